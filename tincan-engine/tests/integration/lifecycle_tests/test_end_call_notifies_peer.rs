use crate::utils::{
    BackendOp, MockBackendFactory, MockSink, SentSignal, init_tracing, remote_answer,
    remote_candidate, wait_for_event, wait_for_state,
};
use tincan_core::{ParticipantId, SignalMessage};
use tincan_engine::{EngineEvent, NegotiationEngine, NegotiationState};
use tokio::time::{Duration, sleep};

#[tokio::test]
async fn test_end_call_notifies_peer() {
    init_tracing();

    let factory = MockBackendFactory::new();
    let (sink, _wire) = MockSink::new();
    let (engine, mut events) = NegotiationEngine::new("alice", factory.clone(), sink.clone());

    let remote = ParticipantId::new();
    engine.handle_signal(SignalMessage::ShowCallButton).await;
    engine
        .handle_signal(SignalMessage::UserJoined {
            user_id: remote.clone(),
            name: "bob".to_owned(),
        })
        .await;

    assert!(engine.call(&remote));
    wait_for_state(&mut events, &remote, NegotiationState::OfferSent)
        .await
        .unwrap();
    engine
        .handle_signal(SignalMessage::Answer {
            answer: remote_answer(0),
            to: ParticipantId::new(),
            from: Some(remote.clone()),
        })
        .await;
    wait_for_state(&mut events, &remote, NegotiationState::Connected)
        .await
        .unwrap();

    engine.end_call(&remote).await;
    wait_for_event(&mut events, |event| {
        matches!(event, EngineEvent::CallEnded { .. })
    })
    .await
    .unwrap();

    // the peer is told, so its own engine closes without a transport signal
    assert_eq!(sink.end_call_count().await, 1);
    assert!(sink.sent().await.iter().any(|signal| matches!(
        signal,
        SentSignal::EndCall { to, name } if to == &remote && name == "alice"
    )));

    let backend = factory.backend(0).await;
    let ops = backend.ops().await;
    assert!(ops.contains(&BackendOp::Close));

    // a candidate for the hung-up session is dropped silently
    let candidates_before = ops
        .iter()
        .filter(|op| matches!(op, BackendOp::AddCandidate(_)))
        .count();
    engine
        .handle_signal(SignalMessage::IceCandidate {
            candidate: remote_candidate("candidate:late"),
            to: ParticipantId::new(),
            from: Some(remote.clone()),
        })
        .await;
    sleep(Duration::from_millis(50)).await;
    let candidates_after = backend
        .ops()
        .await
        .iter()
        .filter(|op| matches!(op, BackendOp::AddCandidate(_)))
        .count();
    assert_eq!(candidates_before, candidates_after);
}
