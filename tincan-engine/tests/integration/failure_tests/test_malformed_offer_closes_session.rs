use crate::utils::{MockBackendFactory, MockSink, init_tracing, wait_for_event, wait_for_state};
use serde_json::json;
use tincan_core::{ParticipantId, SignalMessage};
use tincan_engine::{EngineEvent, NegotiationEngine, NegotiationError, NegotiationState};

#[tokio::test]
async fn test_malformed_offer_closes_session() {
    init_tracing();

    let factory = MockBackendFactory::new();
    let (sink, _wire) = MockSink::new();
    let (engine, mut events) = NegotiationEngine::new("bob", factory.clone(), sink.clone());

    let remote = ParticipantId::new();
    engine.handle_signal(SignalMessage::ShowAnswerButton).await;

    // not a session description at all
    engine
        .handle_signal(SignalMessage::Offer {
            offer: json!("garbage"),
            to: ParticipantId::new(),
            from: Some(remote.clone()),
            name: "alice".to_owned(),
        })
        .await;

    let failed = wait_for_event(&mut events, |event| {
        matches!(event, EngineEvent::NegotiationFailed { .. })
    })
    .await
    .unwrap();
    let EngineEvent::NegotiationFailed { error, .. } = failed else {
        unreachable!()
    };
    assert!(matches!(error, NegotiationError::Decode(_)));
    wait_for_state(&mut events, &remote, NegotiationState::Closed)
        .await
        .unwrap();

    assert_eq!(sink.answer_count().await, 0);
}
