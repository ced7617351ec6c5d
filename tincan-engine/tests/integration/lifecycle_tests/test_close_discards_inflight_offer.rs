use crate::utils::{MockBackendFactory, MockSink, init_tracing, wait_for_event};
use tincan_core::{ParticipantId, SignalMessage};
use tincan_engine::{EngineEvent, NegotiationEngine};
use tokio::time::{Duration, sleep};

#[tokio::test]
async fn test_close_discards_inflight_offer() {
    init_tracing();

    // offer creation takes a while; the hangup lands in the middle of it
    let factory = MockBackendFactory::with_delay(Duration::from_millis(150));
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
    engine.end_call(&remote).await;

    wait_for_event(&mut events, |event| {
        matches!(event, EngineEvent::CallEnded { .. })
    })
    .await
    .unwrap();

    // let the abandoned create_offer resolve; its result must be thrown away
    sleep(Duration::from_millis(400)).await;
    assert_eq!(
        sink.offer_count().await,
        0,
        "an offer finished after the hangup must not reach the wire"
    );
    assert_eq!(sink.end_call_count().await, 1);
}
