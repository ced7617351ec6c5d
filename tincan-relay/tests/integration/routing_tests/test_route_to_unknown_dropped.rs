use crate::integration::init_tracing;
use crate::utils::FakeEndpoint;
use serde_json::json;
use tincan_core::{ParticipantId, SignalMessage};
use tincan_relay::{RoutingError, SignalingService};
use tokio::time::{Duration, sleep};

#[tokio::test]
async fn test_route_to_unknown_dropped() {
    init_tracing();

    let service = SignalingService::new();
    let mut alice = FakeEndpoint::connect(&service);
    let ghost = ParticipantId::new();

    // addressed to an id with no live connection: dropped, nothing crashes
    service.handle_message(
        &alice.id,
        SignalMessage::Answer {
            answer: json!({ "type": "answer", "sdp": "v=0" }),
            to: ghost.clone(),
            from: None,
        },
    );
    sleep(Duration::from_millis(50)).await;
    assert!(alice.try_next().is_none());

    let err = service
        .router()
        .send(&ghost, &SignalMessage::ShowCallButton)
        .unwrap_err();
    assert_eq!(err, RoutingError::NoRoute(ghost));
}
