use crate::utils::{MockBackendFactory, MockSink, SentSignal, init_tracing, recv_signal};
use tincan_core::{IceCandidateInit, ParticipantId, SignalMessage};
use tincan_engine::{BackendEvent, NegotiationEngine};

#[tokio::test]
async fn test_local_candidates_relayed() {
    init_tracing();

    let factory = MockBackendFactory::new();
    let (sink, mut wire) = MockSink::new();
    let (engine, _events) = NegotiationEngine::new("alice", factory.clone(), sink);

    let remote = ParticipantId::new();
    engine.handle_signal(SignalMessage::ShowCallButton).await;
    engine
        .handle_signal(SignalMessage::UserJoined {
            user_id: remote.clone(),
            name: "bob".to_owned(),
        })
        .await;

    // the media layer gathers a candidate; it must reach the remote peer
    let backend = factory.backend(0).await;
    backend
        .emit(BackendEvent::LocalCandidate(IceCandidateInit {
            candidate: "candidate:local-0".to_owned(),
            sdp_mid: None,
            sdp_m_line_index: None,
        }))
        .await;

    let signal = recv_signal(&mut wire).await.expect("candidate on the wire");
    assert!(matches!(
        signal,
        SentSignal::Ice { to, candidate } if to == remote && candidate.candidate == "candidate:local-0"
    ));
}
