use tincan_core::{ParticipantId, Role, RoomId, SignalMessage};
use tincan_relay::RoomRegistry;

#[test]
fn test_positional_role_assignment() {
    let registry = RoomRegistry::new();
    let alice = ParticipantId::new();
    let bob = ParticipantId::new();

    // first into the room calls
    let effects = registry
        .join(alice.clone(), "alice", RoomId::from("r1"))
        .unwrap()
        .expect("first join must produce effects");
    assert_eq!(effects.joined.role, Role::Initiator);
    assert!(matches!(effects.joiner_notice, SignalMessage::ShowCallButton));
    assert!(effects.peer_notice.is_none());

    // second answers, and the first hears about it
    let effects = registry
        .join(bob.clone(), "bob", RoomId::from("r1"))
        .unwrap()
        .expect("second join must produce effects");
    assert_eq!(effects.joined.role, Role::Responder);
    assert!(matches!(
        effects.joiner_notice,
        SignalMessage::ShowAnswerButton
    ));
    let (peer, notice) = effects
        .peer_notice
        .expect("the existing participant must be told");
    assert_eq!(peer, alice);
    assert!(matches!(
        notice,
        SignalMessage::UserJoined { user_id, .. } if user_id == bob
    ));

    assert_eq!(registry.lookup(&alice).unwrap().role, Role::Initiator);
    assert_eq!(registry.lookup(&bob).unwrap().role, Role::Responder);
}
