use crate::error::RegistryError;
use crate::registry::Room;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tincan_core::{Participant, ParticipantId, Role, RoomId, SignalMessage};
use tracing::info;

/// Notices produced by a successful join.
#[derive(Debug)]
pub struct JoinEffects {
    pub joined: Participant,
    /// Role notice addressed to the joiner itself.
    pub joiner_notice: SignalMessage,
    /// `UserJoined` addressed to the participant already in the room, so it
    /// can initiate an offer toward the new id.
    pub peer_notice: Option<(ParticipantId, SignalMessage)>,
}

/// Membership transition produced by a leave.
pub struct LeaveEffects {
    pub left: Participant,
    /// Survivor promoted back to Initiator. Owed a `ShowCallButton` notice so
    /// the room can recover if a third party joins later.
    pub promoted: Option<ParticipantId>,
}

/// Tracks which participant is in which room and assigns roles positionally:
/// first to join is the Initiator, the second a Responder, and role flips are
/// driven purely by membership count transitions.
///
/// Mutation happens under per-entry map guards scoped to the affected room;
/// nothing blocks on I/O while a guard is held.
pub struct RoomRegistry {
    rooms: DashMap<RoomId, Room>,
    index: DashMap<ParticipantId, RoomId>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
            index: DashMap::new(),
        }
    }

    /// Registers a participant. Returns `Ok(None)` when the id is already
    /// registered (re-joining is idempotent).
    pub fn join(
        &self,
        id: ParticipantId,
        name: &str,
        room_id: RoomId,
    ) -> Result<Option<JoinEffects>, RegistryError> {
        if name.trim().is_empty() || room_id.0.trim().is_empty() {
            return Err(RegistryError::MalformedJoin);
        }

        let Entry::Vacant(slot) = self.index.entry(id.clone()) else {
            return Ok(None);
        };

        let mut room = self.rooms.entry(room_id.clone()).or_default();
        if room.is_full() {
            return Err(RegistryError::RoomFull(room_id.0));
        }

        let role = if room.is_empty() {
            Role::Initiator
        } else {
            Role::Responder
        };
        let peer_notice = room.first().map(|peer| {
            (
                peer.id.clone(),
                SignalMessage::UserJoined {
                    user_id: id.clone(),
                    name: name.to_owned(),
                },
            )
        });

        let participant = Participant {
            id: id.clone(),
            name: name.to_owned(),
            room_id: room_id.clone(),
            role,
        };
        room.push(participant.clone());
        drop(room);
        slot.insert(room_id.clone());

        info!(%id, %room_id, ?role, "participant joined");

        let joiner_notice = match role {
            Role::Initiator => SignalMessage::ShowCallButton,
            Role::Responder => SignalMessage::ShowAnswerButton,
        };
        Ok(Some(JoinEffects {
            joined: participant,
            joiner_notice,
            peer_notice,
        }))
    }

    /// Removes a participant from its room. Returns `None` for ids that are
    /// not registered, so a second leave for the same connection is a no-op.
    pub fn leave(&self, id: &ParticipantId) -> Option<LeaveEffects> {
        let (_, room_id) = self.index.remove(id)?;

        let Entry::Occupied(mut occupied) = self.rooms.entry(room_id.clone()) else {
            return None;
        };
        let room = occupied.get_mut();
        let left = room.remove(id)?;

        let promoted = room.sole_member_mut().map(|survivor| {
            survivor.role = Role::Initiator;
            survivor.id.clone()
        });
        if occupied.get().is_empty() {
            occupied.remove();
        }

        info!(%id, %room_id, "participant left");
        Some(LeaveEffects { left, promoted })
    }

    pub fn lookup(&self, id: &ParticipantId) -> Option<Participant> {
        let room_id = self.index.get(id)?.value().clone();
        self.rooms.get(&room_id)?.get(id).cloned()
    }

    pub fn room_len(&self, room_id: &RoomId) -> usize {
        self.rooms.get(room_id).map_or(0, |room| room.len())
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}
