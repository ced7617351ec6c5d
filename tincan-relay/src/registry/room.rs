use tincan_core::{Participant, ParticipantId};

/// Rooms hold at most two participants; the registry refuses a third.
pub(crate) const ROOM_CAPACITY: usize = 2;

/// Join-ordered membership of a single room.
///
/// Order is what makes role assignment positional: the first entry is the
/// Initiator, and the survivor of a leave can be promoted deterministically.
#[derive(Debug, Default)]
pub(crate) struct Room {
    members: Vec<Participant>,
}

impl Room {
    pub(crate) fn len(&self) -> usize {
        self.members.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub(crate) fn is_full(&self) -> bool {
        self.members.len() >= ROOM_CAPACITY
    }

    pub(crate) fn first(&self) -> Option<&Participant> {
        self.members.first()
    }

    pub(crate) fn get(&self, id: &ParticipantId) -> Option<&Participant> {
        self.members.iter().find(|p| &p.id == id)
    }

    pub(crate) fn push(&mut self, participant: Participant) {
        self.members.push(participant);
    }

    pub(crate) fn remove(&mut self, id: &ParticipantId) -> Option<Participant> {
        let index = self.members.iter().position(|p| &p.id == id)?;
        Some(self.members.remove(index))
    }

    /// The remaining participant, if exactly one is left.
    pub(crate) fn sole_member_mut(&mut self) -> Option<&mut Participant> {
        match self.members.as_mut_slice() {
            [survivor] => Some(survivor),
            _ => None,
        }
    }
}
