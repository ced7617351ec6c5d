use crate::model::participant::ParticipantId;
use crate::model::room::RoomId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SdpKind {
    Offer,
    Answer,
}

/// Session description in the browser `RTCSessionDescriptionInit` shape.
///
/// Only the negotiation engine decodes into this type; on the wire the
/// description rides inside `SignalMessage` as an opaque JSON value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionDescription {
    #[serde(rename = "type")]
    pub kind: SdpKind,
    pub sdp: String,
}

/// ICE candidate in the browser `RTCIceCandidateInit` shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidateInit {
    pub candidate: String,
    #[serde(default)]
    pub sdp_mid: Option<String>,
    #[serde(default)]
    pub sdp_m_line_index: Option<u16>,
}

/// The complete signaling vocabulary shared by relay and engine.
///
/// `Join` is the only endpoint-to-relay message that mutates relay state;
/// `ShowCallButton`, `ShowAnswerButton` and `UserJoined` flow relay-to-endpoint
/// only. `Offer`, `Answer`, `IceCandidate` and `EndCall` are routed
/// point-to-point by their `to` field with the payload forwarded untouched.
/// A client-supplied `from` is never trusted: the relay overwrites it with the
/// sender's true connection id before forwarding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", content = "d")]
pub enum SignalMessage {
    Join {
        name: String,
        room_id: RoomId,
    },
    ShowCallButton,
    ShowAnswerButton,
    UserJoined {
        user_id: ParticipantId,
        name: String,
    },
    Offer {
        offer: Value,
        to: ParticipantId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<ParticipantId>,
        name: String,
    },
    Answer {
        answer: Value,
        to: ParticipantId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<ParticipantId>,
    },
    IceCandidate {
        candidate: Value,
        to: ParticipantId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<ParticipantId>,
    },
    EndCall {
        name: String,
        to: ParticipantId,
    },
}
