use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tincan_core::{IceCandidateInit, ParticipantId, SessionDescription};
use tokio::sync::mpsc;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_remote::TrackRemote;

/// Events originating in the media layer, pumped into the session actor.
pub enum BackendEvent {
    /// Trickle ICE: a local candidate to relay to the remote peer.
    LocalCandidate(IceCandidateInit),
    /// A remote media track became available.
    RemoteTrack(Arc<TrackRemote>),
    /// The media path went away underneath us.
    Disconnected,
}

/// Seam between the negotiation state machine and the actual peer connection.
///
/// Description operations are asynchronous and may take unbounded wall-clock
/// time; the session actor serializes calls so they never interleave for one
/// session. `set_remote_description` must accept an offer while an unanswered
/// local offer is pending (rolling the local one back), which is what lets
/// the Responder yield under glare.
#[async_trait]
pub trait MediaBackend: Send + Sync {
    async fn create_offer(&self) -> Result<SessionDescription>;

    async fn create_answer(&self) -> Result<SessionDescription>;

    async fn set_local_description(&self, desc: SessionDescription) -> Result<()>;

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<()>;

    async fn add_ice_candidate(&self, candidate: IceCandidateInit) -> Result<()>;

    /// Attaches a local media track (camera, screen share) to the connection.
    async fn add_track(&self, track: Arc<dyn TrackLocal + Send + Sync>) -> Result<()>;

    /// Releases the media resources this session allocated. Shared capture
    /// devices belong to the caller and are not touched.
    async fn close(&self) -> Result<()>;
}

/// Creates one backend per negotiation session, wired to that session's
/// event channel.
#[async_trait]
pub trait MediaBackendFactory: Send + Sync {
    async fn create(&self, events: mpsc::Sender<BackendEvent>) -> Result<Arc<dyn MediaBackend>>;
}

/// Outbound path from the engine to the relay.
///
/// Implemented by whatever carries signaling for this endpoint: a WebSocket
/// client in production, an in-process channel in tests.
#[async_trait]
pub trait SignalSink: Send + Sync {
    async fn send_offer(&self, to: ParticipantId, offer: SessionDescription, name: String);

    async fn send_answer(&self, to: ParticipantId, answer: SessionDescription);

    async fn send_ice(&self, to: ParticipantId, candidate: IceCandidateInit);

    async fn send_end_call(&self, to: ParticipantId, name: String);
}
