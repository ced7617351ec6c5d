use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tincan_core::{IceCandidateInit, SdpKind, SessionDescription};
use tincan_engine::{BackendEvent, MediaBackend, MediaBackendFactory};
use tokio::sync::{Mutex, mpsc};
use tokio::time::{Duration, sleep};
use webrtc::track::track_local::TrackLocal;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendOp {
    CreateOffer,
    CreateAnswer,
    SetLocal(String),
    SetRemote(String),
    AddCandidate(String),
    AddTrack,
    Close,
}

/// Scripted media backend: hands out canned SDP, records every call, and can
/// slow operations down to hold race windows open.
pub struct MockBackend {
    ops: Mutex<Vec<BackendOp>>,
    offers: AtomicUsize,
    answers: AtomicUsize,
    op_delay: Duration,
    fail_set_remote: AtomicBool,
    events: mpsc::Sender<BackendEvent>,
}

impl MockBackend {
    fn new(op_delay: Duration, events: mpsc::Sender<BackendEvent>) -> Self {
        Self {
            ops: Mutex::new(Vec::new()),
            offers: AtomicUsize::new(0),
            answers: AtomicUsize::new(0),
            op_delay,
            fail_set_remote: AtomicBool::new(false),
            events,
        }
    }

    /// Every operation the engine performed, in order.
    pub async fn ops(&self) -> Vec<BackendOp> {
        self.ops.lock().await.clone()
    }

    /// Makes the next `set_remote_description` fail.
    pub fn fail_next_set_remote(&self) {
        self.fail_set_remote.store(true, Ordering::SeqCst);
    }

    /// Injects a backend-originated event, as the media layer would.
    pub async fn emit(&self, event: BackendEvent) {
        let _ = self.events.send(event).await;
    }

    async fn record(&self, op: BackendOp) {
        if !self.op_delay.is_zero() {
            sleep(self.op_delay).await;
        }
        self.ops.lock().await.push(op);
    }
}

#[async_trait]
impl MediaBackend for MockBackend {
    async fn create_offer(&self) -> Result<SessionDescription> {
        self.record(BackendOp::CreateOffer).await;
        let n = self.offers.fetch_add(1, Ordering::SeqCst);
        Ok(SessionDescription {
            kind: SdpKind::Offer,
            sdp: format!("v=0 mock-offer-{n}"),
        })
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        self.record(BackendOp::CreateAnswer).await;
        let n = self.answers.fetch_add(1, Ordering::SeqCst);
        Ok(SessionDescription {
            kind: SdpKind::Answer,
            sdp: format!("v=0 mock-answer-{n}"),
        })
    }

    async fn set_local_description(&self, desc: SessionDescription) -> Result<()> {
        self.record(BackendOp::SetLocal(desc.sdp)).await;
        Ok(())
    }

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<()> {
        if self.fail_set_remote.swap(false, Ordering::SeqCst) {
            return Err(anyhow!("scripted set_remote_description failure"));
        }
        self.record(BackendOp::SetRemote(desc.sdp)).await;
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidateInit) -> Result<()> {
        self.record(BackendOp::AddCandidate(candidate.candidate)).await;
        Ok(())
    }

    async fn add_track(&self, _track: Arc<dyn TrackLocal + Send + Sync>) -> Result<()> {
        self.record(BackendOp::AddTrack).await;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.record(BackendOp::Close).await;
        Ok(())
    }
}

/// Factory that keeps every backend it built, so tests can inspect the one
/// a session ended up with.
pub struct MockBackendFactory {
    op_delay: Duration,
    created: Mutex<Vec<Arc<MockBackend>>>,
}

impl MockBackendFactory {
    pub fn new() -> Arc<Self> {
        Self::with_delay(Duration::ZERO)
    }

    pub fn with_delay(op_delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            op_delay,
            created: Mutex::new(Vec::new()),
        })
    }

    /// Waits for the `index`-th backend the engine created.
    pub async fn backend(&self, index: usize) -> Arc<MockBackend> {
        for _ in 0..100 {
            if let Some(backend) = self.created.lock().await.get(index) {
                return backend.clone();
            }
            sleep(Duration::from_millis(20)).await;
        }
        panic!("backend {index} was never created");
    }

    pub async fn created_count(&self) -> usize {
        self.created.lock().await.len()
    }
}

#[async_trait]
impl MediaBackendFactory for MockBackendFactory {
    async fn create(&self, events: mpsc::Sender<BackendEvent>) -> Result<Arc<dyn MediaBackend>> {
        let backend = Arc::new(MockBackend::new(self.op_delay, events));
        self.created.lock().await.push(backend.clone());
        Ok(backend)
    }
}
