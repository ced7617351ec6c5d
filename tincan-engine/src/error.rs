use thiserror::Error;

/// Terminal failure of one negotiation session.
///
/// Never retried in place: the session moves to `Closed` and the caller must
/// open a fresh session. Other sessions are unaffected.
#[derive(Debug, Error)]
pub enum NegotiationError {
    #[error("answer received with no outstanding offer")]
    AnswerWithoutOffer,

    #[error("failed to decode remote payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("media backend failure: {0}")]
    Backend(anyhow::Error),
}
