/// Lifecycle of the offer/answer exchange with a single remote peer.
///
/// Caller path: `Idle → OfferCreated → OfferSent → Connected` (on answer
/// applied). Callee path: `Idle → OfferReceived → AnswerCreated → Connected`
/// (on answer sent). A renegotiation re-enters the same paths from
/// `Connected`. `Closed` is reachable from every state and final.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationState {
    Idle,
    OfferCreated,
    OfferSent,
    OfferReceived,
    AnswerCreated,
    Connected,
    Closed,
}

impl NegotiationState {
    /// True while our own unanswered offer is on the wire; the window in
    /// which an incoming offer means glare.
    pub fn local_offer_outstanding(self) -> bool {
        matches!(self, Self::OfferCreated | Self::OfferSent)
    }
}
