//! Hand-off to satellite flows (move learning, evolution)
//!
//! The turn manager sends an [`InterstitialRequest`] to whoever hosts those
//! flows and suspends until the request's oneshot is answered. No battle
//! logic runs in between.

use skirmish_battle::Combatant;
use tokio::sync::{mpsc, oneshot};

#[derive(Debug, Clone, PartialEq)]
pub enum InterstitialKind {
    MoveLearn {
        combatant_id: String,
        moves: Vec<String>,
    },
    Evolution {
        combatant_id: String,
        from: String,
        to: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum InterstitialOutcome {
    /// Nothing about the combatant changed
    Done,
    /// The flow produced a new version of the combatant (new species or
    /// moveset), to be swapped in whole
    Replaced(Box<Combatant>),
}

#[derive(Debug)]
pub struct InterstitialRequest {
    pub kind: InterstitialKind,
    /// Snapshot of the combatant the flow is about
    pub combatant: Combatant,
    pub respond_to: oneshot::Sender<InterstitialOutcome>,
}

impl InterstitialRequest {
    pub fn complete(self, outcome: InterstitialOutcome) {
        if self.respond_to.send(outcome).is_err() {
            tracing::debug!("Battle scene stopped waiting for interstitial");
        }
    }
}

/// Sending half of the satellite channel
#[derive(Debug, Clone, Default)]
pub struct Satellites {
    tx: Option<mpsc::UnboundedSender<InterstitialRequest>>,
}

impl Satellites {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<InterstitialRequest>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// No host: every interstitial completes immediately
    pub fn none() -> Self {
        Self::default()
    }

    /// Launch a flow and wait for it to finish
    pub async fn run(&self, kind: InterstitialKind, combatant: Combatant) -> InterstitialOutcome {
        let Some(tx) = &self.tx else {
            tracing::warn!(?kind, "No interstitial host, skipping");
            return InterstitialOutcome::Done;
        };

        let (respond_to, response) = oneshot::channel();
        let request = InterstitialRequest {
            kind,
            combatant,
            respond_to,
        };
        if let Err(mpsc::error::SendError(request)) = tx.send(request) {
            tracing::warn!(kind = ?request.kind, "Interstitial host is gone, skipping");
            return InterstitialOutcome::Done;
        }

        response.await.unwrap_or_else(|_| {
            tracing::warn!("Interstitial dropped without completing");
            InterstitialOutcome::Done
        })
    }
}
