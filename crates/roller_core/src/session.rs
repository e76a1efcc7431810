//! One roll request: the batch of dice it spawned and its pending result.

use futures::channel::oneshot;
use rapier3d::prelude::RigidBodyHandle;

use crate::error::RollError;
use crate::settle::SettleDetector;

/// Resolved face values in spawn order, or why the roll failed.
pub type RollResult = Result<Vec<u8>, RollError>;

/// Receiver half of a roll's pending outcome. Await it, or poll it with
/// `try_recv` from a synchronous update loop. If the roll is superseded by a
/// newer one before completing, the receiver observes `Canceled` instead of
/// resolving.
pub type OutcomeReceiver = oneshot::Receiver<RollResult>;

/// The dice batch of a single roll call. The session exclusively owns its
/// body handles; superseding it removes them from the world before the
/// session (and with it the sender and detector) is dropped, which is what
/// makes stale settlement polls structurally impossible.
pub struct RollSession {
    id: u64,
    dice: Vec<RigidBodyHandle>,
    sender: Option<oneshot::Sender<RollResult>>,
    pub(crate) detector: SettleDetector,
}

impl RollSession {
    pub fn new(
        id: u64,
        dice: Vec<RigidBodyHandle>,
        detector: SettleDetector,
    ) -> (Self, OutcomeReceiver) {
        let (sender, receiver) = oneshot::channel();
        (
            Self {
                id,
                dice,
                sender: Some(sender),
                detector,
            },
            receiver,
        )
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Body handles in spawn order.
    pub fn dice(&self) -> &[RigidBodyHandle] {
        &self.dice
    }

    /// Deliver the outcome. A dropped receiver is fine; the result is simply
    /// discarded.
    pub fn complete(&mut self, result: RollResult) {
        if let Some(sender) = self.sender.take() {
            let _ = sender.send(result);
        }
    }

    pub fn is_complete(&self) -> bool {
        self.sender.is_none()
    }
}
