//! The workflow sequencer: a single-slot register for deferred UI actions.
//!
//! A dialog that produced a side effect may need a follow-up action once
//! its close transition settles — revealing a freshly generated key, or
//! opening the share dialog after an analysis. The sequencer guarantees
//! the follow-up fires exactly once, after settling, and that at most one
//! follow-up is pending: enqueueing while one is pending overwrites it
//! (last-write-wins), which is sound because at most one dialog is open at
//! a time.
//!
//! The state machine is explicit — `Idle | AwaitingSettle` driven by a
//! `dialog_settled` event — rather than relying on animation-completion
//! timing as a synchronization primitive.

use smartcrypt_core::{DecryptionKey, FileId};

/// A deferred action to run after the current dialog settles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FollowUp {
    /// Reveal a freshly generated decryption key. Queued by a successful
    /// standard share so the key is never rendered underneath the share
    /// dialog.
    RevealKey { file_id: FileId, key: DecryptionKey },

    /// Open the share dialog for a file. Queued when the user chooses to
    /// secure a high-risk file from an analysis result.
    OpenShare { file_id: FileId },
}

/// Sequencer state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SequencerState {
    /// Nothing pending.
    #[default]
    Idle,
    /// A follow-up is queued, waiting for the dialog to settle.
    AwaitingSettle(FollowUp),
}

/// The single-slot pending-action register.
#[derive(Debug, Default)]
pub struct Sequencer {
    state: SequencerState,
}

impl Sequencer {
    /// Create an idle sequencer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether nothing is pending.
    pub fn is_idle(&self) -> bool {
        matches!(self.state, SequencerState::Idle)
    }

    /// Queue a follow-up, replacing any pending one.
    ///
    /// Returns the follow-up that was overwritten, if any.
    pub fn enqueue(&mut self, follow_up: FollowUp) -> Option<FollowUp> {
        let previous = std::mem::replace(
            &mut self.state,
            SequencerState::AwaitingSettle(follow_up),
        );
        match previous {
            SequencerState::Idle => None,
            SequencerState::AwaitingSettle(overwritten) => Some(overwritten),
        }
    }

    /// The dialog finished its close transition: fire the pending
    /// follow-up exactly once and return to idle.
    pub fn dialog_settled(&mut self) -> Option<FollowUp> {
        match std::mem::take(&mut self.state) {
            SequencerState::Idle => None,
            SequencerState::AwaitingSettle(follow_up) => Some(follow_up),
        }
    }
}
