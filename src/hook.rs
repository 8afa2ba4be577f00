//! Types shared by the quickplay hooks.
//!
//! The host patches each engine function named by a `HookSite` so that it calls the matching
//! override in `game::hooks` instead. An override either forwards to the original implementation
//! or replaces it once, guarded by a `Latch`.

use std::sync::atomic::{AtomicBool, Ordering};

use strum::{EnumIter, IntoEnumIterator, IntoStaticStr};

use crate::config::Revision;

/// A one-way flag. Once fired, it stays fired.
#[derive(Debug, Default)]
pub struct Latch(AtomicBool);

impl Latch {
    pub const fn new() -> Latch {
        Latch(AtomicBool::new(false))
    }

    pub fn has_fired(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Fires the latch. Returns `true` only for the call that actually fired it, so at most one
    /// caller ever sees `true`, even across threads.
    pub fn try_fire(&self) -> bool {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// An engine function that quickplay intercepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, IntoStaticStr)]
pub enum HookSite {
    #[strum(serialize = "CMainFlow::AdvanceGameState")]
    AdvanceGameState,

    #[strum(serialize = "CStateManager::InitializeState")]
    InitializeState,

    #[strum(serialize = "CGameArea::StartStreamIn")]
    StartStreamIn,
}

impl HookSite {
    /// The engine symbol to patch.
    pub fn symbol(self) -> &'static str {
        self.into()
    }

    /// Returns `true` if this site needs to be hooked for `revision`.
    pub fn is_used_by(self, revision: Revision) -> bool {
        match self {
            HookSite::AdvanceGameState | HookSite::InitializeState => true,
            HookSite::StartStreamIn => revision.has_layer_flags(),
        }
    }

    /// All sites needed for `revision`.
    pub fn for_revision(revision: Revision) -> impl Iterator<Item = HookSite> {
        HookSite::iter().filter(move |site| site.is_used_by(revision))
    }
}

/// What an override did on a particular call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dispatch {
    /// Only the original behaviour ran.
    Forwarded,

    /// Quickplay changed the outcome of the call.
    Overridden,
}
