//! Navigation state machine
//!
//! Tracks where the user is in the district → subdistrict → block → parcel
//! hierarchy as a single tagged-union state. The breadcrumb stack is derived
//! from the state rather than stored beside it, so the two can never drift
//! apart: stack depth always equals the current level's ordinal, and every
//! ancestor in the chain is present exactly once.
//!
//! Invalid transitions (drilling below parcel, going back from district) are
//! reported as typed errors and leave the state untouched. They are normal
//! outcomes of user input, not failures; callers log them at debug and move
//! on.
//!
//! Only the drill-down controller mutates this state, and only after a
//! transition's fetch/render work has succeeded.

use thiserror::Error;
use tracing::debug;

use crate::region::{Level, NavigationEntry, RegionCode};

/// A transition that is not allowed from the current state.
///
/// Always a no-op on the state machine; never surfaced to the user as a
/// failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidTransition {
    /// `drill_into` from the parcel level; there is nothing below parcels.
    #[error("cannot drill below the parcel level")]
    BelowParcel,

    /// `go_back` from the district level; the stack is already empty.
    #[error("cannot go back from the district level")]
    AtRoot,

    /// The drill entry was selected at a different level than the current one.
    #[error("drill entry is at level {found}, expected {expected}")]
    LevelMismatch { expected: Level, found: Level },
}

/// Current position in the drill-down hierarchy.
///
/// Each variant carries the full ancestor selection chain, so "where am I"
/// and "how did I get here" are answered by one value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavState {
    /// Viewing all districts; nothing selected yet.
    AtDistrict,
    /// Viewing the subdistricts of one selected district.
    AtSubdistrict { district: NavigationEntry },
    /// Viewing the blocks of one selected subdistrict.
    AtBlock {
        district: NavigationEntry,
        subdistrict: NavigationEntry,
    },
    /// Viewing the parcels of one selected block.
    AtParcel {
        district: NavigationEntry,
        subdistrict: NavigationEntry,
        block: NavigationEntry,
    },
}

impl NavState {
    /// The level currently being viewed.
    pub fn level(&self) -> Level {
        match self {
            NavState::AtDistrict => Level::District,
            NavState::AtSubdistrict { .. } => Level::Subdistrict,
            NavState::AtBlock { .. } => Level::Block,
            NavState::AtParcel { .. } => Level::Parcel,
        }
    }

    /// The breadcrumb stack, coarsest selection first.
    ///
    /// Length always equals `self.level().ordinal()`.
    pub fn breadcrumb(&self) -> Vec<NavigationEntry> {
        match self {
            NavState::AtDistrict => vec![],
            NavState::AtSubdistrict { district } => vec![district.clone()],
            NavState::AtBlock {
                district,
                subdistrict,
            } => vec![district.clone(), subdistrict.clone()],
            NavState::AtParcel {
                district,
                subdistrict,
                block,
            } => vec![district.clone(), subdistrict.clone(), block.clone()],
        }
    }

    /// The ancestor code chain, coarsest first.
    pub fn ancestor_codes(&self) -> Vec<RegionCode> {
        self.breadcrumb().into_iter().map(|e| e.code).collect()
    }
}

/// State machine for drill-down navigation.
///
/// Starts at [`NavState::AtDistrict`]. All transitions validate against the
/// current state and return [`InvalidTransition`] without mutating on
/// rejection.
#[derive(Debug, Clone)]
pub struct NavigationStateMachine {
    state: NavState,
}

impl Default for NavigationStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl NavigationStateMachine {
    /// Create a state machine at the district level.
    pub fn new() -> Self {
        Self {
            state: NavState::AtDistrict,
        }
    }

    /// The current state.
    pub fn state(&self) -> &NavState {
        &self.state
    }

    /// The level currently being viewed.
    pub fn current_level(&self) -> Level {
        self.state.level()
    }

    /// The breadcrumb stack, coarsest selection first.
    pub fn breadcrumb(&self) -> Vec<NavigationEntry> {
        self.state.breadcrumb()
    }

    /// The ancestor code chain, coarsest first.
    pub fn ancestor_codes(&self) -> Vec<RegionCode> {
        self.state.ancestor_codes()
    }

    /// Drill into the region selected at the current level.
    ///
    /// `entry.level` must equal the current level (the selection is made on
    /// the currently displayed layer). On success the machine moves one
    /// level finer and returns the new level.
    pub fn drill_into(&mut self, entry: NavigationEntry) -> Result<Level, InvalidTransition> {
        let current = self.state.level();
        if entry.level != current {
            return Err(InvalidTransition::LevelMismatch {
                expected: current,
                found: entry.level,
            });
        }

        let next = match self.state.clone() {
            NavState::AtDistrict => NavState::AtSubdistrict { district: entry },
            NavState::AtSubdistrict { district } => NavState::AtBlock {
                district,
                subdistrict: entry,
            },
            NavState::AtBlock {
                district,
                subdistrict,
            } => NavState::AtParcel {
                district,
                subdistrict,
                block: entry,
            },
            NavState::AtParcel { .. } => return Err(InvalidTransition::BelowParcel),
        };

        self.state = next;
        let level = self.state.level();
        debug!(level = %level, depth = self.breadcrumb().len(), "Navigation drilled in");
        Ok(level)
    }

    /// Go back one level, popping the most recent selection.
    pub fn go_back(&mut self) -> Result<Level, InvalidTransition> {
        let previous = match self.state.clone() {
            NavState::AtDistrict => return Err(InvalidTransition::AtRoot),
            NavState::AtSubdistrict { .. } => NavState::AtDistrict,
            NavState::AtBlock { district, .. } => NavState::AtSubdistrict { district },
            NavState::AtParcel {
                district,
                subdistrict,
                ..
            } => NavState::AtBlock {
                district,
                subdistrict,
            },
        };

        self.state = previous;
        let level = self.state.level();
        debug!(level = %level, depth = self.breadcrumb().len(), "Navigation went back");
        Ok(level)
    }

    /// Jump to the district root, clearing the breadcrumb stack.
    pub fn reset(&mut self) {
        self.state = NavState::AtDistrict;
        debug!("Navigation reset to district level");
    }
}
