//! # Relationship Lifecycle
//!
//! The relationship state machine and relationship kinds. State transitions
//! are driven exclusively by on-chain transactions; the orchestrator only
//! observes the resulting state via read calls after each transaction
//! confirms, so this module is pure data — the guard logic lives with the
//! orchestrator.
//!
//! ## Transition Graph
//!
//! ```text
//! Created ──create──▶ Proposed ──fund_escrow──▶ Funded
//!                        │                        │
//!                        └────────assign_worker───┴──▶ Assigned
//!                                                        │
//!                                                   submit_work
//!                                                        │
//!                                                        ▼
//!                                  dispute ◀──────── Submitted
//!                                     │                  │
//!                                     ▼               resolve
//!                    Assigned ──▶ Disputed               │
//!                                     │                  ▼
//!                                  verdict            Resolved [terminal]
//!                                     │
//!                                     ▼
//!                                 Arbitrated [terminal]
//! ```
//!
//! ## Canonical Status Representation
//!
//! On chain, the status is a single `uint8` slot read through the
//! `contractStatus()` view. The word values below are the canonical
//! mapping; every contract variant reports through this accessor.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// The lifecycle state of a work relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationshipState {
    /// Relationship contract exists but has not been opened to proposals.
    Created,
    /// Open for a worker; escrow not yet funded.
    Proposed,
    /// Escrow holds the payout; no worker assigned yet.
    Funded,
    /// A worker is assigned and working.
    Assigned,
    /// The worker has submitted a solution pointer.
    Submitted,
    /// Escrow released to the worker. Terminal state.
    Resolved,
    /// Outcome contested; an external voting process decides.
    Disputed,
    /// A dispute verdict has been recorded. Terminal state.
    Arbitrated,
}

impl RelationshipState {
    /// The canonical string name of this state.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Proposed => "PROPOSED",
            Self::Funded => "FUNDED",
            Self::Assigned => "ASSIGNED",
            Self::Submitted => "SUBMITTED",
            Self::Resolved => "RESOLVED",
            Self::Disputed => "DISPUTED",
            Self::Arbitrated => "ARBITRATED",
        }
    }

    /// The on-chain `uint8` status word for this state.
    pub fn status_word(&self) -> u64 {
        match self {
            Self::Created => 0,
            Self::Proposed => 1,
            Self::Funded => 2,
            Self::Assigned => 3,
            Self::Submitted => 4,
            Self::Resolved => 5,
            Self::Disputed => 6,
            Self::Arbitrated => 7,
        }
    }

    /// Map an on-chain status word back to a state.
    pub fn from_status_word(word: u64) -> Result<Self, ValidationError> {
        match word {
            0 => Ok(Self::Created),
            1 => Ok(Self::Proposed),
            2 => Ok(Self::Funded),
            3 => Ok(Self::Assigned),
            4 => Ok(Self::Submitted),
            5 => Ok(Self::Resolved),
            6 => Ok(Self::Disputed),
            7 => Ok(Self::Arbitrated),
            other => Err(ValidationError::StatusOutOfRange { value: other }),
        }
    }

    /// Whether this state is terminal (no further transitions allowed).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved | Self::Arbitrated)
    }

    /// Valid target states from this state.
    pub fn valid_transitions(&self) -> &'static [RelationshipState] {
        match self {
            Self::Created => &[Self::Proposed],
            Self::Proposed => &[Self::Funded, Self::Assigned],
            Self::Funded => &[Self::Assigned],
            Self::Assigned => &[Self::Submitted, Self::Disputed],
            Self::Submitted => &[Self::Resolved, Self::Disputed],
            Self::Disputed => &[Self::Arbitrated],
            Self::Resolved | Self::Arbitrated => &[],
        }
    }
}

impl std::fmt::Display for RelationshipState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The contract kind backing a relationship. Each kind carries a distinct
/// parameter set at creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationshipKind {
    /// Single payout released in full at resolution.
    FlatRate,
    /// Payout split across a fixed number of milestones.
    Milestone,
    /// Flat payout with an on-chain deadline timestamp.
    Deadline,
}

impl RelationshipKind {
    /// All relationship kinds as a slice.
    pub fn all() -> &'static [RelationshipKind] {
        &[Self::FlatRate, Self::Milestone, Self::Deadline]
    }

    /// The canonical string identifier for serialization and CLI input.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FlatRate => "flat_rate",
            Self::Milestone => "milestone",
            Self::Deadline => "deadline",
        }
    }

    /// Parse a kind identifier. Unrecognized input is an error, never a
    /// silent default.
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value {
            "flat_rate" => Ok(Self::FlatRate),
            "milestone" => Ok(Self::Milestone),
            "deadline" => Ok(Self::Deadline),
            other => Err(ValidationError::UnknownRelationshipKind {
                value: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_word_roundtrip_all_states() {
        for word in 0..8 {
            let state = RelationshipState::from_status_word(word).unwrap();
            assert_eq!(state.status_word(), word);
        }
    }

    #[test]
    fn status_word_out_of_range() {
        assert!(RelationshipState::from_status_word(8).is_err());
        assert!(RelationshipState::from_status_word(255).is_err());
    }

    #[test]
    fn terminal_states() {
        assert!(RelationshipState::Resolved.is_terminal());
        assert!(RelationshipState::Arbitrated.is_terminal());
        assert!(!RelationshipState::Proposed.is_terminal());
        assert!(!RelationshipState::Disputed.is_terminal());
    }

    #[test]
    fn terminal_states_have_no_transitions() {
        assert!(RelationshipState::Resolved.valid_transitions().is_empty());
        assert!(RelationshipState::Arbitrated.valid_transitions().is_empty());
    }

    #[test]
    fn assign_reachable_from_proposed_and_funded() {
        assert!(RelationshipState::Proposed
            .valid_transitions()
            .contains(&RelationshipState::Assigned));
        assert!(RelationshipState::Funded
            .valid_transitions()
            .contains(&RelationshipState::Assigned));
    }

    #[test]
    fn dispute_reachable_from_assigned_and_submitted() {
        assert!(RelationshipState::Assigned
            .valid_transitions()
            .contains(&RelationshipState::Disputed));
        assert!(RelationshipState::Submitted
            .valid_transitions()
            .contains(&RelationshipState::Disputed));
    }

    #[test]
    fn kind_parse_roundtrip() {
        for kind in RelationshipKind::all() {
            assert_eq!(RelationshipKind::parse(kind.as_str()).unwrap(), *kind);
        }
    }

    #[test]
    fn kind_parse_rejects_unknown() {
        assert!(RelationshipKind::parse("hourly").is_err());
        assert!(RelationshipKind::parse("").is_err());
        assert!(RelationshipKind::parse("FlatRate").is_err());
    }

    #[test]
    fn state_serde_roundtrip() {
        let state = RelationshipState::Submitted;
        let json = serde_json::to_string(&state).unwrap();
        let back: RelationshipState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }
}
