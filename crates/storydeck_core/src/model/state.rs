//! Top-level application snapshot.
//!
//! # Responsibility
//! - Define `AppState`, the exact unit written to and read from blob storage.
//! - Validate loaded snapshots before they replace in-memory state.
//!
//! # Invariants
//! - Competency ids are unique within one snapshot.
//! - Card ids are unique within one competency.

use crate::model::card::CardId;
use crate::model::competency::{default_competencies, Competency, CompetencyId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// User preferences persisted with the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// When false, mutations stay in memory only.
    pub auto_save: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self { auto_save: true }
    }
}

/// Complete application state at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppState {
    pub competencies: Vec<Competency>,
    pub settings: Settings,
}

impl Default for AppState {
    /// Five seeded competencies, no cards, auto-save on.
    fn default() -> Self {
        Self {
            competencies: default_competencies(),
            settings: Settings::default(),
        }
    }
}

/// Structural problems found in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateValidationError {
    DuplicateCompetencyId(CompetencyId),
    DuplicateCardId {
        competency_id: CompetencyId,
        card_id: CardId,
    },
}

impl Display for StateValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateCompetencyId(id) => write!(f, "duplicate competency id: {id}"),
            Self::DuplicateCardId {
                competency_id,
                card_id,
            } => write!(
                f,
                "duplicate card id {card_id} in competency {competency_id}"
            ),
        }
    }
}

impl Error for StateValidationError {}

impl AppState {
    /// Checks id uniqueness invariants.
    pub fn validate(&self) -> Result<(), StateValidationError> {
        let mut competency_ids = HashSet::new();
        for competency in &self.competencies {
            if !competency_ids.insert(&competency.id) {
                return Err(StateValidationError::DuplicateCompetencyId(
                    competency.id.clone(),
                ));
            }

            let mut card_ids = HashSet::new();
            for card in &competency.cards {
                if !card_ids.insert(&card.id) {
                    return Err(StateValidationError::DuplicateCardId {
                        competency_id: competency.id.clone(),
                        card_id: card.id.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn competency(&self, id: &CompetencyId) -> Option<&Competency> {
        self.competencies
            .iter()
            .find(|competency| &competency.id == id)
    }

    pub fn contains_competency(&self, id: &CompetencyId) -> bool {
        self.competency(id).is_some()
    }

    /// Total number of cards across all competencies.
    pub fn card_count(&self) -> usize {
        self.competencies
            .iter()
            .map(|competency| competency.cards.len())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::{AppState, StateValidationError};
    use crate::model::card::{Card, CardFormat};
    use crate::model::competency::Competency;

    #[test]
    fn default_state_is_valid() {
        let state = AppState::default();
        assert!(state.validate().is_ok());
        assert_eq!(state.competencies.len(), 5);
        assert!(state.settings.auto_save);
        assert_eq!(state.card_count(), 0);
    }

    #[test]
    fn validate_rejects_duplicate_competency_ids() {
        let mut state = AppState::default();
        state
            .competencies
            .push(Competency::new("teamwork".into(), "Teamwork 2", ""));
        let err = state.validate().unwrap_err();
        assert_eq!(
            err,
            StateValidationError::DuplicateCompetencyId("teamwork".into())
        );
    }

    #[test]
    fn validate_rejects_duplicate_card_ids_in_one_competency() {
        let mut state = AppState::default();
        let card = Card::new("twice", CardFormat::Star, 10);
        state.competencies[0].cards.push(card.clone());
        state.competencies[0].cards.push(card);
        assert!(matches!(
            state.validate(),
            Err(StateValidationError::DuplicateCardId { .. })
        ));
    }
}
