//! Competency domain model and the seeded default set.
//!
//! # Responsibility
//! - Define the named grouping that owns an ordered list of cards.
//! - Provide the five built-in competencies used on first run and reset.
//! - Derive ids for user-created competencies.
//!
//! # Invariants
//! - A card belongs to exactly one competency; removing the competency
//!   removes its cards.
//! - Seeded ids are fixed slugs and never change between releases.

use crate::model::card::{Card, CardId};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

static WHITESPACE_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

const ID_SUFFIX_CHARS: usize = 8;
const FALLBACK_SLUG: &str = "competency";

/// Built-in competencies as `(id, name, description)`.
pub const DEFAULT_COMPETENCIES: [(&str, &str, &str); 5] = [
    (
        "leadership",
        "Leadership",
        "Demonstrating leadership qualities and taking initiative",
    ),
    (
        "teamwork",
        "Teamwork",
        "Working effectively with others to achieve common goals",
    ),
    (
        "problem-solving",
        "Problem Solving",
        "Analyzing issues and creating effective solutions",
    ),
    (
        "communication",
        "Communication",
        "Clearly conveying information and ideas",
    ),
    (
        "adaptability",
        "Adaptability",
        "Responding positively to change and uncertainty",
    ),
];

/// Opaque competency identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompetencyId(String);

impl CompetencyId {
    /// Derives an id from a display name: lowercase slug plus a random suffix.
    ///
    /// The suffix comes from a v4 UUID. Callers that need uniqueness against
    /// an existing collection must still check and retry.
    pub fn derive(name: &str) -> Self {
        let suffix = Uuid::new_v4().simple().to_string();
        Self(format!(
            "{}-{}",
            slugify(name),
            &suffix[..ID_SUFFIX_CHARS]
        ))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<&str> for CompetencyId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for CompetencyId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Display for CompetencyId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A named category of interview stories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Competency {
    pub id: CompetencyId,
    pub name: String,
    pub description: String,
    /// Insertion order is display order.
    #[serde(default)]
    pub cards: Vec<Card>,
}

impl Competency {
    /// Creates an empty competency with a caller-provided id.
    pub fn new(id: CompetencyId, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: description.into(),
            cards: Vec::new(),
        }
    }

    pub fn card(&self, card_id: &CardId) -> Option<&Card> {
        self.cards.iter().find(|card| &card.id == card_id)
    }

    /// Human-readable card count, e.g. `1 card` or `3 cards`.
    pub fn card_count_label(&self) -> String {
        match self.cards.len() {
            1 => "1 card".to_string(),
            count => format!("{count} cards"),
        }
    }
}

/// Returns a fresh copy of the five seeded competencies, all without cards.
pub fn default_competencies() -> Vec<Competency> {
    DEFAULT_COMPETENCIES
        .iter()
        .map(|(id, name, description)| Competency::new((*id).into(), *name, *description))
        .collect()
}

/// Lowercases `name` and collapses whitespace runs into single hyphens.
pub fn slugify(name: &str) -> String {
    let slug = WHITESPACE_RUN_RE
        .replace_all(name.trim(), "-")
        .to_lowercase();
    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}
