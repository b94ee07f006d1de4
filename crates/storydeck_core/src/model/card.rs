//! Card domain model.
//!
//! # Responsibility
//! - Define one interview story and its STAR/CURL narrative content.
//! - Provide read-only projections used by list views (preview, blank check).
//!
//! # Invariants
//! - `id` is stable and never reused for another card.
//! - `created_at` is set once; `updated_at` only moves forward.
//! - Content keeps all eight narrative slots regardless of `format`, so a
//!   format switch never drops text.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Max characters shown by [`Card::preview`] before the ellipsis.
pub const CARD_PREVIEW_MAX_CHARS: usize = 60;

/// Opaque card identifier.
///
/// Stored as a string so snapshots written by earlier builds (which used
/// non-UUID ids) still load.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(String);

impl CardId {
    /// Generates a fresh random id.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<&str> for CardId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for CardId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Display for CardId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Narrative structure of a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CardFormat {
    /// Situation, Task, Action, Result.
    Star,
    /// Challenge, Understanding, Response, Lesson.
    Curl,
}

impl CardFormat {
    /// Content fields meaningful for this format, in display order.
    pub fn fields(self) -> &'static [StoryField; 4] {
        match self {
            Self::Star => &[
                StoryField::Situation,
                StoryField::Task,
                StoryField::Action,
                StoryField::Result,
            ],
            Self::Curl => &[
                StoryField::Challenge,
                StoryField::Understanding,
                StoryField::Response,
                StoryField::Lesson,
            ],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Star => "STAR",
            Self::Curl => "CURL",
        }
    }

    /// Parses the wire label; case-insensitive.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "STAR" => Some(Self::Star),
            "CURL" => Some(Self::Curl),
            _ => None,
        }
    }
}

/// One narrative slot of card content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoryField {
    Situation,
    Task,
    Action,
    Result,
    Challenge,
    Understanding,
    Response,
    Lesson,
}

impl StoryField {
    /// Serialized key inside `content`.
    pub fn key(self) -> &'static str {
        match self {
            Self::Situation => "situation",
            Self::Task => "task",
            Self::Action => "action",
            Self::Result => "result",
            Self::Challenge => "challenge",
            Self::Understanding => "understanding",
            Self::Response => "response",
            Self::Lesson => "lesson",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Situation => "Situation",
            Self::Task => "Task",
            Self::Action => "Action",
            Self::Result => "Result",
            Self::Challenge => "Challenge",
            Self::Understanding => "Understanding",
            Self::Response => "Response",
            Self::Lesson => "Lesson",
        }
    }

    /// Short writing prompt from the format guide.
    pub fn prompt(self) -> &'static str {
        match self {
            Self::Situation => "Set the scene and context",
            Self::Task => "Explain your responsibility",
            Self::Action => "Describe how you completed the task",
            Self::Result => "Share the outcomes of your actions",
            Self::Challenge => "Describe the challenge or problem",
            Self::Understanding => "How you analyzed it",
            Self::Response => "What you did",
            Self::Lesson => "What you learned",
        }
    }

    /// Format this field belongs to.
    pub fn format(self) -> CardFormat {
        match self {
            Self::Situation | Self::Task | Self::Action | Self::Result => CardFormat::Star,
            Self::Challenge | Self::Understanding | Self::Response | Self::Lesson => {
                CardFormat::Curl
            }
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "situation" => Some(Self::Situation),
            "task" => Some(Self::Task),
            "action" => Some(Self::Action),
            "result" => Some(Self::Result),
            "challenge" => Some(Self::Challenge),
            "understanding" => Some(Self::Understanding),
            "response" => Some(Self::Response),
            "lesson" => Some(Self::Lesson),
            _ => None,
        }
    }
}

/// Free-text narrative content. Absent fields are omitted on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub situation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenge: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub understanding: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lesson: Option<String>,
}

impl CardContent {
    pub fn get(&self, field: StoryField) -> Option<&str> {
        self.slot(field).as_deref()
    }

    /// Replaces one slot. Passing `None` clears it.
    pub fn set(&mut self, field: StoryField, value: Option<String>) {
        *self.slot_mut(field) = value;
    }

    /// Builder-style variant of [`CardContent::set`].
    pub fn with(mut self, field: StoryField, value: impl Into<String>) -> Self {
        self.set(field, Some(value.into()));
        self
    }

    fn slot(&self, field: StoryField) -> &Option<String> {
        match field {
            StoryField::Situation => &self.situation,
            StoryField::Task => &self.task,
            StoryField::Action => &self.action,
            StoryField::Result => &self.result,
            StoryField::Challenge => &self.challenge,
            StoryField::Understanding => &self.understanding,
            StoryField::Response => &self.response,
            StoryField::Lesson => &self.lesson,
        }
    }

    fn slot_mut(&mut self, field: StoryField) -> &mut Option<String> {
        match field {
            StoryField::Situation => &mut self.situation,
            StoryField::Task => &mut self.task,
            StoryField::Action => &mut self.action,
            StoryField::Result => &mut self.result,
            StoryField::Challenge => &mut self.challenge,
            StoryField::Understanding => &mut self.understanding,
            StoryField::Response => &mut self.response,
            StoryField::Lesson => &mut self.lesson,
        }
    }
}

/// A single interview story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: CardId,
    pub title: String,
    pub format: CardFormat,
    #[serde(default)]
    pub content: CardContent,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds. Never earlier than `created_at` for store-made cards.
    pub updated_at: i64,
}

impl Card {
    /// Creates a card with empty content and a generated id.
    pub fn new(title: impl Into<String>, format: CardFormat, now_ms: i64) -> Self {
        Self {
            id: CardId::new_random(),
            title: title.into(),
            format,
            content: CardContent::default(),
            created_at: now_ms,
            updated_at: now_ms,
        }
    }

    /// Short teaser built from the first field of the active format.
    ///
    /// Returns `None` when that field is absent or empty.
    pub fn preview(&self) -> Option<String> {
        let lead = self.format.fields()[0];
        let text = self.content.get(lead).filter(|value| !value.is_empty())?;
        let mut preview = text.chars().take(CARD_PREVIEW_MAX_CHARS).collect::<String>();
        if text.chars().count() > CARD_PREVIEW_MAX_CHARS {
            preview.push_str("...");
        }
        Some(preview)
    }

    /// Active-format fields that currently hold text.
    pub fn filled_fields(&self) -> Vec<StoryField> {
        self.format
            .fields()
            .iter()
            .copied()
            .filter(|field| self.content.get(*field).is_some_and(|value| !value.is_empty()))
            .collect()
    }

    /// Whether no field of the active format has been written yet.
    pub fn is_blank(&self) -> bool {
        self.filled_fields().is_empty()
    }
}
