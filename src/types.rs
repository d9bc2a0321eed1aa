use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// Shared constants
pub const QUESTION_OPTIONS: [char; 4] = ['A', 'B', 'C', 'D'];
pub const MIN_LINKED_CONCEPTS: usize = 1;
pub const MAX_LINKED_CONCEPTS: usize = 3;
pub const EPSILON: f64 = 1e-10;

pub type UserId = String;
pub type ConceptId = String;
pub type QuestionId = String;

/// Difficulty tier of an attempt. Only selects the tier-specific answer key.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum DifficultyLevel {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl DifficultyLevel {
    pub const ALL: [DifficultyLevel; 3] = [Self::Easy, Self::Medium, Self::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "EASY",
            Self::Medium => "MEDIUM",
            Self::Hard => "HARD",
        }
    }
}

/// A multiple-choice question linked to 1-3 concepts, with one correct
/// option letter per difficulty tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub concepts: Vec<ConceptId>,
    pub answers: BTreeMap<DifficultyLevel, char>,
}

impl Question {
    pub fn new(
        id: impl Into<QuestionId>,
        concepts: Vec<ConceptId>,
        answers: BTreeMap<DifficultyLevel, char>,
    ) -> Self {
        Self {
            id: id.into(),
            concepts,
            answers,
        }
    }

    /// Correct letter for the tier; falls back to the easy key when the
    /// tier is missing.
    pub fn answer_for(&self, level: DifficultyLevel) -> char {
        self.answers
            .get(&level)
            .or_else(|| self.answers.get(&DifficultyLevel::Easy))
            .copied()
            .unwrap_or(QUESTION_OPTIONS[0])
    }
}
