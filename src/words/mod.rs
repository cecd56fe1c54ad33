//! The user's vocabulary collection.
//!
//! [`WordStore`] is the document-store contract: per-user word records,
//! listed newest first, with live updates through [`WordStore::subscribe`].
//! [`local::LocalWordStore`] implements it over `words.json` in the state
//! directory.

pub mod local;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::mpsc::Receiver;
use thiserror::Error;

use crate::common::constants::{
    MAXIMUM_MASTERY, MINIMUM_MASTERY, REVIEW_MASTERY_THRESHOLD, TODAYS_WORDS_LIMIT,
};
use crate::common::validation::{ValidationError, require_text};
use crate::settings::Language;

pub use local::LocalWordStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "beginner" => Ok(Difficulty::Beginner),
            "intermediate" => Ok(Difficulty::Intermediate),
            "advanced" => Ok(Difficulty::Advanced),
            other => Err(ValidationError::invalid(
                "difficulty",
                format!("'{other}' is not one of beginner, intermediate, advanced"),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub id: String,
    pub user_id: String,
    pub english: String,
    pub japanese: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pronunciation: Option<String>,
    pub difficulty: Difficulty,
    pub category: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reviewed: Option<DateTime<Utc>>,
    /// 0-100
    pub mastery_level: u8,
}

impl Word {
    /// Due for review: not yet mastered, or never reviewed at all.
    pub fn needs_review(&self) -> bool {
        self.mastery_level < REVIEW_MASTERY_THRESHOLD || self.last_reviewed.is_none()
    }
}

/// A validated new word, before the store assigns an id and timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct WordDraft {
    pub english: String,
    pub japanese: String,
    pub pronunciation: Option<String>,
    pub difficulty: Difficulty,
    pub category: String,
}

impl WordDraft {
    pub fn new(
        english: &str,
        japanese: &str,
        pronunciation: Option<&str>,
        difficulty: Difficulty,
        category: &str,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            english: require_text("english", english)?,
            japanese: require_text("japanese", japanese)?,
            pronunciation: pronunciation
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string),
            difficulty,
            category: require_text("category", category)?,
        })
    }
}

/// Partial update of a word. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WordUpdate {
    pub english: Option<String>,
    pub japanese: Option<String>,
    pub pronunciation: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub category: Option<String>,
}

impl WordUpdate {
    fn apply(self, word: &mut Word) {
        if let Some(english) = self.english {
            word.english = english;
        }
        if let Some(japanese) = self.japanese {
            word.japanese = japanese;
        }
        if let Some(pronunciation) = self.pronunciation {
            word.pronunciation = Some(pronunciation).filter(|p| !p.is_empty());
        }
        if let Some(difficulty) = self.difficulty {
            word.difficulty = difficulty;
        }
        if let Some(category) = self.category {
            word.category = category;
        }
    }
}

/// Document-store failure codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageErrorCode {
    PermissionDenied,
    NotFound,
    AlreadyExists,
    ResourceExhausted,
    DeadlineExceeded,
    Unavailable,
    Unauthenticated,
    Unknown,
}

impl StorageErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageErrorCode::PermissionDenied => "permission-denied",
            StorageErrorCode::NotFound => "not-found",
            StorageErrorCode::AlreadyExists => "already-exists",
            StorageErrorCode::ResourceExhausted => "resource-exhausted",
            StorageErrorCode::DeadlineExceeded => "deadline-exceeded",
            StorageErrorCode::Unavailable => "unavailable",
            StorageErrorCode::Unauthenticated => "unauthenticated",
            StorageErrorCode::Unknown => "unknown",
        }
    }

    /// User-facing message for this code.
    pub fn message(&self, language: Language) -> &'static str {
        match (self, language) {
            (StorageErrorCode::PermissionDenied, Language::Ja) => {
                "データへのアクセス権限がありません。"
            }
            (StorageErrorCode::PermissionDenied, Language::En) => {
                "You do not have permission to access this data."
            }
            (StorageErrorCode::NotFound, Language::Ja) => "指定された単語が見つかりません。",
            (StorageErrorCode::NotFound, Language::En) => "The word could not be found.",
            (StorageErrorCode::AlreadyExists, Language::Ja) => "この単語は既に存在しています。",
            (StorageErrorCode::AlreadyExists, Language::En) => "This word already exists.",
            (StorageErrorCode::ResourceExhausted, Language::Ja) => {
                "リクエストの制限に達しました。しばらく時間をおいてから再度お試しください。"
            }
            (StorageErrorCode::ResourceExhausted, Language::En) => {
                "Request limit reached. Please try again later."
            }
            (StorageErrorCode::DeadlineExceeded, Language::Ja) => "処理がタイムアウトしました。",
            (StorageErrorCode::DeadlineExceeded, Language::En) => "The operation timed out.",
            (StorageErrorCode::Unavailable, Language::Ja) => {
                "サービスが一時的に利用できません。"
            }
            (StorageErrorCode::Unavailable, Language::En) => {
                "The service is temporarily unavailable."
            }
            (StorageErrorCode::Unauthenticated, Language::Ja) => {
                "認証が必要です。ログインしてください。"
            }
            (StorageErrorCode::Unauthenticated, Language::En) => {
                "Authentication required. Please log in."
            }
            (StorageErrorCode::Unknown, Language::Ja) => {
                "データの処理中にエラーが発生しました。"
            }
            (StorageErrorCode::Unknown, Language::En) => {
                "An error occurred while processing the data."
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{} ({})", .code.message(Language::default()), .code.as_str())]
pub struct StorageError {
    pub code: StorageErrorCode,
}

impl StorageError {
    pub fn new(code: StorageErrorCode) -> Self {
        Self { code }
    }

    pub fn localized(&self, language: Language) -> &'static str {
        self.code.message(language)
    }
}

impl From<StorageErrorCode> for StorageError {
    fn from(code: StorageErrorCode) -> Self {
        Self::new(code)
    }
}

/// Per-user collection of vocabulary words.
pub trait WordStore {
    fn add(&mut self, user_id: &str, draft: WordDraft) -> Result<Word, StorageError>;

    /// All of the user's words, newest first.
    fn list_for_user(&self, user_id: &str) -> Result<Vec<Word>, StorageError>;

    fn update(&mut self, user_id: &str, word_id: &str, update: WordUpdate) -> Result<(), StorageError>;

    fn delete(&mut self, user_id: &str, word_id: &str) -> Result<(), StorageError>;

    /// Set the mastery level, clamped to 0-100, and stamp the review time.
    fn update_mastery(&mut self, user_id: &str, word_id: &str, mastery: i32) -> Result<(), StorageError>;

    /// Receive the user's full list now and after every change.
    fn subscribe(&mut self, user_id: &str) -> Receiver<Vec<Word>>;
}

pub fn clamp_mastery(mastery: i32) -> u8 {
    mastery.clamp(i32::from(MINIMUM_MASTERY), i32::from(MAXIMUM_MASTERY)) as u8
}

/// Words to practice today: due for review, at most five, in list order.
pub fn todays_words(words: &[Word]) -> Vec<&Word> {
    words
        .iter()
        .filter(|word| word.needs_review())
        .take(TODAYS_WORDS_LIMIT)
        .collect()
}

/// Search and category filter for word listings.
#[derive(Debug, Clone, Default)]
pub struct WordFilter {
    pub search: Option<String>,
    pub category: Option<String>,
}

impl WordFilter {
    pub fn matches(&self, word: &Word) -> bool {
        let matches_search = self.search.as_ref().is_none_or(|term| {
            let term = term.to_lowercase();
            word.english.to_lowercase().contains(&term)
                || word.japanese.to_lowercase().contains(&term)
        });
        let matches_category = self
            .category
            .as_ref()
            .is_none_or(|category| category == "all" || &word.category == category);
        matches_search && matches_category
    }
}

/// Aggregate progress over a word list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MasteryStats {
    pub total: usize,
    pub average: f64,
    /// 80 and above
    pub mastered: usize,
    /// Below 60
    pub struggling: usize,
}

impl MasteryStats {
    pub fn from_words(words: &[Word]) -> Option<Self> {
        if words.is_empty() {
            return None;
        }
        let sum: u32 = words.iter().map(|w| u32::from(w.mastery_level)).sum();
        Some(Self {
            total: words.len(),
            average: f64::from(sum) / words.len() as f64,
            mastered: words.iter().filter(|w| w.mastery_level >= 80).count(),
            struggling: words.iter().filter(|w| w.mastery_level < 60).count(),
        })
    }
}

#[cfg(test)]
mod tests;
