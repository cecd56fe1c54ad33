//! `words.json`-backed word store.

use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};

use super::{
    StorageError, StorageErrorCode, Word, WordDraft, WordStore, WordUpdate, clamp_mastery,
};
use crate::common::constants::WORDS_FILE_NAME;
use crate::library::builtin_words;
use crate::state::{read_json, write_json_atomic};

pub struct LocalWordStore {
    path: PathBuf,
    words: Vec<Word>,
    subscribers: Vec<(String, Sender<Vec<Word>>)>,
}

impl LocalWordStore {
    pub fn open(state_dir: &Path) -> Result<Self, StorageError> {
        let path = state_dir.join(WORDS_FILE_NAME);
        let words = read_json(&path)
            .map_err(|_| StorageError::new(StorageErrorCode::Unavailable))?
            .unwrap_or_default();
        Ok(Self {
            path,
            words,
            subscribers: Vec::new(),
        })
    }

    /// Give a user with no words the demo vocabulary. Returns the number added.
    pub fn seed(&mut self, user_id: &str) -> Result<usize, StorageError> {
        if self.words.iter().any(|w| w.user_id == user_id) {
            return Ok(0);
        }

        let mut added = 0;
        for mut word in builtin_words(user_id) {
            if self.words.iter().any(|w| w.id == word.id) {
                word.id = self.next_id();
            }
            self.words.push(word);
            added += 1;
        }
        self.commit(user_id)?;
        Ok(added)
    }

    fn snapshot(&self, user_id: &str) -> Vec<Word> {
        let mut words: Vec<Word> = self
            .words
            .iter()
            .rev()
            .filter(|w| w.user_id == user_id)
            .cloned()
            .collect();
        // Stable sort: equal timestamps keep the later insertion first
        words.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        words
    }

    fn next_id(&self) -> String {
        let mut candidate = Utc::now().timestamp_millis();
        while self.words.iter().any(|w| w.id == candidate.to_string()) {
            candidate += 1;
        }
        candidate.to_string()
    }

    fn owned_word_mut(&mut self, user_id: &str, word_id: &str) -> Result<&mut Word, StorageError> {
        let word = self
            .words
            .iter_mut()
            .find(|w| w.id == word_id)
            .ok_or(StorageErrorCode::NotFound)?;
        if word.user_id != user_id {
            return Err(StorageErrorCode::PermissionDenied.into());
        }
        Ok(word)
    }

    /// Persist and notify the user's subscribers.
    fn commit(&mut self, user_id: &str) -> Result<(), StorageError> {
        write_json_atomic(&self.path, &self.words)
            .map_err(|_| StorageError::new(StorageErrorCode::Unavailable))?;

        let snapshot = self.snapshot(user_id);
        self.subscribers
            .retain(|(subscriber, tx)| subscriber != user_id || tx.send(snapshot.clone()).is_ok());
        Ok(())
    }
}

impl WordStore for LocalWordStore {
    fn add(&mut self, user_id: &str, draft: WordDraft) -> Result<Word, StorageError> {
        if user_id.is_empty() {
            return Err(StorageErrorCode::Unauthenticated.into());
        }
        let duplicate = self
            .words
            .iter()
            .any(|w| w.user_id == user_id && w.english.eq_ignore_ascii_case(&draft.english));
        if duplicate {
            return Err(StorageErrorCode::AlreadyExists.into());
        }

        let word = Word {
            id: self.next_id(),
            user_id: user_id.to_string(),
            english: draft.english,
            japanese: draft.japanese,
            pronunciation: draft.pronunciation,
            difficulty: draft.difficulty,
            category: draft.category,
            created_at: Utc::now(),
            last_reviewed: None,
            mastery_level: 0,
        };
        self.words.push(word.clone());
        self.commit(user_id)?;
        Ok(word)
    }

    fn list_for_user(&self, user_id: &str) -> Result<Vec<Word>, StorageError> {
        if user_id.is_empty() {
            return Err(StorageErrorCode::Unauthenticated.into());
        }
        Ok(self.snapshot(user_id))
    }

    fn update(&mut self, user_id: &str, word_id: &str, update: WordUpdate) -> Result<(), StorageError> {
        let word = self.owned_word_mut(user_id, word_id)?;
        update.apply(word);
        self.commit(user_id)
    }

    fn delete(&mut self, user_id: &str, word_id: &str) -> Result<(), StorageError> {
        self.owned_word_mut(user_id, word_id)?;
        self.words.retain(|w| w.id != word_id);
        self.commit(user_id)
    }

    fn update_mastery(&mut self, user_id: &str, word_id: &str, mastery: i32) -> Result<(), StorageError> {
        let word = self.owned_word_mut(user_id, word_id)?;
        word.mastery_level = clamp_mastery(mastery);
        word.last_reviewed = Some(Utc::now());
        self.commit(user_id)
    }

    fn subscribe(&mut self, user_id: &str) -> Receiver<Vec<Word>> {
        let (tx, rx) = mpsc::channel();
        // Like a snapshot listener, the current list arrives right away
        let _ = tx.send(self.snapshot(user_id));
        self.subscribers.push((user_id.to_string(), tx));
        rx
    }
}
