//! Question model and the question bank.
//!
//! The bank is loaded once at startup and is read-only afterwards. A bank
//! always holds at least one valid question; an empty or invalid source is a
//! [`QuestionError`] and the caller must surface it as "quiz unavailable".

mod flags;

pub use flags::FlagCatalog;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::error::QuestionError;

const BUNDLED_QUESTIONS: &str = include_str!("../../data/questions.json");

/// One answer choice.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Country {
    pub id: u32,
    pub country_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Id of the correct entry in `countries`.
    pub answer_id: u32,
    pub countries: Vec<Country>,
    /// ISO code used as the flag asset key.
    pub country_code: String,
}

impl Question {
    pub fn is_correct(&self, answer_id: u32) -> bool {
        self.answer_id == answer_id
    }

    pub fn correct_country(&self) -> Option<&Country> {
        self.countries.iter().find(|c| c.id == self.answer_id)
    }

    fn validate(&self, index: usize) -> Result<(), QuestionError> {
        let invalid = |reason: &str| QuestionError::InvalidQuestion {
            index,
            reason: reason.to_string(),
        };
        if self.country_code.trim().is_empty() {
            return Err(invalid("country_code is empty"));
        }
        if self.countries.len() < 2 {
            return Err(invalid("needs at least two answer choices"));
        }
        let mut seen = HashSet::new();
        if !self.countries.iter().all(|c| seen.insert(c.id)) {
            return Err(invalid("answer choices share an id"));
        }
        if self.correct_country().is_none() {
            return Err(invalid("answer_id is not one of the choices"));
        }
        Ok(())
    }
}

/// On-disk shape of a question file.
#[derive(Debug, Serialize, Deserialize)]
struct QuizData {
    questions: Vec<Question>,
}

/// Ordered, validated, non-empty list of questions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    /// Build a bank from already-decoded questions.
    ///
    /// # Errors
    /// Returns [`QuestionError::Empty`] for an empty list, or
    /// [`QuestionError::InvalidQuestion`] for the first bad entry.
    pub fn new(questions: Vec<Question>) -> Result<Self, QuestionError> {
        if questions.is_empty() {
            return Err(QuestionError::Empty);
        }
        for (i, q) in questions.iter().enumerate() {
            q.validate(i)?;
        }
        Ok(Self { questions })
    }

    /// Decode `{"questions": [...]}`.
    ///
    /// # Errors
    /// Returns an error if the JSON is malformed or the bank is unplayable.
    pub fn from_json(json: &str) -> Result<Self, QuestionError> {
        let data: QuizData = serde_json::from_str(json)?;
        Self::new(data.questions)
    }

    /// Load a question file from disk.
    ///
    /// # Errors
    /// Returns [`QuestionError::Missing`] when the file cannot be read, plus
    /// everything [`QuestionBank::from_json`] can return.
    pub fn load(path: &Path) -> Result<Self, QuestionError> {
        let content = std::fs::read_to_string(path).map_err(|_| QuestionError::Missing {
            path: path.to_path_buf(),
        })?;
        Self::from_json(&content)
    }

    /// The 15-question bank shipped with the crate.
    ///
    /// # Errors
    /// Only fails if the bundled file itself is broken.
    pub fn bundled() -> Result<Self, QuestionError> {
        Self::from_json(BUNDLED_QUESTIONS)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Always false for a constructed bank; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter()
    }

    pub fn last_index(&self) -> usize {
        self.questions.len() - 1
    }
}
