// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'multiple_choices' table: one question of a test.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultipleChoice {
    pub id: i64,
    pub test_id: i64,

    /// The text content of the question.
    pub question: String,
}

/// Represents the 'options' table: one possible answer to a question.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOption {
    pub id: i64,
    pub multiple_choice_id: i64,
    pub option_description: String,
    pub is_correct: bool,
}

/// A question with its options nested, as served to the test editor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionWithOptions {
    #[serde(flatten)]
    pub question: MultipleChoice,
    pub option: Vec<AnswerOption>,
}
