// src/models/result.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Status of an answer that counts toward the tally.
pub const FINAL_STATUS: &str = "final";

/// One answer within a result: the chosen option's correctness and the answer status.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct AnswerMark {
    pub status: String,
    pub is_correct: bool,
}

impl AnswerMark {
    pub fn is_final(&self) -> bool {
        self.status == FINAL_STATUS
    }
}

/// A result joined with its user, test, questions and answers.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSheet {
    pub score: i64,
    pub user_name: String,
    pub test_id: i64,
    pub test_title: String,
    pub questions: Vec<String>,
    pub answers: Vec<AnswerMark>,
}

/// Correct/wrong counts over final answers only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnswerTally {
    pub correct: i64,
    pub wrong: i64,
}

impl AnswerTally {
    pub fn from_marks<'a, I>(marks: I) -> Self
    where
        I: IntoIterator<Item = &'a AnswerMark>,
    {
        marks
            .into_iter()
            .filter(|mark| mark.is_final())
            .fold(Self::default(), |mut tally, mark| {
                if mark.is_correct {
                    tally.correct += 1;
                } else {
                    tally.wrong += 1;
                }
                tally
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResultSummary {
    pub score: i64,
    pub user_name: String,
    pub test_id: i64,
    pub test_title: String,
    pub correct_answers: i64,
    pub wrong_answers: i64,
}

impl From<ResultSheet> for TestResultSummary {
    fn from(sheet: ResultSheet) -> Self {
        let tally = AnswerTally::from_marks(&sheet.answers);
        Self {
            score: sheet.score,
            user_name: sheet.user_name,
            test_id: sheet.test_id,
            test_title: sheet.test_title,
            correct_answers: tally.correct,
            wrong_answers: tally.wrong,
        }
    }
}
