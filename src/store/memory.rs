// src/store/memory.rs

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::{
    models::{
        account::{Account, NewAccount, Role},
        author::Author,
        question::{AnswerOption, MultipleChoice, QuestionWithOptions},
        result::{AnswerMark, ResultSheet},
        test::{AuthorTestRow, NewTest, Test, TestChanges, TestSummary, TestWithQuestions},
    },
    store::{DataStore, StoreError, StoreResult},
};

#[derive(Debug, Clone)]
struct StoredResult {
    id: i64,
    user_id: i64,
    test_id: i64,
    score: i64,
}

#[derive(Debug, Clone)]
struct StoredDetail {
    result_id: i64,
    option_id: i64,
    status: String,
}

#[derive(Debug, Default)]
struct Tables {
    next_id: i64,
    accounts: Vec<Account>,
    authors: Vec<Author>,
    tests: Vec<Test>,
    questions: Vec<MultipleChoice>,
    options: Vec<AnswerOption>,
    histories: Vec<i64>,
    results: Vec<StoredResult>,
    details: Vec<StoredDetail>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn push_account(&mut self, name: &str, email: &str, password_hash: &str, role: Role) -> Account {
        let account = Account {
            id: self.next_id(),
            name: name.to_string(),
            email: email.to_string(),
            password: password_hash.to_string(),
            role,
        };
        self.accounts.push(account.clone());
        account
    }

    fn author(&self, id: i64) -> StoreResult<&Author> {
        self.authors
            .iter()
            .find(|a| a.id == id)
            .ok_or_else(|| StoreError::BrokenReference(format!("author {id}")))
    }
}

/// In-process `DataStore` used as a test double.
///
/// Ids are allocated from one sequence shared by all tables. `fail_with`
/// makes every subsequent call fail until `recover` is called.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    fault: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_with(&self, reason: impl Into<String>) {
        *lock(&self.fault) = Some(reason.into());
    }

    pub fn recover(&self) {
        *lock(&self.fault) = None;
    }

    pub fn add_account(&self, name: &str, email: &str, password_hash: &str, role: Role) -> Account {
        lock(&self.tables).push_account(name, email, password_hash, role)
    }

    pub fn add_author(&self, user_id: i64, name: &str, photo: Option<&str>) -> Author {
        let mut tables = lock(&self.tables);
        let author = Author {
            id: tables.next_id(),
            user_id,
            name: name.to_string(),
            author_photo: photo.map(str::to_string),
        };
        tables.authors.push(author.clone());
        author
    }

    /// Stores `test` under a freshly allocated id.
    pub fn add_test(&self, test: Test) -> Test {
        let mut tables = lock(&self.tables);
        let test = Test {
            id: tables.next_id(),
            ..test
        };
        tables.tests.push(test.clone());
        test
    }

    pub fn add_question(&self, test_id: i64, question: &str) -> MultipleChoice {
        let mut tables = lock(&self.tables);
        let question = MultipleChoice {
            id: tables.next_id(),
            test_id,
            question: question.to_string(),
        };
        tables.questions.push(question.clone());
        question
    }

    pub fn add_option(&self, question_id: i64, description: &str, is_correct: bool) -> AnswerOption {
        let mut tables = lock(&self.tables);
        let option = AnswerOption {
            id: tables.next_id(),
            multiple_choice_id: question_id,
            option_description: description.to_string(),
            is_correct,
        };
        tables.options.push(option.clone());
        option
    }

    pub fn add_history(&self, test_id: i64) {
        lock(&self.tables).histories.push(test_id);
    }

    /// Returns the new result id.
    pub fn add_result(&self, user_id: i64, test_id: i64, score: i64) -> i64 {
        let mut tables = lock(&self.tables);
        let id = tables.next_id();
        tables.results.push(StoredResult {
            id,
            user_id,
            test_id,
            score,
        });
        id
    }

    pub fn add_detail(&self, result_id: i64, option_id: i64, status: &str) {
        lock(&self.tables).details.push(StoredDetail {
            result_id,
            option_id,
            status: status.to_string(),
        });
    }

    fn check(&self) -> StoreResult<()> {
        match lock(&self.fault).as_ref() {
            Some(reason) => Err(StoreError::Unavailable(reason.clone())),
            None => Ok(()),
        }
    }

    fn tables(&self) -> StoreResult<MutexGuard<'_, Tables>> {
        self.check()?;
        Ok(lock(&self.tables))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn find_account_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        let tables = self.tables()?;
        Ok(tables.accounts.iter().find(|a| a.email == email).cloned())
    }

    async fn insert_account(&self, account: &NewAccount) -> StoreResult<Account> {
        let mut tables = self.tables()?;
        if tables.accounts.iter().any(|a| a.email == account.email) {
            return Err(StoreError::Conflict(format!("email {}", account.email)));
        }
        Ok(tables.push_account(&account.name, &account.email, &account.password, account.role))
    }

    async fn count_accounts_by_role(&self, role: Role) -> StoreResult<i64> {
        let tables = self.tables()?;
        Ok(tables.accounts.iter().filter(|a| a.role == role).count() as i64)
    }

    async fn count_authors(&self) -> StoreResult<i64> {
        Ok(self.tables()?.authors.len() as i64)
    }

    async fn find_author_by_user(&self, user_id: i64) -> StoreResult<Option<Author>> {
        let tables = self.tables()?;
        Ok(tables.authors.iter().find(|a| a.user_id == user_id).cloned())
    }

    async fn count_published_tests(&self) -> StoreResult<i64> {
        let tables = self.tables()?;
        Ok(tables.tests.iter().filter(|t| t.is_published).count() as i64)
    }

    async fn insert_test(&self, test: &NewTest) -> StoreResult<Test> {
        let mut tables = self.tables()?;
        tables.author(test.author_id)?;

        let test = Test {
            id: tables.next_id(),
            author_id: test.author_id,
            test_type: test.test_type.clone(),
            category: test.category.clone(),
            title: test.title.clone(),
            test_description: test.test_description.clone(),
            is_published: false,
            price: None,
            similarity: 0.0,
            created_at: Some(chrono::Utc::now()),
        };
        tables.tests.push(test.clone());
        Ok(test)
    }

    async fn publish_test(&self, id: i64, changes: &TestChanges) -> StoreResult<Test> {
        let mut tables = self.tables()?;
        let test = tables
            .tests
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(StoreError::RecordNotFound)?;

        changes.apply_to(test);
        Ok(test.clone())
    }

    async fn find_test(&self, id: i64) -> StoreResult<Option<Test>> {
        let tables = self.tables()?;
        Ok(tables.tests.iter().find(|t| t.id == id).cloned())
    }

    async fn list_test_summaries(&self) -> StoreResult<Vec<TestSummary>> {
        let tables = self.tables()?;
        Ok(tables
            .tests
            .iter()
            .map(|t| TestSummary {
                title: t.title.clone(),
                similarity: t.similarity,
            })
            .collect())
    }

    async fn list_tests_by_category(&self, category: &str) -> StoreResult<Vec<Test>> {
        let tables = self.tables()?;
        Ok(tables
            .tests
            .iter()
            .filter(|t| t.category == category)
            .cloned()
            .collect())
    }

    async fn find_test_with_questions(&self, id: i64) -> StoreResult<Option<TestWithQuestions>> {
        let tables = self.tables()?;
        let Some(test) = tables.tests.iter().find(|t| t.id == id) else {
            return Ok(None);
        };
        let author = tables.author(test.author_id)?.clone();

        let multiplechoice = tables
            .questions
            .iter()
            .filter(|q| q.test_id == test.id)
            .map(|question| QuestionWithOptions {
                question: question.clone(),
                option: tables
                    .options
                    .iter()
                    .filter(|o| o.multiple_choice_id == question.id)
                    .cloned()
                    .collect(),
            })
            .collect();

        Ok(Some(TestWithQuestions {
            test: test.clone(),
            author,
            multiplechoice,
        }))
    }

    async fn list_author_tests(&self, author_id: i64) -> StoreResult<Vec<AuthorTestRow>> {
        let tables = self.tables()?;
        let author = tables.author(author_id)?;

        Ok(tables
            .tests
            .iter()
            .filter(|t| t.author_id == author_id)
            .map(|t| AuthorTestRow {
                id: t.id,
                title: t.title.clone(),
                category: t.category.clone(),
                similarity: t.similarity,
                is_published: t.is_published,
                price: t.price,
                history_count: tables.histories.iter().filter(|&&h| h == t.id).count() as i64,
                author_name: author.name.clone(),
                author_photo: author.author_photo.clone(),
            })
            .collect())
    }

    async fn find_result_sheet(&self, result_id: i64) -> StoreResult<Option<ResultSheet>> {
        let tables = self.tables()?;
        let Some(result) = tables.results.iter().find(|r| r.id == result_id) else {
            return Ok(None);
        };

        let user = tables
            .accounts
            .iter()
            .find(|a| a.id == result.user_id)
            .ok_or_else(|| StoreError::BrokenReference(format!("user {}", result.user_id)))?;
        let test = tables
            .tests
            .iter()
            .find(|t| t.id == result.test_id)
            .ok_or_else(|| StoreError::BrokenReference(format!("test {}", result.test_id)))?;

        let questions = tables
            .questions
            .iter()
            .filter(|q| q.test_id == test.id)
            .map(|q| q.question.clone())
            .collect();

        let answers = tables
            .details
            .iter()
            .filter(|d| d.result_id == result.id)
            .map(|d| {
                tables
                    .options
                    .iter()
                    .find(|o| o.id == d.option_id)
                    .map(|o| AnswerMark {
                        status: d.status.clone(),
                        is_correct: o.is_correct,
                    })
                    .ok_or_else(|| StoreError::BrokenReference(format!("option {}", d.option_id)))
            })
            .collect::<StoreResult<Vec<_>>>()?;

        Ok(Some(ResultSheet {
            score: result.score,
            user_name: user.name.clone(),
            test_id: test.id,
            test_title: test.title.clone(),
            questions,
            answers,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let store = MemoryStore::new();
        store.add_account("Admin", "admin@example.com", "x", Role::Admin);

        let err = store
            .insert_account(&NewAccount {
                name: "Other".to_string(),
                email: "admin@example.com".to_string(),
                password: "y".to_string(),
                role: Role::User,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(store.count_accounts_by_role(Role::User).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn missing_parents_are_broken_references() {
        let store = MemoryStore::new();
        let result_id = store.add_result(404, 405, 10);

        let err = store.find_result_sheet(result_id).await.unwrap_err();

        assert!(matches!(err, StoreError::BrokenReference(_)));
    }
}
