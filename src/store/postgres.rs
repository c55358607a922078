// src/store/postgres.rs

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

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

const ACCOUNT_COLUMNS: &str = "id, name, email, password, role";

const AUTHOR_COLUMNS: &str = "id, user_id, name, author_photo";

const TEST_COLUMNS: &str = "\
    id, author_id, type, category, title, test_description, \
    is_published, price, similarity, created_at";

/// Result row outer-joined with its user and test; a missing parent reads as NULL.
#[derive(FromRow)]
struct ResultHeader {
    score: i64,
    user_id: i64,
    test_id: i64,
    user_name: Option<String>,
    test_title: Option<String>,
}

/// `DataStore` backed by a Postgres connection pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DataStore for PgStore {
    async fn find_account_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    async fn insert_account(&self, account: &NewAccount) -> StoreResult<Account> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "INSERT INTO users (name, email, password, role)
            VALUES ($1, $2, $3, $4)
            RETURNING {ACCOUNT_COLUMNS}"
        ))
        .bind(&account.name)
        .bind(&account.email)
        .bind(&account.password)
        .bind(account.role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            // Postgres error code for unique violation is 23505
            let unique_violation = e
                .as_database_error()
                .and_then(|db| db.code())
                .is_some_and(|code| code == "23505");
            if unique_violation {
                StoreError::Conflict(format!("email {}", account.email))
            } else {
                StoreError::from(e)
            }
        })?;

        Ok(account)
    }

    async fn count_accounts_by_role(&self, role: Role) -> StoreResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE role = $1")
            .bind(role)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn count_authors(&self) -> StoreResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM authors")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn find_author_by_user(&self, user_id: i64) -> StoreResult<Option<Author>> {
        let author = sqlx::query_as::<_, Author>(&format!(
            "SELECT {AUTHOR_COLUMNS} FROM authors WHERE user_id = $1 LIMIT 1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(author)
    }

    async fn count_published_tests(&self) -> StoreResult<i64> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM tests WHERE is_published = TRUE")
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    async fn insert_test(&self, test: &NewTest) -> StoreResult<Test> {
        let test = sqlx::query_as::<_, Test>(&format!(
            "INSERT INTO tests (author_id, type, category, title, test_description)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {TEST_COLUMNS}"
        ))
        .bind(test.author_id)
        .bind(&test.test_type)
        .bind(&test.category)
        .bind(&test.title)
        .bind(&test.test_description)
        .fetch_one(&self.pool)
        .await?;

        Ok(test)
    }

    async fn publish_test(&self, id: i64, changes: &TestChanges) -> StoreResult<Test> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("UPDATE tests SET is_published = TRUE");

        if let Some(test_type) = &changes.test_type {
            builder.push(", type = ");
            builder.push_bind(test_type.clone());
        }

        if let Some(category) = &changes.category {
            builder.push(", category = ");
            builder.push_bind(category.clone());
        }

        if let Some(title) = &changes.title {
            builder.push(", title = ");
            builder.push_bind(title.clone());
        }

        if let Some(description) = &changes.test_description {
            builder.push(", test_description = ");
            builder.push_bind(description.clone());
        }

        if let Some(price) = changes.price {
            builder.push(", price = ");
            builder.push_bind(price);
        }

        if let Some(similarity) = changes.similarity {
            builder.push(", similarity = ");
            builder.push_bind(similarity);
        }

        builder.push(" WHERE id = ");
        builder.push_bind(id);
        builder.push(format!(" RETURNING {TEST_COLUMNS}"));

        builder
            .build_query_as::<Test>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::RecordNotFound)
    }

    async fn find_test(&self, id: i64) -> StoreResult<Option<Test>> {
        let test = sqlx::query_as::<_, Test>(&format!(
            "SELECT {TEST_COLUMNS} FROM tests WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(test)
    }

    async fn list_test_summaries(&self) -> StoreResult<Vec<TestSummary>> {
        let summaries =
            sqlx::query_as::<_, TestSummary>("SELECT title, similarity FROM tests ORDER BY id")
                .fetch_all(&self.pool)
                .await?;

        Ok(summaries)
    }

    async fn list_tests_by_category(&self, category: &str) -> StoreResult<Vec<Test>> {
        let tests = sqlx::query_as::<_, Test>(&format!(
            "SELECT {TEST_COLUMNS} FROM tests WHERE category = $1 ORDER BY id"
        ))
        .bind(category)
        .fetch_all(&self.pool)
        .await?;

        Ok(tests)
    }

    async fn find_test_with_questions(&self, id: i64) -> StoreResult<Option<TestWithQuestions>> {
        let Some(test) = self.find_test(id).await? else {
            return Ok(None);
        };

        let author = sqlx::query_as::<_, Author>(&format!(
            "SELECT {AUTHOR_COLUMNS} FROM authors WHERE id = $1"
        ))
        .bind(test.author_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::BrokenReference(format!("author {}", test.author_id)))?;

        let questions = sqlx::query_as::<_, MultipleChoice>(
            "SELECT id, test_id, question FROM multiple_choices WHERE test_id = $1 ORDER BY id",
        )
        .bind(test.id)
        .fetch_all(&self.pool)
        .await?;

        let question_ids: Vec<i64> = questions.iter().map(|q| q.id).collect();
        let options = sqlx::query_as::<_, AnswerOption>(
            "SELECT id, multiple_choice_id, option_description, is_correct
            FROM options
            WHERE multiple_choice_id = ANY($1)
            ORDER BY id",
        )
        .bind(&question_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut options_by_question: HashMap<i64, Vec<AnswerOption>> = HashMap::new();
        for option in options {
            options_by_question
                .entry(option.multiple_choice_id)
                .or_default()
                .push(option);
        }

        let multiplechoice = questions
            .into_iter()
            .map(|question| QuestionWithOptions {
                option: options_by_question.remove(&question.id).unwrap_or_default(),
                question,
            })
            .collect();

        Ok(Some(TestWithQuestions {
            test,
            author,
            multiplechoice,
        }))
    }

    async fn list_author_tests(&self, author_id: i64) -> StoreResult<Vec<AuthorTestRow>> {
        let rows = sqlx::query_as::<_, AuthorTestRow>(
            r#"
            SELECT
                t.id,
                t.title,
                t.category,
                t.similarity,
                t.is_published,
                t.price,
                (SELECT COUNT(*) FROM histories h WHERE h.test_id = t.id) AS history_count,
                a.name AS author_name,
                a.author_photo
            FROM tests t
            JOIN authors a ON a.id = t.author_id
            WHERE t.author_id = $1
            ORDER BY t.id
            "#,
        )
        .bind(author_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn find_result_sheet(&self, result_id: i64) -> StoreResult<Option<ResultSheet>> {
        let header = sqlx::query_as::<_, ResultHeader>(
            r#"
            SELECT
                r.score,
                r.user_id,
                r.test_id,
                u.name AS user_name,
                t.title AS test_title
            FROM results r
            LEFT JOIN users u ON u.id = r.user_id
            LEFT JOIN tests t ON t.id = r.test_id
            WHERE r.id = $1
            "#,
        )
        .bind(result_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(header) = header else {
            return Ok(None);
        };
        let user_name = header
            .user_name
            .ok_or_else(|| StoreError::BrokenReference(format!("user {}", header.user_id)))?;
        let test_title = header
            .test_title
            .ok_or_else(|| StoreError::BrokenReference(format!("test {}", header.test_id)))?;

        let questions = sqlx::query_scalar::<_, String>(
            "SELECT question FROM multiple_choices WHERE test_id = $1 ORDER BY id",
        )
        .bind(header.test_id)
        .fetch_all(&self.pool)
        .await?;

        let answers = sqlx::query_as::<_, AnswerMark>(
            r#"
            SELECT d.status, o.is_correct
            FROM detail_results d
            JOIN options o ON o.id = d.option_id
            WHERE d.result_id = $1
            "#,
        )
        .bind(result_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(ResultSheet {
            score: header.score,
            user_name,
            test_id: header.test_id,
            test_title,
            questions,
            answers,
        }))
    }
}
