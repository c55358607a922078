// tests/pg_store_tests.rs
//
// Runs PgStore against a live Postgres. Each test creates its own schema from
// tests/fixtures/schema.sql and drops it afterwards. Skipped when DATABASE_URL is unset.

use std::{
    sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    },
    time::{SystemTime, UNIX_EPOCH},
};

use quiz_service::{
    AppState,
    config::Config,
    error::{Entity, ServiceError},
    models::{
        account::{NewAccount, Role},
        test::{NewTest, TestChanges},
    },
    services::{CatalogService, ResultService, StatsService},
    store::{DataStore, StoreError, postgres::PgStore},
};
use sqlx::{PgPool, postgres::PgPoolOptions};

const SCHEMA_SQL: &str = include_str!("fixtures/schema.sql");

static SCHEMA_COUNTER: AtomicU32 = AtomicU32::new(0);

struct TestDb {
    database_url: String,
    schema: String,
    pool: PgPool,
}

impl TestDb {
    /// Helper that creates an isolated schema and a pool pinned to it.
    /// Returns `None` when no database is configured.
    async fn connect() -> Option<Self> {
        let database_url = std::env::var("DATABASE_URL").ok()?;

        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .subsec_nanos();
        let schema = format!(
            "quiz_test_{}_{}_{}",
            std::process::id(),
            nanos,
            SCHEMA_COUNTER.fetch_add(1, Ordering::SeqCst)
        );

        let admin_pool = PgPoolOptions::new()
            .max_connections(1)
            .connect(&database_url)
            .await
            .expect("Failed to connect to Postgres for testing.");
        sqlx::query(&format!("CREATE SCHEMA {schema}"))
            .execute(&admin_pool)
            .await
            .expect("Failed to create test schema");
        admin_pool.close().await;

        let search_path = schema.clone();
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .after_connect(move |conn, _meta| {
                let search_path = search_path.clone();
                Box::pin(async move {
                    sqlx::query(&format!("SET search_path TO {search_path}"))
                        .execute(&mut *conn)
                        .await?;
                    Ok(())
                })
            })
            .connect(&database_url)
            .await
            .expect("Failed to connect to test schema");

        sqlx::raw_sql(SCHEMA_SQL)
            .execute(&pool)
            .await
            .expect("Failed to load schema fixture");

        Some(Self {
            database_url,
            schema,
            pool,
        })
    }

    fn store(&self) -> Arc<PgStore> {
        Arc::new(PgStore::new(self.pool.clone()))
    }

    async fn drop_schema(self) {
        sqlx::query(&format!("DROP SCHEMA {} CASCADE", self.schema))
            .execute(&self.pool)
            .await
            .expect("Failed to drop test schema");
        self.pool.close().await;
    }

    async fn account(&self, name: &str, email: &str, role: Role) -> i64 {
        sqlx::query_scalar(
            "INSERT INTO users (name, email, password, role) VALUES ($1, $2, 'x', $3) RETURNING id",
        )
        .bind(name)
        .bind(email)
        .bind(role)
        .fetch_one(&self.pool)
        .await
        .unwrap()
    }

    async fn author(&self, user_id: i64, name: &str, photo: Option<&str>) -> i64 {
        sqlx::query_scalar(
            "INSERT INTO authors (user_id, name, author_photo) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(user_id)
        .bind(name)
        .bind(photo)
        .fetch_one(&self.pool)
        .await
        .unwrap()
    }

    async fn test(&self, author_id: i64, title: &str, category: &str, similarity: f64) -> i64 {
        sqlx::query_scalar(
            r#"
            INSERT INTO tests (author_id, type, category, title, test_description, similarity)
            VALUES ($1, 'multiple', $2, $3, '', $4)
            RETURNING id
            "#,
        )
        .bind(author_id)
        .bind(category)
        .bind(title)
        .bind(similarity)
        .fetch_one(&self.pool)
        .await
        .unwrap()
    }

    async fn question(&self, test_id: i64, question: &str) -> i64 {
        sqlx::query_scalar(
            "INSERT INTO multiple_choices (test_id, question) VALUES ($1, $2) RETURNING id",
        )
        .bind(test_id)
        .bind(question)
        .fetch_one(&self.pool)
        .await
        .unwrap()
    }

    async fn option(&self, question_id: i64, description: &str, is_correct: bool) -> i64 {
        sqlx::query_scalar(
            r#"
            INSERT INTO options (multiple_choice_id, option_description, is_correct)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(question_id)
        .bind(description)
        .bind(is_correct)
        .fetch_one(&self.pool)
        .await
        .unwrap()
    }

    async fn history(&self, test_id: i64) {
        sqlx::query("INSERT INTO histories (test_id) VALUES ($1)")
            .bind(test_id)
            .execute(&self.pool)
            .await
            .unwrap();
    }

    async fn result(&self, user_id: i64, test_id: i64, score: i64) -> i64 {
        sqlx::query_scalar(
            "INSERT INTO results (user_id, test_id, score) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(user_id)
        .bind(test_id)
        .bind(score)
        .fetch_one(&self.pool)
        .await
        .unwrap()
    }

    async fn detail(&self, result_id: i64, option_id: i64, status: &str) {
        sqlx::query("INSERT INTO detail_results (result_id, option_id, status) VALUES ($1, $2, $3)")
            .bind(result_id)
            .bind(option_id)
            .bind(status)
            .execute(&self.pool)
            .await
            .unwrap();
    }
}

macro_rules! test_db {
    () => {
        match TestDb::connect().await {
            Some(db) => db,
            None => {
                eprintln!("DATABASE_URL not set; skipping Postgres test");
                return;
            }
        }
    };
}

#[tokio::test]
async fn create_then_partial_publish() {
    // Arrange
    let db = test_db!();
    let user_id = db.account("Dewi", "dewi@example.com", Role::Author).await;
    let author_id = db.author(user_id, "Dewi", None).await;
    let service = CatalogService::new(db.store());

    // Act
    let created = service
        .create_test(&NewTest {
            author_id,
            test_type: "multiple".to_string(),
            category: "Umum".to_string(),
            title: "Draft".to_string(),
            test_description: "desc".to_string(),
        })
        .await
        .expect("Insert should decode with default similarity");
    let changes = TestChanges {
        title: Some("Final".to_string()),
        price: Some(25_000),
        ..Default::default()
    };
    let first = service.publish_test(created.id, &changes).await.unwrap();
    let second = service.publish_test(created.id, &changes).await.unwrap();

    // Assert
    assert!(!created.is_published);
    assert_eq!(created.similarity, 0.0);
    assert!(created.created_at.is_some());
    assert!(first.is_published);
    assert!(second.is_published);
    assert_eq!(second.title, "Final");
    assert_eq!(second.price, Some(25_000));
    assert_eq!(second.category, "Umum");
    assert_eq!(second.test_description, "desc");

    db.drop_schema().await;
}

#[tokio::test]
async fn publish_unknown_id_is_not_found() {
    let db = test_db!();
    let service = CatalogService::new(db.store());

    let err = service
        .publish_test(9_999, &TestChanges::default())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ServiceError::NotFound {
            entity: Entity::Test,
            ..
        }
    ));

    db.drop_schema().await;
}

#[tokio::test]
async fn details_have_nine_fields() {
    // Arrange
    let db = test_db!();
    let user_id = db.account("Dewi", "dewi@example.com", Role::Author).await;
    let author_id = db.author(user_id, "Dewi", None).await;
    let test_id = db.test(author_id, "Detail", "Umum", 42.5).await;
    let service = CatalogService::new(db.store());

    // Act
    let details = service.test_details(test_id).await.unwrap();
    let missing = service.test_details(test_id + 1_000).await.unwrap_err();

    // Assert
    let json = serde_json::to_value(&details).unwrap();
    let object = json.as_object().unwrap();
    assert_eq!(object.len(), 9);
    assert_eq!(object["id"], test_id);
    assert_eq!(object["authorId"], author_id);
    assert_eq!(object["similarity"], 42.5);
    assert!(matches!(missing, ServiceError::NotFound { .. }));

    db.drop_schema().await;
}

#[tokio::test]
async fn author_listing_counts_history() {
    // Arrange
    let db = test_db!();
    let user_id = db.account("Dewi", "dewi@example.com", Role::Author).await;
    let author_id = db
        .author(user_id, "Dewi", Some("https://cdn.example.com/dewi.png"))
        .await;
    let busy = db.test(author_id, "T1", "Psikologi", 80.0).await;
    let quiet = db.test(author_id, "T2", "Umum", 12.5).await;
    db.history(busy).await;
    db.history(busy).await;
    let service = CatalogService::new(db.store());

    // Act
    let views = service.list_tests_by_author(user_id).await.unwrap();
    let missing = service.list_tests_by_author(user_id + 1_000).await.unwrap_err();

    // Assert
    assert_eq!(views.len(), 2);
    assert_eq!(views[0].id, busy);
    assert_eq!(views[0].history, 2);
    assert_eq!(views[0].prediksi_kemiripan, "Prediksi kemiripan 80%");
    assert_eq!(
        views[0].author_profile.as_deref(),
        Some("https://cdn.example.com/dewi.png")
    );
    assert_eq!(views[1].id, quiet);
    assert_eq!(views[1].history, 0);
    assert_eq!(views[1].prediksi_kemiripan, "Prediksi kemiripan 12.5%");
    assert!(matches!(
        missing,
        ServiceError::NotFound {
            entity: Entity::Author,
            ..
        }
    ));

    db.drop_schema().await;
}

#[tokio::test]
async fn questions_are_nested_with_their_options() {
    // Arrange
    let db = test_db!();
    let user_id = db.account("Dewi", "dewi@example.com", Role::Author).await;
    let author_id = db.author(user_id, "Dewi", None).await;
    let test_id = db.test(author_id, "Kuis", "Umum", 0.0).await;
    let q1 = db.question(test_id, "2 + 2 = ?").await;
    db.option(q1, "3", false).await;
    db.option(q1, "4", true).await;
    let q2 = db.question(test_id, "Ibu kota Indonesia?").await;
    db.option(q2, "Jakarta", true).await;
    let bare = db.test(author_id, "Kosong", "Umum", 0.0).await;
    let service = CatalogService::new(db.store());

    // Act
    let loaded = service.test_with_questions(test_id).await.unwrap().unwrap();
    let empty = service.test_with_questions(bare).await.unwrap().unwrap();
    let missing = service.test_with_questions(bare + 1_000).await.unwrap();

    // Assert
    assert_eq!(loaded.author.name, "Dewi");
    assert_eq!(loaded.multiplechoice.len(), 2);
    assert_eq!(loaded.multiplechoice[0].question.id, q1);
    assert_eq!(loaded.multiplechoice[0].option.len(), 2);
    assert!(loaded.multiplechoice[0].option[1].is_correct);
    assert_eq!(loaded.multiplechoice[1].option.len(), 1);
    assert!(empty.multiplechoice.is_empty());
    assert!(missing.is_none());

    db.drop_schema().await;
}

#[tokio::test]
async fn result_tally_skips_drafts() {
    // Arrange
    let db = test_db!();
    let author_user = db.account("Dewi", "dewi@example.com", Role::Author).await;
    let author_id = db.author(author_user, "Dewi", None).await;
    let test_id = db.test(author_id, "Tes Logika", "Umum", 0.0).await;
    let mut picks = Vec::new();
    for text in ["Soal 1", "Soal 2", "Soal 3"] {
        let q = db.question(test_id, text).await;
        let right = db.option(q, "benar", true).await;
        let wrong = db.option(q, "salah", false).await;
        picks.push((right, wrong));
    }
    let user_id = db.account("Budi", "budi@example.com", Role::User).await;
    let result_id = db.result(user_id, test_id, 70).await;
    db.detail(result_id, picks[0].0, "final").await;
    db.detail(result_id, picks[1].1, "final").await;
    db.detail(result_id, picks[2].0, "draft").await;
    let service = ResultService::new(db.store());

    // Act
    let summary = service.test_result(result_id).await.unwrap();
    let missing = service.test_result(result_id + 1_000).await.unwrap_err();

    // Assert
    assert_eq!(summary.score, 70);
    assert_eq!(summary.user_name, "Budi");
    assert_eq!(summary.test_id, test_id);
    assert_eq!(summary.test_title, "Tes Logika");
    assert_eq!(summary.correct_answers, 1);
    assert_eq!(summary.wrong_answers, 1);
    assert!(matches!(
        missing,
        ServiceError::NotFound {
            entity: Entity::TestResult,
            ..
        }
    ));

    db.drop_schema().await;
}

#[tokio::test]
async fn result_with_missing_user_is_fetch_failed() {
    // Arrange
    let db = test_db!();
    let author_user = db.account("Dewi", "dewi@example.com", Role::Author).await;
    let author_id = db.author(author_user, "Dewi", None).await;
    let test_id = db.test(author_id, "Tes", "Umum", 0.0).await;
    sqlx::query("ALTER TABLE results DROP CONSTRAINT results_user_id_fkey")
        .execute(&db.pool)
        .await
        .unwrap();
    let result_id = db.result(424_242, test_id, 10).await;
    let service = ResultService::new(db.store());

    // Act
    let err = service.test_result(result_id).await.unwrap_err();

    // Assert
    assert!(matches!(
        err,
        ServiceError::FetchFailed {
            entity: Entity::TestResult,
            ..
        }
    ));

    db.drop_schema().await;
}

#[tokio::test]
async fn stats_and_account_conflicts() {
    // Arrange
    let db = test_db!();
    db.account("Admin", "admin@example.com", Role::Admin).await;
    db.account("Budi", "budi@example.com", Role::User).await;
    db.account("Ani", "ani@example.com", Role::User).await;
    let author_user = db.account("Dewi", "dewi@example.com", Role::Author).await;
    let author_id = db.author(author_user, "Dewi", None).await;
    let published = db.test(author_id, "A", "Umum", 0.0).await;
    db.test(author_id, "B", "Umum", 0.0).await;
    let store = db.store();
    store
        .publish_test(published, &TestChanges::default())
        .await
        .unwrap();

    // Act
    let stats = StatsService::new(store.clone()).dashboard_stats().await.unwrap();
    let duplicate = store
        .insert_account(&NewAccount {
            name: "Again".to_string(),
            email: "budi@example.com".to_string(),
            password: "y".to_string(),
            role: Role::User,
        })
        .await
        .unwrap_err();

    // Assert
    assert_eq!(stats.total_users, 2);
    assert_eq!(stats.total_authors, 1);
    assert_eq!(stats.total_published_tests, 1);
    assert!(matches!(duplicate, StoreError::Conflict(_)));

    db.drop_schema().await;
}

#[tokio::test]
async fn app_state_boots_from_config() {
    let db = test_db!();
    let database_url = db.database_url.clone();
    let config = Config::from_lookup(|key| match key {
        "DATABASE_URL" => Some(database_url.clone()),
        "JWT_SECRET" => Some("boot_secret".to_string()),
        _ => None,
    })
    .unwrap();

    let state = AppState::from_config(&config).await;

    assert!(state.is_ok());

    db.drop_schema().await;
}
