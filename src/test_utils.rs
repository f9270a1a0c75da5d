#[cfg(test)]
pub mod test_utils {
    use crate::auth::{generate_token_key, hash_password};
    use crate::router::create_router;
    use crate::schemas::AppState;
    use axum::Router;
    use axum_test::TestServer;
    use chrono::Utc;
    use migration::{Migrator, MigratorTrait};
    use model::entities::{auth_token, user, user_profile};
    use moka::future::Cache;
    use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
    use serde_json::json;
    use tracing::Level;
    use tracing_subscriber::FmtSubscriber;

    /// Create an in-memory SQLite database for testing
    pub async fn setup_test_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to connect to in-memory database");

        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");

        db
    }

    /// Create AppState for testing
    pub async fn setup_test_app_state() -> AppState {
        let db = setup_test_db().await;
        let cache = Cache::new(100);
        AppState { db, cache }
    }

    /// Initialize tracing for tests with output to STDERR.
    ///
    /// The log level is determined by the RUST_LOG environment variable,
    /// defaulting to WARN if not set.
    fn init_test_tracing() -> tracing::subscriber::DefaultGuard {
        let log_level = std::env::var("RUST_LOG")
            .ok()
            .and_then(|level| match level.to_uppercase().as_str() {
                "ERROR" => Some(Level::ERROR),
                "WARN" => Some(Level::WARN),
                "INFO" => Some(Level::INFO),
                "DEBUG" => Some(Level::DEBUG),
                "TRACE" => Some(Level::TRACE),
                _ => None,
            })
            .unwrap_or(Level::WARN);

        let subscriber = FmtSubscriber::builder()
            .with_max_level(log_level)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    /// Create axum app for testing
    pub async fn setup_test_app() -> Router {
        let _ = init_test_tracing();

        let state = setup_test_app_state().await;
        create_router(state)
    }

    /// Create a test server with its backing state, for tests that need
    /// direct database access alongside HTTP calls
    pub async fn setup_test_server_with_state() -> (TestServer, AppState) {
        let _ = init_test_tracing();

        let state = setup_test_app_state().await;
        let server = TestServer::new(create_router(state.clone())).unwrap();
        (server, state)
    }

    /// Register an account through the API and return its auth token and user ID
    pub async fn register(
        server: &TestServer,
        username: &str,
        profile_type: &str,
    ) -> (String, i32) {
        let response = server
            .post("/api/v1/registration")
            .json(&json!({
                "username": username,
                "email": format!("{username}@example.com"),
                "password": "examplePassword",
                "repeated_password": "examplePassword",
                "type": profile_type,
            }))
            .await;
        assert_eq!(
            response.status_code(),
            axum::http::StatusCode::CREATED,
            "registration of '{}' failed: {}",
            username,
            response.text()
        );
        let body: serde_json::Value = response.json();
        (
            body["data"]["token"].as_str().unwrap().to_string(),
            body["data"]["user_id"].as_i64().unwrap() as i32,
        )
    }

    /// Insert a staff account directly and return its token and user ID
    pub async fn create_staff_user(db: &DatabaseConnection, username: &str) -> (String, i32) {
        let user_model = user::ActiveModel {
            username: Set(username.to_string()),
            email: Set(format!("{username}@example.com")),
            password_hash: Set(hash_password("staffPassword").unwrap()),
            first_name: Set(String::new()),
            last_name: Set(String::new()),
            is_staff: Set(true),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("Failed to insert staff user");

        user_profile::ActiveModel {
            user_id: Set(user_model.id),
            location: Set(String::new()),
            email: Set(user_model.email.clone()),
            file: Set(String::new()),
            description: Set(String::new()),
            tel: Set(String::new()),
            working_hours: Set(String::new()),
            profile_type: Set(user_profile::ProfileType::Staff),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("Failed to insert staff profile");

        let token = auth_token::ActiveModel {
            user_id: Set(user_model.id),
            key: Set(generate_token_key()),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("Failed to insert staff token");

        (token.key, user_model.id)
    }

    /// A standard three-tier offer payload for tests
    pub fn example_offer_payload(title: &str) -> serde_json::Value {
        json!({
            "title": title,
            "image": null,
            "description": "Example offer used in tests",
            "details": [
                {
                    "title": "Basic package",
                    "revisions": 2,
                    "delivery_time_in_days": 7,
                    "price": "50.00",
                    "features": ["Logo design"],
                    "offer_type": "basic"
                },
                {
                    "title": "Standard package",
                    "revisions": 5,
                    "delivery_time_in_days": 10,
                    "price": "120.00",
                    "features": ["Logo design", "Visiting card"],
                    "offer_type": "standard"
                },
                {
                    "title": "Premium package",
                    "revisions": -1,
                    "delivery_time_in_days": 14,
                    "price": "300.00",
                    "features": ["Logo design", "Visiting card", "Flyer"],
                    "offer_type": "premium"
                }
            ]
        })
    }
}
