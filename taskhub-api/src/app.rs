/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use taskhub_api::app::{build_router, AppState, Stores};
/// use taskhub_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let state = AppState::new(config, Stores::in_memory())?;
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, middleware::deadline::DeadlineLayer, routes};
use axum::{
    http::{header, HeaderValue, Method, Request},
    routing::{delete, get, patch, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use taskhub_shared::{
    auth::{
        authorization::{ProjectScope, TaskScope},
        jwt::TokenService,
        middleware::{auth_gate, AuthContext},
        password::{PasswordError, PasswordService},
    },
    models::{project::Project, task::Task},
    store::{
        memory::{MemoryRecordStore, MemoryStore},
        postgres::PgStore,
        CredentialStore, ProjectStore, RecordStore,
    },
};
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

/// Largest accepted request body
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Persistence collaborators used by the handlers
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn CredentialStore>,
    pub tasks: Arc<dyn RecordStore<Task>>,
    pub projects: Arc<dyn ProjectStore>,
}

impl Stores {
    /// All collaborators backed by one PostgreSQL pool
    pub fn postgres(pool: PgPool) -> Self {
        let store = Arc::new(PgStore::new(pool));
        Self {
            users: store.clone(),
            tasks: store.clone(),
            projects: store,
        }
    }

    /// In-process collaborators; data is lost on restart
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(MemoryStore::new()),
            tasks: Arc::new(MemoryRecordStore::<Task>::new()),
            projects: Arc::new(MemoryRecordStore::<Project>::new()),
        }
    }
}

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<Config>,

    pub tokens: Arc<TokenService>,

    pub passwords: Arc<PasswordService>,

    pub users: Arc<dyn CredentialStore>,

    tasks: Arc<dyn RecordStore<Task>>,

    projects: Arc<dyn ProjectStore>,
}

impl AppState {
    /// Creates new application state
    ///
    /// # Errors
    ///
    /// Returns `PasswordError` if the configured hashing cost is rejected
    pub fn new(config: Config, stores: Stores) -> Result<Self, PasswordError> {
        let tokens = TokenService::new(&config.jwt.secret, config.token_expiry());
        let passwords = PasswordService::new(config.password)?;

        Ok(Self {
            config: Arc::new(config),
            tokens: Arc::new(tokens),
            passwords: Arc::new(passwords),
            users: stores.users,
            tasks: stores.tasks,
            projects: stores.projects,
        })
    }

    /// Task storage constrained to the authenticated caller
    pub fn task_scope<'a>(&'a self, auth: &AuthContext) -> TaskScope<'a> {
        TaskScope::new(auth, self.tasks.as_ref())
    }

    /// Project storage constrained to the authenticated caller
    pub fn project_scope<'a>(&'a self, auth: &AuthContext) -> ProjectScope<'a> {
        ProjectScope::new(auth, self.projects.as_ref())
    }
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.api.cors_origins.iter().any(|origin| origin == "*") {
        // Development mode: permissive CORS
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

/// Span for one HTTP request
///
/// `user_id` starts empty and is filled by the authentication gate.
pub fn request_span<B>(request: &Request<B>) -> Span {
    tracing::info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        version = ?request.version(),
        user_id = tracing::field::Empty,
    )
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET /health
/// ├── /auth/
/// │   ├── POST /signup
/// │   ├── POST /login
/// │   ├── POST /logout
/// │   └── GET  /protected                     (gated)
/// ├── /tasks/                                 (gated)
/// │   ├── POST   /create-task
/// │   ├── GET    /tasks
/// │   ├── GET    /task/:id
/// │   ├── PUT    /update-task/:id
/// │   ├── PATCH  /update-task/status/:id
/// │   ├── PATCH  /update-task/priority/:id
/// │   └── DELETE /delete-task/:id
/// └── /projects/                              (gated)
///     ├── POST   /create-project
///     ├── GET    /get-projects
///     ├── GET    /statistics
///     ├── GET    /project/:id
///     ├── PUT    /update-project/:id
///     └── DELETE /delete-project/:id
/// ```
///
/// # Middleware Stack
///
/// Outer to inner:
/// 1. Request body limit (10 MiB)
/// 2. CORS (tower-http CorsLayer)
/// 3. Logging (tower-http TraceLayer)
/// 4. Request deadline
/// 5. Authentication gate (per route group)
pub fn build_router(state: AppState) -> Router {
    let gate = axum::middleware::from_fn_with_state(state.tokens.clone(), auth_gate);

    let auth_routes = Router::new()
        .route("/protected", get(routes::auth::protected))
        .route_layer(gate.clone())
        .route("/signup", post(routes::auth::signup))
        .route("/login", post(routes::auth::login))
        .route("/logout", post(routes::auth::logout));

    let task_routes = Router::new()
        .route("/create-task", post(routes::tasks::create_task))
        .route("/tasks", get(routes::tasks::list_tasks))
        .route("/task/:id", get(routes::tasks::get_task))
        .route("/update-task/:id", put(routes::tasks::update_task))
        .route("/update-task/status/:id", patch(routes::tasks::update_task_status))
        .route("/update-task/priority/:id", patch(routes::tasks::update_task_priority))
        .route("/delete-task/:id", delete(routes::tasks::delete_task))
        .route_layer(gate.clone());

    let project_routes = Router::new()
        .route("/create-project", post(routes::projects::create_project))
        .route("/get-projects", get(routes::projects::list_projects))
        .route("/statistics", get(routes::projects::project_statistics))
        .route("/project/:id", get(routes::projects::get_project))
        .route("/update-project/:id", put(routes::projects::update_project))
        .route("/delete-project/:id", delete(routes::projects::delete_project))
        .route_layer(gate);

    let cors = cors_layer(&state.config);
    let deadline = DeadlineLayer::new(state.config.api.request_timeout);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/auth", auth_routes)
        .nest("/tasks", task_routes)
        .nest("/projects", project_routes)
        .layer(deadline)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(request_span)
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use taskhub_shared::models::task::NewTask;
    use uuid::Uuid;

    fn config(vars: &[(&str, &str)]) -> Config {
        let mut map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        map.insert("JWT_SECRET".into(), "test-secret-key-at-least-32-bytes-long".into());
        map.insert("PASSWORD_HASH_MEMORY_KIB".into(), "1024".into());
        map.insert("PASSWORD_HASH_ITERATIONS".into(), "1".into());
        map.insert("PASSWORD_HASH_PARALLELISM".into(), "1".into());
        Config::from_lookup(|key| map.get(key).cloned()).unwrap()
    }

    #[test]
    fn test_state_uses_configured_expiry() {
        let state = AppState::new(config(&[("JWT_EXPIRY_SECONDS", "600")]), Stores::in_memory()).unwrap();

        assert_eq!(state.tokens.expires_in(), chrono::Duration::seconds(600));
        assert_eq!(state.passwords.config().iterations, 1);
        assert_eq!(state.users.backend(), "memory");
    }

    #[tokio::test]
    async fn test_scopes_are_bound_to_caller() {
        let state = AppState::new(config(&[]), Stores::in_memory()).unwrap();
        let ann = AuthContext {
            user_id: Uuid::new_v4(),
            email: "ann@x.com".to_string(),
        };
        let bob = AuthContext {
            user_id: Uuid::new_v4(),
            email: "bob@x.com".to_string(),
        };

        let task = state.task_scope(&ann).create(NewTask::titled("Ann's")).await.unwrap();

        assert_eq!(task.created_by, ann.user_id);
        assert!(state.task_scope(&bob).get(task.id).await.is_err());
        assert_eq!(state.project_scope(&ann).owner(), ann.user_id);
    }

    #[test]
    fn test_request_span_declares_user_id() {
        let subscriber = tracing_subscriber::registry();
        tracing::subscriber::with_default(subscriber, || {
            let request = Request::builder().uri("/tasks/tasks").body(()).unwrap();
            let span = request_span(&request);

            assert!(span.field("user_id").is_some());
            assert!(span.field("uri").is_some());
        });
    }

    #[test]
    fn test_router_builds_with_wildcard_cors() {
        let state = AppState::new(config(&[("CORS_ORIGINS", "*")]), Stores::in_memory()).unwrap();
        let _router = build_router(state);
    }
}
