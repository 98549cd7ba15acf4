//! Common test utilities for HTTP-level tests
//!
//! Builds the real router on top of the in-process store with a cheap password work
//! factor, so no database is needed. Requests go through `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use serde_json::{json, Value};
use std::collections::HashMap;
use taskhub_api::app::{build_router, AppState, Stores};
use taskhub_api::config::Config;
use tower::ServiceExt;

pub const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

pub const STRONG_PASSWORD: &str = "Str0ng!Pass";

/// Parsed response
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn message(&self) -> &str {
        self.body["message"].as_str().unwrap_or_default()
    }
}

/// Test context holding a router over a fresh in-memory store
pub struct TestContext {
    pub app: axum::Router,
    pub state: AppState,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_env(&[])
    }

    /// Builds a context with extra configuration variables
    pub fn with_env(vars: &[(&str, &str)]) -> Self {
        let mut env: HashMap<String, String> = HashMap::from([
            ("JWT_SECRET".to_string(), SECRET.to_string()),
            ("PASSWORD_HASH_MEMORY_KIB".to_string(), "1024".to_string()),
            ("PASSWORD_HASH_ITERATIONS".to_string(), "1".to_string()),
            ("PASSWORD_HASH_PARALLELISM".to_string(), "1".to_string()),
        ]);
        for (key, value) in vars {
            env.insert(key.to_string(), value.to_string());
        }

        let config = Config::from_lookup(|key| env.get(key).cloned()).expect("valid test config");
        let state = AppState::new(config, Stores::in_memory()).expect("valid hashing config");
        let app = build_router(state.clone());

        Self { app, state }
    }

    /// Sends a request with an optional bearer token and JSON body
    pub async fn send(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        self.execute(builder.body(body).unwrap()).await
    }

    /// Sends a prepared request
    pub async fn execute(&self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        TestResponse { status, headers, body }
    }

    pub async fn get(&self, uri: &str, token: &str) -> TestResponse {
        self.send(Method::GET, uri, Some(token), None).await
    }

    pub async fn signup(&self, name: &str, email: &str, password: &str) -> TestResponse {
        self.send(
            Method::POST,
            "/auth/signup",
            None,
            Some(json!({ "name": name, "email": email, "password": password })),
        )
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> TestResponse {
        self.send(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": email, "password": password })),
        )
        .await
    }

    /// Signs up and logs in, returning the session token
    pub async fn register(&self, name: &str, email: &str) -> String {
        let response = self.signup(name, email, STRONG_PASSWORD).await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);

        let response = self.login(email, STRONG_PASSWORD).await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.body);
        response.body["token"].as_str().unwrap().to_string()
    }

    /// Creates a task and returns its JSON
    pub async fn create_task(&self, token: &str, body: Value) -> Value {
        let response = self.send(Method::POST, "/tasks/create-task", Some(token), Some(body)).await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.body["task"].clone()
    }

    /// Creates a project and returns its JSON
    pub async fn create_project(&self, token: &str, body: Value) -> Value {
        let response = self
            .send(Method::POST, "/projects/create-project", Some(token), Some(body))
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.body["project"].clone()
    }
}
