#![allow(dead_code)]
// Shared helpers for router-level integration tests

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use teamhub::{db, server::build_router, AppContext, ServerConfig};
use tower::ServiceExt;

pub struct TestApp {
    pub ctx: AppContext,
    pub router: Router,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub set_cookie: Option<String>,
    pub body: Value,
}

impl TestApp {
    pub async fn new() -> Self {
        let pool = db::create_memory_pool().await.unwrap();
        let ctx = AppContext::with_pool(ServerConfig::default(), pool).unwrap();
        let router = build_router(ctx.clone());
        Self { ctx, router }
    }

    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        TestResponse {
            status,
            set_cookie,
            body,
        }
    }

    /// Register and log in; returns (user id, cookie header value)
    pub async fn signup(&self, email: &str, first_name: &str) -> (String, String) {
        let response = self
            .request(
                "POST",
                "/api/users/register",
                None,
                Some(json!({
                    "email": email,
                    "password": "password123",
                    "first_name": first_name,
                    "last_name": "Tester",
                })),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        let user_id = response.body["user"]["id"].as_str().unwrap().to_string();

        let cookie = self.login(email, "password123").await;
        (user_id, cookie)
    }

    pub async fn login(&self, email: &str, password: &str) -> String {
        let response = self
            .request(
                "POST",
                "/api/users/login",
                None,
                Some(json!({ "email": email, "password": password })),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.body);

        let set_cookie = response.set_cookie.expect("login sets a cookie");
        set_cookie.split(';').next().unwrap().to_string()
    }

    pub async fn create_team(&self, cookie: &str, name: &str) -> String {
        let response = self
            .request("POST", "/api/teams", Some(cookie), Some(json!({ "name": name })))
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.body["id"].as_str().unwrap().to_string()
    }

    /// Invitation tokens only travel by email; read it from the store
    pub async fn invitation_token(&self, invitation_id: &str) -> String {
        sqlx::query_scalar("SELECT token FROM invitations WHERE id = ?1")
            .bind(invitation_id)
            .fetch_one(&self.ctx.db)
            .await
            .unwrap()
    }
}
