//! Shared fixtures for HTTP integration tests
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use chrono::Duration;
use http_body_util::BodyExt;
use iview_common::auth::{Scope, ScopeSet};
use iview_common::config::{FileConfig, Overrides, ServiceConfig};
use iview_common::db::{connect_in_memory, InterviewStatus, QuestionKind, Role, Tenant, User};
use iview_common::time;
use serde_json::Value;
use sqlx::SqlitePool;
use tower::util::ServiceExt;

use iview_server::db::{api_keys, interviews, invitations, questions, sessions, tenants, users};
use iview_server::{build_router, AppState};

pub const PUBLIC_URL: &str = "https://jobs.example.test";
pub const PASSWORD: &str = "correct horse battery";

pub struct TestApp {
    pub app: Router,
    pub db: SqlitePool,
}

pub async fn test_app() -> TestApp {
    test_app_with(Overrides::default()).await
}

pub async fn test_app_with(mut overrides: Overrides) -> TestApp {
    overrides.public_url.get_or_insert_with(|| PUBLIC_URL.to_string());
    let config = ServiceConfig::resolve(overrides, FileConfig::default()).unwrap();
    let db = connect_in_memory().await.unwrap();
    let state = AppState::new(db.clone(), config, "test-session-secret".to_string()).unwrap();
    TestApp {
        app: build_router(state),
        db,
    }
}

pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub text: String,
}

impl Response {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.text).unwrap_or(Value::Null)
    }

    pub fn error_code(&self) -> String {
        self.json()["error"]["code"].as_str().unwrap_or_default().to_string()
    }

    /// `name=value` from the `set-cookie` header
    pub fn cookie(&self) -> String {
        let raw = self.headers[header::SET_COOKIE].to_str().unwrap();
        raw.split(';').next().unwrap().to_string()
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        Response {
            status,
            headers,
            text: String::from_utf8(bytes.to_vec()).unwrap(),
        }
    }

    pub async fn get(&self, uri: &str, bearer: Option<&str>) -> Response {
        self.send(request(Method::GET, uri, bearer, None)).await
    }

    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        bearer: Option<&str>,
        body: Option<Value>,
    ) -> Response {
        self.send(request(method, uri, bearer, body)).await
    }

    pub async fn get_with_cookie(&self, uri: &str, cookie: &str) -> Response {
        self.send(
            Request::builder()
                .uri(uri)
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn call_with_cookie(
        &self,
        method: Method,
        uri: &str,
        cookie: &str,
        body: Option<Value>,
    ) -> Response {
        let mut req = request(method, uri, None, body);
        req.headers_mut().insert(header::COOKIE, cookie.parse().unwrap());
        self.send(req).await
    }

    /// Signs in and returns the session cookie pair
    pub async fn login(&self, slug: &str, email: &str) -> String {
        let response = self
            .call(
                Method::POST,
                &format!("/t/{}/auth/login", slug),
                None,
                Some(serde_json::json!({ "email": email, "password": PASSWORD })),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.text);
        response.cookie()
    }
}

pub fn request(
    method: Method,
    uri: &str,
    bearer: Option<&str>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(key) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", key));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn seed_tenant(db: &SqlitePool, slug: &str) -> Tenant {
    tenants::create(db, slug, &format!("{} Inc", slug)).await.unwrap()
}

pub async fn seed_user(db: &SqlitePool, tenant: &Tenant, email: &str, role: Role) -> User {
    users::create(db, &tenant.id, email, email, role, PASSWORD).await.unwrap()
}

pub async fn seed_key(db: &SqlitePool, tenant: &Tenant, scopes: &[Scope]) -> String {
    api_keys::create(db, &tenant.id, "test", &ScopeSet::new(scopes.iter().copied()))
        .await
        .unwrap()
        .key
}

pub async fn seed_interview(db: &SqlitePool, tenant: &Tenant, status: InterviewStatus) -> String {
    interviews::create(
        db,
        &tenant.id,
        &interviews::NewInterview {
            title: "Backend Engineer".to_string(),
            description: None,
            job_title: Some("Engineer".to_string()),
            status,
            created_by: None,
        },
    )
    .await
    .unwrap()
    .id
}

pub async fn seed_question(
    db: &SqlitePool,
    tenant: &Tenant,
    interview_id: &str,
    prompt: &str,
) -> String {
    questions::append(
        db,
        &tenant.id,
        interview_id,
        &questions::NewQuestion {
            prompt: prompt.to_string(),
            kind: QuestionKind::Text,
            time_limit_secs: None,
        },
    )
    .await
    .unwrap()
    .id
}

/// Token of a fresh invitation; `days` may be negative for an expired one
pub async fn seed_invitation(
    db: &SqlitePool,
    tenant: &Tenant,
    interview_id: &str,
    days: i64,
) -> String {
    invitations::create(
        db,
        &tenant.id,
        interview_id,
        &invitations::NewInvitation {
            candidate_email: "ada@example.com".to_string(),
            candidate_name: Some("Ada Lovelace".to_string()),
            expires_at: time::now() + Duration::days(days),
        },
    )
    .await
    .unwrap()
    .token
}

/// Active interview with one answered question; returns (interview_id, response_id)
pub async fn seed_response(db: &SqlitePool, tenant: &Tenant) -> (String, String) {
    let interview_id = seed_interview(db, tenant, InterviewStatus::Active).await;
    let question_id = seed_question(db, tenant, &interview_id, "Tell us about yourself").await;
    let token = seed_invitation(db, tenant, &interview_id, 7).await;
    let invitation = invitations::find_by_token(db, &token).await.unwrap().unwrap();
    let session = sessions::start(db, &invitation).await.unwrap();
    let response =
        sessions::upsert_response(db, &session, &question_id, Some("I build things"), None)
            .await
            .unwrap();
    (interview_id, response.id)
}
