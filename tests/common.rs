#![allow(dead_code)]

use paradisepay_backend::{
    api::router::create_router,
    config::{Config, QrConfig},
    domain::ports::{EmailAttachment, EmailService},
    domain::services::notification_service::load_templates,
    error::AppError,
    infra::factory::sqlite_repositories,
    state::AppState,
};
use sqlx::{sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions}, Pool, Sqlite};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;
use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    Router,
};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use tower::ServiceExt;
use serde_json::{json, Value};

pub const TEST_PASSWORD: &str = "correct-horse-battery";
pub const TEST_QR_SECRET: &str = "test-qr-secret";

#[derive(Clone, Debug)]
pub struct SentEmail {
    pub recipient: String,
    pub subject: String,
    pub html_body: String,
    pub attachments: Vec<String>,
}

#[derive(Default)]
pub struct RecordingEmailService {
    pub sent: Mutex<Vec<SentEmail>>,
}

impl RecordingEmailService {
    pub fn subjects(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|e| e.subject.clone()).collect()
    }
}

#[async_trait]
impl EmailService for RecordingEmailService {
    async fn send(
        &self,
        recipient: &str,
        subject: &str,
        html_body: &str,
        attachments: &[EmailAttachment],
    ) -> Result<(), AppError> {
        self.sent.lock().unwrap().push(SentEmail {
            recipient: recipient.to_string(),
            subject: subject.to_string(),
            html_body: html_body.to_string(),
            attachments: attachments.iter().map(|a| a.filename.clone()).collect(),
        });
        Ok(())
    }
}

pub struct FailingEmailService;

#[async_trait]
impl EmailService for FailingEmailService {
    async fn send(&self, _: &str, _: &str, _: &str, _: &[EmailAttachment]) -> Result<(), AppError> {
        Err(AppError::InternalWithMsg("mail relay unavailable".to_string()))
    }
}

/// Reads a base64 PNG QR image back to the text it encodes.
pub fn decode_qr(png_base64: &str) -> String {
    let png = STANDARD.decode(png_base64).expect("QR image is not base64");
    let luma = image::load_from_memory(&png).expect("QR image is not a PNG").to_luma8();

    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
        luma.width() as usize,
        luma.height() as usize,
        |x, y| luma.get_pixel(x as u32, y as u32).0[0],
    );
    let grids = prepared.detect_grids();
    assert_eq!(grids.len(), 1, "expected exactly one QR code in the image");

    let (_, content) = grids[0].decode().expect("QR image does not decode");
    content
}

pub struct TestUser {
    pub id: String,
    pub email: String,
    pub token: String,
}

pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Sqlite>,
    pub db_filename: String,
    pub state: Arc<AppState>,
    pub emails: Arc<RecordingEmailService>,
}

impl TestApp {
    pub async fn new() -> Self {
        let emails = Arc::new(RecordingEmailService::default());
        Self::build(emails.clone(), emails).await
    }

    pub async fn with_failing_email() -> Self {
        Self::build(Arc::new(FailingEmailService), Arc::new(RecordingEmailService::default())).await
    }

    async fn build(mailer: Arc<dyn EmailService>, emails: Arc<RecordingEmailService>) -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let connection_options = SqliteConnectOptions::from_str(&db_url)
            .unwrap()
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connection_options)
            .await
            .expect("Failed to connect to test db");

        sqlx::migrate!("./migrations/sqlite")
            .run(&pool)
            .await
            .expect("Failed to migrate test db");

        let priv_key_pem = include_str!("../tests/keys/test_private.pem");
        let pub_key_pem = include_str!("../tests/keys/test_public.pem");

        let config = Config {
            database_url: db_url.clone(),
            port: 0,
            mail_service_url: "http://localhost".to_string(),
            mail_service_token: "token".to_string(),
            jwt_secret_key: priv_key_pem.to_string(),
            jwt_public_key: pub_key_pem.to_string(),
            auth_issuer: "test-issuer".to_string(),
            base_url: "https://paradisepay.test".to_string(),
            qr: QrConfig {
                secret_key: TEST_QR_SECRET.to_string(),
                width: 400,
                margin: 4,
                ..QrConfig::default()
            },
        };

        let templates = Arc::new(load_templates().expect("templates"));
        let state = Arc::new(AppState::new(config, sqlite_repositories(&pool), mailer, templates));
        let router = create_router(state.clone());

        Self { router, pool, db_filename, state, emails }
    }

    /// Sends a JSON request with an optional bearer token.
    pub async fn request(&self, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(t) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", t));
        }
        let request = match body {
            Some(b) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    pub async fn register(&self, name: &str) -> TestUser {
        let email = format!("{}-{}@example.com", name.to_lowercase(), Uuid::new_v4().simple());
        let (status, body) = self.request("POST", "/api/v1/auth/register", None, Some(json!({
            "name": name,
            "email": email,
            "password": TEST_PASSWORD,
        }))).await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);

        let id = body["id"].as_str().unwrap().to_string();
        let token = self.login(&email).await;
        TestUser { id, email, token }
    }

    pub async fn login(&self, email: &str) -> String {
        let (status, body) = self.request("POST", "/api/v1/auth/login", None, Some(json!({
            "email": email,
            "password": TEST_PASSWORD,
        }))).await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        body["access_token"].as_str().unwrap().to_string()
    }

    /// Registers a user, sets the role directly and logs in again so the
    /// token carries it.
    pub async fn register_with_role(&self, name: &str, role: &str) -> TestUser {
        let mut user = self.register(name).await;
        self.state.user_repo.update_role(&user.id, role).await.unwrap();
        user.token = self.login(&user.email).await;
        user
    }

    pub async fn organizer(&self) -> TestUser {
        self.register_with_role("Olivia", "Organizer").await
    }

    pub async fn admin(&self) -> TestUser {
        self.register_with_role("Ada", "Admin").await
    }

    pub async fn create_event(&self, organizer: &TestUser, event_date: DateTime<Utc>) -> String {
        let (status, body) = self.request("POST", "/api/v1/events", Some(&organizer.token), Some(json!({
            "title": "Paradise Beach Festival",
            "description": "Three stages on the sand",
            "venue_name": "Beau Vallon",
            "venue_address": "West Coast Road",
            "city": "Mahe",
            "country": "SC",
            "event_date": event_date,
        }))).await;
        assert_eq!(status, StatusCode::CREATED, "create event failed: {}", body);
        body["id"].as_str().unwrap().to_string()
    }

    pub async fn set_event_status(&self, organizer: &TestUser, event_id: &str, status: &str) {
        let (code, body) = self.request(
            "PUT",
            &format!("/api/v1/events/{}/status", event_id),
            Some(&organizer.token),
            Some(json!({ "status": status })),
        ).await;
        assert_eq!(code, StatusCode::OK, "status update failed: {}", body);
    }

    pub async fn published_event(&self, organizer: &TestUser, event_date: DateTime<Utc>) -> String {
        let event_id = self.create_event(organizer, event_date).await;
        self.set_event_status(organizer, &event_id, "published").await;
        event_id
    }

    /// Creates a ticket type; `extra` fields override the defaults.
    pub async fn create_ticket_type(&self, organizer: &TestUser, event_id: &str, available: i32, extra: Value) -> String {
        let mut payload = json!({
            "name": "General Admission",
            "price": 2500,
            "currency": "USD",
            "available_quantity": available,
        });
        if let (Some(base), Some(overrides)) = (payload.as_object_mut(), extra.as_object()) {
            for (k, v) in overrides {
                base.insert(k.clone(), v.clone());
            }
        }

        let (status, body) = self.request(
            "POST",
            &format!("/api/v1/events/{}/ticket-types", event_id),
            Some(&organizer.token),
            Some(payload),
        ).await;
        assert_eq!(status, StatusCode::CREATED, "create ticket type failed: {}", body);
        body["id"].as_str().unwrap().to_string()
    }

    pub async fn purchase(&self, buyer: &TestUser, event_id: &str, ticket_type_id: &str, quantity: usize) -> (StatusCode, Value) {
        let attendees: Vec<Value> = (0..quantity)
            .map(|i| json!({ "name": format!("Guest {}", i + 1), "email": format!("guest{}@example.com", i + 1) }))
            .collect();

        self.request("POST", "/api/v1/tickets/purchase", Some(&buyer.token), Some(json!({
            "event_id": event_id,
            "ticket_type_id": ticket_type_id,
            "quantity": quantity,
            "attendee_details": attendees,
            "payment_method": "card",
        }))).await
    }

    pub async fn sold_quantity(&self, ticket_type_id: &str) -> i64 {
        sqlx::query_scalar::<_, i64>("SELECT sold_quantity FROM ticket_types WHERE id = ?")
            .bind(ticket_type_id)
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }

    pub async fn set_sold_quantity(&self, ticket_type_id: &str, sold: i64) {
        sqlx::query("UPDATE ticket_types SET sold_quantity = ? WHERE id = ?")
            .bind(sold)
            .bind(ticket_type_id)
            .execute(&self.pool)
            .await
            .unwrap();
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
        let _ = std::fs::remove_file(format!("{}-wal", self.db_filename));
        let _ = std::fs::remove_file(format!("{}-shm", self.db_filename));
    }
}
