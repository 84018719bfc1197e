use std::sync::{Arc, Mutex};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use base64::{Engine as _, engine::general_purpose};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::notification::{Notification, NotificationLevel, Notifier};

pub struct TestConfig {
    pub jwt_secret: String,
    pub api_base_url: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            api_base_url: "http://localhost:3000".to_string(),
        }
    }
}

impl TestConfig {
    pub fn with_backend(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig::with_backend(self.api_base_url.clone(), self.jwt_secret.clone())
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: String,
    pub email: String,
    pub role: String,
}

impl Default for TestUser {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: "test@example.com".to_string(),
            role: "PATIENT".to_string(),
        }
    }
}

impl TestUser {
    pub fn new(email: &str, role: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            role: role.to_string(),
        }
    }

    pub fn professional(email: &str) -> Self {
        Self::new(email, "PROFESSIONAL")
    }

    pub fn patient(email: &str) -> Self {
        Self::new(email, "PATIENT")
    }

    pub fn admin(email: &str) -> Self {
        Self::new(email, "ADMIN")
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            email: Some(self.email.clone()),
            role: Some("authenticated".to_string()),
            metadata: None,
            created_at: Some(Utc::now()),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        // The provider issues the generic "authenticated" role; dashboard roles
        // live in the backend profile.
        let payload = json!({
            "sub": user.id,
            "email": user.email,
            "role": "authenticated",
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

/// Backend payloads wrapped the way the scheduling API wraps them.
pub struct MockBackendResponses;

impl MockBackendResponses {
    pub fn envelope(data: Value) -> Value {
        json!({
            "success": true,
            "message": "Operation completed successfully",
            "data": data,
            "timestamp": "2024-01-01T00:00:00Z"
        })
    }

    pub fn failure(message: &str) -> Value {
        json!({
            "success": false,
            "message": message,
            "data": null,
            "timestamp": "2024-01-01T00:00:00Z"
        })
    }

    pub fn user_profile(user_id: &str, role: &str) -> Value {
        json!({
            "id": user_id,
            "authUserId": user_id,
            "firstName": "Elena",
            "lastName": "López",
            "fullName": "Elena López",
            "role": role
        })
    }

    pub fn professional(id: &str, full_name: &str) -> Value {
        json!({
            "id": id,
            "fullName": full_name,
            "role": "PROFESSIONAL"
        })
    }

    /// `date` is `YYYY-MM-DD`, `start`/`end` are `HH:MM`.
    pub fn slot(id: &str, professional_id: &str, date: &str, start: &str, end: &str, is_booked: bool) -> Value {
        json!({
            "id": id,
            "professionalId": professional_id,
            "availableDate": date,
            "startTime": format!("{}T{}:00Z", date, start),
            "endTime": format!("{}T{}:00Z", date, end),
            "isBooked": is_booked,
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-01T00:00:00Z"
        })
    }

    pub fn appointment(
        id: &str,
        patient_id: &str,
        professional_id: &str,
        availability_id: Option<&str>,
        appointment_date: &str,
        status: &str,
    ) -> Value {
        json!({
            "id": id,
            "patientId": patient_id,
            "professionalId": professional_id,
            "availabilityId": availability_id,
            "appointmentDate": appointment_date,
            "status": status,
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-01T00:00:00Z"
        })
    }
}

/// Notifier that keeps every notification for later assertions.
#[derive(Debug, Default, Clone)]
pub struct RecordingNotifier {
    notifications: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<Notification> {
        self.notifications.lock().map(|n| n.clone()).unwrap_or_default()
    }

    pub fn count(&self, level: NotificationLevel) -> usize {
        self.all().iter().filter(|n| n.level == level).count()
    }

    pub fn errors(&self) -> usize {
        self.count(NotificationLevel::Error)
    }

    pub fn successes(&self) -> usize {
        self.count(NotificationLevel::Success)
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        if let Ok(mut notifications) = self.notifications.lock() {
            notifications.push(notification);
        }
    }
}
