use std::sync::Arc;
use chrono::{DateTime, Utc};
use serde_json::json;
use uuid::Uuid;

use shared_config::{AppConfig, ScheduleWindowDefaults};

pub struct TestConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub schedule_window: ScheduleWindowDefaults,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            schedule_window: ScheduleWindowDefaults::default(),
        }
    }
}

impl TestConfig {
    /// Points the config at a mock PostgREST server (e.g. `MockServer::uri()`).
    pub fn with_supabase_url(url: &str) -> Self {
        Self {
            supabase_url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            port: 0,
            schedule_window: self.schedule_window.clone(),
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    /// A row shaped like the `appointments` table.
    pub fn appointment_row(
        id: &str,
        doctor_id: &str,
        appointment_date: DateTime<Utc>,
        duration_minutes: i64,
        status: &str,
    ) -> serde_json::Value {
        json!({
            "id": id,
            "patient_id": Uuid::new_v4(),
            "doctor_id": doctor_id,
            "appointment_date": appointment_date.to_rfc3339(),
            "duration_minutes": duration_minutes,
            "status": status,
            "appointment_type": "GeneralConsultation",
            "patient_notes": null,
            "doctor_notes": null,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn error_response(message: &str, code: &str) -> serde_json::Value {
        json!({
            "message": message,
            "code": code
        })
    }
}
