// libs/schedule-cell/src/models.rs
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::fmt;

use shared_config::ScheduleWindowDefaults;
use shared_models::error::AppError;

/// Extra appointment fields carried through the layout untouched.
pub type OpaquePayload = Map<String, Value>;

// ==============================================================================
// LAYOUT INPUT / OUTPUT
// ==============================================================================

/// A time-bounded calendar entry as seen by the layout engine.
///
/// Only `id`, `start` and `end` are interpreted. Everything else lives in
/// `payload` and is flattened back into the JSON representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledAppointment<P = OpaquePayload> {
    pub id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(flatten)]
    pub payload: P,
}

impl<P> ScheduledAppointment<P> {
    pub fn new(id: impl Into<String>, start: DateTime<Utc>, end: DateTime<Utc>, payload: P) -> Self {
        Self {
            id: id.into(),
            start,
            end,
            payload,
        }
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn has_valid_interval(&self) -> bool {
        self.end > self.start
    }

    /// Half-open `[start, end)` intersection test.
    pub fn overlaps<Q>(&self, other: &ScheduledAppointment<Q>) -> bool {
        other.start < self.end && other.end > self.start
    }
}

/// An appointment together with its lane assignment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionedAppointment<P = OpaquePayload> {
    #[serde(flatten)]
    pub appointment: ScheduledAppointment<P>,
    /// Number of appointments whose interval intersects this one, itself included.
    pub overlap_group_size: usize,
    /// Zero-based lane, always `< overlap_group_size`.
    pub column_index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geometry: Option<BlockGeometry>,
}

impl<P> PositionedAppointment<P> {
    pub fn id(&self) -> &str {
        &self.appointment.id
    }
}

/// How column indices are chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutStrategy {
    /// Rank within the overlap set, computed with a sorted sweep in O(n log n).
    #[default]
    SweepLine,
    /// Rank within the overlap set, computed by testing every pair in O(n²).
    Pairwise,
    /// Lowest lane not held by an active appointment. Same-lane blocks never
    /// collide, at the cost of diverging from the rank-based column numbers.
    GreedyColumns,
}

impl fmt::Display for LayoutStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutStrategy::SweepLine => write!(f, "sweep_line"),
            LayoutStrategy::Pairwise => write!(f, "pairwise"),
            LayoutStrategy::GreedyColumns => write!(f, "greedy_columns"),
        }
    }
}

// ==============================================================================
// GEOMETRY
// ==============================================================================

/// Rendering window and pixel density for one calendar day.
///
/// Minutes are measured from midnight UTC of the rendered date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleGeometry {
    pub window_start_minute: u32,
    pub window_end_minute: u32,
    pub pixels_per_minute: f64,
    pub min_block_height: f64,
}

impl Default for ScheduleGeometry {
    fn default() -> Self {
        Self::from(&ScheduleWindowDefaults::default())
    }
}

impl From<&ScheduleWindowDefaults> for ScheduleGeometry {
    fn from(defaults: &ScheduleWindowDefaults) -> Self {
        Self {
            window_start_minute: defaults.window_start_minute,
            window_end_minute: defaults.window_end_minute,
            pixels_per_minute: defaults.pixels_per_minute,
            min_block_height: defaults.min_block_height,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlockGeometry {
    pub top: f64,
    pub height: f64,
    pub left_percent: f64,
    pub width_percent: f64,
}

// ==============================================================================
// STORE MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Ready,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
    Rescheduled,
}

impl AppointmentStatus {
    /// Whether an appointment in this status occupies the doctor's calendar.
    pub fn is_displayed(&self) -> bool {
        matches!(self,
            AppointmentStatus::Pending |
            AppointmentStatus::Confirmed |
            AppointmentStatus::Ready |
            AppointmentStatus::InProgress |
            AppointmentStatus::Completed
        )
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "pending"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::Ready => write!(f, "ready"),
            AppointmentStatus::InProgress => write!(f, "in_progress"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
            AppointmentStatus::NoShow => write!(f, "no_show"),
            AppointmentStatus::Rescheduled => write!(f, "rescheduled"),
        }
    }
}

/// A row of the `appointments` table, reduced to what the calendar needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentRow {
    pub id: String,
    pub doctor_id: String,
    pub patient_id: Option<String>,
    pub appointment_date: DateTime<Utc>,
    pub duration_minutes: i64,
    pub status: AppointmentStatus,
    pub appointment_type: Option<String>,
    pub patient_notes: Option<String>,
    pub doctor_notes: Option<String>,
}

/// Payload attached to appointments loaded from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppointmentDetails {
    pub patient_id: Option<String>,
    pub status: AppointmentStatus,
    pub appointment_type: Option<String>,
    pub patient_notes: Option<String>,
    pub doctor_notes: Option<String>,
}

impl AppointmentRow {
    /// `None` when the stored duration does not fit the calendar range.
    pub fn scheduled_end_time(&self) -> Option<DateTime<Utc>> {
        Duration::try_minutes(self.duration_minutes)
            .and_then(|duration| self.appointment_date.checked_add_signed(duration))
    }

    pub fn into_scheduled(self) -> Result<ScheduledAppointment<AppointmentDetails>, LayoutError> {
        let Some(end) = self.scheduled_end_time() else {
            return Err(LayoutError::InvalidInterval { ids: vec![self.id] });
        };
        Ok(ScheduledAppointment {
            id: self.id,
            start: self.appointment_date,
            end,
            payload: AppointmentDetails {
                patient_id: self.patient_id,
                status: self.status,
                appointment_type: self.appointment_type,
                patient_notes: self.patient_notes,
                doctor_notes: self.doctor_notes,
            },
        })
    }
}

/// One doctor's laid-out day.
#[derive(Debug, Clone, Serialize)]
pub struct DaySchedule {
    pub doctor_id: String,
    pub date: NaiveDate,
    pub appointments: Vec<PositionedAppointment<AppointmentDetails>>,
    pub total: usize,
    pub max_overlap: usize,
}

// ==============================================================================
// REQUESTS
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct LayoutRequest {
    pub appointments: Vec<ScheduledAppointment>,
    pub date: Option<NaiveDate>,
    pub geometry: Option<ScheduleGeometry>,
    #[serde(default)]
    pub strategy: LayoutStrategy,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DayScheduleQuery {
    pub date: NaiveDate,
    pub with_geometry: Option<bool>,
    pub strategy: Option<LayoutStrategy>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

/// The layout engine's only failure: some appointment ends at or before its start.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("Invalid appointment interval, end must be after start: {}", .ids.join(", "))]
    InvalidInterval { ids: Vec<String> },
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ScheduleError {
    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error("Invalid schedule geometry: {0}")]
    InvalidGeometry(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<ScheduleError> for AppError {
    fn from(err: ScheduleError) -> Self {
        match err {
            ScheduleError::Layout(e) => AppError::Unprocessable(e.to_string()),
            ScheduleError::InvalidGeometry(_) | ScheduleError::Validation(_) => {
                AppError::ValidationError(err.to_string())
            }
            ScheduleError::Database(msg) => AppError::Database(msg),
        }
    }
}
