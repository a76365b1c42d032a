// libs/schedule-cell/src/services/day_schedule.rs
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{
    AppointmentDetails, AppointmentRow, DaySchedule, LayoutError, LayoutStrategy, ScheduleError,
    ScheduleGeometry, ScheduledAppointment,
};
use crate::services::geometry::apply_geometry;
use crate::services::overlap::{layout_with_strategy, max_overlap};

/// Loads one doctor's appointments for a day and lays them out.
pub struct DayScheduleService {
    supabase: Arc<SupabaseClient>,
}

impl DayScheduleService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
        }
    }

    pub fn with_client(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    pub async fn build_day_schedule(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        geometry: Option<&ScheduleGeometry>,
        strategy: LayoutStrategy,
        auth_token: Option<&str>,
    ) -> Result<DaySchedule, ScheduleError> {
        if let Some(geometry) = geometry {
            geometry.validate()?;
        }

        let appointments = self.get_day_appointments(doctor_id, date, auth_token).await?;
        let mut positioned = layout_with_strategy(appointments, strategy)?;

        if let Some(geometry) = geometry {
            apply_geometry(geometry, date, &mut positioned)?;
        }

        let schedule = DaySchedule {
            doctor_id: doctor_id.to_string(),
            date,
            total: positioned.len(),
            max_overlap: max_overlap(&positioned),
            appointments: positioned,
        };

        info!("Built schedule for doctor {} on {}: {} appointments, max overlap {}",
              doctor_id, date, schedule.total, schedule.max_overlap);

        Ok(schedule)
    }

    /// Appointments that occupy the doctor's calendar on `date`.
    pub async fn get_day_appointments(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        auth_token: Option<&str>,
    ) -> Result<Vec<ScheduledAppointment<AppointmentDetails>>, ScheduleError> {
        let (day_start, day_end) = day_bounds(date)?;

        let query_parts = [
            format!("doctor_id=eq.{}", doctor_id),
            format!("appointment_date=gte.{}", day_start.to_rfc3339_opts(SecondsFormat::Secs, true)),
            format!("appointment_date=lt.{}", day_end.to_rfc3339_opts(SecondsFormat::Secs, true)),
        ];

        let path = format!("/rest/v1/appointments?{}&order=appointment_date.asc",
                          query_parts.join("&"));

        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            auth_token,
            None,
        ).await.map_err(|e| ScheduleError::Database(e.to_string()))?;

        let rows: Vec<AppointmentRow> = result.into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<AppointmentRow>, _>>()
            .map_err(|e| ScheduleError::Database(format!("Failed to parse appointments: {}", e)))?;

        let fetched = rows.len();
        let mut appointments = Vec::with_capacity(fetched);
        let mut unbounded = Vec::new();

        for row in rows.into_iter().filter(|row| row.status.is_displayed()) {
            match row.into_scheduled() {
                Ok(appointment) => appointments.push(appointment),
                Err(LayoutError::InvalidInterval { ids }) => unbounded.extend(ids),
            }
        }

        if !unbounded.is_empty() {
            warn!("Doctor {} has appointments on {} with out-of-range durations: {:?}",
                  doctor_id, date, unbounded);
            return Err(LayoutError::InvalidInterval { ids: unbounded }.into());
        }

        debug!("Fetched {} appointments for doctor {} on {}, {} displayed",
               fetched, doctor_id, date, appointments.len());

        Ok(appointments)
    }
}

fn day_bounds(date: NaiveDate) -> Result<(DateTime<Utc>, DateTime<Utc>), ScheduleError> {
    let next = date.succ_opt().ok_or_else(|| {
        ScheduleError::Validation(format!("date {} is outside the supported calendar range", date))
    })?;
    Ok((
        date.and_time(NaiveTime::MIN).and_utc(),
        next.and_time(NaiveTime::MIN).and_utc(),
    ))
}
