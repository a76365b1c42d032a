// libs/schedule-cell/src/services/geometry.rs
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use tracing::debug;

use crate::models::{BlockGeometry, PositionedAppointment, ScheduleError, ScheduleGeometry};

const MINUTES_PER_DAY: u32 = 24 * 60;

impl ScheduleGeometry {
    pub fn validate(&self) -> Result<(), ScheduleError> {
        if self.window_end_minute <= self.window_start_minute {
            return Err(ScheduleError::InvalidGeometry(format!(
                "window end ({}) must be after window start ({})",
                self.window_end_minute, self.window_start_minute
            )));
        }
        if self.window_end_minute > MINUTES_PER_DAY {
            return Err(ScheduleError::InvalidGeometry(format!(
                "window end ({}) exceeds the length of a day",
                self.window_end_minute
            )));
        }
        if !(self.pixels_per_minute.is_finite() && self.pixels_per_minute > 0.0) {
            return Err(ScheduleError::InvalidGeometry(
                "pixels_per_minute must be a positive number".to_string(),
            ));
        }
        if !(self.min_block_height.is_finite() && self.min_block_height >= 0.0) {
            return Err(ScheduleError::InvalidGeometry(
                "min_block_height must not be negative".to_string(),
            ));
        }
        Ok(())
    }

    pub fn window_bounds(&self, date: NaiveDate) -> Result<(DateTime<Utc>, DateTime<Utc>), ScheduleError> {
        let midnight = date.and_time(NaiveTime::MIN).and_utc();
        let offset = |minute: u32| {
            midnight
                .checked_add_signed(Duration::minutes(i64::from(minute)))
                .ok_or_else(|| {
                    ScheduleError::Validation(format!(
                        "schedule window on {} is outside the supported calendar range",
                        date
                    ))
                })
        };
        Ok((offset(self.window_start_minute)?, offset(self.window_end_minute)?))
    }

    /// Pixel block for one laid-out appointment, `None` if it falls outside the window.
    pub fn block_for<P>(
        &self,
        date: NaiveDate,
        positioned: &PositionedAppointment<P>,
    ) -> Result<Option<BlockGeometry>, ScheduleError> {
        let bounds = self.window_bounds(date)?;
        Ok(self.block_within(bounds, positioned))
    }

    fn block_within<P>(
        &self,
        (window_start, window_end): (DateTime<Utc>, DateTime<Utc>),
        positioned: &PositionedAppointment<P>,
    ) -> Option<BlockGeometry> {
        let appointment = &positioned.appointment;

        let visible_start = appointment.start.max(window_start);
        let visible_end = appointment.end.min(window_end);
        if visible_end <= visible_start {
            return None;
        }

        let offset_minutes = minutes_between(window_start, visible_start);
        let visible_minutes = minutes_between(visible_start, visible_end);
        let width_percent = 100.0 / positioned.overlap_group_size.max(1) as f64;

        Some(BlockGeometry {
            top: offset_minutes * self.pixels_per_minute,
            height: (visible_minutes * self.pixels_per_minute).max(self.min_block_height),
            left_percent: positioned.column_index as f64 * width_percent,
            width_percent,
        })
    }

    /// Total pixel height of the window.
    pub fn track_height(&self) -> f64 {
        f64::from(self.window_end_minute.saturating_sub(self.window_start_minute)) * self.pixels_per_minute
    }
}

/// Fills in `geometry` for every appointment of a laid-out day.
pub fn apply_geometry<P>(
    geometry: &ScheduleGeometry,
    date: NaiveDate,
    positioned: &mut [PositionedAppointment<P>],
) -> Result<(), ScheduleError> {
    geometry.validate()?;
    let bounds = geometry.window_bounds(date)?;

    let mut hidden = 0;
    for item in positioned.iter_mut() {
        item.geometry = geometry.block_within(bounds, item);
        if item.geometry.is_none() {
            hidden += 1;
        }
    }

    if hidden > 0 {
        debug!("{} appointment(s) fall outside the {} schedule window", hidden, date);
    }

    Ok(())
}

fn minutes_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_seconds() as f64 / 60.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScheduledAppointment;
    use assert_matches::assert_matches;
    use chrono::TimeZone;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 20).unwrap()
    }

    fn positioned(start: (u32, u32), end: (u32, u32), size: usize, column: usize) -> PositionedAppointment<()> {
        PositionedAppointment {
            appointment: ScheduledAppointment::new(
                "apt",
                Utc.with_ymd_and_hms(2025, 6, 20, start.0, start.1, 0).unwrap(),
                Utc.with_ymd_and_hms(2025, 6, 20, end.0, end.1, 0).unwrap(),
                (),
            ),
            overlap_group_size: size,
            column_index: column,
            geometry: None,
        }
    }

    fn geometry() -> ScheduleGeometry {
        ScheduleGeometry {
            window_start_minute: 8 * 60,
            window_end_minute: 18 * 60,
            pixels_per_minute: 2.0,
            min_block_height: 30.0,
        }
    }

    #[test]
    fn test_block_position_and_width() {
        let block = geometry().block_for(date(), &positioned((9, 0), (10, 0), 2, 1)).unwrap().unwrap();
        assert_eq!(block.top, 120.0);
        assert_eq!(block.height, 120.0);
        assert_eq!(block.width_percent, 50.0);
        assert_eq!(block.left_percent, 50.0);
    }

    #[test]
    fn test_short_block_gets_min_height() {
        let block = geometry().block_for(date(), &positioned((9, 0), (9, 5), 1, 0)).unwrap().unwrap();
        assert_eq!(block.height, 30.0);
    }

    #[test]
    fn test_block_clipped_to_window() {
        let block = geometry().block_for(date(), &positioned((7, 30), (8, 30), 1, 0)).unwrap().unwrap();
        assert_eq!(block.top, 0.0);
        assert_eq!(block.height, 60.0);

        assert!(geometry().block_for(date(), &positioned((18, 0), (19, 0), 1, 0)).unwrap().is_none());
    }

    #[test]
    fn test_invalid_geometry_rejected() {
        let mut bad = geometry();
        bad.window_end_minute = bad.window_start_minute;
        assert_matches!(bad.validate(), Err(ScheduleError::InvalidGeometry(_)));

        let mut bad = geometry();
        bad.pixels_per_minute = 0.0;
        assert_matches!(bad.validate(), Err(ScheduleError::InvalidGeometry(_)));

        let mut bad = geometry();
        bad.window_end_minute = 25 * 60;
        assert_matches!(bad.validate(), Err(ScheduleError::InvalidGeometry(_)));
    }

    #[test]
    fn test_apply_geometry_marks_hidden_blocks() {
        let mut items = vec![positioned((9, 0), (9, 30), 1, 0), positioned((20, 0), (21, 0), 1, 0)];
        apply_geometry(&geometry(), date(), &mut items).unwrap();
        assert!(items[0].geometry.is_some());
        assert!(items[1].geometry.is_none());
        assert_eq!(geometry().track_height(), 1200.0);
    }

    #[test]
    fn test_window_past_calendar_range_rejected() {
        let mut full_day = geometry();
        full_day.window_end_minute = 24 * 60;

        assert_matches!(full_day.window_bounds(NaiveDate::MAX), Err(ScheduleError::Validation(_)));

        let mut items = vec![positioned((9, 0), (9, 30), 1, 0)];
        assert_matches!(
            apply_geometry(&full_day, NaiveDate::MAX, &mut items),
            Err(ScheduleError::Validation(_))
        );
        assert!(items[0].geometry.is_none());
    }
}
