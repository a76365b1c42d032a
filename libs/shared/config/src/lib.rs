use std::env;
use std::str::FromStr;
use tracing::warn;

/// Default rendering window used when a caller asks for geometry without
/// supplying its own. Minutes are measured from midnight UTC of the day.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleWindowDefaults {
    pub window_start_minute: u32,
    pub window_end_minute: u32,
    pub pixels_per_minute: f64,
    pub min_block_height: f64,
}

impl Default for ScheduleWindowDefaults {
    fn default() -> Self {
        Self {
            window_start_minute: 8 * 60,
            window_end_minute: 20 * 60,
            pixels_per_minute: 1.0,
            min_block_height: 20.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub port: u16,
    pub schedule_window: ScheduleWindowDefaults,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = ScheduleWindowDefaults::default();

        let start_hour: u32 = parse_var("SCHEDULE_WINDOW_START_HOUR", defaults.window_start_minute / 60);
        let end_hour: u32 = parse_var("SCHEDULE_WINDOW_END_HOUR", defaults.window_end_minute / 60);
        let (window_start_minute, window_end_minute) = window_minutes(start_hour, end_hour, &defaults);

        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            port: parse_var("PORT", 3000),
            schedule_window: ScheduleWindowDefaults {
                window_start_minute,
                window_end_minute,
                pixels_per_minute: parse_var("SCHEDULE_PIXELS_PER_MINUTE", defaults.pixels_per_minute),
                min_block_height: parse_var("SCHEDULE_MIN_BLOCK_HEIGHT", defaults.min_block_height),
            },
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_anon_key.is_empty()
    }
}

/// Converts the configured window hours to minutes from midnight. Hours past
/// 24, or an end that is not after the start, fall back to the defaults.
fn window_minutes(start_hour: u32, end_hour: u32, defaults: &ScheduleWindowDefaults) -> (u32, u32) {
    let start = hour_to_minute("SCHEDULE_WINDOW_START_HOUR", start_hour, defaults.window_start_minute);
    let end = hour_to_minute("SCHEDULE_WINDOW_END_HOUR", end_hour, defaults.window_end_minute);

    if end <= start {
        warn!("Schedule window end ({}) is not after start ({}), using default window", end, start);
        return (defaults.window_start_minute, defaults.window_end_minute);
    }
    (start, end)
}

fn hour_to_minute(key: &str, hour: u32, default_minute: u32) -> u32 {
    match hour.checked_mul(60).filter(|_| hour <= 24) {
        Some(minute) => minute,
        None => {
            warn!("{} has out-of-range hour {}, using default {}", key, hour, default_minute / 60);
            default_minute
        }
    }
}

fn parse_var<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using default {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}
