use std::env;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_port: u16,
    pub slot_start_hour: u32,
    pub slot_end_hour: u32,
    pub slot_interval_minutes: u32,
    pub default_duration_minutes: i32,
    pub default_clinic_offset_minutes: i32,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            bind_port: parse_env("CLINIC_API_PORT", 3000),
            slot_start_hour: parse_env("SLOT_GRID_START_HOUR", 8),
            slot_end_hour: parse_env("SLOT_GRID_END_HOUR", 20),
            slot_interval_minutes: parse_env("SLOT_GRID_INTERVAL_MINUTES", 30),
            default_duration_minutes: parse_env("DEFAULT_APPOINTMENT_DURATION_MINUTES", 30),
            default_clinic_offset_minutes: parse_env("DEFAULT_CLINIC_UTC_OFFSET_MINUTES", 0),
        };

        if !config.is_valid() {
            warn!("Slot grid configuration is inconsistent, falling back to defaults");
            return Self::default();
        }

        config
    }

    pub fn is_valid(&self) -> bool {
        self.slot_start_hour < self.slot_end_hour
            && self.slot_end_hour <= 24
            && self.slot_interval_minutes > 0
            && self.slot_interval_minutes <= 240
            && self.default_duration_minutes > 0
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_port: 3000,
            slot_start_hour: 8,
            slot_end_hour: 20,
            slot_interval_minutes: 30,
            default_duration_minutes: 30,
            default_clinic_offset_minutes: 0,
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} has an unparseable value, using default", name);
            default
        }),
        Err(_) => default,
    }
}
