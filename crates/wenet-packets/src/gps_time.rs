//! GPS time and receiver state codes.

use std::fmt;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::ser::{Serialize, SerializeStruct, Serializer};

/// GPS week / time-of-week / leap-second triple as sent by the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GpsTime {
    /// Weeks since the GPS epoch.
    pub week: u16,
    /// Time of week, milliseconds.
    pub itow_ms: u32,
    /// GPS-UTC offset, seconds.
    pub leap_seconds: u8,
}

impl GpsTime {
    pub fn new(week: u16, itow_ms: u32, leap_seconds: u8) -> Self {
        Self {
            week,
            itow_ms,
            leap_seconds,
        }
    }

    /// 1980-01-06T00:00:00.
    pub fn epoch() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(1980, 1, 6)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .unwrap_or_default()
    }

    /// Time of week in seconds.
    pub fn itow_seconds(&self) -> f64 {
        f64::from(self.itow_ms) / 1000.0
    }

    /// UTC time: epoch + week·7 days + time-of-week − leap seconds.
    pub fn to_utc(&self) -> NaiveDateTime {
        Self::epoch() + Duration::days(i64::from(self.week) * 7)
            + Duration::milliseconds(i64::from(self.itow_ms))
            - Duration::seconds(i64::from(self.leap_seconds))
    }
}

impl Serialize for GpsTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("GpsTime", 4)?;
        state.serialize_field("week", &self.week)?;
        state.serialize_field("iTOW", &self.itow_seconds())?;
        state.serialize_field("leapS", &self.leap_seconds)?;
        state.serialize_field("timestamp", &self.to_utc().format("%Y-%m-%dT%H:%M:%S%.f").to_string())?;
        state.end()
    }
}

/// u-blox fix type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixState {
    NoFix,
    Fix2D,
    Fix3D,
    TimeOnly,
    Other(u8),
}

impl FixState {
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => Self::NoFix,
            2 => Self::Fix2D,
            3 => Self::Fix3D,
            5 => Self::TimeOnly,
            other => Self::Other(other),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::NoFix => 0,
            Self::Fix2D => 2,
            Self::Fix3D => 3,
            Self::TimeOnly => 5,
            Self::Other(code) => code,
        }
    }
}

impl fmt::Display for FixState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoFix => write!(f, "No Fix"),
            Self::Fix2D => write!(f, "2D Fix"),
            Self::Fix3D => write!(f, "3D Fix"),
            Self::TimeOnly => write!(f, "Time Only"),
            Self::Other(code) => write!(f, "Unknown ({code})"),
        }
    }
}

/// u-blox navigation dynamic model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DynamicModel {
    Portable,
    NotUsed,
    Stationary,
    Pedestrian,
    Automotive,
    Sea,
    Airborne1G,
    Airborne2G,
    Airborne4G,
    Other(u8),
}

impl DynamicModel {
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => Self::Portable,
            1 => Self::NotUsed,
            2 => Self::Stationary,
            3 => Self::Pedestrian,
            4 => Self::Automotive,
            5 => Self::Sea,
            6 => Self::Airborne1G,
            7 => Self::Airborne2G,
            8 => Self::Airborne4G,
            other => Self::Other(other),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::Portable => 0,
            Self::NotUsed => 1,
            Self::Stationary => 2,
            Self::Pedestrian => 3,
            Self::Automotive => 4,
            Self::Sea => 5,
            Self::Airborne1G => 6,
            Self::Airborne2G => 7,
            Self::Airborne4G => 8,
            Self::Other(code) => code,
        }
    }
}

impl fmt::Display for DynamicModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Portable => "Portable",
            Self::NotUsed => "Not Used",
            Self::Stationary => "Stationary",
            Self::Pedestrian => "Pedestrian",
            Self::Automotive => "Automotive",
            Self::Sea => "Sea",
            Self::Airborne1G => "Airborne 1G",
            Self::Airborne2G => "Airborne 2G",
            Self::Airborne4G => "Airborne 4G",
            Self::Other(_) => "Unknown",
        };
        f.write_str(name)
    }
}

impl Serialize for FixState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl Serialize for DynamicModel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_week_and_time_of_week_to_utc() {
        let time = GpsTime::new(2290, 200_000, 18);
        let expected = NaiveDate::from_ymd_opt(2023, 11, 26)
            .unwrap()
            .and_hms_opt(0, 3, 2)
            .unwrap();

        assert_eq!(time.to_utc(), expected);
        assert_eq!(
            time.to_utc(),
            GpsTime::epoch() + Duration::days(2290 * 7) + Duration::seconds(200)
                - Duration::seconds(18)
        );
    }

    #[test]
    fn keeps_millisecond_precision() {
        let time = GpsTime::new(0, 1_500, 0);
        assert_eq!(time.to_utc(), GpsTime::epoch() + Duration::milliseconds(1_500));
        assert_eq!(time.itow_seconds(), 1.5);
    }

    #[test]
    fn fix_state_names() {
        assert_eq!(FixState::from_code(3).to_string(), "3D Fix");
        assert_eq!(FixState::from_code(5).to_string(), "Time Only");
        assert_eq!(FixState::from_code(4).to_string(), "Unknown (4)");
        assert_eq!(FixState::from_code(4).code(), 4);
    }

    #[test]
    fn dynamic_model_names() {
        assert_eq!(DynamicModel::from_code(6).to_string(), "Airborne 1G");
        assert_eq!(DynamicModel::from_code(1).to_string(), "Not Used");
        assert_eq!(DynamicModel::from_code(42).to_string(), "Unknown");
        assert_eq!(DynamicModel::from_code(42).code(), 42);
    }
}
