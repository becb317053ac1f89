use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

pub const MINUTES_PER_DAY: u32 = 24 * 60;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VehicleClass {
    #[serde(alias = "sedan")]
    Sedan,
    #[serde(rename = "SUV", alias = "suv", alias = "Suv")]
    Suv,
    #[serde(alias = "electric")]
    Electric,
    #[serde(alias = "luxury")]
    Luxury,
}

impl VehicleClass {
    pub const ALL: [VehicleClass; 4] =
        [VehicleClass::Sedan, VehicleClass::Suv, VehicleClass::Electric, VehicleClass::Luxury];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sedan => "Sedan",
            Self::Suv => "SUV",
            Self::Electric => "Electric",
            Self::Luxury => "Luxury",
        }
    }

    pub fn is_electric(&self) -> bool {
        matches!(self, Self::Electric)
    }
}

impl fmt::Display for VehicleClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VehicleClass {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sedan" => Ok(Self::Sedan),
            "suv" => Ok(Self::Suv),
            "electric" => Ok(Self::Electric),
            "luxury" => Ok(Self::Luxury),
            other => Err(DomainError::invalid_input(
                "taxi_type",
                format!("unsupported vehicle class `{other}` (expected sedan|suv|electric|luxury)"),
            )),
        }
    }
}

/// Named periods of the day. Each period owns a clock window and an anchor
/// minute (the window midpoint) used when projecting into the future.
///
/// | period        | window        | anchor |
/// |---------------|---------------|--------|
/// | early_morning | 05:00 - 07:00 | 06:00  |
/// | morning_rush  | 07:00 - 09:00 | 08:00  |
/// | midday        | 09:00 - 16:00 | 12:30  |
/// | evening_rush  | 16:00 - 19:00 | 17:30  |
/// | evening       | 19:00 - 22:00 | 20:30  |
/// | night         | 22:00 - 05:00 | 01:30  |
///
/// With the default 15 minute step and 60 minute horizon this rolls
/// `morning_rush` into `midday` and `early_morning` into `morning_rush` at
/// the 60 minute offset; every other period stays put for the hour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeOfDay {
    EarlyMorning,
    MorningRush,
    #[serde(alias = "day")]
    Midday,
    EveningRush,
    Evening,
    Night,
}

impl TimeOfDay {
    pub const ALL: [TimeOfDay; 6] = [
        TimeOfDay::EarlyMorning,
        TimeOfDay::MorningRush,
        TimeOfDay::Midday,
        TimeOfDay::EveningRush,
        TimeOfDay::Evening,
        TimeOfDay::Night,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EarlyMorning => "early_morning",
            Self::MorningRush => "morning_rush",
            Self::Midday => "midday",
            Self::EveningRush => "evening_rush",
            Self::Evening => "evening",
            Self::Night => "night",
        }
    }

    pub fn is_rush(&self) -> bool {
        matches!(self, Self::MorningRush | Self::EveningRush)
    }

    /// Window start minute (inclusive) and end minute (exclusive), measured
    /// from midnight. Night wraps, so its start is greater than its end.
    pub fn window(&self) -> (u32, u32) {
        match self {
            Self::EarlyMorning => (5 * 60, 7 * 60),
            Self::MorningRush => (7 * 60, 9 * 60),
            Self::Midday => (9 * 60, 16 * 60),
            Self::EveningRush => (16 * 60, 19 * 60),
            Self::Evening => (19 * 60, 22 * 60),
            Self::Night => (22 * 60, 5 * 60),
        }
    }

    pub fn anchor_minute(&self) -> u32 {
        match self {
            Self::EarlyMorning => 6 * 60,
            Self::MorningRush => 8 * 60,
            Self::Midday => 12 * 60 + 30,
            Self::EveningRush => 17 * 60 + 30,
            Self::Evening => 20 * 60 + 30,
            Self::Night => 60 + 30,
        }
    }

    pub fn from_minute_of_day(minute: u32) -> Self {
        let minute = minute % MINUTES_PER_DAY;
        Self::ALL
            .into_iter()
            .find(|period| {
                let (start, end) = period.window();
                if start < end {
                    (start..end).contains(&minute)
                } else {
                    minute >= start || minute < end
                }
            })
            .unwrap_or(Self::Night)
    }

    pub fn from_hour(hour: u32) -> Self {
        Self::from_minute_of_day(hour * 60)
    }

    pub fn shifted(&self, offset_minutes: u32) -> Self {
        Self::from_minute_of_day(self.anchor_minute() + offset_minutes % MINUTES_PER_DAY)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeOfDay {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "early_morning" => Ok(Self::EarlyMorning),
            "morning_rush" => Ok(Self::MorningRush),
            "midday" | "day" => Ok(Self::Midday),
            "evening_rush" => Ok(Self::EveningRush),
            "evening" => Ok(Self::Evening),
            "night" => Ok(Self::Night),
            other => Err(DomainError::invalid_input(
                "time_of_day",
                format!("unsupported time of day `{other}`"),
            )),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Usd,
    Eur,
    Gbp,
    Jpy,
    Cad,
    Aud,
    Cny,
    Inr,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Usd => "USD",
            Self::Eur => "EUR",
            Self::Gbp => "GBP",
            Self::Jpy => "JPY",
            Self::Cad => "CAD",
            Self::Aud => "AUD",
            Self::Cny => "CNY",
            Self::Inr => "INR",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Usd => "$",
            Self::Eur => "€",
            Self::Gbp => "£",
            Self::Jpy | Self::Cny => "¥",
            Self::Cad => "C$",
            Self::Aud => "A$",
            Self::Inr => "₹",
        }
    }

    /// Units of this currency per US dollar. Rate tables are quoted in USD.
    pub fn exchange_rate(&self) -> f64 {
        match self {
            Self::Usd => 1.0,
            Self::Eur => 0.85,
            Self::Gbp => 0.73,
            Self::Jpy => 110.0,
            Self::Cad => 1.25,
            Self::Aud => 1.35,
            Self::Cny => 6.45,
            Self::Inr => 74.5,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "USD" => Ok(Self::Usd),
            "EUR" => Ok(Self::Eur),
            "GBP" => Ok(Self::Gbp),
            "JPY" => Ok(Self::Jpy),
            "CAD" => Ok(Self::Cad),
            "AUD" => Ok(Self::Aud),
            "CNY" => Ok(Self::Cny),
            "INR" => Ok(Self::Inr),
            other => Err(DomainError::invalid_input(
                "currency",
                format!("unsupported currency `{other}`"),
            )),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Location {
    Coordinates { lat: f64, lng: f64 },
    Named(String),
}

impl Location {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// Stable key used to seed simulated conditions. Coordinates are snapped
    /// to roughly one kilometre so neighbouring pins share conditions.
    pub fn seed_key(&self) -> String {
        match self {
            Self::Named(name) => name.trim().to_ascii_lowercase(),
            Self::Coordinates { lat, lng } => format!("{lat:.2},{lng:.2}"),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::Coordinates { lat, lng } => write!(f, "{lat:.5},{lng:.5}"),
        }
    }
}

impl FromStr for Location {
    type Err = DomainError;

    /// Accepts `"lat,lng"` pairs as coordinates and anything else as a name.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if let Some((lat, lng)) = value.split_once(',') {
            if let (Ok(lat), Ok(lng)) = (lat.trim().parse::<f64>(), lng.trim().parse::<f64>()) {
                return Ok(Self::Coordinates { lat, lng });
            }
        }
        Ok(Self::Named(value.trim().to_string()))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TripRequest {
    pub distance_km: f64,
    pub duration_min: f64,
    pub vehicle_class: VehicleClass,
    pub location: Location,
    pub time_of_day: TimeOfDay,
    pub currency: Currency,
    pub passenger_count: u32,
}

impl TripRequest {
    pub fn new(
        distance_km: f64,
        duration_min: f64,
        vehicle_class: VehicleClass,
        location: Location,
        time_of_day: TimeOfDay,
    ) -> Self {
        Self {
            distance_km,
            duration_min,
            vehicle_class,
            location,
            time_of_day,
            currency: Currency::default(),
            passenger_count: 1,
        }
    }

    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.currency = currency;
        self
    }

    pub fn with_passengers(mut self, passenger_count: u32) -> Self {
        self.passenger_count = passenger_count;
        self
    }

    pub fn with_time_of_day(&self, time_of_day: TimeOfDay) -> Self {
        Self { time_of_day, ..self.clone() }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        validate_non_negative("distance_km", self.distance_km)?;
        validate_non_negative("duration_min", self.duration_min)?;
        if self.passenger_count == 0 {
            return Err(DomainError::invalid_input(
                "passenger_count",
                "passenger_count must be at least 1",
            ));
        }
        Ok(())
    }
}

fn validate_non_negative(field: &'static str, value: f64) -> Result<(), DomainError> {
    if !value.is_finite() {
        return Err(DomainError::invalid_input(field, format!("{field} must be a finite number")));
    }
    if value < 0.0 {
        return Err(DomainError::invalid_input(field, format!("{field} must not be negative")));
    }
    Ok(())
}
