//! Condition sources feeding the factor resolver.
//!
//! A [`ConditionSource`] turns a location, a period of the day and a look-ahead
//! offset into discrete traffic, weather and demand levels. The shipped
//! [`SimulatedConditions`] source draws from per-city distributions with a
//! ChaCha8 generator seeded from a blake3 digest of its inputs, so the same
//! question always gets the same answer.

use rand::distributions::{Distribution, WeightedIndex};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::domain::factors::{DemandLevel, TrafficLevel, WeatherCondition};
use crate::domain::trip::{Location, TimeOfDay};
use crate::errors::ResolutionError;

/// Chance that a look-ahead traffic reading drifts one level up or down.
pub const TRAFFIC_DRIFT_PROBABILITY: f64 = 0.3;
/// Chance that weather changes for look-aheads of an hour or more.
pub const WEATHER_DRIFT_PROBABILITY: f64 = 0.4;
pub const WEATHER_DRIFT_MIN_OFFSET: u32 = 60;
pub const DEMAND_JITTER: i32 = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conditions {
    pub traffic: TrafficLevel,
    pub weather: WeatherCondition,
    pub demand: DemandLevel,
}

pub trait ConditionSource: Send + Sync {
    fn conditions(
        &self,
        location: &Location,
        period: TimeOfDay,
        offset_minutes: u32,
    ) -> Result<Conditions, ResolutionError>;
}

impl<T: ConditionSource + ?Sized> ConditionSource for std::sync::Arc<T> {
    fn conditions(
        &self,
        location: &Location,
        period: TimeOfDay,
        offset_minutes: u32,
    ) -> Result<Conditions, ResolutionError> {
        (**self).conditions(location, period, offset_minutes)
    }
}

/// Weights are percentages in `TrafficLevel::ALL` / `WeatherCondition::ALL`
/// order; traffic rows follow `TimeOfDay::ALL`.
struct CityPattern {
    key: &'static str,
    traffic: [[u32; 4]; 6],
    weather: [u32; 5],
}

const DEFAULT_PATTERN: CityPattern = CityPattern {
    key: "default",
    traffic: [
        [70, 25, 5, 0],
        [5, 20, 50, 25],
        [20, 50, 25, 5],
        [5, 20, 50, 25],
        [30, 45, 20, 5],
        [75, 20, 5, 0],
    ],
    weather: [50, 25, 15, 5, 5],
};

const CITY_PATTERNS: &[CityPattern] = &[
    CityPattern {
        key: "new york",
        traffic: [
            [70, 25, 5, 0],
            [5, 15, 50, 30],
            [20, 50, 25, 5],
            [5, 15, 55, 25],
            [30, 45, 20, 5],
            [75, 20, 5, 0],
        ],
        weather: [40, 30, 20, 5, 5],
    },
    CityPattern {
        key: "los angeles",
        traffic: [
            [60, 30, 10, 0],
            [0, 10, 55, 35],
            [10, 40, 35, 15],
            [0, 10, 50, 40],
            [20, 45, 30, 5],
            [70, 25, 5, 0],
        ],
        weather: [75, 20, 4, 0, 1],
    },
    CityPattern {
        key: "chicago",
        traffic: [
            [75, 20, 5, 0],
            [10, 25, 45, 20],
            [25, 45, 25, 5],
            [5, 20, 50, 25],
            [35, 40, 20, 5],
            [80, 15, 5, 0],
        ],
        weather: [35, 30, 20, 10, 5],
    },
];

fn pattern_for(location: &Location) -> &'static CityPattern {
    match location {
        Location::Named(_) => {
            let key = location.seed_key();
            CITY_PATTERNS.iter().find(|pattern| pattern.key == key).unwrap_or(&DEFAULT_PATTERN)
        }
        Location::Coordinates { .. } => &DEFAULT_PATTERN,
    }
}

fn period_row(period: TimeOfDay) -> usize {
    TimeOfDay::ALL.iter().position(|candidate| *candidate == period).unwrap_or(2)
}

fn demand_base_score(period: TimeOfDay) -> i32 {
    match period {
        TimeOfDay::EarlyMorning => 30,
        TimeOfDay::MorningRush => 80,
        TimeOfDay::Midday => 50,
        TimeOfDay::EveningRush => 85,
        TimeOfDay::Evening => 65,
        TimeOfDay::Night => 40,
    }
}

fn traffic_score(traffic: TrafficLevel) -> i32 {
    match traffic {
        TrafficLevel::Low => 0,
        TrafficLevel::Moderate => 10,
        TrafficLevel::Heavy => 25,
        TrafficLevel::Extreme => 40,
    }
}

fn weather_score(weather: WeatherCondition) -> i32 {
    match weather {
        WeatherCondition::Clear => 0,
        WeatherCondition::Cloudy => 5,
        WeatherCondition::Rain => 15,
        WeatherCondition::Snow => 25,
        WeatherCondition::Storm => 35,
    }
}

pub fn validate_location(location: &Location) -> Result<(), ResolutionError> {
    match location {
        Location::Named(name) if name.trim().is_empty() => Err(ResolutionError::BlankLocation),
        Location::Named(_) => Ok(()),
        Location::Coordinates { lat, lng } => {
            let in_range = lat.is_finite()
                && lng.is_finite()
                && (-90.0..=90.0).contains(lat)
                && (-180.0..=180.0).contains(lng);
            if in_range {
                Ok(())
            } else {
                Err(ResolutionError::CoordinatesOutOfRange { lat: *lat, lng: *lng })
            }
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct SimulatedConditions {
    seed: u64,
}

impl SimulatedConditions {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    fn rng(&self, location: &Location, stream: &str, period: &str, offset: u32) -> ChaCha8Rng {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.seed.to_le_bytes());
        for part in [location.seed_key().as_str(), stream, period] {
            hasher.update(part.as_bytes());
            hasher.update(&[0]);
        }
        hasher.update(&offset.to_le_bytes());
        ChaCha8Rng::from_seed(*hasher.finalize().as_bytes())
    }

    fn traffic(
        &self,
        location: &Location,
        pattern: &CityPattern,
        period: TimeOfDay,
        offset: u32,
    ) -> Result<TrafficLevel, ResolutionError> {
        let mut rng = self.rng(location, "traffic", period.as_str(), offset);
        let drawn = pick(location, &mut rng, &TrafficLevel::ALL, &pattern.traffic[period_row(period)])?;

        if offset == 0 || !rng.gen_bool(TRAFFIC_DRIFT_PROBABILITY) {
            return Ok(drawn);
        }

        let index = TrafficLevel::ALL.iter().position(|level| *level == drawn).unwrap_or(0);
        let shifted = if rng.gen_bool(0.5) {
            index.saturating_sub(1)
        } else {
            (index + 1).min(TrafficLevel::ALL.len() - 1)
        };
        Ok(TrafficLevel::ALL[shifted])
    }

    fn weather(
        &self,
        location: &Location,
        pattern: &CityPattern,
        offset: u32,
    ) -> Result<WeatherCondition, ResolutionError> {
        let mut rng = self.rng(location, "weather", "current", 0);
        let current = pick(location, &mut rng, &WeatherCondition::ALL, &pattern.weather)?;

        if offset < WEATHER_DRIFT_MIN_OFFSET {
            return Ok(current);
        }

        let mut rng = self.rng(location, "weather", "forecast", offset);
        if !rng.gen_bool(WEATHER_DRIFT_PROBABILITY) {
            return Ok(current);
        }

        let (options, weights): (Vec<_>, Vec<_>) = WeatherCondition::ALL
            .into_iter()
            .zip(pattern.weather)
            .filter(|(condition, weight)| *condition != current && *weight > 0)
            .unzip();
        if options.is_empty() {
            return Ok(current);
        }
        pick(location, &mut rng, &options, &weights)
    }
}

fn pick<T: Copy>(
    location: &Location,
    rng: &mut ChaCha8Rng,
    options: &[T],
    weights: &[u32],
) -> Result<T, ResolutionError> {
    let distribution = WeightedIndex::new(weights).map_err(|error| ResolutionError::Source {
        location: location.to_string(),
        message: format!("invalid condition distribution: {error}"),
    })?;
    Ok(options[distribution.sample(rng)])
}

impl ConditionSource for SimulatedConditions {
    fn conditions(
        &self,
        location: &Location,
        period: TimeOfDay,
        offset_minutes: u32,
    ) -> Result<Conditions, ResolutionError> {
        validate_location(location)?;
        let pattern = pattern_for(location);

        let traffic = self.traffic(location, pattern, period, offset_minutes)?;
        let weather = self.weather(location, pattern, offset_minutes)?;

        let jitter = self
            .rng(location, "demand", period.as_str(), offset_minutes)
            .gen_range(-DEMAND_JITTER..=DEMAND_JITTER);
        let score =
            demand_base_score(period) + traffic_score(traffic) + weather_score(weather) + jitter;

        Ok(Conditions { traffic, weather, demand: DemandLevel::from_score(score) })
    }
}
