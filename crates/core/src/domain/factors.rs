use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::trip::{TimeOfDay, VehicleClass};

pub const DEFAULT_MODIFIER_FLOOR: f64 = 0.8;
pub const DEFAULT_MODIFIER_CEILING: f64 = 2.0;
pub const DEFAULT_ECO_DISCOUNT: f64 = 0.10;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrafficLevel {
    Low,
    Moderate,
    Heavy,
    Extreme,
}

impl TrafficLevel {
    pub const ALL: [TrafficLevel; 4] =
        [TrafficLevel::Low, TrafficLevel::Moderate, TrafficLevel::Heavy, TrafficLevel::Extreme];

    pub fn base_modifier(&self) -> f64 {
        match self {
            Self::Low => 1.0,
            Self::Moderate => 1.2,
            Self::Heavy => 1.5,
            Self::Extreme => 1.8,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::Heavy => "heavy",
            Self::Extreme => "extreme",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    Clear,
    Cloudy,
    Rain,
    Snow,
    Storm,
}

impl WeatherCondition {
    pub const ALL: [WeatherCondition; 5] = [
        WeatherCondition::Clear,
        WeatherCondition::Cloudy,
        WeatherCondition::Rain,
        WeatherCondition::Snow,
        WeatherCondition::Storm,
    ];

    pub fn base_modifier(&self) -> f64 {
        match self {
            Self::Clear => 1.0,
            Self::Cloudy => 1.05,
            Self::Rain => 1.2,
            Self::Snow => 1.4,
            Self::Storm => 1.6,
        }
    }

    pub fn is_adverse(&self) -> bool {
        matches!(self, Self::Rain | Self::Snow | Self::Storm)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clear => "clear",
            Self::Cloudy => "cloudy",
            Self::Rain => "rain",
            Self::Snow => "snow",
            Self::Storm => "storm",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DemandLevel {
    VeryLow,
    Low,
    Normal,
    High,
    VeryHigh,
    Extreme,
}

impl DemandLevel {
    pub fn base_modifier(&self) -> f64 {
        match self {
            Self::VeryLow => 0.8,
            Self::Low => 0.9,
            Self::Normal => 1.0,
            Self::High => 1.3,
            Self::VeryHigh => 1.8,
            Self::Extreme => 2.5,
        }
    }

    /// Bands a demand score: `<30 very_low, <50 low, <70 normal, <85 high,
    /// <100 very_high`, anything above is `extreme`.
    pub fn from_score(score: i32) -> Self {
        match score {
            i32::MIN..=29 => Self::VeryLow,
            30..=49 => Self::Low,
            50..=69 => Self::Normal,
            70..=84 => Self::High,
            85..=99 => Self::VeryHigh,
            _ => Self::Extreme,
        }
    }

    pub fn is_surging(&self) -> bool {
        matches!(self, Self::VeryHigh | Self::Extreme)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VeryLow => "very_low",
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
            Self::VeryHigh => "very_high",
            Self::Extreme => "extreme",
        }
    }
}

impl TimeOfDay {
    pub fn base_modifier(&self) -> f64 {
        match self {
            Self::EarlyMorning => 1.1,
            Self::MorningRush => 1.5,
            Self::Midday => 1.0,
            Self::EveningRush => 1.5,
            Self::Evening => 1.2,
            Self::Night => 1.3,
        }
    }
}

macro_rules! display_via_as_str {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

display_via_as_str!(TrafficLevel, WeatherCondition, DemandLevel);

/// Display band for any condition/modifier pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Moderate,
    High,
    Extreme,
}

impl Severity {
    /// `<= 1.05 low`, `<= 1.20 moderate`, `<= 1.50 high`, else `extreme`.
    pub fn classify(modifier: f64) -> Self {
        if modifier <= 1.05 {
            Self::Low
        } else if modifier <= 1.20 {
            Self::Moderate
        } else if modifier <= 1.50 {
            Self::High
        } else {
            Self::Extreme
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
            Self::Extreme => "extreme",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModifierBounds {
    pub floor: f64,
    pub ceiling: f64,
}

impl Default for ModifierBounds {
    fn default() -> Self {
        Self { floor: DEFAULT_MODIFIER_FLOOR, ceiling: DEFAULT_MODIFIER_CEILING }
    }
}

impl ModifierBounds {
    pub fn clamp(&self, modifier: f64) -> f64 {
        modifier.clamp(self.floor, self.ceiling)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Factor<C> {
    pub condition: C,
    pub modifier: f64,
}

impl<C> Factor<C> {
    pub fn new(condition: C, modifier: f64) -> Self {
        Self { condition, modifier }
    }

    pub fn severity(&self) -> Severity {
        Severity::classify(self.modifier)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FactorSet {
    pub traffic: Factor<TrafficLevel>,
    pub weather: Factor<WeatherCondition>,
    pub time: Factor<TimeOfDay>,
    pub demand: Factor<DemandLevel>,
    pub eco_discount: f64,
}

impl FactorSet {
    /// Product of the four modifiers, before the eco discount.
    pub fn combined_multiplier(&self) -> f64 {
        self.traffic.modifier * self.weather.modifier * self.time.modifier * self.demand.modifier
    }

    pub fn discount_factor(&self) -> f64 {
        1.0 - self.eco_discount
    }

    /// Neutral conditions substituted when a location cannot be resolved:
    /// low traffic, clear weather and normal demand, all at 1.0. The time
    /// factor still follows the period and the eco discount still follows
    /// the vehicle class.
    pub fn fallback(
        time_of_day: TimeOfDay,
        vehicle_class: VehicleClass,
        bounds: ModifierBounds,
        eco_discount: f64,
    ) -> Self {
        Self {
            traffic: Factor::new(TrafficLevel::Low, bounds.clamp(TrafficLevel::Low.base_modifier())),
            weather: Factor::new(
                WeatherCondition::Clear,
                bounds.clamp(WeatherCondition::Clear.base_modifier()),
            ),
            time: Factor::new(time_of_day, bounds.clamp(time_of_day.base_modifier())),
            demand: Factor::new(
                DemandLevel::Normal,
                bounds.clamp(DemandLevel::Normal.base_modifier()),
            ),
            eco_discount: if vehicle_class.is_electric() { eco_discount } else { 0.0 },
        }
    }
}
