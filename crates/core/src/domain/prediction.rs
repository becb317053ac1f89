use serde::{Deserialize, Serialize};

use crate::domain::factors::{TrafficLevel, WeatherCondition};
use crate::domain::trip::TimeOfDay;
use crate::errors::DomainError;

pub const DEFAULT_HORIZON_MINUTES: u32 = 60;
pub const DEFAULT_STEP_MINUTES: u32 = 15;
pub const MAX_HORIZON_MINUTES: u32 = 24 * 60;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Horizon {
    pub horizon_minutes: u32,
    pub step_minutes: u32,
}

impl Default for Horizon {
    fn default() -> Self {
        Self { horizon_minutes: DEFAULT_HORIZON_MINUTES, step_minutes: DEFAULT_STEP_MINUTES }
    }
}

impl Horizon {
    pub fn new(horizon_minutes: u32, step_minutes: u32) -> Result<Self, DomainError> {
        if step_minutes == 0 {
            return Err(DomainError::invalid_input(
                "step_minutes",
                "step_minutes must be greater than zero",
            ));
        }
        if horizon_minutes == 0 || horizon_minutes > MAX_HORIZON_MINUTES {
            return Err(DomainError::invalid_input(
                "time_offset_minutes",
                format!("horizon must be in range 1..={MAX_HORIZON_MINUTES} minutes"),
            ));
        }
        if step_minutes > horizon_minutes {
            return Err(DomainError::invalid_input(
                "step_minutes",
                format!("step_minutes ({step_minutes}) must not exceed the horizon ({horizon_minutes})"),
            ));
        }
        Ok(Self { horizon_minutes, step_minutes })
    }

    /// Offsets `step, 2*step, ...` up to and including the horizon;
    /// `horizon / step` entries.
    pub fn offsets(&self) -> impl Iterator<Item = u32> {
        let step = self.step_minutes.max(1);
        (1..=self.horizon_minutes / step).map(move |index| index * step)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PredictionPoint {
    pub time_offset_minutes: u32,
    pub fare: f64,
    pub change_percentage: f64,
    pub time_of_day: TimeOfDay,
    pub traffic: TrafficLevel,
    pub weather: WeatherCondition,
}

#[cfg(test)]
mod tests {
    use super::Horizon;
    use crate::errors::DomainError;

    #[test]
    fn default_horizon_yields_four_quarter_hour_offsets() {
        let offsets = Horizon::default().offsets().collect::<Vec<_>>();
        assert_eq!(offsets, vec![15, 30, 45, 60]);
    }

    #[test]
    fn step_longer_than_horizon_is_invalid_input() {
        let error = Horizon::new(10, 15).expect_err("step past horizon");
        assert!(matches!(error, DomainError::InvalidInput { ref field, .. } if field == "step_minutes"));
        assert_eq!(Horizon::new(15, 15).expect("equal step").offsets().count(), 1);
    }

    #[test]
    fn zero_step_is_invalid_input() {
        assert!(Horizon::new(60, 0).is_err());
        assert!(Horizon::new(0, 15).is_err());
        assert!(Horizon::new(24 * 60 + 1, 15).is_err());
    }
}
