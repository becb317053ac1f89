use serde::{Deserialize, Serialize};

use crate::domain::trip::{Currency, VehicleClass};

pub const MAX_BILLED_PASSENGERS: u32 = 5;
pub const QUICK_ESTIMATE_SPREAD: f64 = 0.10;

/// Per-class tariff, quoted in USD.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RateCard {
    pub base: f64,
    pub per_km: f64,
    pub per_min: f64,
}

impl RateCard {
    pub const fn new(base: f64, per_km: f64, per_min: f64) -> Self {
        Self { base, per_km, per_min }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    pub sedan: RateCard,
    pub suv: RateCard,
    pub electric: RateCard,
    pub luxury: RateCard,
}

impl Default for RateTable {
    fn default() -> Self {
        Self {
            sedan: RateCard::new(2.50, 1.50, 0.35),
            suv: RateCard::new(3.50, 2.00, 0.45),
            electric: RateCard::new(3.00, 1.60, 0.40),
            luxury: RateCard::new(5.00, 2.80, 0.60),
        }
    }
}

impl RateTable {
    pub fn card(&self, class: VehicleClass) -> &RateCard {
        match class {
            VehicleClass::Sedan => &self.sedan,
            VehicleClass::Suv => &self.suv,
            VehicleClass::Electric => &self.electric,
            VehicleClass::Luxury => &self.luxury,
        }
    }

    pub fn card_mut(&mut self, class: VehicleClass) -> &mut RateCard {
        match class {
            VehicleClass::Sedan => &mut self.sedan,
            VehicleClass::Suv => &mut self.suv,
            VehicleClass::Electric => &mut self.electric,
            VehicleClass::Luxury => &mut self.luxury,
        }
    }

    pub fn with_card(mut self, class: VehicleClass, card: RateCard) -> Self {
        *self.card_mut(class) = card;
        self
    }
}

/// Which fare formula variant the calculator runs.
///
/// `Detailed` bills a single passenger and backs the full estimator.
/// `Quick` scales the adjusted fare by `min(passenger_count, 5)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FareMode {
    #[default]
    Detailed,
    Quick,
}

impl FareMode {
    pub fn billed_passengers(&self, passenger_count: u32) -> u32 {
        match self {
            Self::Detailed => 1,
            Self::Quick => passenger_count.clamp(1, MAX_BILLED_PASSENGERS),
        }
    }
}

/// Unrounded fare layers. Rounding happens in [`crate::display`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FareBreakdown {
    pub base_fare: f64,
    pub distance_fare: f64,
    pub time_fare: f64,
    pub raw_fare: f64,
    pub adjusted_fare: f64,
    pub total_fare: f64,
    pub passenger_count: u32,
    pub currency: Currency,
    pub mode: FareMode,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FareBand {
    pub min: f64,
    pub max: f64,
}

impl FareBreakdown {
    /// The ±10% min/max spread shown next to quick estimates.
    pub fn estimate_band(&self) -> FareBand {
        FareBand {
            min: self.total_fare * (1.0 - QUICK_ESTIMATE_SPREAD),
            max: self.total_fare * (1.0 + QUICK_ESTIMATE_SPREAD),
        }
    }
}
