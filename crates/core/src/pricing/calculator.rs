use crate::domain::factors::FactorSet;
use crate::domain::fare::{FareBreakdown, FareMode, RateTable};
use crate::domain::trip::TripRequest;
use crate::errors::DomainError;

pub trait FareEngine: Send + Sync {
    fn compute(&self, request: &TripRequest, factors: &FactorSet)
        -> Result<FareBreakdown, DomainError>;
}

/// One calculator for both fare variants; the mode only changes how many
/// passengers are billed on top of the adjusted fare.
#[derive(Clone, Debug, Default)]
pub struct FareCalculator {
    rates: RateTable,
    mode: FareMode,
}

impl FareCalculator {
    pub fn new(rates: RateTable, mode: FareMode) -> Self {
        Self { rates, mode }
    }

    pub fn with_mode(&self, mode: FareMode) -> Self {
        Self { rates: self.rates, mode }
    }

    pub fn mode(&self) -> FareMode {
        self.mode
    }

    pub fn rates(&self) -> &RateTable {
        &self.rates
    }
}

impl FareEngine for FareCalculator {
    fn compute(
        &self,
        request: &TripRequest,
        factors: &FactorSet,
    ) -> Result<FareBreakdown, DomainError> {
        compute_fare(request, factors, &self.rates, self.mode)
    }
}

/// ```text
/// base     = rate.base                * fx
/// distance = distance_km * rate.per_km  * fx
/// time     = duration_min * rate.per_min * fx
/// raw      = base + distance + time
/// adjusted = raw * traffic * weather * time_of_day * demand * (1 - eco_discount)
/// total    = adjusted * billed_passengers(mode)
/// ```
///
/// `fx` converts the USD rate table into the request currency. Values are
/// left unrounded. Finite inputs large enough to overflow are rejected rather
/// than priced at infinity.
pub fn compute_fare(
    request: &TripRequest,
    factors: &FactorSet,
    rates: &RateTable,
    mode: FareMode,
) -> Result<FareBreakdown, DomainError> {
    request.validate()?;

    let card = rates.card(request.vehicle_class);
    let fx = request.currency.exchange_rate();

    let base_fare = card.base * fx;
    let distance_fare = request.distance_km * card.per_km * fx;
    let time_fare = request.duration_min * card.per_min * fx;
    let raw_fare = base_fare + distance_fare + time_fare;

    let adjusted_fare = raw_fare * factors.combined_multiplier() * factors.discount_factor();
    let passenger_count = mode.billed_passengers(request.passenger_count);
    let total_fare = adjusted_fare * f64::from(passenger_count);
    if !adjusted_fare.is_finite() || !total_fare.is_finite() {
        return Err(DomainError::invalid_input(
            "adjusted_fare",
            "computed fare is not a finite amount; check distance, duration and rates",
        ));
    }

    Ok(FareBreakdown {
        base_fare,
        distance_fare,
        time_fare,
        raw_fare,
        adjusted_fare,
        total_fare,
        passenger_count,
        currency: request.currency,
        mode,
    })
}
