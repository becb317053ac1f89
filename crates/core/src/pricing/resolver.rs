use tracing::warn;

use crate::domain::factors::{Factor, FactorSet, ModifierBounds, DEFAULT_ECO_DISCOUNT};
use crate::domain::trip::{Location, TimeOfDay, TripRequest, VehicleClass};
use crate::errors::ResolutionError;
use crate::pricing::conditions::{ConditionSource, SimulatedConditions};

pub struct FactorResolver<S> {
    source: S,
    bounds: ModifierBounds,
    eco_discount: f64,
}

impl Default for FactorResolver<SimulatedConditions> {
    fn default() -> Self {
        Self::new(SimulatedConditions::default(), ModifierBounds::default(), DEFAULT_ECO_DISCOUNT)
    }
}

impl<S: ConditionSource> FactorResolver<S> {
    pub fn new(source: S, bounds: ModifierBounds, eco_discount: f64) -> Self {
        Self { source, bounds, eco_discount }
    }

    pub fn bounds(&self) -> ModifierBounds {
        self.bounds
    }

    pub fn eco_discount(&self) -> f64 {
        self.eco_discount
    }

    pub fn resolve(&self, request: &TripRequest) -> Result<FactorSet, ResolutionError> {
        self.resolve_at(&request.location, request.time_of_day, request.vehicle_class, 0)
    }

    /// Resolves factors `offset_minutes` ahead. `period` is expected to be
    /// the already-shifted period for that offset.
    pub fn resolve_at(
        &self,
        location: &Location,
        period: TimeOfDay,
        vehicle_class: VehicleClass,
        offset_minutes: u32,
    ) -> Result<FactorSet, ResolutionError> {
        let conditions = self.source.conditions(location, period, offset_minutes)?;
        let bounds = self.bounds;

        Ok(FactorSet {
            traffic: Factor::new(
                conditions.traffic,
                bounds.clamp(conditions.traffic.base_modifier()),
            ),
            weather: Factor::new(
                conditions.weather,
                bounds.clamp(conditions.weather.base_modifier()),
            ),
            time: Factor::new(period, bounds.clamp(period.base_modifier())),
            demand: Factor::new(conditions.demand, bounds.clamp(conditions.demand.base_modifier())),
            eco_discount: self.discount_for(vehicle_class),
        })
    }

    /// Same as [`Self::resolve_at`] but never fails: unresolvable context
    /// falls back to [`FactorSet::fallback`].
    pub fn resolve_or_fallback(
        &self,
        location: &Location,
        period: TimeOfDay,
        vehicle_class: VehicleClass,
        offset_minutes: u32,
    ) -> FactorSet {
        match self.resolve_at(location, period, vehicle_class, offset_minutes) {
            Ok(factors) => factors,
            Err(error) => {
                warn!(
                    event_name = "fare.resolution.fallback",
                    location = %location,
                    period = %period,
                    offset_minutes,
                    error = %error,
                    "factor resolution failed, using default factor set"
                );
                FactorSet::fallback(period, vehicle_class, self.bounds, self.eco_discount)
            }
        }
    }

    fn discount_for(&self, vehicle_class: VehicleClass) -> f64 {
        if vehicle_class.is_electric() {
            self.eco_discount
        } else {
            0.0
        }
    }
}
