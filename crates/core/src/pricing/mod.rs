//! Fare pipeline: resolve factors, price the trip, score emissions, project
//! the next hour and derive advice. Each call builds fresh value objects;
//! nothing here holds mutable state between requests.

pub mod advisory;
pub mod calculator;
pub mod conditions;
pub mod eco;
pub mod projector;
pub mod resolver;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{AppConfig, ConfigError, PricingConfig};
use crate::domain::advisory::Suggestion;
use crate::domain::eco::EcoMetrics;
use crate::domain::factors::FactorSet;
use crate::domain::fare::{FareBand, FareBreakdown, FareMode};
use crate::domain::prediction::{Horizon, PredictionPoint};
use crate::domain::trip::TripRequest;
use crate::errors::DomainError;

pub use advisory::AdvisoryEngine;
pub use calculator::{compute_fare, FareCalculator, FareEngine};
pub use conditions::{ConditionSource, Conditions, SimulatedConditions};
pub use eco::EcoScorer;
pub use projector::{change_percentage, PredictionProjector};
pub use resolver::FactorResolver;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FareEstimate {
    pub fare: FareBreakdown,
    pub factors: FactorSet,
    pub eco: EcoMetrics,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuickEstimate {
    pub fare: FareBreakdown,
    pub band: FareBand,
    pub factors: FactorSet,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FarePrediction {
    pub current: FareBreakdown,
    pub factors: FactorSet,
    pub predictions: Vec<PredictionPoint>,
}

/// Fare, eco metrics, projection and advice produced by one pipeline run.
/// Either every part is present or the run failed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TripAssessment {
    pub request: TripRequest,
    pub fare: FareBreakdown,
    pub factors: FactorSet,
    pub eco: EcoMetrics,
    pub predictions: Vec<PredictionPoint>,
    pub suggestions: Vec<Suggestion>,
}

pub struct FarePipeline<S = SimulatedConditions> {
    resolver: FactorResolver<S>,
    calculator: FareCalculator,
    scorer: EcoScorer,
    advisor: AdvisoryEngine,
    horizon: Horizon,
}

impl Default for FarePipeline<SimulatedConditions> {
    fn default() -> Self {
        Self::with_source(
            SimulatedConditions::default(),
            &AppConfig::default().pricing,
            Horizon::default(),
        )
    }
}

impl FarePipeline<SimulatedConditions> {
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        let horizon = config.prediction.horizon()?;
        Ok(Self::with_source(
            SimulatedConditions::new(config.conditions.seed),
            &config.pricing,
            horizon,
        ))
    }
}

impl<S: ConditionSource> FarePipeline<S> {
    pub fn with_source(source: S, pricing: &PricingConfig, horizon: Horizon) -> Self {
        Self {
            resolver: FactorResolver::new(source, pricing.bounds(), pricing.eco_discount),
            calculator: FareCalculator::new(pricing.rates, FareMode::Detailed),
            scorer: EcoScorer,
            advisor: AdvisoryEngine::new(pricing.eco_discount),
            horizon,
        }
    }

    pub fn default_horizon(&self) -> Horizon {
        self.horizon
    }

    pub fn resolver(&self) -> &FactorResolver<S> {
        &self.resolver
    }

    pub fn calculator(&self) -> &FareCalculator {
        &self.calculator
    }

    fn current_factors(&self, request: &TripRequest) -> FactorSet {
        self.resolver.resolve_or_fallback(
            &request.location,
            request.time_of_day,
            request.vehicle_class,
            0,
        )
    }

    pub fn estimate(&self, request: &TripRequest) -> Result<FareEstimate, DomainError> {
        request.validate()?;

        let factors = self.current_factors(request);
        let fare = self.calculator.compute(request, &factors)?;
        let eco = self.scorer.score(request.vehicle_class, request.distance_km)?;

        debug!(
            event_name = "fare.estimate.completed",
            vehicle_class = %request.vehicle_class,
            time_of_day = %request.time_of_day,
            adjusted_fare = fare.adjusted_fare,
            eco_score = eco.eco_score,
            "fare estimate computed"
        );
        Ok(FareEstimate { fare, factors, eco })
    }

    pub fn quick(&self, request: &TripRequest) -> Result<QuickEstimate, DomainError> {
        request.validate()?;

        let factors = self.current_factors(request);
        let fare = self.calculator.with_mode(FareMode::Quick).compute(request, &factors)?;
        let band = fare.estimate_band();

        debug!(
            event_name = "fare.quick.completed",
            passenger_count = fare.passenger_count,
            total_fare = fare.total_fare,
            "quick fare estimate computed"
        );
        Ok(QuickEstimate { fare, band, factors })
    }

    /// Current fare plus its projection. `horizon` defaults to the pipeline's
    /// configured horizon.
    pub fn predict(
        &self,
        request: &TripRequest,
        horizon: Option<Horizon>,
    ) -> Result<FarePrediction, DomainError> {
        request.validate()?;

        let factors = self.current_factors(request);
        let current = self.calculator.compute(request, &factors)?;
        let predictions = PredictionProjector::new(&self.resolver, &self.calculator).project(
            request,
            current.adjusted_fare,
            horizon.unwrap_or(self.horizon),
        )?;

        debug!(
            event_name = "fare.prediction.completed",
            points = predictions.len(),
            current_fare = current.adjusted_fare,
            "fare prediction computed"
        );
        Ok(FarePrediction { current, factors, predictions })
    }

    /// Runs every stage and returns them together, or the first error.
    pub fn assess(&self, request: &TripRequest) -> Result<TripAssessment, DomainError> {
        let FareEstimate { fare, factors, eco } = self.estimate(request)?;
        let predictions = PredictionProjector::new(&self.resolver, &self.calculator).project(
            request,
            fare.adjusted_fare,
            self.horizon,
        )?;
        let suggestions = self.advisor.advise(request, &factors, &eco, &predictions);

        debug!(
            event_name = "fare.assessment.completed",
            suggestions = suggestions.len(),
            "trip assessment computed"
        );
        Ok(TripAssessment {
            request: request.clone(),
            fare,
            factors,
            eco,
            predictions,
            suggestions,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::{ConditionSource, Conditions, FarePipeline};
    use crate::config::AppConfig;
    use crate::domain::advisory::Suggestion;
    use crate::domain::factors::{DemandLevel, TrafficLevel, WeatherCondition};
    use crate::domain::prediction::Horizon;
    use crate::domain::trip::{Location, TimeOfDay, TripRequest, VehicleClass};
    use crate::errors::{DomainError, ResolutionError};

    struct CountingConditions {
        calls: AtomicUsize,
        conditions: Conditions,
    }

    impl ConditionSource for CountingConditions {
        fn conditions(
            &self,
            _location: &Location,
            _period: TimeOfDay,
            _offset_minutes: u32,
        ) -> Result<Conditions, ResolutionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.conditions)
        }
    }

    fn calm_source() -> Arc<CountingConditions> {
        Arc::new(CountingConditions {
            calls: AtomicUsize::new(0),
            conditions: Conditions {
                traffic: TrafficLevel::Low,
                weather: WeatherCondition::Clear,
                demand: DemandLevel::Normal,
            },
        })
    }

    fn pipeline(source: Arc<CountingConditions>) -> FarePipeline<Arc<CountingConditions>> {
        FarePipeline::with_source(source, &AppConfig::default().pricing, Horizon::default())
    }

    fn electric_midday() -> TripRequest {
        TripRequest::new(
            5.0,
            15.0,
            VehicleClass::Electric,
            Location::named("Chicago"),
            TimeOfDay::Midday,
        )
    }

    #[test]
    fn identical_requests_produce_identical_reports() {
        let pipeline = pipeline(calm_source());
        let request = electric_midday();

        let first = pipeline.assess(&request).expect("first run");
        let second = pipeline.assess(&request).expect("second run");

        let first_json = serde_json::to_string(&first).expect("serialize first");
        let second_json = serde_json::to_string(&second).expect("serialize second");
        assert_eq!(first_json, second_json);
    }

    #[test]
    fn calm_long_electric_midday_trip_is_affirmed() {
        let request = TripRequest { distance_km: 12.0, duration_min: 25.0, ..electric_midday() };
        let assessment = pipeline(calm_source()).assess(&request).expect("assessment");

        assert_eq!(assessment.factors.eco_discount, 0.10);
        assert_eq!(assessment.predictions.len(), 4);
        assert_eq!(assessment.suggestions, vec![Suggestion::affirmation()]);
    }

    #[test]
    fn prediction_resolves_once_per_offset_plus_current() {
        let source = calm_source();
        let pipeline = pipeline(Arc::clone(&source));

        let prediction = pipeline.predict(&electric_midday(), None).expect("prediction");
        assert_eq!(prediction.predictions.len(), 4);
        assert_eq!(source.calls.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn custom_horizon_changes_point_count() {
        let pipeline = pipeline(calm_source());
        let horizon = Horizon::new(120, 30).expect("horizon");

        let prediction = pipeline.predict(&electric_midday(), Some(horizon)).expect("prediction");
        let offsets =
            prediction.predictions.iter().map(|point| point.time_offset_minutes).collect::<Vec<_>>();
        assert_eq!(offsets, vec![30, 60, 90, 120]);
    }

    #[test]
    fn quick_estimate_bills_group_and_spreads_ten_percent() {
        let pipeline = pipeline(calm_source());
        let request = electric_midday().with_passengers(3);

        let quick = pipeline.quick(&request).expect("quick");
        assert_eq!(quick.fare.passenger_count, 3);
        assert!((quick.band.min - quick.fare.total_fare * 0.9).abs() < 1e-9);
        assert!((quick.band.max - quick.fare.total_fare * 1.1).abs() < 1e-9);
    }

    #[test]
    fn invalid_input_fails_before_any_resolution() {
        let source = calm_source();
        let pipeline = pipeline(Arc::clone(&source));
        let mut request = electric_midday();
        request.distance_km = -3.0;

        assert!(matches!(pipeline.assess(&request), Err(DomainError::InvalidInput { .. })));
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unresolvable_location_still_prices_with_fallback() {
        let pipeline: FarePipeline = FarePipeline::default();
        let request = TripRequest::new(
            8.0,
            20.0,
            VehicleClass::Sedan,
            Location::named(" "),
            TimeOfDay::EveningRush,
        );

        let estimate = pipeline.estimate(&request).expect("fallback estimate");
        assert_eq!(estimate.factors.traffic.condition, TrafficLevel::Low);
        assert_eq!(estimate.factors.time.modifier, 1.5);
        assert_eq!(estimate.fare.adjusted_fare, estimate.fare.raw_fare * 1.5);
    }
}
