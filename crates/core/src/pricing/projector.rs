use crate::domain::prediction::{Horizon, PredictionPoint};
use crate::domain::trip::TripRequest;
use crate::errors::DomainError;
use crate::pricing::calculator::FareEngine;
use crate::pricing::conditions::ConditionSource;
use crate::pricing::resolver::FactorResolver;

/// Relative difference under which two fares are the same fare.
const FARE_EPSILON: f64 = 1e-9;

pub struct PredictionProjector<'a, S, F> {
    resolver: &'a FactorResolver<S>,
    engine: &'a F,
}

impl<'a, S, F> PredictionProjector<'a, S, F>
where
    S: ConditionSource,
    F: FareEngine,
{
    pub fn new(resolver: &'a FactorResolver<S>, engine: &'a F) -> Self {
        Self { resolver, engine }
    }

    /// Projects the adjusted fare at every `step` up to `horizon`.
    ///
    /// Each point shifts the period with [`crate::domain::trip::TimeOfDay::shifted`],
    /// re-resolves factors for that offset and re-prices the trip. The result
    /// depends only on `request`, `current_adjusted_fare` and `horizon`.
    pub fn project(
        &self,
        request: &TripRequest,
        current_adjusted_fare: f64,
        horizon: Horizon,
    ) -> Result<Vec<PredictionPoint>, DomainError> {
        request.validate()?;

        horizon
            .offsets()
            .map(|offset| -> Result<PredictionPoint, DomainError> {
                let period = request.time_of_day.shifted(offset);
                let factors = self.resolver.resolve_or_fallback(
                    &request.location,
                    period,
                    request.vehicle_class,
                    offset,
                );
                let shifted = request.with_time_of_day(period);
                let predicted = self.engine.compute(&shifted, &factors)?.adjusted_fare;
                let fare = snap_to(current_adjusted_fare, predicted);

                Ok(PredictionPoint {
                    time_offset_minutes: offset,
                    fare,
                    change_percentage: change_percentage(current_adjusted_fare, fare),
                    time_of_day: period,
                    traffic: factors.traffic.condition,
                    weather: factors.weather.condition,
                })
            })
            .collect()
    }
}

fn snap_to(current: f64, predicted: f64) -> f64 {
    if (predicted - current).abs() <= current.abs() * FARE_EPSILON {
        current
    } else {
        predicted
    }
}

/// Signed change rounded to one decimal, with one deliberate exception: a
/// real change smaller than 0.05% is reported as ±0.1 instead of 0.0, so an
/// increase or decrease is never displayed as "no change". This trades exact
/// one-decimal rounding for a sign that always matches the fare movement.
/// Only fares within [`FARE_EPSILON`] of the current fare report 0.0.
pub fn change_percentage(current: f64, predicted: f64) -> f64 {
    if current == 0.0 || predicted == current {
        return 0.0;
    }

    let change = (predicted - current) / current * 100.0;
    let rounded = (change * 10.0).round() / 10.0;
    if rounded == 0.0 {
        0.1_f64.copysign(change)
    } else {
        rounded
    }
}

#[cfg(test)]
mod tests {
    use super::{change_percentage, PredictionProjector};
    use crate::domain::factors::{DemandLevel, ModifierBounds, TrafficLevel, WeatherCondition};
    use crate::domain::prediction::Horizon;
    use crate::domain::trip::{Location, TimeOfDay, TripRequest, VehicleClass};
    use crate::errors::ResolutionError;
    use crate::pricing::calculator::{FareCalculator, FareEngine};
    use crate::pricing::conditions::{ConditionSource, Conditions};
    use crate::pricing::resolver::FactorResolver;

    struct FlatConditions;

    impl ConditionSource for FlatConditions {
        fn conditions(
            &self,
            _location: &Location,
            _period: TimeOfDay,
            _offset_minutes: u32,
        ) -> Result<Conditions, ResolutionError> {
            Ok(Conditions {
                traffic: TrafficLevel::Moderate,
                weather: WeatherCondition::Cloudy,
                demand: DemandLevel::Normal,
            })
        }
    }

    fn morning_trip() -> TripRequest {
        TripRequest::new(
            12.0,
            30.0,
            VehicleClass::Sedan,
            Location::named("Chicago"),
            TimeOfDay::MorningRush,
        )
    }

    fn current_fare(resolver: &FactorResolver<FlatConditions>, calculator: &FareCalculator) -> f64 {
        let factors = resolver.resolve(&morning_trip()).expect("resolves");
        calculator.compute(&morning_trip(), &factors).expect("fare").adjusted_fare
    }

    #[test]
    fn default_horizon_projects_four_increasing_offsets() {
        let resolver = FactorResolver::new(FlatConditions, ModifierBounds::default(), 0.10);
        let calculator = FareCalculator::default();
        let current = current_fare(&resolver, &calculator);

        let points = PredictionProjector::new(&resolver, &calculator)
            .project(&morning_trip(), current, Horizon::default())
            .expect("projection");

        let offsets = points.iter().map(|point| point.time_offset_minutes).collect::<Vec<_>>();
        assert_eq!(offsets, vec![15, 30, 45, 60]);
        assert!(offsets.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn rush_hour_rolls_into_midday_and_fare_drops() {
        let resolver = FactorResolver::new(FlatConditions, ModifierBounds::default(), 0.10);
        let calculator = FareCalculator::default();
        let current = current_fare(&resolver, &calculator);

        let points = PredictionProjector::new(&resolver, &calculator)
            .project(&morning_trip(), current, Horizon::default())
            .expect("projection");

        assert_eq!(points[0].change_percentage, 0.0);
        assert_eq!(points[0].fare, current);
        let last = points.last().expect("last point");
        assert_eq!(last.time_of_day, TimeOfDay::Midday);
        assert!(last.fare < current);
        assert_eq!(last.change_percentage, -33.3);
    }

    #[test]
    fn sign_of_change_matches_fare_direction() {
        let resolver = FactorResolver::default();
        let calculator = FareCalculator::default();

        for period in TimeOfDay::ALL {
            let request = morning_trip().with_time_of_day(period);
            let factors = resolver.resolve(&request).expect("resolves");
            let current = calculator.compute(&request, &factors).expect("fare").adjusted_fare;

            let points = PredictionProjector::new(&resolver, &calculator)
                .project(&request, current, Horizon::default())
                .expect("projection");
            for point in points {
                assert_eq!(point.fare > current, point.change_percentage > 0.0);
                assert_eq!(point.fare < current, point.change_percentage < 0.0);
            }
        }
    }

    #[test]
    fn projection_is_repeatable_and_leaves_input_untouched() {
        let resolver = FactorResolver::default();
        let calculator = FareCalculator::default();
        let request = morning_trip();
        let current = 42.0;

        let projector = PredictionProjector::new(&resolver, &calculator);
        let first = projector.project(&request, current, Horizon::default()).expect("first");
        let second = projector.project(&request, current, Horizon::default()).expect("second");

        assert_eq!(first, second);
        assert_eq!(request, morning_trip());
    }

    #[test]
    fn change_percentage_rounds_to_one_decimal_and_keeps_sign() {
        assert_eq!(change_percentage(100.0, 112.345), 12.3);
        assert_eq!(change_percentage(100.0, 100.001), 0.1);
        assert_eq!(change_percentage(100.0, 99.999), -0.1);
        assert_eq!(change_percentage(0.0, 15.0), 0.0);
        assert_eq!(change_percentage(80.0, 80.0), 0.0);
    }
}
