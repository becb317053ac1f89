//! Rule-based travel advice.
//!
//! Every rule is checked for every request; matches keep the order of
//! [`RULES`]. When nothing matches the engine returns a single affirmation.

use tracing::trace;

use crate::domain::advisory::{Suggestion, SuggestionIcon};
use crate::domain::eco::EcoMetrics;
use crate::domain::factors::{FactorSet, TrafficLevel, DEFAULT_ECO_DISCOUNT};
use crate::domain::prediction::PredictionPoint;
use crate::domain::trip::{TripRequest, VehicleClass};
use crate::pricing::eco::co2_per_km;

pub const PUBLIC_TRANSPORT_MAX_KM: f64 = 10.0;
pub const WALKING_MAX_KM: f64 = 2.0;
pub const WAIT_FOR_DROP_PERCENT: f64 = -10.0;

/// Everything a rule may look at.
#[derive(Clone, Copy, Debug)]
pub struct AdvisoryContext<'a> {
    pub request: &'a TripRequest,
    pub factors: &'a FactorSet,
    pub eco: &'a EcoMetrics,
    pub predictions: &'a [PredictionPoint],
    pub offered_eco_discount: f64,
}

pub struct AdvisoryRule {
    pub name: &'static str,
    pub applies: fn(&AdvisoryContext<'_>) -> bool,
    pub suggest: fn(&AdvisoryContext<'_>) -> Suggestion,
}

pub const RULES: [AdvisoryRule; 8] = [
    AdvisoryRule { name: "switch_to_electric", applies: not_electric, suggest: switch_to_electric },
    AdvisoryRule { name: "public_transport", applies: public_transport_range, suggest: public_transport },
    AdvisoryRule { name: "avoid_rush_hour", applies: rush_hour, suggest: avoid_rush_hour },
    AdvisoryRule { name: "optimize_route", applies: congested, suggest: optimize_route },
    AdvisoryRule { name: "prepare_for_weather", applies: adverse_weather, suggest: prepare_for_weather },
    AdvisoryRule { name: "consider_walking", applies: walkable, suggest: consider_walking },
    AdvisoryRule { name: "consider_waiting", applies: surging, suggest: consider_waiting },
    AdvisoryRule { name: "wait_for_lower_fare", applies: fare_drop_ahead, suggest: wait_for_lower_fare },
];

fn not_electric(context: &AdvisoryContext<'_>) -> bool {
    !context.request.vehicle_class.is_electric()
}

/// Applies to every vehicle class, electric included.
fn public_transport_range(context: &AdvisoryContext<'_>) -> bool {
    context.request.distance_km < PUBLIC_TRANSPORT_MAX_KM
}

fn rush_hour(context: &AdvisoryContext<'_>) -> bool {
    context.request.time_of_day.is_rush()
}

fn congested(context: &AdvisoryContext<'_>) -> bool {
    matches!(context.factors.traffic.condition, TrafficLevel::Heavy | TrafficLevel::Extreme)
}

fn adverse_weather(context: &AdvisoryContext<'_>) -> bool {
    context.factors.weather.condition.is_adverse()
}

fn walkable(context: &AdvisoryContext<'_>) -> bool {
    context.request.distance_km < WALKING_MAX_KM
}

fn surging(context: &AdvisoryContext<'_>) -> bool {
    context.factors.demand.condition.is_surging()
}

fn switch_to_electric(context: &AdvisoryContext<'_>) -> Suggestion {
    let current = context.eco.co2_per_km_grams;
    let reduction = if current > 0.0 {
        ((1.0 - co2_per_km(VehicleClass::Electric) / current) * 100.0).round()
    } else {
        0.0
    };
    let discount = (context.offered_eco_discount * 100.0).round();

    Suggestion::new(
        SuggestionIcon::Leaf,
        "Choose an Electric Taxi",
        format!(
            "Reduce your CO2 emissions by up to {reduction}% and get a {discount}% fare discount."
        ),
    )
}

fn public_transport(_context: &AdvisoryContext<'_>) -> Suggestion {
    Suggestion::new(
        SuggestionIcon::Bus,
        "Consider Public Transport",
        "For this distance, public transportation could be a more eco-friendly option.",
    )
}

fn avoid_rush_hour(_context: &AdvisoryContext<'_>) -> Suggestion {
    Suggestion::new(
        SuggestionIcon::Clock,
        "Travel Outside Rush Hours",
        "Shifting your travel time could reduce your fare by up to 50%.",
    )
}

fn optimize_route(context: &AdvisoryContext<'_>) -> Suggestion {
    Suggestion::new(
        SuggestionIcon::Route,
        "Optimize Your Route",
        format!(
            "Current traffic is {}. Consider alternative routes or waiting for traffic to clear.",
            context.factors.traffic.condition
        ),
    )
}

fn prepare_for_weather(context: &AdvisoryContext<'_>) -> Suggestion {
    Suggestion::new(
        SuggestionIcon::Umbrella,
        format!("Prepare for {}", capitalize(context.factors.weather.condition.as_str())),
        "Current weather conditions may affect travel times and comfort.",
    )
}

fn consider_walking(_context: &AdvisoryContext<'_>) -> Suggestion {
    Suggestion::new(
        SuggestionIcon::Walking,
        "Consider Walking",
        "For this short distance, walking could be a healthier and eco-friendly option.",
    )
}

fn consider_waiting(_context: &AdvisoryContext<'_>) -> Suggestion {
    Suggestion::new(
        SuggestionIcon::HourglassHalf,
        "Consider Waiting",
        "Current demand is high, which increases fares. Waiting may reduce your fare.",
    )
}

fn last_change(context: &AdvisoryContext<'_>) -> Option<f64> {
    context.predictions.last().map(|point| point.change_percentage)
}

fn fare_drop_ahead(context: &AdvisoryContext<'_>) -> bool {
    last_change(context).is_some_and(|change| change < WAIT_FOR_DROP_PERCENT)
}

fn wait_for_lower_fare(context: &AdvisoryContext<'_>) -> Suggestion {
    let (drop, minutes) = context
        .predictions
        .last()
        .map(|point| (point.change_percentage.abs(), point.time_offset_minutes))
        .unwrap_or_default();

    Suggestion::new(
        SuggestionIcon::ChartLine,
        "Wait for Lower Fare",
        format!("Fares are predicted to drop by {drop}% in the next {minutes} minutes."),
    )
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[derive(Clone, Copy, Debug)]
pub struct AdvisoryEngine {
    offered_eco_discount: f64,
}

impl Default for AdvisoryEngine {
    fn default() -> Self {
        Self::new(DEFAULT_ECO_DISCOUNT)
    }
}

impl AdvisoryEngine {
    pub fn new(offered_eco_discount: f64) -> Self {
        Self { offered_eco_discount }
    }

    pub fn advise(
        &self,
        request: &TripRequest,
        factors: &FactorSet,
        eco: &EcoMetrics,
        predictions: &[PredictionPoint],
    ) -> Vec<Suggestion> {
        let context = AdvisoryContext {
            request,
            factors,
            eco,
            predictions,
            offered_eco_discount: self.offered_eco_discount,
        };

        let suggestions = RULES.iter().fold(Vec::new(), |mut matched, rule| {
            if (rule.applies)(&context) {
                trace!(
                    event_name = "fare.advisory.rule_matched",
                    rule = rule.name,
                    "advisory rule matched"
                );
                matched.push((rule.suggest)(&context));
            }
            matched
        });

        if suggestions.is_empty() {
            vec![Suggestion::affirmation()]
        } else {
            suggestions
        }
    }
}

#[cfg(test)]
mod tests {
    use super::AdvisoryEngine;
    use crate::domain::advisory::{Suggestion, SuggestionIcon};
    use crate::domain::factors::{
        DemandLevel, Factor, FactorSet, TrafficLevel, WeatherCondition,
    };
    use crate::domain::prediction::PredictionPoint;
    use crate::domain::trip::{Location, TimeOfDay, TripRequest, VehicleClass};
    use crate::pricing::eco::score_trip;

    fn factors(
        traffic: TrafficLevel,
        weather: WeatherCondition,
        period: TimeOfDay,
        demand: DemandLevel,
    ) -> FactorSet {
        FactorSet {
            traffic: Factor::new(traffic, traffic.base_modifier()),
            weather: Factor::new(weather, weather.base_modifier()),
            time: Factor::new(period, period.base_modifier()),
            demand: Factor::new(demand, demand.base_modifier().min(2.0)),
            eco_discount: 0.0,
        }
    }

    fn point(offset: u32, change_percentage: f64) -> PredictionPoint {
        PredictionPoint {
            time_offset_minutes: offset,
            fare: 10.0,
            change_percentage,
            time_of_day: TimeOfDay::Midday,
            traffic: TrafficLevel::Low,
            weather: WeatherCondition::Clear,
        }
    }

    #[test]
    fn calm_long_electric_trip_gets_only_the_affirmation() {
        let request = TripRequest::new(
            12.0,
            25.0,
            VehicleClass::Electric,
            Location::named("Chicago"),
            TimeOfDay::Midday,
        );
        let factors =
            factors(TrafficLevel::Low, WeatherCondition::Clear, TimeOfDay::Midday, DemandLevel::Normal);
        let eco = score_trip(VehicleClass::Electric, 12.0).expect("eco");
        let predictions = vec![point(15, 0.0), point(30, -4.0), point(45, 2.5), point(60, -9.9)];

        let suggestions = AdvisoryEngine::default().advise(&request, &factors, &eco, &predictions);
        assert_eq!(suggestions, vec![Suggestion::affirmation()]);
    }

    #[test]
    fn short_electric_trip_is_still_pointed_at_public_transport() {
        let request = TripRequest::new(
            5.0,
            15.0,
            VehicleClass::Electric,
            Location::named("Chicago"),
            TimeOfDay::Midday,
        );
        let factors =
            factors(TrafficLevel::Low, WeatherCondition::Clear, TimeOfDay::Midday, DemandLevel::Normal);
        let eco = score_trip(VehicleClass::Electric, 5.0).expect("eco");

        let suggestions = AdvisoryEngine::default().advise(&request, &factors, &eco, &[]);
        let icons = suggestions.iter().map(|suggestion| suggestion.icon).collect::<Vec<_>>();
        assert_eq!(icons, vec![SuggestionIcon::Bus]);
    }

    #[test]
    fn every_rule_fires_in_priority_order() {
        let request = TripRequest::new(
            1.5,
            9.0,
            VehicleClass::Luxury,
            Location::named("New York"),
            TimeOfDay::EveningRush,
        );
        let factors = factors(
            TrafficLevel::Extreme,
            WeatherCondition::Storm,
            TimeOfDay::EveningRush,
            DemandLevel::VeryHigh,
        );
        let eco = score_trip(VehicleClass::Luxury, 1.5).expect("eco");
        let predictions = vec![point(15, -3.0), point(30, -12.5)];

        let engine = AdvisoryEngine::default();
        let suggestions = engine.advise(&request, &factors, &eco, &predictions);
        let icons = suggestions.iter().map(|suggestion| suggestion.icon).collect::<Vec<_>>();

        assert_eq!(
            icons,
            vec![
                SuggestionIcon::Leaf,
                SuggestionIcon::Bus,
                SuggestionIcon::Clock,
                SuggestionIcon::Route,
                SuggestionIcon::Umbrella,
                SuggestionIcon::Walking,
                SuggestionIcon::HourglassHalf,
                SuggestionIcon::ChartLine,
            ]
        );
        assert_eq!(suggestions[4].title, "Prepare for Storm");
        assert!(suggestions[7].description.contains("12.5%"));
        assert!(suggestions[0].description.contains("86%"));
        assert!(suggestions[0].description.contains("10% fare discount"));
    }

    #[test]
    fn rules_are_independent_of_each_other() {
        let request = TripRequest::new(
            25.0,
            40.0,
            VehicleClass::Sedan,
            Location::named("Chicago"),
            TimeOfDay::Midday,
        );
        let factors = factors(
            TrafficLevel::Moderate,
            WeatherCondition::Rain,
            TimeOfDay::Midday,
            DemandLevel::Normal,
        );
        let eco = score_trip(VehicleClass::Sedan, 25.0).expect("eco");

        let suggestions = AdvisoryEngine::default().advise(&request, &factors, &eco, &[]);
        let icons = suggestions.iter().map(|suggestion| suggestion.icon).collect::<Vec<_>>();
        assert_eq!(icons, vec![SuggestionIcon::Leaf, SuggestionIcon::Umbrella]);
    }

    #[test]
    fn advice_is_stable_across_calls() {
        let request = TripRequest::new(
            3.0,
            10.0,
            VehicleClass::Suv,
            Location::named("Chicago"),
            TimeOfDay::MorningRush,
        );
        let factors = factors(
            TrafficLevel::Heavy,
            WeatherCondition::Clear,
            TimeOfDay::MorningRush,
            DemandLevel::High,
        );
        let eco = score_trip(VehicleClass::Suv, 3.0).expect("eco");
        let predictions = vec![point(15, -20.0)];

        let engine = AdvisoryEngine::default();
        assert_eq!(
            engine.advise(&request, &factors, &eco, &predictions),
            engine.advise(&request, &factors, &eco, &predictions)
        );
    }
}
