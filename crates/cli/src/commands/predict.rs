use farecast_core::display::{format_money, round_money, round_to, rounded_breakdown};
use farecast_core::{Currency, FarePrediction, Horizon};
use serde_json::json;

use crate::commands::trip::{invalid_input, load_session, to_json, TripArgs};
use crate::commands::CommandResult;

const COMMAND: &str = "predict";

pub fn run(
    trip: &TripArgs,
    horizon_minutes: Option<u32>,
    step_minutes: Option<u32>,
    json_output: bool,
) -> CommandResult {
    let session = match load_session(COMMAND) {
        Ok(session) => session,
        Err(failure) => return failure,
    };
    let request = match trip.to_request(session.config.pricing.default_currency) {
        Ok(request) => request,
        Err(error) => return invalid_input(COMMAND, error),
    };

    let configured = session.pipeline.default_horizon();
    let horizon = match Horizon::new(
        horizon_minutes.unwrap_or(configured.horizon_minutes),
        step_minutes.unwrap_or(configured.step_minutes),
    ) {
        Ok(horizon) => horizon,
        Err(error) => return invalid_input(COMMAND, error),
    };

    match session.pipeline.predict(&request, Some(horizon)) {
        Ok(prediction) if json_output => {
            let points: Vec<_> = prediction
                .predictions
                .iter()
                .map(|point| {
                    json!({
                        "time_offset": point.time_offset_minutes,
                        "fare": round_money(point.fare),
                        "change_percentage": round_to(point.change_percentage, 1),
                        "time_of_day": point.time_of_day,
                        "traffic": point.traffic,
                        "weather": point.weather,
                    })
                })
                .collect();
            to_json(
                COMMAND,
                "fare prediction computed",
                &json!({
                    "current": rounded_breakdown(&prediction.current),
                    "predictions": points,
                }),
            )
        }
        Ok(prediction) => CommandResult::human(render(&prediction, request.currency)),
        Err(error) => invalid_input(COMMAND, error),
    }
}

fn render(prediction: &FarePrediction, currency: Currency) -> String {
    let mut lines =
        vec![format!("current fare: {}", format_money(prediction.current.adjusted_fare, currency))];
    lines.extend(prediction.predictions.iter().map(|point| {
        format!(
            "- +{:>3} min  {:>10}  {:+.1}%  ({}, {} traffic, {})",
            point.time_offset_minutes,
            format_money(point.fare, currency),
            point.change_percentage,
            point.time_of_day,
            point.traffic.as_str(),
            point.weather.as_str(),
        )
    }));
    lines.join("\n")
}
