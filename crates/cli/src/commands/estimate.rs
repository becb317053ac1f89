use farecast_core::display::{factor_badges, format_money, round_money, rounded_breakdown};
use farecast_core::{FareEstimate, QuickEstimate};
use serde_json::json;

use crate::commands::trip::{invalid_input, load_session, to_json, TripArgs};
use crate::commands::CommandResult;

const COMMAND: &str = "estimate";

pub fn run(trip: &TripArgs, quick: bool, json_output: bool) -> CommandResult {
    let session = match load_session(COMMAND) {
        Ok(session) => session,
        Err(failure) => return failure,
    };
    let request = match trip.to_request(session.config.pricing.default_currency) {
        Ok(request) => request,
        Err(error) => return invalid_input(COMMAND, error),
    };

    if quick {
        return match session.pipeline.quick(&request) {
            Ok(estimate) if json_output => to_json(
                COMMAND,
                "quick estimate computed",
                &json!({
                    "fare": rounded_breakdown(&estimate.fare),
                    "estimate_range": {
                        "min": round_money(estimate.band.min),
                        "max": round_money(estimate.band.max),
                    },
                    "factors": estimate.factors,
                }),
            ),
            Ok(estimate) => CommandResult::human(render_quick(&estimate)),
            Err(error) => invalid_input(COMMAND, error),
        };
    }

    match session.pipeline.estimate(&request) {
        Ok(estimate) if json_output => to_json(
            COMMAND,
            "fare estimate computed",
            &json!({
                "fare": rounded_breakdown(&estimate.fare),
                "factors": estimate.factors,
                "eco": estimate.eco,
            }),
        ),
        Ok(estimate) => CommandResult::human(render_estimate(&estimate)),
        Err(error) => invalid_input(COMMAND, error),
    }
}

fn render_estimate(estimate: &FareEstimate) -> String {
    let currency = estimate.fare.currency;
    let mut lines = vec![
        format!("estimate: {}", format_money(estimate.fare.adjusted_fare, currency)),
        format!(
            "- base {} + distance {} + time {} = {}",
            format_money(estimate.fare.base_fare, currency),
            format_money(estimate.fare.distance_fare, currency),
            format_money(estimate.fare.time_fare, currency),
            format_money(estimate.fare.raw_fare, currency),
        ),
    ];
    lines.extend(
        factor_badges(&estimate.factors)
            .iter()
            .map(|badge| format!("- [{}] {}", badge.severity.as_str(), badge.label)),
    );
    if estimate.factors.eco_discount > 0.0 {
        lines.push(format!("- eco discount {:.0}%", estimate.factors.eco_discount * 100.0));
    }
    lines.push(format!(
        "- eco score {} ({:.0} g CO2, {:.2} trees)",
        estimate.eco.eco_score, estimate.eco.co2_total_grams, estimate.eco.trees_equivalent
    ));
    lines.join("\n")
}

fn render_quick(estimate: &QuickEstimate) -> String {
    let currency = estimate.fare.currency;
    [
        format!(
            "quick estimate: {} for {} passenger(s)",
            format_money(estimate.fare.total_fare, currency),
            estimate.fare.passenger_count
        ),
        format!(
            "- range {} to {}",
            format_money(estimate.band.min, currency),
            format_money(estimate.band.max, currency)
        ),
    ]
    .join("\n")
}
