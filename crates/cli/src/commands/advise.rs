use farecast_core::display::{format_money, rounded_breakdown};
use farecast_core::TripAssessment;
use serde_json::json;

use crate::commands::trip::{invalid_input, load_session, to_json, TripArgs};
use crate::commands::CommandResult;

const COMMAND: &str = "advise";

pub fn run(trip: &TripArgs, json_output: bool) -> CommandResult {
    let session = match load_session(COMMAND) {
        Ok(session) => session,
        Err(failure) => return failure,
    };
    let request = match trip.to_request(session.config.pricing.default_currency) {
        Ok(request) => request,
        Err(error) => return invalid_input(COMMAND, error),
    };

    match session.pipeline.assess(&request) {
        Ok(assessment) if json_output => to_json(
            COMMAND,
            "trip assessment computed",
            &json!({
                "fare": rounded_breakdown(&assessment.fare),
                "eco_score": assessment.eco.eco_score,
                "suggestions": assessment.suggestions,
            }),
        ),
        Ok(assessment) => CommandResult::human(render(&assessment)),
        Err(error) => invalid_input(COMMAND, error),
    }
}

fn render(assessment: &TripAssessment) -> String {
    let mut lines = vec![format!(
        "{} trip, {} (eco score {})",
        assessment.request.vehicle_class,
        format_money(assessment.fare.adjusted_fare, assessment.fare.currency),
        assessment.eco.eco_score
    )];
    lines.extend(
        assessment
            .suggestions
            .iter()
            .map(|suggestion| format!("- {}: {}", suggestion.title, suggestion.description)),
    );
    lines.join("\n")
}
