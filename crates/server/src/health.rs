use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use farecast_core::{FarePipeline, Location, TimeOfDay, TripRequest, VehicleClass};
use serde::Serialize;

#[derive(Clone)]
pub struct HealthState {
    pipeline: Arc<FarePipeline>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub pricing: HealthCheck,
    pub checked_at: String,
}

pub fn router(pipeline: Arc<FarePipeline>) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { pipeline })
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let pricing = pricing_check(&state.pipeline);
    let ready = pricing.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "farecast-server runtime initialized".to_string(),
        },
        pricing,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

/// Prices a canned trip end to end and checks the result is a usable amount.
fn pricing_check(pipeline: &FarePipeline) -> HealthCheck {
    let probe = TripRequest::new(
        5.0,
        15.0,
        VehicleClass::Sedan,
        Location::named("health-probe"),
        TimeOfDay::Midday,
    );

    match pipeline.estimate(&probe) {
        Ok(estimate) if estimate.fare.adjusted_fare.is_finite() && estimate.fare.adjusted_fare > 0.0 => {
            HealthCheck { status: "ready", detail: "pricing self-check succeeded".to_string() }
        }
        Ok(estimate) => HealthCheck {
            status: "degraded",
            detail: format!(
                "pricing self-check produced unusable fare {}",
                estimate.fare.adjusted_fare
            ),
        },
        Err(error) => {
            HealthCheck { status: "degraded", detail: format!("pricing self-check failed: {error}") }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{extract::State, http::StatusCode, Json};
    use farecast_core::{
        AppConfig, FarePipeline, Horizon, RateCard, SimulatedConditions, VehicleClass,
    };

    use crate::health::{health, HealthState};

    #[tokio::test]
    async fn health_returns_ready_when_pricing_works() {
        let state = HealthState { pipeline: Arc::new(FarePipeline::default()) };

        let (status, Json(payload)) = health(State(state)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert_eq!(payload.pricing.status, "ready");
        assert_eq!(payload.service.status, "ready");
    }

    #[tokio::test]
    async fn health_returns_service_unavailable_when_rates_are_broken() {
        let mut pricing = AppConfig::default().pricing;
        pricing.rates = pricing.rates.with_card(VehicleClass::Sedan, RateCard::new(f64::NAN, 1.0, 1.0));
        let pipeline =
            FarePipeline::with_source(SimulatedConditions::default(), &pricing, Horizon::default());

        let (status, Json(payload)) =
            health(State(HealthState { pipeline: Arc::new(pipeline) })).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload.status, "degraded");
        assert_eq!(payload.pricing.status, "degraded");
        assert_eq!(payload.service.status, "ready");
    }
}
