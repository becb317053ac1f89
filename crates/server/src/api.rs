//! Fare JSON API.
//!
//! - `POST /api/fare/estimate`: fare breakdown, factors and eco metrics
//! - `POST /api/fare/predict`: current fare plus projected fares
//! - `POST /api/fare/quick`: passenger-scaled fare with a ±10% range
//! - `POST /api/fare/advise`: full report; also published to the board
//! - `GET  /api/fare/latest`: report currently on the board

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{Local, Timelike};
use farecast_core::display::{round_money, round_to, FactorBadge};
use farecast_core::{
    ApplicationError, BoardUpdate, Currency, DemandLevel, DisplayBoard, DomainError, EcoBand,
    EcoMetrics, Factor, FactorSet, FareBreakdown, FarePipeline, Horizon, InterfaceError,
    Location, PredictionPoint, Severity, Suggestion, TimeOfDay, TrafficLevel, TripAssessment,
    TripRequest, VehicleClass, WeatherCondition,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct ApiState {
    pub pipeline: Arc<FarePipeline>,
    pub board: Arc<DisplayBoard>,
    pub default_currency: Currency,
}

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Deserialize)]
pub struct TripPayload {
    pub distance_km: f64,
    pub duration_min: f64,
    pub taxi_type: String,
    pub location: Location,
    /// Defaults to the period of the server's local clock.
    pub time_of_day: Option<String>,
    pub currency: Option<String>,
    pub passenger_count: Option<u32>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PredictPayload {
    #[serde(flatten)]
    pub trip: TripPayload,
    pub time_offset_minutes: Option<u32>,
    pub step_minutes: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub detail: String,
    pub correlation_id: String,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

#[derive(Debug, Serialize)]
pub struct FareView {
    pub base_fare: f64,
    pub distance_fare: f64,
    pub time_fare: f64,
    pub raw_fare: f64,
    pub adjusted_fare: f64,
    pub total_fare: f64,
    pub passenger_count: u32,
    pub currency: Currency,
    pub currency_symbol: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ConditionView {
    pub condition: String,
    pub modifier: f64,
    pub severity: Severity,
    pub label: String,
}

#[derive(Debug, Serialize)]
pub struct PeriodView {
    pub period: TimeOfDay,
    pub modifier: f64,
    pub severity: Severity,
    pub label: String,
}

#[derive(Debug, Serialize)]
pub struct LevelView {
    pub level: DemandLevel,
    pub modifier: f64,
    pub severity: Severity,
    pub label: String,
}

#[derive(Debug, Serialize)]
pub struct FactorsView {
    pub traffic: ConditionView,
    pub weather: ConditionView,
    pub time: PeriodView,
    pub demand: LevelView,
    pub eco_discount: f64,
}

#[derive(Debug, Serialize)]
pub struct Co2View {
    pub total_g: f64,
    pub per_km_g: f64,
    pub trees_equivalent: f64,
    pub savings_vs_suv_g: f64,
    pub is_eco_friendly: bool,
}

#[derive(Debug, Serialize)]
pub struct EstimateResponse {
    #[serde(flatten)]
    pub fare: FareView,
    pub factors: FactorsView,
    pub eco_score: u8,
    pub eco_band: EcoBand,
    pub co2_emissions: Co2View,
}

#[derive(Debug, Serialize)]
pub struct PredictionView {
    pub time_offset: u32,
    pub fare: f64,
    pub change_percentage: f64,
    pub time_of_day: TimeOfDay,
    pub traffic: TrafficLevel,
    pub weather: WeatherCondition,
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub current: FareView,
    pub factors: FactorsView,
    pub predictions: Vec<PredictionView>,
}

#[derive(Debug, Serialize)]
pub struct RangeView {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Serialize)]
pub struct QuickResponse {
    #[serde(flatten)]
    pub fare: FareView,
    pub estimate_range: RangeView,
    pub factors: FactorsView,
}

#[derive(Debug, Serialize)]
pub struct AdviceResponse {
    pub fare: FareView,
    pub factors: FactorsView,
    pub eco_score: u8,
    pub eco_band: EcoBand,
    pub co2_emissions: Co2View,
    pub predictions: Vec<PredictionView>,
    pub suggestions: Vec<Suggestion>,
}

#[derive(Debug, Serialize)]
pub struct AdvisePublished {
    pub ticket: u64,
    pub rendered: bool,
    #[serde(flatten)]
    pub advice: AdviceResponse,
}

#[derive(Debug, Serialize)]
pub struct LatestResponse {
    pub ticket: Option<u64>,
    pub notice: Option<String>,
    pub advice: Option<AdviceResponse>,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/fare/estimate", post(estimate))
        .route("/api/fare/predict", post(predict))
        .route("/api/fare/quick", post(quick))
        .route("/api/fare/advise", post(advise))
        .route("/api/fare/latest", get(latest))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

pub async fn estimate(
    State(state): State<ApiState>,
    payload: Result<Json<TripPayload>, JsonRejection>,
) -> ApiResult<EstimateResponse> {
    let correlation_id = Uuid::new_v4().to_string();
    let Json(payload) = payload.map_err(|rejection| rejected(rejection, &correlation_id))?;

    let request = trip_request(&payload, state.default_currency)
        .map_err(|error| domain_error(error, &correlation_id))?;
    let estimate =
        state.pipeline.estimate(&request).map_err(|error| domain_error(error, &correlation_id))?;

    info!(
        event_name = "api.fare.estimate",
        correlation_id = %correlation_id,
        vehicle_class = %request.vehicle_class,
        adjusted_fare = estimate.fare.adjusted_fare,
        "fare estimate served"
    );

    Ok(Json(EstimateResponse {
        fare: fare_view(&estimate.fare),
        factors: factors_view(&estimate.factors),
        eco_score: estimate.eco.eco_score,
        eco_band: estimate.eco.band,
        co2_emissions: co2_view(&estimate.eco),
    }))
}

pub async fn predict(
    State(state): State<ApiState>,
    payload: Result<Json<PredictPayload>, JsonRejection>,
) -> ApiResult<PredictResponse> {
    let correlation_id = Uuid::new_v4().to_string();
    let Json(payload) = payload.map_err(|rejection| rejected(rejection, &correlation_id))?;

    let request = trip_request(&payload.trip, state.default_currency)
        .map_err(|error| domain_error(error, &correlation_id))?;
    let defaults = state.pipeline.default_horizon();
    let horizon = Horizon::new(
        payload.time_offset_minutes.unwrap_or(defaults.horizon_minutes),
        payload.step_minutes.unwrap_or(defaults.step_minutes),
    )
    .map_err(|error| domain_error(error, &correlation_id))?;

    let prediction = state
        .pipeline
        .predict(&request, Some(horizon))
        .map_err(|error| domain_error(error, &correlation_id))?;

    info!(
        event_name = "api.fare.predict",
        correlation_id = %correlation_id,
        points = prediction.predictions.len(),
        "fare prediction served"
    );

    Ok(Json(PredictResponse {
        current: fare_view(&prediction.current),
        factors: factors_view(&prediction.factors),
        predictions: prediction.predictions.iter().map(prediction_view).collect(),
    }))
}

pub async fn quick(
    State(state): State<ApiState>,
    payload: Result<Json<TripPayload>, JsonRejection>,
) -> ApiResult<QuickResponse> {
    let correlation_id = Uuid::new_v4().to_string();
    let Json(payload) = payload.map_err(|rejection| rejected(rejection, &correlation_id))?;

    let request = trip_request(&payload, state.default_currency)
        .map_err(|error| domain_error(error, &correlation_id))?;
    let quick =
        state.pipeline.quick(&request).map_err(|error| domain_error(error, &correlation_id))?;

    info!(
        event_name = "api.fare.quick",
        correlation_id = %correlation_id,
        passenger_count = quick.fare.passenger_count,
        "quick fare served"
    );

    Ok(Json(QuickResponse {
        fare: fare_view(&quick.fare),
        estimate_range: RangeView { min: round_money(quick.band.min), max: round_money(quick.band.max) },
        factors: factors_view(&quick.factors),
    }))
}

/// Runs the full pipeline under a board ticket. The report is returned to
/// the caller either way; `rendered` says whether it also reached the board.
pub async fn advise(
    State(state): State<ApiState>,
    payload: Result<Json<TripPayload>, JsonRejection>,
) -> ApiResult<AdvisePublished> {
    let correlation_id = Uuid::new_v4().to_string();
    let Json(payload) = payload.map_err(|rejection| rejected(rejection, &correlation_id))?;
    let ticket = state.board.issue();

    let outcome = trip_request(&payload, state.default_currency)
        .and_then(|request| state.pipeline.assess(&request));

    match outcome {
        Ok(assessment) => {
            let advice = advice_view(&assessment);
            let update = state.board.complete::<String>(ticket, Ok(assessment));
            info!(
                event_name = "api.fare.advise",
                correlation_id = %correlation_id,
                ticket = ticket.number(),
                suggestions = advice.suggestions.len(),
                "trip advice served"
            );
            Ok(Json(AdvisePublished {
                ticket: ticket.number(),
                rendered: update == BoardUpdate::Rendered,
                advice,
            }))
        }
        Err(error) => {
            let (status, body) = domain_error(error, &correlation_id);
            state.board.complete(ticket, Err(body.error.clone()));
            Err((status, body))
        }
    }
}

pub async fn latest(State(state): State<ApiState>) -> Json<LatestResponse> {
    let snapshot = state.board.snapshot();
    Json(LatestResponse {
        ticket: snapshot.rendered_ticket,
        notice: snapshot.notice,
        advice: snapshot.assessment.as_deref().map(advice_view),
    })
}

// ---------------------------------------------------------------------------
// Mapping
// ---------------------------------------------------------------------------

pub fn trip_request(
    payload: &TripPayload,
    default_currency: Currency,
) -> Result<TripRequest, DomainError> {
    let vehicle_class = payload.taxi_type.parse::<VehicleClass>()?;
    let time_of_day = match payload.time_of_day.as_deref() {
        Some(value) => value.parse::<TimeOfDay>()?,
        None => TimeOfDay::from_hour(Local::now().hour()),
    };
    let currency = match payload.currency.as_deref() {
        Some(value) => value.parse::<Currency>()?,
        None => default_currency,
    };

    let request = TripRequest::new(
        payload.distance_km,
        payload.duration_min,
        vehicle_class,
        payload.location.clone(),
        time_of_day,
    )
    .with_currency(currency)
    .with_passengers(payload.passenger_count.unwrap_or(1));
    request.validate()?;
    Ok(request)
}

fn fare_view(fare: &FareBreakdown) -> FareView {
    FareView {
        base_fare: round_money(fare.base_fare),
        distance_fare: round_money(fare.distance_fare),
        time_fare: round_money(fare.time_fare),
        raw_fare: round_money(fare.raw_fare),
        adjusted_fare: round_money(fare.adjusted_fare),
        total_fare: round_money(fare.total_fare),
        passenger_count: fare.passenger_count,
        currency: fare.currency,
        currency_symbol: fare.currency.symbol(),
    }
}

fn condition_view<C: std::fmt::Display>(factor: &Factor<C>) -> ConditionView {
    let badge = FactorBadge::for_factor(factor);
    ConditionView {
        condition: factor.condition.to_string(),
        modifier: factor.modifier,
        severity: badge.severity,
        label: badge.label,
    }
}

fn factors_view(factors: &FactorSet) -> FactorsView {
    let time = FactorBadge::for_factor(&factors.time);
    let demand = FactorBadge::for_factor(&factors.demand);
    FactorsView {
        traffic: condition_view(&factors.traffic),
        weather: condition_view(&factors.weather),
        time: PeriodView {
            period: factors.time.condition,
            modifier: factors.time.modifier,
            severity: time.severity,
            label: time.label,
        },
        demand: LevelView {
            level: factors.demand.condition,
            modifier: factors.demand.modifier,
            severity: demand.severity,
            label: demand.label,
        },
        eco_discount: factors.eco_discount,
    }
}

fn co2_view(eco: &EcoMetrics) -> Co2View {
    Co2View {
        total_g: round_money(eco.co2_total_grams),
        per_km_g: eco.co2_per_km_grams,
        trees_equivalent: round_to(eco.trees_equivalent, 4),
        savings_vs_suv_g: round_money(eco.savings_vs_baseline_grams),
        is_eco_friendly: eco.is_eco_friendly,
    }
}

fn prediction_view(point: &PredictionPoint) -> PredictionView {
    PredictionView {
        time_offset: point.time_offset_minutes,
        fare: round_money(point.fare),
        change_percentage: point.change_percentage,
        time_of_day: point.time_of_day,
        traffic: point.traffic,
        weather: point.weather,
    }
}

fn advice_view(assessment: &TripAssessment) -> AdviceResponse {
    AdviceResponse {
        fare: fare_view(&assessment.fare),
        factors: factors_view(&assessment.factors),
        eco_score: assessment.eco.eco_score,
        eco_band: assessment.eco.band,
        co2_emissions: co2_view(&assessment.eco),
        predictions: assessment.predictions.iter().map(prediction_view).collect(),
        suggestions: assessment.suggestions.clone(),
    }
}

fn domain_error(error: DomainError, correlation_id: &str) -> (StatusCode, Json<ApiError>) {
    interface_error(ApplicationError::from(error).into_interface(correlation_id))
}

fn rejected(rejection: JsonRejection, correlation_id: &str) -> (StatusCode, Json<ApiError>) {
    interface_error(InterfaceError::BadRequest {
        message: rejection.body_text(),
        correlation_id: correlation_id.to_string(),
    })
}

fn interface_error(error: InterfaceError) -> (StatusCode, Json<ApiError>) {
    let status = match error {
        InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
    };
    let detail = match &error {
        InterfaceError::BadRequest { message, .. }
        | InterfaceError::ServiceUnavailable { message, .. } => message.clone(),
    };

    warn!(
        event_name = "api.fare.rejected",
        correlation_id = %error.correlation_id(),
        status = status.as_u16(),
        detail = %detail,
        "fare request failed"
    );

    (
        status,
        Json(ApiError {
            error: error.user_message().to_string(),
            detail,
            correlation_id: error.correlation_id().to_string(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        extract::State,
        http::{Request, StatusCode},
        Json,
    };
    use farecast_core::{Currency, DisplayBoard, FarePipeline, Location, SuggestionIcon};
    use tower::ServiceExt;

    use super::*;

    fn state() -> ApiState {
        ApiState {
            pipeline: Arc::new(FarePipeline::default()),
            board: Arc::new(DisplayBoard::new()),
            default_currency: Currency::Usd,
        }
    }

    fn payload(taxi_type: &str, distance_km: f64) -> TripPayload {
        TripPayload {
            distance_km,
            duration_min: 15.0,
            taxi_type: taxi_type.to_string(),
            location: Location::named("Chicago"),
            time_of_day: Some("midday".to_string()),
            currency: None,
            passenger_count: None,
        }
    }

    #[tokio::test]
    async fn estimate_returns_layered_fare_and_eco_metrics() {
        let Json(response) = estimate(State(state()), Ok(Json(payload("Sedan", 5.0))))
            .await
            .expect("estimate should succeed");

        assert_eq!(response.fare.base_fare, 2.5);
        assert_eq!(response.fare.distance_fare, 7.5);
        assert_eq!(response.fare.time_fare, 5.25);
        assert_eq!(response.fare.raw_fare, 15.25);
        assert_eq!(response.fare.currency, Currency::Usd);
        assert_eq!(response.eco_score, 56);
        assert_eq!(response.co2_emissions.total_g, 600.0);
        assert_eq!(response.co2_emissions.savings_vs_suv_g, 300.0);
        assert_eq!(response.factors.eco_discount, 0.0);
        assert_eq!(response.factors.time.period, TimeOfDay::Midday);
    }

    #[tokio::test]
    async fn estimate_rejects_negative_distance_with_correlation_id() {
        let result = estimate(State(state()), Ok(Json(payload("Sedan", -1.0)))).await;

        let (status, Json(body)) = result.expect_err("negative distance should fail");
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.detail.contains("distance_km"));
        assert!(!body.correlation_id.is_empty());
    }

    #[tokio::test]
    async fn unknown_taxi_type_is_bad_request() {
        let result = estimate(State(state()), Ok(Json(payload("Rickshaw", 3.0)))).await;

        let (status, Json(body)) = result.expect_err("unknown class should fail");
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.detail.contains("taxi_type"));
    }

    #[tokio::test]
    async fn predict_defaults_to_four_quarter_hour_points() {
        let request = PredictPayload {
            trip: payload("SUV", 12.0),
            time_offset_minutes: None,
            step_minutes: None,
        };
        let Json(response) =
            predict(State(state()), Ok(Json(request))).await.expect("predict should succeed");

        let offsets =
            response.predictions.iter().map(|point| point.time_offset).collect::<Vec<_>>();
        assert_eq!(offsets, vec![15, 30, 45, 60]);
    }

    #[tokio::test]
    async fn predict_rejects_zero_step() {
        let request = PredictPayload {
            trip: payload("SUV", 12.0),
            time_offset_minutes: Some(60),
            step_minutes: Some(0),
        };
        let (status, _) =
            predict(State(state()), Ok(Json(request))).await.expect_err("zero step should fail");
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn predict_rejects_step_longer_than_horizon() {
        let request = PredictPayload {
            trip: payload("SUV", 12.0),
            time_offset_minutes: Some(10),
            step_minutes: Some(15),
        };
        let (status, Json(body)) = predict(State(state()), Ok(Json(request)))
            .await
            .expect_err("step past the horizon should fail");
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.detail.contains("step_minutes"));
    }

    #[tokio::test]
    async fn quick_scales_by_passengers() {
        let mut trip = payload("Sedan", 5.0);
        trip.passenger_count = Some(8);

        let Json(response) = quick(State(state()), Ok(Json(trip))).await.expect("quick");
        assert_eq!(response.fare.passenger_count, 5);
        assert!(response.estimate_range.min < response.fare.total_fare);
        assert!(response.estimate_range.max > response.fare.total_fare);
    }

    #[tokio::test]
    async fn advise_publishes_to_board_and_failure_keeps_it() {
        let state = state();

        let Json(published) = advise(State(state.clone()), Ok(Json(payload("Luxury", 4.0))))
            .await
            .expect("advise should succeed");
        assert!(published.rendered);
        assert_eq!(published.advice.suggestions[0].icon, SuggestionIcon::Leaf);

        let failed = advise(State(state.clone()), Ok(Json(payload("Luxury", -4.0)))).await;
        assert!(failed.is_err());

        let Json(latest) = latest(State(state)).await;
        assert_eq!(latest.ticket, Some(published.ticket));
        assert!(latest.advice.is_some());
        assert!(latest.notice.is_some());
    }

    #[tokio::test]
    async fn router_maps_malformed_json_to_bad_request() {
        let response = router(state())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/fare/estimate")
                    .header("content-type", "application/json")
                    .body(Body::from("{\"distance_km\": \"far\"}"))
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(response.into_body(), 64 * 1024).await.expect("body");
        let body: serde_json::Value = serde_json::from_slice(&bytes).expect("json body");
        assert!(body["correlation_id"].as_str().is_some_and(|id| !id.is_empty()));
    }

    #[tokio::test]
    async fn router_serves_estimate_in_wire_shape() {
        let body = serde_json::json!({
            "distance_km": 5.0,
            "duration_min": 15.0,
            "taxi_type": "Electric",
            "location": {"lat": 41.88, "lng": -87.63},
            "time_of_day": "midday",
            "currency": "EUR"
        });
        let response = router(state())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/fare/estimate")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), 64 * 1024).await.expect("body");
        let json: serde_json::Value = serde_json::from_slice(&bytes).expect("json body");
        assert_eq!(json["currency"], "EUR");
        assert_eq!(json["factors"]["eco_discount"], 0.1);
        assert!(json["factors"]["time"]["period"].is_string());
        assert!(json["factors"]["demand"]["level"].is_string());
        assert!(json["co2_emissions"]["trees_equivalent"].is_number());
        assert_eq!(json["eco_score"], 89);
    }
}
