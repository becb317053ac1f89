use std::sync::Arc;

use axum::Router;
use farecast_core::config::{AppConfig, ConfigError, LoadOptions};
use farecast_core::{DisplayBoard, FarePipeline};
use thiserror::Error;
use tracing::info;

use crate::api::{self, ApiState};
use crate::health;

pub struct Application {
    pub config: AppConfig,
    pub pipeline: Arc<FarePipeline>,
    pub board: Arc<DisplayBoard>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("pricing pipeline could not be built: {0}")]
    Pipeline(#[source] ConfigError),
}

pub fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config)
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let pipeline = FarePipeline::from_config(&config).map_err(BootstrapError::Pipeline)?;
    info!(
        event_name = "system.bootstrap.pipeline_ready",
        correlation_id = "bootstrap",
        conditions_seed = config.conditions.seed,
        horizon_minutes = config.prediction.horizon_minutes,
        step_minutes = config.prediction.step_minutes,
        default_currency = %config.pricing.default_currency,
        "fare pipeline initialized"
    );

    Ok(Application { config, pipeline: Arc::new(pipeline), board: Arc::new(DisplayBoard::new()) })
}

impl Application {
    pub fn router(&self) -> Router {
        api::router(ApiState {
            pipeline: Arc::clone(&self.pipeline),
            board: Arc::clone(&self.board),
            default_currency: self.config.pricing.default_currency,
        })
        .merge(health::router(Arc::clone(&self.pipeline)))
    }

    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.config.server.bind_address, self.config.server.port)
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use farecast_core::config::{AppConfig, ConfigOverrides, LoadOptions};
    use farecast_core::Currency;
    use tower::ServiceExt;

    use crate::bootstrap::{bootstrap, bootstrap_with_config};

    #[test]
    fn bootstrap_applies_overrides() {
        let app = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                port: Some(9911),
                default_currency: Some(Currency::Gbp),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .expect("bootstrap should succeed");

        assert_eq!(app.listen_address(), "127.0.0.1:9911");
        assert_eq!(app.config.pricing.default_currency, Currency::Gbp);
        assert_eq!(app.pipeline.default_horizon().offsets().count(), 4);
    }

    #[tokio::test]
    async fn router_serves_health_and_fare_routes() {
        let app = bootstrap_with_config(AppConfig::default()).expect("bootstrap should succeed");

        let health = app
            .router()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).expect("request"))
            .await
            .expect("health response");
        assert_eq!(health.status(), StatusCode::OK);

        let latest = app
            .router()
            .oneshot(Request::builder().uri("/api/fare/latest").body(Body::empty()).expect("request"))
            .await
            .expect("latest response");
        assert_eq!(latest.status(), StatusCode::OK);
        let bytes = to_bytes(latest.into_body(), 16 * 1024).await.expect("body");
        let json: serde_json::Value = serde_json::from_slice(&bytes).expect("json");
        assert!(json["advice"].is_null());
    }
}
