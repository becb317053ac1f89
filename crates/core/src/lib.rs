pub mod board;
pub mod config;
pub mod display;
pub mod domain;
pub mod errors;
pub mod pricing;

pub use board::{BoardSnapshot, BoardUpdate, DisplayBoard, Ticket};
pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
pub use domain::advisory::{Suggestion, SuggestionIcon};
pub use domain::eco::{EcoBand, EcoMetrics};
pub use domain::factors::{
    DemandLevel, Factor, FactorSet, ModifierBounds, Severity, TrafficLevel, WeatherCondition,
};
pub use domain::fare::{FareBand, FareBreakdown, FareMode, RateCard, RateTable};
pub use domain::prediction::{Horizon, PredictionPoint};
pub use domain::trip::{Currency, Location, TimeOfDay, TripRequest, VehicleClass};
pub use errors::{ApplicationError, DomainError, InterfaceError, ResolutionError};
pub use pricing::{
    AdvisoryEngine, EcoScorer, FactorResolver, FareCalculator, FareEngine, FareEstimate,
    FarePipeline, FarePrediction, PredictionProjector, QuickEstimate, SimulatedConditions,
    TripAssessment,
};
