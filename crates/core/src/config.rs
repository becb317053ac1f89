use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::factors::{
    ModifierBounds, DEFAULT_ECO_DISCOUNT, DEFAULT_MODIFIER_CEILING, DEFAULT_MODIFIER_FLOOR,
};
use crate::domain::fare::{RateCard, RateTable};
use crate::domain::prediction::{
    Horizon, DEFAULT_HORIZON_MINUTES, DEFAULT_STEP_MINUTES, MAX_HORIZON_MINUTES,
};
use crate::domain::trip::{Currency, VehicleClass};

pub const DEFAULT_CONFIG_FILE: &str = "farecast.toml";
pub const ENV_PREFIX: &str = "FARECAST_";

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub pricing: PricingConfig,
    pub prediction: PredictionConfig,
    pub conditions: ConditionsConfig,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PricingConfig {
    pub default_currency: Currency,
    pub modifier_floor: f64,
    pub modifier_ceiling: f64,
    pub eco_discount: f64,
    pub rates: RateTable,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PredictionConfig {
    pub horizon_minutes: u32,
    pub step_minutes: u32,
}

/// Seed for the simulated condition source. Two processes with the same
/// seed price identical trips identically.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConditionsConfig {
    pub seed: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compact => "compact",
            Self::Pretty => "pretty",
            Self::Json => "json",
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
    pub default_currency: Option<Currency>,
    pub conditions_seed: Option<u64>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                graceful_shutdown_secs: 15,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
            pricing: PricingConfig {
                default_currency: Currency::Usd,
                modifier_floor: DEFAULT_MODIFIER_FLOOR,
                modifier_ceiling: DEFAULT_MODIFIER_CEILING,
                eco_discount: DEFAULT_ECO_DISCOUNT,
                rates: RateTable::default(),
            },
            prediction: PredictionConfig {
                horizon_minutes: DEFAULT_HORIZON_MINUTES,
                step_minutes: DEFAULT_STEP_MINUTES,
            },
            conditions: ConditionsConfig { seed: 0 },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl PricingConfig {
    pub fn bounds(&self) -> ModifierBounds {
        ModifierBounds { floor: self.modifier_floor, ceiling: self.modifier_ceiling }
    }
}

impl PredictionConfig {
    pub fn horizon(&self) -> Result<Horizon, ConfigError> {
        Horizon::new(self.horizon_minutes, self.step_minutes)
            .map_err(|error| ConfigError::Validation(format!("prediction: {error}")))
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }

        if let Some(pricing) = patch.pricing {
            if let Some(default_currency) = pricing.default_currency {
                self.pricing.default_currency = default_currency;
            }
            if let Some(modifier_floor) = pricing.modifier_floor {
                self.pricing.modifier_floor = modifier_floor;
            }
            if let Some(modifier_ceiling) = pricing.modifier_ceiling {
                self.pricing.modifier_ceiling = modifier_ceiling;
            }
            if let Some(eco_discount) = pricing.eco_discount {
                self.pricing.eco_discount = eco_discount;
            }
            if let Some(rates) = pricing.rates {
                rates.apply(&mut self.pricing.rates);
            }
        }

        if let Some(prediction) = patch.prediction {
            if let Some(horizon_minutes) = prediction.horizon_minutes {
                self.prediction.horizon_minutes = horizon_minutes;
            }
            if let Some(step_minutes) = prediction.step_minutes {
                self.prediction.step_minutes = step_minutes;
            }
        }

        if let Some(conditions) = patch.conditions {
            if let Some(seed) = conditions.seed {
                self.conditions.seed = seed;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("FARECAST_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("FARECAST_SERVER_PORT") {
            self.server.port = parse_env("FARECAST_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("FARECAST_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_env("FARECAST_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        let log_level =
            read_env("FARECAST_LOGGING_LEVEL").or_else(|| read_env("FARECAST_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("FARECAST_LOGGING_FORMAT").or_else(|| read_env("FARECAST_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        if let Some(value) = read_env("FARECAST_PRICING_DEFAULT_CURRENCY") {
            self.pricing.default_currency = value.parse().map_err(|_| {
                ConfigError::InvalidEnvOverride {
                    key: "FARECAST_PRICING_DEFAULT_CURRENCY".to_string(),
                    value: value.clone(),
                }
            })?;
        }
        if let Some(value) = read_env("FARECAST_PRICING_MODIFIER_FLOOR") {
            self.pricing.modifier_floor = parse_env("FARECAST_PRICING_MODIFIER_FLOOR", &value)?;
        }
        if let Some(value) = read_env("FARECAST_PRICING_MODIFIER_CEILING") {
            self.pricing.modifier_ceiling =
                parse_env("FARECAST_PRICING_MODIFIER_CEILING", &value)?;
        }
        if let Some(value) = read_env("FARECAST_PRICING_ECO_DISCOUNT") {
            self.pricing.eco_discount = parse_env("FARECAST_PRICING_ECO_DISCOUNT", &value)?;
        }

        if let Some(value) = read_env("FARECAST_PREDICTION_HORIZON_MINUTES") {
            self.prediction.horizon_minutes =
                parse_env("FARECAST_PREDICTION_HORIZON_MINUTES", &value)?;
        }
        if let Some(value) = read_env("FARECAST_PREDICTION_STEP_MINUTES") {
            self.prediction.step_minutes = parse_env("FARECAST_PREDICTION_STEP_MINUTES", &value)?;
        }

        if let Some(value) = read_env("FARECAST_CONDITIONS_SEED") {
            self.conditions.seed = parse_env("FARECAST_CONDITIONS_SEED", &value)?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(bind_address) = overrides.bind_address {
            self.server.bind_address = bind_address;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
        if let Some(default_currency) = overrides.default_currency {
            self.pricing.default_currency = default_currency;
        }
        if let Some(seed) = overrides.conditions_seed {
            self.conditions.seed = seed;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        validate_pricing(&self.pricing)?;
        validate_prediction(&self.prediction)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from("config").join(DEFAULT_CONFIG_FILE)]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.bind_address.trim().is_empty() {
        return Err(ConfigError::Validation("server.bind_address must not be empty".to_string()));
    }

    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn validate_pricing(pricing: &PricingConfig) -> Result<(), ConfigError> {
    let floor = pricing.modifier_floor;
    let ceiling = pricing.modifier_ceiling;
    if !floor.is_finite() || floor <= 0.0 {
        return Err(ConfigError::Validation(
            "pricing.modifier_floor must be a positive number".to_string(),
        ));
    }
    if !ceiling.is_finite() || ceiling <= floor {
        return Err(ConfigError::Validation(
            "pricing.modifier_ceiling must be greater than pricing.modifier_floor".to_string(),
        ));
    }

    if !(0.0..1.0).contains(&pricing.eco_discount) {
        return Err(ConfigError::Validation(
            "pricing.eco_discount must be in range [0, 1)".to_string(),
        ));
    }

    for class in VehicleClass::ALL {
        let card = pricing.rates.card(class);
        let valid = [card.base, card.per_km, card.per_min]
            .into_iter()
            .all(|value| value.is_finite() && value >= 0.0);
        if !valid {
            return Err(ConfigError::Validation(format!(
                "pricing.rates.{} must contain non-negative base, per_km and per_min",
                class.as_str().to_ascii_lowercase()
            )));
        }
    }

    Ok(())
}

fn validate_prediction(prediction: &PredictionConfig) -> Result<(), ConfigError> {
    if prediction.step_minutes == 0 {
        return Err(ConfigError::Validation(
            "prediction.step_minutes must be greater than zero".to_string(),
        ));
    }
    if prediction.horizon_minutes == 0 || prediction.horizon_minutes > MAX_HORIZON_MINUTES {
        return Err(ConfigError::Validation(format!(
            "prediction.horizon_minutes must be in range 1..={MAX_HORIZON_MINUTES}"
        )));
    }
    if prediction.step_minutes > prediction.horizon_minutes {
        return Err(ConfigError::Validation(
            "prediction.step_minutes must not exceed prediction.horizon_minutes".to_string(),
        ));
    }

    Ok(())
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse::<T>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
    pricing: Option<PricingPatch>,
    prediction: Option<PredictionPatch>,
    conditions: Option<ConditionsPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[derive(Debug, Default, Deserialize)]
struct PricingPatch {
    default_currency: Option<Currency>,
    modifier_floor: Option<f64>,
    modifier_ceiling: Option<f64>,
    eco_discount: Option<f64>,
    rates: Option<RatesPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct RatesPatch {
    sedan: Option<RateCardPatch>,
    #[serde(alias = "SUV")]
    suv: Option<RateCardPatch>,
    electric: Option<RateCardPatch>,
    luxury: Option<RateCardPatch>,
}

impl RatesPatch {
    fn apply(self, table: &mut RateTable) {
        let patches = [
            (VehicleClass::Sedan, self.sedan),
            (VehicleClass::Suv, self.suv),
            (VehicleClass::Electric, self.electric),
            (VehicleClass::Luxury, self.luxury),
        ];
        for (class, patch) in patches {
            if let Some(patch) = patch {
                patch.apply(table.card_mut(class));
            }
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RateCardPatch {
    base: Option<f64>,
    per_km: Option<f64>,
    per_min: Option<f64>,
}

impl RateCardPatch {
    fn apply(self, card: &mut RateCard) {
        if let Some(base) = self.base {
            card.base = base;
        }
        if let Some(per_km) = self.per_km {
            card.per_km = per_km;
        }
        if let Some(per_min) = self.per_min {
            card.per_min = per_min;
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct PredictionPatch {
    horizon_minutes: Option<u32>,
    step_minutes: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct ConditionsPatch {
    seed: Option<u64>,
}
