use clap::Args;
use farecast_core::config::{AppConfig, LoadOptions};
use farecast_core::{
    Currency, DomainError, FarePipeline, Location, TimeOfDay, TripRequest, VehicleClass,
};

use crate::commands::{CommandResult, EXIT_CONFIG, EXIT_INVALID_INPUT};

#[derive(Clone, Debug, Args)]
pub struct TripArgs {
    #[arg(long, help = "Trip distance in kilometres")]
    pub distance: f64,
    #[arg(long, help = "Trip duration in minutes")]
    pub duration: f64,
    #[arg(long = "class", default_value = "sedan", help = "sedan | suv | electric | luxury")]
    pub vehicle_class: String,
    #[arg(long, default_value = "New York", help = "Place name or `lat,lng` pair")]
    pub location: String,
    #[arg(long, default_value = "midday", help = "early_morning | morning_rush | midday | evening_rush | evening | night")]
    pub time_of_day: String,
    #[arg(long, help = "ISO currency code (defaults to pricing.default_currency)")]
    pub currency: Option<String>,
    #[arg(long, default_value_t = 1)]
    pub passengers: u32,
}

impl TripArgs {
    pub fn to_request(&self, default_currency: Currency) -> Result<TripRequest, DomainError> {
        let vehicle_class = self.vehicle_class.parse::<VehicleClass>()?;
        let time_of_day = self.time_of_day.parse::<TimeOfDay>()?;
        let location = self.location.parse::<Location>()?;
        let currency = match self.currency.as_deref() {
            Some(code) => code.parse::<Currency>()?,
            None => default_currency,
        };

        Ok(TripRequest::new(self.distance, self.duration, vehicle_class, location, time_of_day)
            .with_currency(currency)
            .with_passengers(self.passengers))
    }
}

pub struct Session {
    pub config: AppConfig,
    pub pipeline: FarePipeline,
}

/// Loads configuration and builds the pipeline, or the failure to print.
pub fn load_session(command: &str) -> Result<Session, CommandResult> {
    let config = AppConfig::load(LoadOptions::default()).map_err(|error| {
        CommandResult::failure(command, "config_validation", error.to_string(), EXIT_CONFIG)
    })?;
    let pipeline = FarePipeline::from_config(&config).map_err(|error| {
        CommandResult::failure(command, "config_validation", error.to_string(), EXIT_CONFIG)
    })?;
    Ok(Session { config, pipeline })
}

pub fn invalid_input(command: &str, error: DomainError) -> CommandResult {
    CommandResult::failure(command, "invalid_input", error.to_string(), EXIT_INVALID_INPUT)
}

pub fn to_json(command: &str, message: &str, value: &impl serde::Serialize) -> CommandResult {
    match serde_json::to_value(value) {
        Ok(data) => CommandResult::success_with_data(command, message, data),
        Err(error) => CommandResult::failure(command, "serialization", error.to_string(), 1),
    }
}
