use farecast_core::config::{AppConfig, LoadOptions};
use farecast_core::{FarePipeline, Location, TimeOfDay, TripRequest, VehicleClass};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

const DEPENDENT_CHECKS: [&str; 3] = ["prediction_horizon", "pricing_self_check", "condition_source"];

pub fn run(json_output: bool) -> String {
    let report = build_report();

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.extend(check_pipeline(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.extend(DEPENDENT_CHECKS.into_iter().map(|name| DoctorCheck {
                name,
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            }));
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_pipeline(config: &AppConfig) -> Vec<DoctorCheck> {
    let pipeline = match FarePipeline::from_config(config) {
        Ok(pipeline) => pipeline,
        Err(error) => {
            return vec![
                DoctorCheck {
                    name: "prediction_horizon",
                    status: CheckStatus::Fail,
                    details: error.to_string(),
                },
                DoctorCheck {
                    name: "pricing_self_check",
                    status: CheckStatus::Skipped,
                    details: "skipped because the pipeline could not be built".to_string(),
                },
                DoctorCheck {
                    name: "condition_source",
                    status: CheckStatus::Skipped,
                    details: "skipped because the pipeline could not be built".to_string(),
                },
            ];
        }
    };

    let horizon = pipeline.default_horizon();
    let probe = TripRequest::new(
        5.0,
        15.0,
        VehicleClass::Sedan,
        Location::named("doctor-probe"),
        TimeOfDay::Midday,
    )
    .with_currency(config.pricing.default_currency);

    vec![
        DoctorCheck {
            name: "prediction_horizon",
            status: CheckStatus::Pass,
            details: format!(
                "{} points every {} minutes",
                horizon.offsets().count(),
                horizon.step_minutes
            ),
        },
        check_pricing(&pipeline, &probe),
        check_conditions(&pipeline, &probe, config.conditions.seed),
    ]
}

fn check_pricing(pipeline: &FarePipeline, probe: &TripRequest) -> DoctorCheck {
    match pipeline.estimate(probe) {
        Ok(estimate) if estimate.fare.adjusted_fare.is_finite() && estimate.fare.adjusted_fare > 0.0 => {
            DoctorCheck {
                name: "pricing_self_check",
                status: CheckStatus::Pass,
                details: format!(
                    "probe trip priced at {:.2} {}",
                    estimate.fare.adjusted_fare, estimate.fare.currency
                ),
            }
        }
        Ok(estimate) => DoctorCheck {
            name: "pricing_self_check",
            status: CheckStatus::Fail,
            details: format!("probe trip produced unusable fare {}", estimate.fare.adjusted_fare),
        },
        Err(error) => DoctorCheck {
            name: "pricing_self_check",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
    }
}

fn check_conditions(pipeline: &FarePipeline, probe: &TripRequest, seed: u64) -> DoctorCheck {
    match pipeline.resolver().resolve(probe) {
        Ok(factors) => DoctorCheck {
            name: "condition_source",
            status: CheckStatus::Pass,
            details: format!(
                "simulated conditions (seed {seed}): {} traffic, {} weather, {} demand",
                factors.traffic.condition.as_str(),
                factors.weather.condition.as_str(),
                factors.demand.condition.as_str()
            ),
        },
        Err(error) => DoctorCheck {
            name: "condition_source",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
