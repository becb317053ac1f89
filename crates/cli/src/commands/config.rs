use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use farecast_core::config::{AppConfig, LoadOptions, DEFAULT_CONFIG_FILE};
use farecast_core::VehicleClass;
use toml::Value;

struct Entry {
    key: String,
    value: String,
    env_keys: Vec<String>,
}

impl Entry {
    fn new(key: &str, value: impl ToString) -> Self {
        let env_key = format!("FARECAST_{}", key.replace('.', "_").to_ascii_uppercase());
        Self { key: key.to_string(), value: value.to_string(), env_keys: vec![env_key] }
    }

    fn file_only(key: String, value: impl ToString) -> Self {
        Self { key, value: value.to_string(), env_keys: Vec::new() }
    }

    fn with_alias(mut self, alias: &str) -> Self {
        self.env_keys.push(alias.to_string());
        self
    }
}

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    lines.extend(entries(&config).into_iter().map(|entry| {
        let source = field_source(
            &entry.key,
            &entry.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        render_line(&entry.key, &entry.value, source)
    }));

    lines.join("\n")
}

fn entries(config: &AppConfig) -> Vec<Entry> {
    let mut entries = vec![
        Entry::new("server.bind_address", &config.server.bind_address),
        Entry::new("server.port", config.server.port),
        Entry::new("server.graceful_shutdown_secs", config.server.graceful_shutdown_secs),
        Entry::new("logging.level", &config.logging.level).with_alias("FARECAST_LOG_LEVEL"),
        Entry::new("logging.format", config.logging.format.as_str())
            .with_alias("FARECAST_LOG_FORMAT"),
        Entry::new("pricing.default_currency", config.pricing.default_currency),
        Entry::new("pricing.modifier_floor", config.pricing.modifier_floor),
        Entry::new("pricing.modifier_ceiling", config.pricing.modifier_ceiling),
        Entry::new("pricing.eco_discount", config.pricing.eco_discount),
    ];

    for class in VehicleClass::ALL {
        let card = config.pricing.rates.card(class);
        let key = format!("pricing.rates.{}", class.as_str().to_ascii_lowercase());
        entries.push(Entry::file_only(
            key,
            format!("base {} + {}/km + {}/min", card.base, card.per_km, card.per_min),
        ));
    }

    entries.extend([
        Entry::new("prediction.horizon_minutes", config.prediction.horizon_minutes),
        Entry::new("prediction.step_minutes", config.prediction.step_minutes),
        Entry::new("conditions.seed", config.conditions.seed),
    ]);
    entries
}

fn detect_config_path() -> Option<PathBuf> {
    let root = PathBuf::from(DEFAULT_CONFIG_FILE);
    if root.exists() {
        return Some(root);
    }

    let nested = Path::new("config").join(DEFAULT_CONFIG_FILE);
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[String],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
