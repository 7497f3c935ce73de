//! Environment-resolved configuration for training and serving.
//!
//! Paths follow the SageMaker container layout under a root prefix
//! (`/opt/ml` by default). Every path can be overridden individually.

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::domain::ArimaOrder;
use crate::error::{AppError, ErrorKind};

pub const DEFAULT_ROOT: &str = "/opt/ml";
pub const HYPERPARAMETERS_FILE: &str = "hyperparameters.json";
pub const MODEL_FILE_NAME: &str = "model.json";

/// Periods per seasonal cycle used by the seasonal transform.
pub const DEFAULT_SEASON_LEN: usize = 12;
/// Sampling period of the PJM instantaneous load feed (10 minutes).
pub const DEFAULT_FREQ_SECS: i64 = 600;

/// Directories used by a training run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingPaths {
    /// Raw CSV channel. The canonical artifact is written here as well.
    pub input: PathBuf,
    /// Failure marker and diagnostics.
    pub output: PathBuf,
    /// Model bundle destination.
    pub model: PathBuf,
    /// Hyperparameter file location.
    pub config: PathBuf,
}

impl TrainingPaths {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve paths through an arbitrary lookup (used by `from_env` and tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let root = PathBuf::from(lookup("ROOT_PATH").unwrap_or_else(|| DEFAULT_ROOT.to_string()));
        let defaults = Self::under(&root);
        Self {
            input: lookup("INPUT_PATH").map(PathBuf::from).unwrap_or(defaults.input),
            output: lookup("OUTPUT_PATH").map(PathBuf::from).unwrap_or(defaults.output),
            model: lookup("MODEL_PATH").map(PathBuf::from).unwrap_or(defaults.model),
            config: lookup("CONFIG_PATH").map(PathBuf::from).unwrap_or(defaults.config),
        }
    }

    pub fn under(root: &Path) -> Self {
        Self {
            input: root.join("input").join("data").join("training"),
            output: root.join("output"),
            model: root.join("model"),
            config: root.join("input").join("config"),
        }
    }
}

/// Tunables read from `hyperparameters.json`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hyperparameters {
    pub season_len: usize,
    pub freq_secs: i64,
    pub order: ArimaOrder,
    /// Keep a bundle even when some zones failed to fit.
    pub allow_partial_fit: bool,
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Self {
            season_len: DEFAULT_SEASON_LEN,
            freq_secs: DEFAULT_FREQ_SECS,
            order: ArimaOrder::default(),
            allow_partial_fit: false,
        }
    }
}

impl Hyperparameters {
    /// Load `<config_dir>/hyperparameters.json`, falling back to defaults when absent.
    pub fn load(config_dir: &Path) -> Result<Self, AppError> {
        let path = config_dir.join(HYPERPARAMETERS_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let file = File::open(&path).map_err(|e| {
            AppError::new(
                ErrorKind::Io,
                format!("Failed to open hyperparameters '{}': {e}", path.display()),
            )
        })?;
        let raw: HashMap<String, Value> = serde_json::from_reader(file).map_err(|e| {
            AppError::new(
                ErrorKind::MalformedInput,
                format!("Invalid hyperparameters JSON '{}': {e}", path.display()),
            )
        })?;
        Self::from_map(&raw)
    }

    /// Build from a decoded JSON object. SageMaker passes every value as a string,
    /// so both `"12"` and `12` are accepted.
    pub fn from_map(raw: &HashMap<String, Value>) -> Result<Self, AppError> {
        let defaults = Self::default();
        let order = ArimaOrder {
            p: read_usize(raw, "p")?.unwrap_or(defaults.order.p),
            d: read_usize(raw, "d")?.unwrap_or(defaults.order.d),
            q: read_usize(raw, "q")?.unwrap_or(defaults.order.q),
        };
        let season_len = read_usize(raw, "season_len")?.unwrap_or(defaults.season_len);
        let freq_secs = read_usize(raw, "freq_secs")?
            .map(|v| v as i64)
            .unwrap_or(defaults.freq_secs);
        if freq_secs <= 0 {
            return Err(AppError::new(
                ErrorKind::InvalidParameter,
                "Hyperparameter `freq_secs` must be > 0.",
            ));
        }
        let allow_partial_fit = match raw.get("allow_partial_fit") {
            None => defaults.allow_partial_fit,
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => true,
                "false" | "0" | "no" => false,
                _ => {
                    return Err(AppError::new(
                        ErrorKind::InvalidParameter,
                        format!("Hyperparameter `allow_partial_fit` is not a boolean: '{s}'."),
                    ));
                }
            },
            Some(other) => {
                return Err(AppError::new(
                    ErrorKind::InvalidParameter,
                    format!("Hyperparameter `allow_partial_fit` is not a boolean: {other}."),
                ));
            }
        };

        Ok(Self {
            season_len,
            freq_secs,
            order,
            allow_partial_fit,
        })
    }
}

fn read_usize(raw: &HashMap<String, Value>, key: &str) -> Result<Option<usize>, AppError> {
    let invalid = |v: &Value| {
        AppError::new(
            ErrorKind::InvalidParameter,
            format!("Hyperparameter `{key}` must be a non-negative integer, got {v}."),
        )
    };
    match raw.get(key) {
        None => Ok(None),
        Some(v @ Value::Number(n)) => n.as_u64().map(|n| Some(n as usize)).ok_or_else(|| invalid(v)),
        Some(v @ Value::String(s)) => s.trim().parse::<usize>().map(Some).map_err(|_| invalid(v)),
        Some(v) => Err(invalid(v)),
    }
}

/// Serving process settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServeConfig {
    pub host: String,
    pub port: u16,
    pub model_file: PathBuf,
}

impl ServeConfig {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let root = PathBuf::from(lookup("ROOT_PATH").unwrap_or_else(|| DEFAULT_ROOT.to_string()));
        Self {
            host: lookup("SERVE_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: lookup("SERVE_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            model_file: lookup("MODEL_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| root.join("model").join(MODEL_FILE_NAME)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn training_paths_default_to_sagemaker_layout() {
        let paths = TrainingPaths::from_lookup(lookup_from(&[]));
        assert_eq!(paths.input, PathBuf::from("/opt/ml/input/data/training"));
        assert_eq!(paths.output, PathBuf::from("/opt/ml/output"));
        assert_eq!(paths.model, PathBuf::from("/opt/ml/model"));
        assert_eq!(paths.config, PathBuf::from("/opt/ml/input/config"));
    }

    #[test]
    fn training_paths_honour_root_and_overrides() {
        let paths = TrainingPaths::from_lookup(lookup_from(&[
            ("ROOT_PATH", "/tmp/ml"),
            ("MODEL_PATH", "/srv/models"),
        ]));
        assert_eq!(paths.input, PathBuf::from("/tmp/ml/input/data/training"));
        assert_eq!(paths.model, PathBuf::from("/srv/models"));
    }

    #[test]
    fn hyperparameters_accept_strings_and_numbers() {
        let raw: HashMap<String, Value> = serde_json::from_str(
            r#"{"season_len": "144", "p": 2, "allow_partial_fit": "true", "unrelated": "x"}"#,
        )
        .unwrap();
        let hp = Hyperparameters::from_map(&raw).unwrap();
        assert_eq!(hp.season_len, 144);
        assert_eq!(hp.order, ArimaOrder { p: 2, d: 1, q: 1 });
        assert!(hp.allow_partial_fit);
        assert_eq!(hp.freq_secs, DEFAULT_FREQ_SECS);
    }

    #[test]
    fn hyperparameters_reject_garbage() {
        let raw: HashMap<String, Value> = serde_json::from_str(r#"{"season_len": "-3"}"#).unwrap();
        let err = Hyperparameters::from_map(&raw).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
    }

    #[test]
    fn missing_hyperparameter_file_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let hp = Hyperparameters::load(dir.path()).unwrap();
        assert_eq!(hp, Hyperparameters::default());
    }

    #[test]
    fn serve_config_defaults() {
        let cfg = ServeConfig::from_lookup(lookup_from(&[("SERVE_PORT", "9000")]));
        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.model_file, PathBuf::from("/opt/ml/model/model.json"));
    }
}
