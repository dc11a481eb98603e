//! Run configuration for the crash analytics pipeline.
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! environment variables prefixed with `CRASHES` using `__` as the nesting
//! separator (`CRASHES__DATA_DIR`, `CRASHES__FILES__PERSON`, ...).

use config::{builder::DefaultState, ConfigBuilder, Environment, File, FileFormat};
use getset::{Getters, Setters};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, instrument};
use typed_builder::TypedBuilder;

/// Prefix of the environment variables that override configuration values.
pub const ENV_PREFIX: &str = "CRASHES";

pub const DEFAULT_DATA_DIR: &str = "./Data";
pub const DEFAULT_OUTPUT_DIR: &str = "./Analytics_Results";
pub const DEFAULT_REPORT_NAME: &str = "Crashes_Analysis";
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// File names of the six input tables, relative to the data directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Getters, TypedBuilder)]
#[getset(get = "pub")]
pub struct InputFiles {
    person: String,
    restrict: String,
    unit: String,
    charge: String,
    damage: String,
    endorse: String,
}

impl Default for InputFiles {
    fn default() -> Self {
        Self {
            person: "Primary_Person_use.csv".to_string(),
            restrict: "Restrict_use.csv".to_string(),
            unit: "Units_use.csv".to_string(),
            charge: "Charges_use.csv".to_string(),
            damage: "Damages_use.csv".to_string(),
            endorse: "Endorse_use.csv".to_string(),
        }
    }
}

impl InputFiles {
    fn all(&self) -> [(&'static str, &String); 6] {
        [
            ("person", &self.person),
            ("restrict", &self.restrict),
            ("unit", &self.unit),
            ("charge", &self.charge),
            ("damage", &self.damage),
            ("endorse", &self.endorse),
        ]
    }
}

#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Getters, Setters, TypedBuilder,
)]
#[getset(get = "pub", set = "pub")]
pub struct CrashConfig {
    /// Directory holding the six input CSV files.
    data_dir: PathBuf,
    /// Directory the report is written to. Created if missing.
    output_dir: PathBuf,
    /// Report file stem; the report is `<output_dir>/<report_name>.csv`.
    report_name: String,
    files: InputFiles,
    /// Accepted timestamp formats, in `chrono` strftime syntax.
    timestamp_formats: Vec<String>,
    /// Run the eight analyses concurrently.
    parallel: bool,
    /// Tracing filter used when `RUST_LOG` is not set.
    log_level: String,
}

impl Default for CrashConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            report_name: DEFAULT_REPORT_NAME.to_string(),
            files: InputFiles::default(),
            timestamp_formats: ty::DEFAULT_TIMESTAMP_FORMATS
                .iter()
                .map(|f| f.to_string())
                .collect(),
            parallel: true,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl CrashConfig {
    /// Loads configuration from `file_path` (optional, TOML) and the
    /// environment, on top of the defaults.
    #[instrument]
    pub fn load_from_file_and_env(file_path: &Path) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let files = defaults.files();
        let config = ConfigBuilder::<DefaultState>::default()
            .set_default("data_dir", DEFAULT_DATA_DIR)?
            .set_default("output_dir", DEFAULT_OUTPUT_DIR)?
            .set_default("report_name", DEFAULT_REPORT_NAME)?
            .set_default("files.person", files.person().as_str())?
            .set_default("files.restrict", files.restrict().as_str())?
            .set_default("files.unit", files.unit().as_str())?
            .set_default("files.charge", files.charge().as_str())?
            .set_default("files.damage", files.damage().as_str())?
            .set_default("files.endorse", files.endorse().as_str())?
            .set_default("timestamp_formats", defaults.timestamp_formats().clone())?
            .set_default("parallel", true)?
            .set_default("log_level", DEFAULT_LOG_LEVEL)?
            .add_source(File::from(file_path).format(FileFormat::Toml).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        let config: CrashConfig = config.try_deserialize()?;
        config.validate()?;
        debug!(?config, "Configuration loaded");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.report_name.trim().is_empty() {
            return Err(ConfigError::Invalid("report_name must not be empty".to_string()));
        }
        for (table, name) in self.files.all() {
            if name.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "file name for the {} table must not be empty",
                    table
                )));
            }
        }
        Ok(())
    }

    /// Full path of an input file name.
    pub fn input_path(&self, file_name: &str) -> PathBuf {
        self.data_dir.join(file_name)
    }

    /// Full path of the report file.
    pub fn report_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.csv", self.report_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions_sorted::assert_eq;
    use std::env;
    use std::io::Write;

    #[test]
    fn test_defaults_without_file() {
        let config = CrashConfig::load_from_file_and_env(Path::new("does-not-exist.toml")).unwrap();
        assert_eq!(config.report_name(), DEFAULT_REPORT_NAME);
        assert_eq!(config.files().unit(), "Units_use.csv");
        assert_eq!(config.timestamp_formats().len(), ty::DEFAULT_TIMESTAMP_FORMATS.len());
        assert!(*config.parallel());
    }

    #[test]
    fn test_load_from_file() {
        let mut temp_file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            temp_file,
            r#"
            data_dir = "/srv/crashes"
            report_name = "Weekly"
            parallel = false

            [files]
            charge = "charges_2023.csv"
            "#
        )
        .unwrap();

        let config = CrashConfig::load_from_file_and_env(temp_file.path()).unwrap();
        assert_eq!(config.data_dir(), &PathBuf::from("/srv/crashes"));
        assert_eq!(config.files().charge(), "charges_2023.csv");
        assert_eq!(config.files().person(), "Primary_Person_use.csv");
        assert!(!*config.parallel());
        assert!(config.report_path().ends_with("Weekly.csv"));
    }

    #[test]
    fn test_env_overrides_file() {
        let mut temp_file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(temp_file, r#"output_dir = "from_file""#).unwrap();

        env::set_var("CRASHES__OUTPUT_DIR", "from_env");
        let config = CrashConfig::load_from_file_and_env(temp_file.path());
        env::remove_var("CRASHES__OUTPUT_DIR");

        assert_eq!(config.unwrap().output_dir(), &PathBuf::from("from_env"));
    }

    #[test]
    fn test_validate_rejects_empty_names() {
        let mut config = CrashConfig::default();
        config.set_report_name(" ".to_string());
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = CrashConfig::default();
        config.set_files(
            InputFiles::builder()
                .person(String::new())
                .restrict("r.csv".to_string())
                .unit("u.csv".to_string())
                .charge("c.csv".to_string())
                .damage("d.csv".to_string())
                .endorse("e.csv".to_string())
                .build(),
        );
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_paths() {
        let config = CrashConfig::default();
        assert_eq!(
            config.input_path("Units_use.csv"),
            PathBuf::from(DEFAULT_DATA_DIR).join("Units_use.csv")
        );
        assert_eq!(
            config.report_path(),
            PathBuf::from(DEFAULT_OUTPUT_DIR).join("Crashes_Analysis.csv")
        );
    }
}
