use anyhow::{Context, Result};
use serde::Deserialize;
use std::{
    env, fs,
    path::{Path, PathBuf},
};

pub const CONFIG_ENV: &str = "ETHIOPULSE_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "ethiopulse.yaml";

/// Where the store reads and writes its files.
///
/// Loaded from a YAML file (all keys optional), then overridden by
/// `ETHIOPULSE_DATA_DIR`, `ETHIOPULSE_REPORTS_DIR` and `ETHIOPULSE_LOG`.
/// Relative file names resolve against `data_dir` / `reports_dir`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub reports_dir: PathBuf,
    pub unified_data: PathBuf,
    pub enriched_data: PathBuf,
    pub reference_codes: PathBuf,
    pub data_source_guide: PathBuf,
    pub forecast_table: PathBuf,
    pub forecast_scenarios: PathBuf,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            reports_dir: PathBuf::from("reports"),
            unified_data: PathBuf::from("raw/ethiopia_fi_unified_data.csv"),
            enriched_data: PathBuf::from("processed/ethiopia_fi_enriched.csv"),
            reference_codes: PathBuf::from("raw/reference_codes.csv"),
            data_source_guide: PathBuf::from("raw/additional_data_points_guide.xlsx"),
            forecast_table: PathBuf::from("task4_forecast_table_2025_2027.csv"),
            forecast_scenarios: PathBuf::from("task4_forecast_scenarios.csv"),
            log_filter: "info".to_string(),
        }
    }
}

impl Settings {
    /// `path` if given, else `$ETHIOPULSE_CONFIG`, else `ethiopulse.yaml` when
    /// it exists, else defaults. Environment overrides apply last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let explicit = path
            .map(Path::to_path_buf)
            .or_else(|| env::var_os(CONFIG_ENV).map(PathBuf::from));

        let mut settings = match explicit {
            Some(p) => Self::from_file(&p)?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };

        settings.apply_env(|key| env::var(key).ok());
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("ETHIOPULSE_DATA_DIR") {
            self.data_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("ETHIOPULSE_REPORTS_DIR") {
            self.reports_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("ETHIOPULSE_LOG") {
            self.log_filter = v;
        }
    }

    pub fn unified_data_path(&self) -> PathBuf {
        self.data_dir.join(&self.unified_data)
    }

    pub fn enriched_data_path(&self) -> PathBuf {
        self.data_dir.join(&self.enriched_data)
    }

    pub fn reference_codes_path(&self) -> PathBuf {
        self.data_dir.join(&self.reference_codes)
    }

    pub fn data_source_guide_path(&self) -> PathBuf {
        self.data_dir.join(&self.data_source_guide)
    }

    pub fn forecast_table_path(&self) -> PathBuf {
        self.reports_dir.join(&self.forecast_table)
    }

    pub fn forecast_scenarios_path(&self) -> PathBuf {
        self.reports_dir.join(&self.forecast_scenarios)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn partial_yaml_keeps_defaults() -> Result<()> {
        let s = Settings::from_yaml("data_dir: /srv/fi\nlog_filter: debug\n")?;
        assert_eq!(s.data_dir, PathBuf::from("/srv/fi"));
        assert_eq!(s.log_filter, "debug");
        assert_eq!(
            s.enriched_data_path(),
            PathBuf::from("/srv/fi/processed/ethiopia_fi_enriched.csv")
        );
        assert_eq!(s.reports_dir, PathBuf::from("reports"));
        Ok(())
    }

    #[test]
    fn empty_yaml_is_default() -> Result<()> {
        assert_eq!(Settings::from_yaml("\n")?, Settings::default());
        Ok(())
    }

    #[test]
    fn unknown_shape_is_an_error() {
        assert!(Settings::from_yaml("data_dir: [1, 2]").is_err());
    }

    #[test]
    fn env_overrides_file() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("ethiopulse.yaml");
        fs::write(&path, "reports_dir: out\n")?;

        let mut s = Settings::load(Some(path.as_path()))?;
        let vars = HashMap::from([
            ("ETHIOPULSE_REPORTS_DIR", "elsewhere"),
            ("ETHIOPULSE_LOG", "warn"),
        ]);
        s.apply_env(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(s.forecast_table_path(), PathBuf::from("elsewhere/task4_forecast_table_2025_2027.csv"));
        assert_eq!(s.log_filter, "warn");
        Ok(())
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        assert!(Settings::load(Some(Path::new("/nonexistent/ethiopulse.yaml"))).is_err());
    }
}
