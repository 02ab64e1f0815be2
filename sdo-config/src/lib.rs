use config::{Config, Environment, File, FileFormat};
use sdo_anomaly::DetectorConfig;
use sdo_core::{AppConfig, Result, SdoError, SourceKind};
use std::path::Path;
use tracing::info;

const ENV_PREFIX: &str = "SDO_MONITOR";

pub struct ConfigManager {
    app_config: AppConfig,
}

impl ConfigManager {
    pub fn new() -> Result<Self> {
        Self::from_file("config.yaml")
    }

    /// YAML file first, then `SDO_MONITOR__SECTION__KEY` environment overrides.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()).format(FileFormat::Yaml))
            .add_source(environment())
            .build()
            .map_err(|e| SdoError::Configuration(e.to_string()))?;

        let app_config: AppConfig = config
            .try_deserialize()
            .map_err(|e| SdoError::Configuration(e.to_string()))?;

        info!("Configuration loaded from {}", path.as_ref().display());
        Ok(Self { app_config })
    }

    pub fn from_env() -> Result<Self> {
        let config = Config::builder()
            .add_source(environment())
            .build()
            .map_err(|e| SdoError::Configuration(e.to_string()))?;

        let app_config: AppConfig = config
            .try_deserialize()
            .map_err(|e| SdoError::Configuration(e.to_string()))?;

        info!("Configuration loaded from environment");
        Ok(Self { app_config })
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()
            .map_err(|e| SdoError::Configuration(e.to_string()))?;

        let app_config: AppConfig = config
            .try_deserialize()
            .map_err(|e| SdoError::Configuration(e.to_string()))?;

        Ok(Self { app_config })
    }

    pub fn from_defaults() -> Self {
        Self {
            app_config: AppConfig::default(),
        }
    }

    pub fn get_config(&self) -> &AppConfig {
        &self.app_config
    }

    pub fn get_config_mut(&mut self) -> &mut AppConfig {
        &mut self.app_config
    }

    pub fn into_config(self) -> AppConfig {
        self.app_config
    }

    pub fn validate(&self) -> Result<()> {
        let config = &self.app_config;

        DetectorConfig::from_settings(&config.detector)
            .map_err(|e| SdoError::Configuration(e.to_string()))?;

        let stream = &config.stream;
        if stream.warmup_window == 0 {
            return Err(SdoError::Configuration(
                "Warm-up window must not be empty".to_string(),
            ));
        }

        if stream.stream_length == 0 {
            return Err(SdoError::Configuration(
                "Stream length must be positive".to_string(),
            ));
        }

        if stream.adapt_every == 0 || stream.report_every == 0 {
            return Err(SdoError::Configuration(
                "Adaptation and report intervals must be positive".to_string(),
            ));
        }

        if stream.adapt_window == 0 || stream.adapt_window > stream.required_points() {
            return Err(SdoError::Configuration(format!(
                "Adaptation window must be within 1..={}",
                stream.required_points()
            )));
        }

        if config.source.kind == SourceKind::Csv && config.source.path.is_none() {
            return Err(SdoError::Configuration(
                "CSV source requires a path".to_string(),
            ));
        }

        if config.source.kind == SourceKind::Yahoo && config.source.ticker.trim().is_empty() {
            return Err(SdoError::Configuration(
                "Yahoo source requires a ticker".to_string(),
            ));
        }

        info!("Configuration validation passed");
        Ok(())
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(&self.app_config)
            .map_err(|e| SdoError::Configuration(e.to_string()))?;

        std::fs::write(path, yaml).map_err(|e| SdoError::Configuration(e.to_string()))?;

        info!("Configuration saved to file");
        Ok(())
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_defaults_are_valid() {
        let manager = ConfigManager::from_defaults();
        assert!(manager.validate().is_ok());
        assert_eq!(manager.get_config().detector.capacity, 50);
    }

    #[test]
    fn test_yaml_overrides_defaults() {
        let yaml = "detector:\n  capacity: 30\n  threshold: 2.5\n  seed: 7\nstream:\n  delay_ms: 0\n";
        let manager = ConfigManager::from_yaml_str(yaml).unwrap();
        let config = manager.get_config();
        assert_eq!(config.detector.capacity, 30);
        assert_eq!(config.detector.threshold, 2.5);
        assert_eq!(config.detector.seed, Some(7));
        assert_eq!(config.detector.active_observers, 5);
        assert_eq!(config.stream.delay_ms, 0);
        assert_eq!(config.stream.warmup_window, 200);
    }

    #[test]
    fn test_validate_rejects_bad_detector() {
        let mut manager = ConfigManager::from_defaults();
        manager.get_config_mut().detector.active_observers = 60;
        assert!(matches!(manager.validate(), Err(SdoError::Configuration(_))));
    }

    #[test]
    fn test_validate_rejects_csv_without_path() {
        let mut manager = ConfigManager::from_defaults();
        manager.get_config_mut().source.kind = SourceKind::Csv;
        assert!(manager.validate().is_err());

        manager.get_config_mut().source.path = Some(PathBuf::from("prices.csv"));
        assert!(manager.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_oversized_adapt_window() {
        let mut manager = ConfigManager::from_defaults();
        manager.get_config_mut().stream.adapt_window = 5000;
        assert!(manager.validate().is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let path = std::env::temp_dir().join(format!("sdo-config-{}.yaml", std::process::id()));
        let mut manager = ConfigManager::from_defaults();
        manager.get_config_mut().detector.threshold = 12.5;
        manager.save_to_file(&path).unwrap();

        let reloaded = ConfigManager::from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(reloaded.get_config(), manager.get_config());
    }
}
