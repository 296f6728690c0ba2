//! Tests for configuration

#[cfg(test)]
mod tests {
    use super::super::config::*;
    use crate::ml::WindowLabeler;
    use std::io::Write;

    #[test]
    fn test_pipeline_config_default() {
        let config = PipelineConfig::default();
        assert_eq!(config.window_size, 10);
        assert_eq!(config.prediction_offset, 3);
        assert_eq!(config.interval, "15m");
        assert_eq!(config.period_days, 5);
        assert_eq!(config.period(), "5d");

        let labeler = WindowLabeler::new(config.window_size, config.prediction_offset);
        assert_eq!(labeler.required_rows(), 14);
    }

    #[test]
    fn test_model_config_default() {
        let config = ModelConfig::default();
        assert_eq!(config.n_estimators, 300);
        assert_eq!(config.learning_rate, 0.05);
        assert_eq!(config.max_depth, 5);
        assert_eq!(config.subsample, 0.9);
        assert_eq!(config.colsample_bytree, 0.9);
        assert_eq!(config.seed, 42);
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.pipeline.window_size, 10);
        assert_eq!(config.yahoo.base_url, "https://query1.finance.yahoo.com");
        assert_eq!(config.quotes.cache_ttl_secs, 5);
    }

    #[test]
    fn test_partial_sections() {
        let toml_str = r#"
[server]
port = 8080

[model]
seed = 7
n_estimators = 50
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.request_timeout_secs, 60);
        assert_eq!(config.model.seed, 7);
        assert_eq!(config.model.n_estimators, 50);
        assert_eq!(config.model.learning_rate, 0.05);
    }

    #[test]
    fn test_validate_defaults() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_window() {
        let mut config = Config::default();
        config.pipeline.window_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_ratios() {
        let mut config = Config::default();
        config.model.subsample = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.model.colsample_bytree = 1.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.model.learning_rate = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("predictor.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
[pipeline]
interval = "5m"
period_days = 2

[yahoo]
timeout_secs = 10
"#
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.pipeline.interval, "5m");
        assert_eq!(config.pipeline.period_days, 2);
        assert_eq!(config.yahoo.timeout_secs, 10);
        assert_eq!(config.pipeline.window_size, 10);
    }

    #[test]
    fn test_load_missing_file_is_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.model.n_estimators, 300);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[model]\nlearning_rate = 2.0\n").unwrap();
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_example_config_parses() {
        let example = include_str!("../config.example.toml");
        let config: Config = toml::from_str(example).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.model.seed, 42);
        assert_eq!(config.pipeline.period(), "5d");
    }
}
