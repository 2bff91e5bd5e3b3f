use crate::utils::error::{FetchError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 設定檔中所有區段皆為選填；CLI 參數優先於檔案內容
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub images: ImagesConfig,
    #[serde(default)]
    pub download: DownloadConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    pub api_base: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub retry_attempts: Option<u32>,
    pub retry_delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImagesConfig {
    pub size: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DownloadConfig {
    pub concurrent_requests: Option<usize>,
    pub continue_on_error: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    pub manifest: Option<bool>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            FetchError::config(format!("Cannot read config file {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;
        Ok(toml::from_str(&processed_content)?)
    }

    /// 替換環境變數 (例如 ${BDR_API_BASE})；未設定的變數視為錯誤
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}")
            .map_err(|e| FetchError::config(e.to_string()))?;

        let mut missing = Vec::new();
        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| {
                missing.push(var_name.to_string());
                String::new()
            })
        });

        if !missing.is_empty() {
            return Err(FetchError::config(format!(
                "Environment variable(s) not set: {}",
                missing.join(", ")
            )));
        }

        Ok(result.into_owned())
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        if let Some(api_base) = &self.source.api_base {
            validation::validate_url("source.api_base", api_base)?;
        }
        if let Some(size) = &self.images.size {
            validation::validate_image_size("images.size", size)?;
        }
        if let Some(concurrent) = self.download.concurrent_requests {
            validation::validate_range("download.concurrent_requests", concurrent, 1, 64)?;
        }
        if let Some(retries) = self.source.retry_attempts {
            validation::validate_range("source.retry_attempts", retries, 0, 10)?;
        }
        if let Some(delay) = self.source.retry_delay_ms {
            validation::validate_range("source.retry_delay_ms", delay, 0, 60_000)?;
        }
        if let Some(timeout) = self.source.timeout_seconds {
            validation::validate_range("source.timeout_seconds", timeout, 1, 3600)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_toml_config() {
        let toml_content = r#"
[source]
api_base = "https://repository.library.brown.edu"
timeout_seconds = 60
retry_attempts = 3
retry_delay_ms = 250

[images]
size = "max"

[download]
concurrent_requests = 8
continue_on_error = true

[output]
manifest = true
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(
            config.source.api_base.as_deref(),
            Some("https://repository.library.brown.edu")
        );
        assert_eq!(config.source.retry_attempts, Some(3));
        assert_eq!(config.images.size.as_deref(), Some("max"));
        assert_eq!(config.download.concurrent_requests, Some(8));
        assert_eq!(config.output.manifest, Some(true));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_config_is_valid() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert!(config.source.api_base.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("BDR_FETCH_TEST_API_BASE", "https://bdr.test");

        let toml_content = r#"
[source]
api_base = "${BDR_FETCH_TEST_API_BASE}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.source.api_base.as_deref(), Some("https://bdr.test"));

        std::env::remove_var("BDR_FETCH_TEST_API_BASE");
    }

    #[test]
    fn test_missing_env_var_is_error() {
        let toml_content = r#"
[source]
api_base = "${BDR_FETCH_TEST_DEFINITELY_UNSET}"
"#;

        let err = TomlConfig::from_toml_str(toml_content).unwrap_err();
        assert!(err.to_string().contains("BDR_FETCH_TEST_DEFINITELY_UNSET"));
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let err = TomlConfig::from_toml_str("[download]\nthreads = 4\n").unwrap_err();
        assert!(matches!(err, FetchError::TomlError(_)));
    }

    #[test]
    fn test_config_validation() {
        let config = TomlConfig::from_toml_str("[download]\nconcurrent_requests = 0\n").unwrap();
        assert!(config.validate().is_err());

        let config = TomlConfig::from_toml_str("[source]\napi_base = \"invalid-url\"\n").unwrap();
        assert!(config.validate().is_err());

        let config = TomlConfig::from_toml_str("[source]\nretry_delay_ms = 600000\n").unwrap();
        assert!(config.validate().is_err());

        let config = TomlConfig::from_toml_str("[source]\nretry_delay_ms = 0\n").unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[images]\nsize = \"!1200,1200\"\n")
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.images.size.as_deref(), Some("!1200,1200"));
    }
}
