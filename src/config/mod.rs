pub mod cli;
pub mod toml_config;

use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use toml_config::TomlConfig;

pub const DEFAULT_API_BASE: &str = "https://repository.library.brown.edu";
pub const DEFAULT_IMAGE_SIZE: &str = "!800,800";
pub const DEFAULT_CONCURRENT_REQUESTS: usize = 4;
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 2;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 500;
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, clap::Parser)]
#[command(name = "fetch-images")]
#[command(about = "Fetch page images of a Brown Digital Repository item")]
pub struct CliConfig {
    /// Persistent identifier of the parent item, e.g. bdr:123456
    pub pid: String,

    /// Directory the page images are written to
    pub output: PathBuf,

    /// Optional TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub api_base: Option<String>,

    /// IIIF size parameter
    #[arg(long)]
    pub image_size: Option<String>,

    #[arg(long)]
    pub concurrent_requests: Option<usize>,

    #[arg(long)]
    pub retry_attempts: Option<u32>,

    #[arg(long)]
    pub timeout_seconds: Option<u64>,

    /// Keep downloading remaining pages after a failure
    #[arg(long)]
    pub continue_on_error: bool,

    /// Write manifest.csv next to the images
    #[arg(long)]
    pub manifest: bool,

    /// Resolve pages without downloading anything
    #[arg(long)]
    pub dry_run: bool,

    /// Hide the progress bar
    #[arg(short, long)]
    pub quiet: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub log_json: bool,

    #[arg(long, help = "Log process CPU and memory usage")]
    pub monitor: bool,
}

/// CLI、設定檔與預設值合併後的最終設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchSettings {
    pub pid: String,
    pub output: PathBuf,
    pub api_base: String,
    pub image_size: String,
    pub concurrent_requests: usize,
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
    pub timeout_seconds: u64,
    pub continue_on_error: bool,
    pub manifest: bool,
    pub dry_run: bool,
    pub quiet: bool,
}

impl FetchSettings {
    pub fn new(pid: impl Into<String>, output: impl Into<PathBuf>) -> Self {
        Self {
            pid: pid.into(),
            output: output.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            image_size: DEFAULT_IMAGE_SIZE.to_string(),
            concurrent_requests: DEFAULT_CONCURRENT_REQUESTS,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            continue_on_error: false,
            manifest: false,
            dry_run: false,
            quiet: false,
        }
    }

    /// 套用設定檔中有給值的欄位
    pub fn apply_toml(mut self, file: &TomlConfig) -> Self {
        if let Some(v) = &file.source.api_base {
            self.api_base = v.clone();
        }
        if let Some(v) = file.source.timeout_seconds {
            self.timeout_seconds = v;
        }
        if let Some(v) = file.source.retry_attempts {
            self.retry_attempts = v;
        }
        if let Some(v) = file.source.retry_delay_ms {
            self.retry_delay_ms = v;
        }
        if let Some(v) = &file.images.size {
            self.image_size = v.clone();
        }
        if let Some(v) = file.download.concurrent_requests {
            self.concurrent_requests = v;
        }
        if let Some(v) = file.download.continue_on_error {
            self.continue_on_error = v;
        }
        if let Some(v) = file.output.manifest {
            self.manifest = v;
        }
        self
    }

    /// Precedence: CLI flag, then config file, then built-in default.
    #[cfg(feature = "cli")]
    pub fn resolve(cli: &CliConfig) -> Result<Self> {
        let mut settings = Self::new(cli.pid.trim(), cli.output.clone());

        if let Some(path) = &cli.config {
            tracing::info!("📁 Loading configuration from: {}", path.display());
            let file = TomlConfig::from_file(path)?;
            file.validate()?;
            settings = settings.apply_toml(&file);
        }

        if let Some(v) = &cli.api_base {
            settings.api_base = v.clone();
        }
        if let Some(v) = &cli.image_size {
            settings.image_size = v.clone();
        }
        if let Some(v) = cli.concurrent_requests {
            settings.concurrent_requests = v;
        }
        if let Some(v) = cli.retry_attempts {
            settings.retry_attempts = v;
        }
        if let Some(v) = cli.timeout_seconds {
            settings.timeout_seconds = v;
        }
        settings.continue_on_error |= cli.continue_on_error;
        settings.manifest |= cli.manifest;
        settings.dry_run = cli.dry_run;
        settings.quiet = cli.quiet;

        Ok(settings)
    }
}

impl Validate for FetchSettings {
    fn validate(&self) -> Result<()> {
        validation::validate_non_empty_string("pid", &self.pid)?;
        validation::validate_path("output", &self.output.to_string_lossy())?;
        validation::validate_url("api_base", &self.api_base)?;
        validation::validate_image_size("image_size", &self.image_size)?;
        validation::validate_range("concurrent_requests", self.concurrent_requests, 1, 64)?;
        validation::validate_range("retry_attempts", self.retry_attempts, 0, 10)?;
        validation::validate_range("retry_delay_ms", self.retry_delay_ms, 0, 60_000)?;
        validation::validate_range("timeout_seconds", self.timeout_seconds, 1, 3600)?;
        Ok(())
    }
}

impl ConfigProvider for FetchSettings {
    fn pid(&self) -> &str {
        &self.pid
    }

    fn api_base(&self) -> &str {
        &self.api_base
    }

    fn image_size(&self) -> &str {
        &self.image_size
    }

    fn concurrent_requests(&self) -> usize {
        self.concurrent_requests
    }

    fn retry_attempts(&self) -> u32 {
        self.retry_attempts
    }

    fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    fn continue_on_error(&self) -> bool {
        self.continue_on_error
    }

    fn write_manifest(&self) -> bool {
        self.manifest
    }

    fn dry_run(&self) -> bool {
        self.dry_run
    }

    fn quiet(&self) -> bool {
        self.quiet
    }
}
