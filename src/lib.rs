pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{cli::LocalStorage, FetchSettings};

pub use core::{etl::FetchEngine, pipeline::ImagePipeline};
pub use domain::model::{DownloadOutcome, DownloadStatus, FetchSummary, PageImage, ParentItem};
pub use utils::error::{FetchError, Result};
