pub mod download;
pub mod etl;
pub mod manifest;
pub mod pipeline;

pub use crate::domain::model::{DownloadOutcome, DownloadStatus, FetchSummary, PageImage, ParentItem};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
