use crate::domain::model::{DownloadOutcome, PageImage, ParentItem};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn exists(&self, path: &str) -> impl std::future::Future<Output = bool> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn ensure_root(&self) -> impl std::future::Future<Output = Result<()>> + Send;
    fn root(&self) -> &Path;
}

pub trait ConfigProvider: Send + Sync {
    fn pid(&self) -> &str;
    fn api_base(&self) -> &str;
    fn image_size(&self) -> &str;
    fn concurrent_requests(&self) -> usize;
    fn retry_attempts(&self) -> u32;
    fn retry_delay(&self) -> Duration;
    fn request_timeout(&self) -> Duration;
    fn continue_on_error(&self) -> bool;
    fn write_manifest(&self) -> bool;
    fn dry_run(&self) -> bool;
    fn quiet(&self) -> bool;

    fn item_url(&self) -> String {
        format!("{}/api/items/{}/", self.api_base().trim_end_matches('/'), self.pid())
    }

    fn image_url(&self, child_pid: &str) -> String {
        format!(
            "{}/iiif/image/{}/full/{}/0/default.jpg",
            self.api_base().trim_end_matches('/'),
            child_pid,
            self.image_size()
        )
    }
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    fn parent_pid(&self) -> &str;
    fn output_dir(&self) -> &Path;
    async fn extract(&self) -> Result<ParentItem>;
    async fn transform(&self, parent: ParentItem) -> Result<Vec<PageImage>>;
    async fn load(&self, pages: Vec<PageImage>) -> Result<Vec<DownloadOutcome>>;
}
