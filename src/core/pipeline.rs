use crate::core::download;
use crate::core::manifest::{render_manifest, MANIFEST_FILE};
use crate::core::{
    ConfigProvider, DownloadOutcome, DownloadStatus, PageImage, ParentItem, Pipeline, Storage,
};
use crate::utils::error::{FetchError, Result};
use crate::utils::progress;
use reqwest::Client;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// 取得父項目、解析子頁面並下載 IIIF 影像
pub struct ImagePipeline<S: Storage + 'static, C: ConfigProvider> {
    storage: Arc<S>,
    config: C,
    client: Client,
}

impl<S: Storage + 'static, C: ConfigProvider> ImagePipeline<S, C> {
    pub fn new(storage: S, config: C) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!("bdr-fetch/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            storage: Arc::new(storage),
            config,
            client,
        })
    }

    async fn write_manifest_if_enabled(&self, outcomes: &[DownloadOutcome]) -> Result<()> {
        if !self.config.write_manifest() {
            return Ok(());
        }
        let data = render_manifest(outcomes)?;
        self.storage.write_file(MANIFEST_FILE, &data).await?;
        tracing::info!("📝 Manifest written to {}", MANIFEST_FILE);
        Ok(())
    }
}

async fn fetch_page<S: Storage>(
    client: &Client,
    storage: &S,
    image: &PageImage,
    retries: u32,
    delay: Duration,
) -> Result<DownloadStatus> {
    if storage.exists(&image.file_name).await {
        tracing::debug!(
            "Image already exists at {}, skipping download.",
            storage.root().join(&image.file_name).display()
        );
        return Ok(DownloadStatus::Skipped);
    }

    let bytes = download::get_bytes_with_retry(client, &image.image_url, retries, delay).await?;
    storage.write_file(&image.file_name, &bytes).await?;
    Ok(DownloadStatus::Downloaded {
        bytes: bytes.len() as u64,
    })
}

fn is_safe_file_name(name: &str) -> bool {
    !name.contains('/') && !name.contains('\\') && !name.starts_with('.')
}

#[async_trait::async_trait]
impl<S: Storage + 'static, C: ConfigProvider> Pipeline for ImagePipeline<S, C> {
    fn parent_pid(&self) -> &str {
        self.config.pid()
    }

    fn output_dir(&self) -> &Path {
        self.storage.root()
    }

    async fn extract(&self) -> Result<ParentItem> {
        let url = self.config.item_url();
        tracing::debug!("Fetching parent item from: {}", url);

        let body = match download::get_bytes_with_retry(
            &self.client,
            &url,
            self.config.retry_attempts(),
            self.config.retry_delay(),
        )
        .await
        {
            Ok(body) => body,
            Err(e) => {
                tracing::error!("❌ {}", e.user_friendly_message());
                return Err(e);
            }
        };

        serde_json::from_slice(&body).map_err(|e| {
            tracing::error!("❌ JSON Decode Error: {}", e);
            FetchError::from(e)
        })
    }

    async fn transform(&self, parent: ParentItem) -> Result<Vec<PageImage>> {
        let relations = parent
            .relations
            .filter(|r| !r.is_empty())
            .ok_or_else(|| FetchError::processing("No relations found in parent data."))?;

        let children = relations
            .children()
            .filter(|c| !c.is_empty())
            .ok_or_else(|| FetchError::processing("No child items found in parent data."))?;

        let mut seen = HashSet::new();
        let mut pages = Vec::with_capacity(children.len());
        for child in &children {
            let Some((pid, order)) = child.page_key() else {
                continue;
            };
            let image = PageImage::new(pid, &order, self.config.image_url(pid));

            if !is_safe_file_name(&image.file_name) {
                tracing::warn!("⚠️ Skipping {}: unusable page number '{}'", pid, order);
                continue;
            }
            if !seen.insert(image.file_name.clone()) {
                tracing::warn!("⚠️ Skipping {}: page {} already assigned", pid, image.page);
                continue;
            }
            pages.push(image);
        }

        if pages.is_empty() {
            return Err(FetchError::processing("No valid child PIDs found."));
        }

        tracing::info!("Found {} child PIDs.", pages.len());
        Ok(pages)
    }

    async fn load(&self, pages: Vec<PageImage>) -> Result<Vec<DownloadOutcome>> {
        if self.config.dry_run() {
            tracing::info!("🔎 Dry run: {} images would be downloaded", pages.len());
            return Ok(pages
                .into_iter()
                .map(|image| DownloadOutcome {
                    image,
                    status: DownloadStatus::Planned,
                })
                .collect());
        }

        self.storage.ensure_root().await?;

        let total = pages.len();
        let bar = progress::download_bar(total, self.config.quiet());
        let semaphore = Arc::new(Semaphore::new(self.config.concurrent_requests()));
        let retries = self.config.retry_attempts();
        let delay = self.config.retry_delay();

        let mut tasks = JoinSet::new();
        for (index, image) in pages.into_iter().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let storage = Arc::clone(&self.storage);
            let client = self.client.clone();
            tasks.spawn(async move {
                let status = match semaphore.acquire_owned().await {
                    Ok(_permit) => fetch_page(&client, storage.as_ref(), &image, retries, delay).await,
                    Err(e) => Err(FetchError::processing(e.to_string())),
                };
                (index, image, status)
            });
        }

        let mut slots: Vec<Option<DownloadOutcome>> = vec![None; total];
        while let Some(joined) = tasks.join_next().await {
            let (index, image, status) = match joined {
                Ok(result) => result,
                Err(e) => {
                    tasks.abort_all();
                    bar.abandon();
                    return Err(e.into());
                }
            };

            let status = match status {
                Ok(status) => status,
                Err(e) if self.config.continue_on_error() => {
                    tracing::error!("❌ Error processing PID {}: {}", image.pid, e);
                    DownloadStatus::Failed {
                        reason: e.to_string(),
                    }
                }
                Err(e) => {
                    tracing::error!("❌ Error processing PID {}: {}", image.pid, e);
                    tasks.abort_all();
                    bar.abandon();
                    return Err(e);
                }
            };

            bar.inc(1);
            slots[index] = Some(DownloadOutcome { image, status });
        }
        bar.finish_and_clear();

        let outcomes: Vec<DownloadOutcome> = slots.into_iter().flatten().collect();
        self.write_manifest_if_enabled(&outcomes).await?;
        Ok(outcomes)
    }
}
