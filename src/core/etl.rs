use crate::core::{FetchSummary, Pipeline};
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;
use chrono::Utc;

pub struct FetchEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> FetchEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<FetchSummary> {
        let started_at = Utc::now();
        tracing::info!("🚀 Fetching item {}", self.pipeline.parent_pid());

        // Extract
        tracing::info!("📥 Fetching parent item data...");
        let parent = self.pipeline.extract().await?;
        self.monitor.log_stats("Extract");

        // Transform
        let pages = self.pipeline.transform(parent).await?;
        self.monitor.log_stats("Transform");

        // Load
        tracing::info!(
            "🖼️ Downloading {} images to {}",
            pages.len(),
            self.pipeline.output_dir().display()
        );
        let outcomes = self.pipeline.load(pages).await?;
        self.monitor.log_stats("Load");
        self.monitor.log_final_stats();

        let summary = FetchSummary {
            parent_pid: self.pipeline.parent_pid().to_string(),
            output_dir: self.pipeline.output_dir().to_path_buf(),
            outcomes,
            started_at,
            finished_at: Utc::now(),
        };

        tracing::info!(
            "✅ Finished in {}s: {} downloaded, {} skipped, {} failed",
            (summary.finished_at - summary.started_at).num_seconds(),
            summary.downloaded(),
            summary.skipped(),
            summary.failed()
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DownloadOutcome, DownloadStatus, PageImage, ParentItem};
    use crate::utils::error::FetchError;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicBool, Ordering};

    struct StubPipeline {
        output: PathBuf,
        fail_transform: bool,
        loaded: AtomicBool,
    }

    #[async_trait::async_trait]
    impl Pipeline for StubPipeline {
        fn parent_pid(&self) -> &str {
            "bdr:stub"
        }

        fn output_dir(&self) -> &Path {
            &self.output
        }

        async fn extract(&self) -> Result<ParentItem> {
            Ok(ParentItem::default())
        }

        async fn transform(&self, _parent: ParentItem) -> Result<Vec<PageImage>> {
            if self.fail_transform {
                return Err(FetchError::processing("No relations found in parent data."));
            }
            Ok(vec![
                PageImage::new("bdr:1", "1", "http://h/1.jpg".to_string()),
                PageImage::new("bdr:2", "2", "http://h/2.jpg".to_string()),
            ])
        }

        async fn load(&self, pages: Vec<PageImage>) -> Result<Vec<DownloadOutcome>> {
            self.loaded.store(true, Ordering::SeqCst);
            Ok(pages
                .into_iter()
                .enumerate()
                .map(|(i, image)| DownloadOutcome {
                    image,
                    status: if i == 0 {
                        DownloadStatus::Downloaded { bytes: 3 }
                    } else {
                        DownloadStatus::Skipped
                    },
                })
                .collect())
        }
    }

    #[tokio::test]
    async fn test_run_builds_summary() {
        let engine = FetchEngine::new(StubPipeline {
            output: PathBuf::from("out"),
            fail_transform: false,
            loaded: AtomicBool::new(false),
        });

        let summary = engine.run().await.unwrap();

        assert_eq!(summary.parent_pid, "bdr:stub");
        assert_eq!(summary.output_dir, PathBuf::from("out"));
        assert_eq!(summary.total(), 2);
        assert_eq!(summary.downloaded(), 1);
        assert_eq!(summary.skipped(), 1);
        assert_eq!(summary.failed(), 0);
        assert!(summary.finished_at >= summary.started_at);
    }

    #[tokio::test]
    async fn test_transform_error_stops_before_load() {
        let engine = FetchEngine::new_with_monitoring(
            StubPipeline {
                output: PathBuf::from("out"),
                fail_transform: true,
                loaded: AtomicBool::new(false),
            },
            true,
        );

        let err = engine.run().await.unwrap_err();

        assert_eq!(err.to_string(), "No relations found in parent data.");
        assert!(!engine.pipeline.loaded.load(Ordering::SeqCst));
    }
}
