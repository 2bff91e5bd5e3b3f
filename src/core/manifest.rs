use crate::domain::model::DownloadOutcome;
use crate::utils::error::{FetchError, Result};

pub const MANIFEST_FILE: &str = "manifest.csv";

/// 產生 `page,pid,file,image_url,status` 格式的清單，供後續 alt-text 步驟使用
pub fn render_manifest(outcomes: &[DownloadOutcome]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["page", "pid", "file", "image_url", "status"])?;

    for outcome in outcomes {
        writer.write_record([
            outcome.image.page.as_str(),
            outcome.image.pid.as_str(),
            outcome.image.file_name.as_str(),
            outcome.image.image_url.as_str(),
            outcome.status.label(),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| FetchError::IoError(e.into_error()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{DownloadStatus, PageImage};

    #[test]
    fn test_manifest_rows_follow_outcomes() {
        let outcomes = vec![
            DownloadOutcome {
                image: PageImage::new("bdr:2", "1", "http://h/iiif/image/bdr:2/full/!800,800/0/default.jpg".to_string()),
                status: DownloadStatus::Downloaded { bytes: 10 },
            },
            DownloadOutcome {
                image: PageImage::new("bdr:3", "2", "http://h/b.jpg".to_string()),
                status: DownloadStatus::Skipped,
            },
        ];

        let text = String::from_utf8(render_manifest(&outcomes).unwrap()).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "page,pid,file,image_url,status");
        // IIIF size contains a comma, so the URL must be quoted
        assert_eq!(
            lines[1],
            "0001,bdr:2,0001.jpg,\"http://h/iiif/image/bdr:2/full/!800,800/0/default.jpg\",downloaded"
        );
        assert_eq!(lines[2], "0002,bdr:3,0002.jpg,http://h/b.jpg,skipped");
    }
}
