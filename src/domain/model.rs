use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;

/// `GET /api/items/{pid}/` 的回應；只保留需要的欄位
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParentItem {
    #[serde(default)]
    pub pid: Option<String>,
    #[serde(default)]
    pub relations: Option<Relations>,
}

/// `has_part` 區分三種情況：缺少鍵 (`None`)、`null` (`Some(None)`)、有值
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Relations {
    #[serde(
        rename = "hasPart",
        default,
        deserialize_with = "present_key",
        skip_serializing_if = "Option::is_none"
    )]
    pub has_part: Option<Option<Vec<ChildRef>>>,
    #[serde(flatten)]
    pub other: serde_json::Map<String, serde_json::Value>,
}

fn present_key<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl Relations {
    /// `{}` 與缺少 relations 同樣視為沒有關聯
    pub fn is_empty(&self) -> bool {
        self.has_part.is_none() && self.other.is_empty()
    }

    pub fn children(self) -> Option<Vec<ChildRef>> {
        self.has_part.flatten()
    }
}

/// `hasPart` 中的一項。`pid` 型別不固定，`order` 可能是數字或字串
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChildRef {
    #[serde(default)]
    pub pid: Option<serde_json::Value>,
    #[serde(default)]
    pub order: Option<serde_json::Value>,
}

impl ChildRef {
    /// Both a non-empty string pid and a non-null order are required.
    pub fn page_key(&self) -> Option<(&str, String)> {
        let pid = match self.pid.as_ref()? {
            serde_json::Value::String(s) if !s.is_empty() => s.as_str(),
            _ => return None,
        };
        let order = match self.order.as_ref()? {
            serde_json::Value::Null => return None,
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        Some((pid, order))
    }
}

/// 一張待下載的頁面影像
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageImage {
    pub pid: String,
    pub page: String,
    pub image_url: String,
    pub file_name: String,
}

impl PageImage {
    pub fn new(pid: &str, order: &str, image_url: String) -> Self {
        let page = zero_pad(order, 4);
        Self {
            pid: pid.to_string(),
            file_name: format!("{}.jpg", page),
            page,
            image_url,
        }
    }
}

/// Left-pads with zeros to `width`, keeping a leading sign in front.
pub fn zero_pad(value: &str, width: usize) -> String {
    let len = value.chars().count();
    if len >= width {
        return value.to_string();
    }
    let zeros = "0".repeat(width - len);
    match value.chars().next() {
        Some(sign @ ('+' | '-')) => format!("{}{}{}", sign, zeros, &value[1..]),
        _ => format!("{}{}", zeros, value),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DownloadStatus {
    Downloaded { bytes: u64 },
    Skipped,
    Planned,
    Failed { reason: String },
}

impl DownloadStatus {
    pub fn label(&self) -> &'static str {
        match self {
            DownloadStatus::Downloaded { .. } => "downloaded",
            DownloadStatus::Skipped => "skipped",
            DownloadStatus::Planned => "planned",
            DownloadStatus::Failed { .. } => "failed",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DownloadOutcome {
    pub image: PageImage,
    pub status: DownloadStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct FetchSummary {
    pub parent_pid: String,
    pub output_dir: PathBuf,
    pub outcomes: Vec<DownloadOutcome>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl FetchSummary {
    fn count(&self, f: impl Fn(&DownloadStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| f(&o.status)).count()
    }

    pub fn downloaded(&self) -> usize {
        self.count(|s| matches!(s, DownloadStatus::Downloaded { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, DownloadStatus::Skipped))
    }

    pub fn planned(&self) -> usize {
        self.count(|s| matches!(s, DownloadStatus::Planned))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, DownloadStatus::Failed { .. }))
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }
}
