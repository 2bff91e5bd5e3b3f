use crate::core::Storage;
use crate::utils::error::Result;
use std::path::{Path, PathBuf};
use tokio::fs;

#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }
}

impl Storage for LocalStorage {
    async fn exists(&self, path: &str) -> bool {
        fs::try_exists(self.base_path.join(path))
            .await
            .unwrap_or(false)
    }

    /// 先寫入 `.part` 再改名，中斷時不會留下半個檔案
    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.base_path.join(path);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut part_name = full_path.as_os_str().to_owned();
        part_name.push(".part");
        let part_path = PathBuf::from(part_name);

        if let Err(e) = fs::write(&part_path, data).await {
            let _ = fs::remove_file(&part_path).await;
            return Err(e.into());
        }
        fs::rename(&part_path, &full_path).await?;
        Ok(())
    }

    async fn ensure_root(&self) -> Result<()> {
        fs::create_dir_all(&self.base_path).await?;
        Ok(())
    }

    fn root(&self) -> &Path {
        &self.base_path
    }
}
