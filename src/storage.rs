use std::path::{Component, Path, PathBuf};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use log::info;

use crate::attendance::{PhotoRef, PhotoStore};

/// Stores verification photos on local disk under `root`.
pub struct LocalPhotoStore {
    root: PathBuf,
}

impl LocalPhotoStore {
    pub fn new(root: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&root)
            .with_context(|| format!("failed to create photo directory {}", root.display()))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path_hint: &str) -> Result<PathBuf> {
        let relative = Path::new(path_hint);
        if path_hint.is_empty()
            || relative
                .components()
                .any(|component| !matches!(component, Component::Normal(_)))
        {
            bail!("invalid photo path '{path_hint}'");
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl PhotoStore for LocalPhotoStore {
    async fn upload_verification_photo(
        &self,
        image_bytes: Vec<u8>,
        path_hint: &str,
    ) -> Result<Option<PhotoRef>> {
        if image_bytes.is_empty() {
            bail!("refusing to store an empty photo");
        }

        let target = self.resolve(path_hint)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        tokio::fs::write(&target, &image_bytes)
            .await
            .with_context(|| format!("failed to write photo {}", target.display()))?;

        info!("Stored verification photo {} ({} bytes)", target.display(), image_bytes.len());
        Ok(Some(PhotoRef {
            public_url: format!("file://{}", target.display()),
        }))
    }
}
