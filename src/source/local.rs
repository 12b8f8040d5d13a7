// local.rs - 本地目录图片源
// 只扫描目录的第一层，不递归

use super::{Candidates, ImageSource, RequestContext};
use crate::error::AppError;
use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};

/// 认为是图片的扩展名（比较时不区分大小写）
pub const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "bmp"];

pub struct LocalDirectory {
    dir: PathBuf,
}

impl LocalDirectory {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// 列出目录中所有图片文件，按路径排序
    pub fn scan(&self) -> Result<Vec<PathBuf>, AppError> {
        let mut images = Vec::new();

        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.is_file() && is_image(&path) {
                images.push(path);
            }
        }

        if images.is_empty() {
            return Err(AppError::NoImagesFound(self.dir.display().to_string()));
        }

        images.sort();
        Ok(images)
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| IMAGE_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)))
        .unwrap_or(false)
}

#[async_trait]
impl ImageSource for LocalDirectory {
    fn describe(&self) -> String {
        self.dir.display().to_string()
    }

    async fn candidates(&self, _ctx: &mut RequestContext) -> Result<Candidates, AppError> {
        log::debug!("scanning {} for images", self.dir.display());
        let images = self.scan()?;
        log::info!("found {} local images in {}", images.len(), self.dir.display());
        Ok(Candidates::Local(images))
    }
}
