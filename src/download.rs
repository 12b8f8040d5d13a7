// download.rs - 远程图片下载模块
// 把选中的 URL 逐个下载到 <wallpaper_dir>/remote_retrieve/
//
// 单个下载失败只影响对应的那一项，整批下载不会中断；
// 调用方根据返回的结果列表判断图片是否够用。

use crate::error::AppError;
use crate::source::{RequestContext, header_map, http_client};
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE, HeaderMap};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::{self, OpenOptions}; // tokio 提供的异步文件操作
use tokio::io::AsyncWriteExt; // 异步写入 trait，提供 write_all() 等方法

pub struct Downloader {
    /// HTTP 客户端（内部有连接池，应复用）
    client: reqwest::Client,
    headers: HeaderMap,
    dest: PathBuf,
}

impl Downloader {
    /// 使用请求上下文中已合并的 headers
    pub fn new(dest: impl AsRef<Path>, ctx: &RequestContext, timeout: Duration) -> Result<Self, AppError> {
        Ok(Self {
            client: http_client(timeout)?,
            headers: header_map(&ctx.headers)?,
            dest: dest.as_ref().to_path_buf(),
        })
    }

    /// 依次下载所有 URL，结果顺序与输入一致
    ///
    /// 只有目标目录无法创建时才整体返回错误。
    pub async fn fetch_all(&self, urls: &[String]) -> Result<Vec<Result<PathBuf, AppError>>, AppError> {
        fs::create_dir_all(&self.dest).await?;
        log::debug!("downloading {} images into {}", urls.len(), self.dest.display());

        let mut results = Vec::with_capacity(urls.len());
        for url in urls {
            let result = self.fetch(url).await;
            if let Err(e) = &result {
                log::warn!("{}", e);
            }
            results.push(result);
        }
        Ok(results)
    }

    /// 下载单张图片，返回保存后的完整路径
    pub async fn fetch(&self, url: &str) -> Result<PathBuf, AppError> {
        log::info!("downloading image from {}", url);

        let response = self
            .client
            .get(url)
            .headers(self.headers.clone())
            .send()
            .await
            .map_err(|e| AppError::fetch(url, e))?
            .error_for_status()
            .map_err(|e| AppError::fetch(url, e))?;

        let headers = response.headers();
        let filename = headers
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(filename_from_disposition)
            .unwrap_or_else(|| {
                let content_type = headers
                    .get(CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("");
                random_filename(extension_for(content_type))
            });

        let bytes = response.bytes().await.map_err(|e| AppError::fetch(url, e))?;

        let save_path = unique_path(&self.dest, &filename).await?;
        write_new(&save_path, &bytes).await?;

        log::info!("wrote {} bytes to {}", bytes.len(), save_path.display());
        Ok(save_path)
    }
}

/// 目标目录中已有同名文件时，在文件名后加随机十六进制串
async fn unique_path(dest: &Path, filename: &str) -> Result<PathBuf, AppError> {
    let candidate = dest.join(filename);
    if !fs::try_exists(&candidate).await? {
        return Ok(candidate);
    }

    let name = Path::new(filename);
    let stem = name.file_stem().and_then(|s| s.to_str()).unwrap_or(filename);
    let renamed = match name.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}-{:032x}.{}", stem, rand::random::<u128>(), ext),
        None => format!("{}-{:032x}", stem, rand::random::<u128>()),
    };
    Ok(dest.join(renamed))
}

/// 只创建新文件，不覆盖已有文件；写入失败时删除写了一半的文件
async fn write_new(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await?;

    let written = match file.write_all(bytes).await {
        Ok(()) => file.flush().await,
        Err(e) => Err(e),
    };
    if written.is_err() {
        drop(file);
        let _ = fs::remove_file(path).await;
    }
    written
}

/// 按 ';' 切分头部参数，引号内的 ';' 不算分隔符
fn split_params(value: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut quoted = false;
    for (i, c) in value.char_indices() {
        match c {
            '"' => quoted = !quoted,
            ';' if !quoted => {
                parts.push(value[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(value[start..].trim());
    parts
}

/// 从 Content-Disposition 中取文件名，只保留最后一段，防止写到目标目录之外
///
/// 支持 `filename="a.jpg"`、`filename=a.jpg` 和 `filename*=UTF-8''a%20b.jpg`，
/// 后者优先。
pub fn filename_from_disposition(value: &str) -> Option<String> {
    let mut plain = None;
    let mut extended = None;

    for part in split_params(value) {
        let Some((key, raw)) = part.split_once('=') else {
            continue;
        };
        match key.trim().to_ascii_lowercase().as_str() {
            "filename" => plain = Some(raw.trim().trim_matches('"').to_string()),
            "filename*" => {
                let encoded = raw.trim().rsplit("''").next().unwrap_or("");
                extended = urlencoding::decode(encoded).ok().map(|s| s.into_owned());
            }
            _ => {}
        }
    }

    extended
        .or(plain)
        .and_then(|name| {
            Path::new(&name)
                .file_name()
                .and_then(|n| n.to_str())
                .map(str::to_string)
        })
        .filter(|name| !name.is_empty() && name != "." && name != "..")
}

/// 根据 Content-Type 猜测扩展名，未知类型返回空字符串
pub fn extension_for(content_type: &str) -> &'static str {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    match mime.as_str() {
        "image/jpeg" | "image/jpg" | "image/pjpeg" => ".jpg",
        "image/png" => ".png",
        "image/bmp" | "image/x-ms-bmp" => ".bmp",
        "image/webp" => ".webp",
        "image/gif" => ".gif",
        "image/tiff" => ".tiff",
        _ => "",
    }
}

/// 随机文件名：32 位十六进制 + 扩展名
fn random_filename(extension: &str) -> String {
    format!("{:032x}{}", rand::random::<u128>(), extension)
}
