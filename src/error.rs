// error.rs - 错误类型模块
// 所有可能中断运行或需要单独报告的错误都集中在这里

use crate::extract::ExtractError;
use crate::setter::Screen;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    /// 配置文件缺失、无法读取或内容不合法
    #[error("configuration error: {0}")]
    Config(String),

    /// 当前平台 / 桌面会话没有可用的命令集
    #[error("{platform} ({session}) is not supported: no commands configured")]
    Unsupported { platform: String, session: String },

    #[error("commands for {0} not defined")]
    MissingCommand(Screen),

    #[error("bad configuration for {0} command: no %image% placeholder")]
    MissingPlaceholder(Screen),

    #[error("no images found in {0}")]
    NoImagesFound(String),

    #[error("unknown image source '{name}', choose a directory or one of the remote apis: {available}")]
    UnknownSource { name: String, available: String },

    #[error("failed to fetch {url}: {reason}")]
    RemoteFetch { url: String, reason: String },

    #[error("failed to extract image urls: {0}")]
    Extraction(#[from] ExtractError),

    /// 可用图片数量少于目标屏幕数量
    #[error("{available} images for {requested} screens{}", describe_unmet(.unmet))]
    InsufficientCandidates {
        available: usize,
        requested: usize,
        unmet: Vec<Screen>,
    },

    #[error("failed to set {screen} image, command exited with {code}: {stderr}")]
    CommandExecution {
        screen: Screen,
        code: String,
        stderr: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn describe_unmet(unmet: &[Screen]) -> String {
    if unmet.is_empty() {
        return String::new();
    }
    let names: Vec<&str> = unmet.iter().map(Screen::as_str).collect();
    format!(", not set: {}", names.join(", "))
}

impl AppError {
    /// 把 reqwest 错误包装成带 URL 的 RemoteFetch
    pub fn fetch(url: &str, err: impl std::fmt::Display) -> Self {
        AppError::RemoteFetch {
            url: url.to_string(),
            reason: err.to_string(),
        }
    }
}
