// source/mod.rs - 图片源模块入口
// 把用户给出的 --src（目录路径或远程源名称）解析成候选图片列表
pub mod local;
pub mod remote;

use crate::config::AppConfig;
use crate::error::AppError;
use async_trait::async_trait; // 异步 Trait 支持宏
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub use local::LocalDirectory;
pub use remote::RemoteSource;

/// 一次运行的候选图片
/// 要么全部是本地文件，要么全部是需要下载的远程 URL
#[derive(Debug, Clone, PartialEq)]
pub enum Candidates {
    Local(Vec<PathBuf>),
    Remote(Vec<String>),
}

impl Candidates {
    pub fn is_remote(&self) -> bool {
        matches!(self, Candidates::Remote(_))
    }

    pub fn len(&self) -> usize {
        match self {
            Candidates::Local(paths) => paths.len(),
            Candidates::Remote(urls) => urls.len(),
        }
    }
}

/// 单次运行的请求上下文
///
/// 搜索关键词和合并后的 headers 都放在这里，按引用传给图片源和下载器，
/// 不去修改全局配置。
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// 命令行 --query，未指定时为配置中的 default_query
    pub search_query: Option<String>,
    /// 全局 headers，远程源解析成功后会合并该源的 headers
    pub headers: BTreeMap<String, String>,
    /// 远程源实际使用的关键词（使用精选路径时为 None）
    pub active_query: Option<String>,
}

impl RequestContext {
    pub fn new(query: Option<&str>, config: &AppConfig) -> Self {
        let search_query = query
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_string)
            .or_else(|| config.default_query.clone());

        Self {
            search_query,
            headers: config.headers.clone(),
            active_query: None,
        }
    }
}

/// 图片源的抽象 Trait
/// 本地目录和远程 API 都实现这个 Trait
#[async_trait]
pub trait ImageSource {
    /// 候选图片的描述（目录路径或源名称），用于提示信息
    fn describe(&self) -> String;

    /// 列出候选图片
    async fn candidates(&self, ctx: &mut RequestContext) -> Result<Candidates, AppError>;
}

/// 根据 --src 选择图片源
///
/// 已存在的目录优先，其次匹配配置中的远程源名称。
pub fn open(token: &str, config: &AppConfig) -> Result<Box<dyn ImageSource + Send + Sync>, AppError> {
    let expanded = shellexpand::tilde(token).into_owned();
    let dir = Path::new(&expanded);
    if dir.is_dir() {
        return Ok(Box::new(LocalDirectory::new(dir)));
    }

    match config.remotes.get(token) {
        Some(site) => Ok(Box::new(RemoteSource::new(
            token,
            site.clone(),
            config.resolution,
            config.timeout,
        )?)),
        None => Err(AppError::UnknownSource {
            name: token.to_string(),
            available: config.remote_names(),
        }),
    }
}

/// 创建带超时的 HTTP 客户端
pub fn http_client(timeout: Duration) -> Result<reqwest::Client, AppError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| AppError::Config(format!("failed to build http client: {}", e)))
}

/// 把配置中的 headers 转成 reqwest 的 HeaderMap
pub fn header_map(headers: &BTreeMap<String, String>) -> Result<HeaderMap, AppError> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| AppError::Config(format!("invalid header name '{}': {}", name, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| AppError::Config(format!("invalid value for header '{}': {}", name, e)))?;
        map.insert(name, value);
    }
    Ok(map)
}

/// 合并 headers：先放全局，再用源专用的覆盖或补充
///
/// header 名不区分大小写，同名时以源专用的为准。
pub fn merge_headers(
    global: &BTreeMap<String, String>,
    site: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let mut merged: BTreeMap<String, String> = global
        .iter()
        .filter(|(name, _)| !site.keys().any(|s| s.eq_ignore_ascii_case(name)))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    merged.extend(site.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
}
