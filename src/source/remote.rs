// remote.rs - 远程图片搜索 API 客户端
// 按配置拼出请求 URL，请求 JSON 响应，再用 extract_keys 取出图片 URL
//
// 不同站点的响应结构各不相同，这里不为每个站点定义结构体，
// 而是统一解析成 serde_json::Value 后交给 extract 模块处理。

use super::{Candidates, ImageSource, RequestContext, header_map, http_client, merge_headers};
use crate::config::{RemoteSite, Resolution};
use crate::error::AppError;
use crate::extract::{extract, into_urls};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashSet;
use std::time::Duration;

/// 远程图片源
pub struct RemoteSource {
    /// 配置中的源名称（如 "unsplash"）
    name: String,
    site: RemoteSite,
    resolution: Resolution,
    /// HTTP 客户端（内部有连接池，应复用）
    client: reqwest::Client,
}

impl RemoteSource {
    pub fn new(
        name: &str,
        site: RemoteSite,
        resolution: Resolution,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        Ok(Self {
            name: name.to_string(),
            site,
            resolution,
            client: http_client(timeout)?,
        })
    }

    /// 拼出搜索请求 URL
    ///
    /// 格式：endpoint + path + 分隔符 + count=default_result，
    /// path 为 `query=关键词`，没有关键词时为精选路径。
    pub fn build_url(&self, query: Option<&str>) -> String {
        let site = &self.site;
        let path = match query {
            Some(q) => format!("{}={}", site.query, urlencoding::encode(q)),
            None => site.curated.clone(),
        };

        let mut url = format!(
            "{}{}{}{}={}",
            site.endpoint,
            path,
            query_separator(&path),
            site.count,
            site.default_result
        );

        if let Some(param) = &site.resolution {
            url.push_str(&format!("&{}={}", param, self.resolution));
        }

        url
    }
}

/// path 中第一个 '=' 之前已经有 '?' 时用 '&' 继续拼参数，否则用 '?'
pub fn query_separator(path: &str) -> &'static str {
    let head = path.split_once('=').map_or(path, |(head, _)| head);
    if head.contains('?') { "&" } else { "?" }
}

/// 去掉重复的 URL，保留第一次出现的顺序
fn unique_urls(urls: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    urls.into_iter().filter(|u| seen.insert(u.clone())).collect()
}

#[async_trait]
impl ImageSource for RemoteSource {
    fn describe(&self) -> String {
        self.name.clone()
    }

    async fn candidates(&self, ctx: &mut RequestContext) -> Result<Candidates, AppError> {
        let query = ctx.search_query.clone();
        let url = self.build_url(query.as_deref());
        let headers = merge_headers(&ctx.headers, &self.site.headers);

        log::debug!("querying {} ({} headers)", url, headers.len());

        let response = self
            .client
            .get(&url)
            .headers(header_map(&headers)?)
            .send()
            .await
            .map_err(|e| AppError::fetch(&url, e))?
            .error_for_status()
            .map_err(|e| AppError::fetch(&url, e))?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| AppError::fetch(&url, e))?;

        let urls = unique_urls(into_urls(extract(body, &self.site.extract_keys)?)?);
        if urls.is_empty() {
            return Err(AppError::NoImagesFound(format!("remote '{}'", self.name)));
        }

        log::info!("{} returned {} image urls", self.name, urls.len());

        // 记录本次实际使用的关键词和 headers，下载图片时沿用
        ctx.headers = headers;
        ctx.active_query = query;

        Ok(Candidates::Remote(urls))
    }
}
