// config.rs - 配置管理模块
// 遵循 Unix 风格：优先从 ~/.config/autowall/ 下读取 config.toml 或 config.json
// 配置在启动时加载一次，运行期间只读，不会写回文件

use crate::error::AppError;
use crate::extract::ExtractKey;
use schemars::JsonSchema; // 引入用于生成 JSON Schema 的 trait
use serde::{Deserialize, Serialize}; // 引入序列化与反序列化 trait
use shellexpand::tilde; // 用于展开 ~ 和环境变量
use std::collections::BTreeMap;
use std::env; // 环境变量模块
use std::fmt;
use std::fs; // 文件系统模块
use std::path::{Path, PathBuf}; // 路径处理类型
use std::time::Duration;

/// wallpaper_dir 中代表用户主目录的占位符
const HOME_PLACEHOLDER: &str = "%home%";

/// 远程图片下载到 wallpaper_dir 下的这个子目录
pub const RETRIEVE_DIR: &str = "remote_retrieve";

/// 展开路径中的 %home%、~ 和环境变量
/// 相对路径则相对于 $HOME
fn expand_path(path_str: &str, home: &Path) -> PathBuf {
    let replaced = path_str
        .trim()
        .replace(HOME_PLACEHOLDER, &home.to_string_lossy());
    // 未定义的环境变量保留原样，只展开 ~
    let expanded = shellexpand::full(&replaced)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| tilde(&replaced).into_owned());
    let p = PathBuf::from(expanded);
    if p.is_absolute() { p } else { home.join(p) }
}

/// 映射配置文件内容的结构体
#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct ConfigFile {
    /// 壁纸目录 (支持 %home%、~、$HOME 等，相对路径则相对于 $HOME)
    #[serde(default = "default_wallpaper_dir")]
    pub wallpaper_dir: String,
    /// 未指定 --query 时使用的搜索关键词
    #[serde(default)]
    pub default_query: Option<String>,
    /// 屏幕分辨率，格式为 "WxH"
    #[serde(default = "default_resolution")]
    pub resolution: String,
    /// HTTP 请求超时（秒）
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// 所有请求都会带上的 HTTP headers
    #[serde(default = "default_headers")]
    pub headers: BTreeMap<String, String>,
    /// 远程图片源，键为源名称
    #[serde(default)]
    pub remotes: BTreeMap<String, RemoteSite>,
}

/// 一个远程图片搜索 API 的描述
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct RemoteSite {
    /// 请求 URL 前缀，如 "https://api.unsplash.com/"
    pub endpoint: String,
    /// 搜索关键词的参数名
    pub query: String,
    /// 没有关键词时使用的精选路径
    pub curated: String,
    /// 结果数量的参数名
    pub count: String,
    /// 结果数量的值
    pub default_result: CountValue,
    /// 从 JSON 响应根部到图片 URL 的键路径
    pub extract_keys: Vec<ExtractKey>,
    /// 分辨率的参数名（可选），设置后会附加 <resolution>=<W>x<H>
    #[serde(default)]
    pub resolution: Option<String>,
    /// 该源专用的 headers，会覆盖同名的全局 header
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

/// default_result 既可以写数字也可以写字符串
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(untagged)]
pub enum CountValue {
    Number(u64),
    Text(String),
}

impl fmt::Display for CountValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CountValue::Number(n) => write!(f, "{}", n),
            CountValue::Text(s) => f.write_str(s),
        }
    }
}

fn default_wallpaper_dir() -> String {
    "%home%/Pictures/wallpapers".to_string()
}
fn default_resolution() -> String {
    "1920x1080".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_headers() -> BTreeMap<String, String> {
    BTreeMap::from([(
        "User-Agent".to_string(),
        concat!("autowall/", env!("CARGO_PKG_VERSION")).to_string(),
    )])
}

/// 屏幕分辨率
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    /// 解析 "WxH" 格式的分辨率字符串
    pub fn parse(s: &str) -> Option<Self> {
        let (w, h) = s.trim().split_once(['x', 'X'])?;
        let width = w.trim().parse().ok()?;
        let height = h.trim().parse().ok()?;
        if width == 0 || height == 0 {
            return None;
        }
        Some(Self { width, height })
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// 配置文件格式，由扩展名决定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => ConfigFormat::Toml,
            _ => ConfigFormat::Json,
        }
    }
}

/// 应用全局配置项
#[derive(Debug)]
pub struct AppConfig {
    /// 壁纸根目录（已展开）
    pub wallpaper_dir: PathBuf,
    /// 默认搜索关键词
    pub default_query: Option<String>,
    /// 全局 HTTP headers
    pub headers: BTreeMap<String, String>,
    pub resolution: Resolution,
    /// HTTP 请求超时
    pub timeout: Duration,
    /// 远程图片源
    pub remotes: BTreeMap<String, RemoteSite>,
    /// 配置文件所在路径
    pub config_path: PathBuf,
}

impl AppConfig {
    /// 读取并解析配置文件
    ///
    /// `path` 为 None 时依次查找默认目录下的 config.toml 与 config.json。
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        let home = home_dir()?;
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_config_path(&home),
        };

        let content = fs::read_to_string(&config_path).map_err(|e| {
            AppError::Config(format!(
                "failed to read config file {}: {}",
                config_path.display(),
                e
            ))
        })?;

        let file = Self::parse_file(&content, ConfigFormat::from_path(&config_path))?;
        Self::from_file(file, &home, config_path)
    }

    /// 解析配置文件文本
    pub fn parse_file(content: &str, format: ConfigFormat) -> Result<ConfigFile, AppError> {
        match format {
            ConfigFormat::Json => serde_json::from_str(content)
                .map_err(|e| AppError::Config(format!("invalid JSON config: {}", e))),
            ConfigFormat::Toml => toml::from_str(content)
                .map_err(|e| AppError::Config(format!("invalid TOML config: {}", e))),
        }
    }

    /// 从解析好的文件内容构建运行时配置，并做校验
    pub fn from_file(file: ConfigFile, home: &Path, config_path: PathBuf) -> Result<Self, AppError> {
        let resolution = Resolution::parse(&file.resolution).ok_or_else(|| {
            AppError::Config(format!(
                "invalid resolution '{}', expected WxH",
                file.resolution
            ))
        })?;

        for (name, site) in &file.remotes {
            if site.extract_keys.is_empty() {
                return Err(AppError::Config(format!(
                    "remote '{}' has no extract_keys",
                    name
                )));
            }
        }

        // 空字符串等同于未配置
        let default_query = file
            .default_query
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty());

        Ok(Self {
            wallpaper_dir: expand_path(&file.wallpaper_dir, home),
            default_query,
            headers: file.headers,
            resolution,
            timeout: Duration::from_secs(file.timeout_secs.max(1)),
            remotes: file.remotes,
            config_path,
        })
    }

    /// 配置目录：$XDG_CONFIG_HOME/autowall，未设置时为 ~/.config/autowall
    pub fn config_dir(home: &Path) -> PathBuf {
        env::var_os("XDG_CONFIG_HOME")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| home.join(".config"))
            .join("autowall")
    }

    /// 默认配置文件路径：config.toml 优先，其次 config.json
    fn default_config_path(home: &Path) -> PathBuf {
        let dir = Self::config_dir(home);
        let toml_path = dir.join("config.toml");
        if toml_path.exists() {
            toml_path
        } else {
            dir.join("config.json")
        }
    }

    /// 远程图片的下载目录
    pub fn retrieve_dir(&self) -> PathBuf {
        self.wallpaper_dir.join(RETRIEVE_DIR)
    }

    /// 所有远程源名称，用逗号连接
    pub fn remote_names(&self) -> String {
        self.remotes.keys().cloned().collect::<Vec<_>>().join(", ")
    }

    /// 获取配置文件的 JSON Schema
    pub fn get_schema() -> String {
        let schema = schemars::schema_for!(ConfigFile);
        serde_json::to_string_pretty(&schema).unwrap_or_else(|_| "{}".to_string())
    }

    /// 将当前配置转换为 TOML 字符串
    pub fn to_toml(&self) -> String {
        let config_file = ConfigFile {
            wallpaper_dir: self.wallpaper_dir.to_string_lossy().to_string(),
            default_query: self.default_query.clone(),
            resolution: self.resolution.to_string(),
            timeout_secs: self.timeout.as_secs(),
            headers: self.headers.clone(),
            remotes: self.remotes.clone(),
        };

        toml::to_string_pretty(&config_file)
            .unwrap_or_else(|_| "# Error serializing config".to_string())
    }
}

/// 用户主目录，取自 $HOME
pub fn home_dir() -> Result<PathBuf, AppError> {
    env::var_os("HOME")
        .filter(|h| !h.is_empty())
        .map(PathBuf::from)
        .ok_or_else(|| AppError::Config("cannot determine $HOME".to_string()))
}
