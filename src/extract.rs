// extract.rs - 响应键路径提取模块
// 按 extract_keys 逐级下钻 JSON 响应，取出图片 URL
//
// 每一步有两种走法：
// - 直接访问：映射按名字取值，数组按下标取值
// - 广播：当前节点是数组而键是名字时，把这个键作用到数组的每个元素上
//
// 这样一份声明式的键列表就能同时描述 "普通下钻" 和 "遍历结果数组"，
// 不同 API 把 URL 放在不同深度也不需要各自的语法。

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// 键路径中的一个键：字段名或数组下标
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(untagged)]
pub enum ExtractKey {
    Index(usize),
    Name(String),
}

impl fmt::Display for ExtractKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractKey::Index(i) => write!(f, "[{}]", i),
            ExtractKey::Name(name) => write!(f, "\"{}\"", name),
        }
    }
}

impl From<&str> for ExtractKey {
    fn from(name: &str) -> Self {
        ExtractKey::Name(name.to_string())
    }
}

impl From<usize> for ExtractKey {
    fn from(index: usize) -> Self {
        ExtractKey::Index(index)
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum ExtractError {
    #[error("key {key} (step {step}) not found")]
    KeyNotFound { key: ExtractKey, step: usize },

    #[error("index {key} (step {step}) out of range for array of length {len}")]
    IndexOutOfRange {
        key: ExtractKey,
        step: usize,
        len: usize,
    },

    #[error("key {key} (step {step}) cannot be applied to {found}")]
    TypeMismatch {
        key: ExtractKey,
        step: usize,
        found: &'static str,
    },

    #[error("expected url string, found {0}")]
    NotAUrl(&'static str),
}

/// 直接访问的结果：取到值、类型不匹配（可以改为广播）或确实不存在
enum Direct {
    Found(Value),
    Mismatch(Value),
    Missing(ExtractError),
}

/// 沿键路径从左到右提取节点
///
/// 空路径原样返回节点。
pub fn extract(node: Value, keys: &[ExtractKey]) -> Result<Value, ExtractError> {
    extract_from(node, keys, 0)
}

fn extract_from(node: Value, keys: &[ExtractKey], step: usize) -> Result<Value, ExtractError> {
    let Some((key, rest)) = keys.split_first() else {
        return Ok(node);
    };

    let next = step_into(node, key, step)?;
    extract_from(next, rest, step + 1)
}

/// 单步：先尝试直接访问，类型不匹配且当前节点是数组时改为广播
fn step_into(node: Value, key: &ExtractKey, step: usize) -> Result<Value, ExtractError> {
    match direct(node, key, step) {
        Direct::Found(value) => Ok(value),
        Direct::Missing(err) => Err(err),
        Direct::Mismatch(Value::Array(items)) => broadcast(items, key, step),
        Direct::Mismatch(other) => Err(ExtractError::TypeMismatch {
            key: key.clone(),
            step,
            found: kind(&other),
        }),
    }
}

fn direct(node: Value, key: &ExtractKey, step: usize) -> Direct {
    match (node, key) {
        (Value::Object(mut map), ExtractKey::Name(name)) => match map.remove(name) {
            Some(value) => Direct::Found(value),
            None => Direct::Missing(ExtractError::KeyNotFound {
                key: key.clone(),
                step,
            }),
        },
        (Value::Array(items), ExtractKey::Index(index)) => {
            let len = items.len();
            match items.into_iter().nth(*index) {
                Some(value) => Direct::Found(value),
                None => Direct::Missing(ExtractError::IndexOutOfRange {
                    key: key.clone(),
                    step,
                    len,
                }),
            }
        }
        // 有些 API 用数字字符串作为对象的键
        (Value::Object(mut map), ExtractKey::Index(index)) => match map.remove(&index.to_string()) {
            Some(value) => Direct::Found(value),
            None => Direct::Missing(ExtractError::KeyNotFound {
                key: key.clone(),
                step,
            }),
        },
        (other, _) => Direct::Mismatch(other),
    }
}

/// 把键作用到数组的每个元素上；元素本身是数组时继续广播
fn broadcast(items: Vec<Value>, key: &ExtractKey, step: usize) -> Result<Value, ExtractError> {
    items
        .into_iter()
        .map(|item| step_into(item, key, step))
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Array)
}

/// 把提取结果展平为 URL 列表
pub fn into_urls(value: Value) -> Result<Vec<String>, ExtractError> {
    let mut urls = Vec::new();
    collect_urls(value, &mut urls)?;
    Ok(urls)
}

fn collect_urls(value: Value, urls: &mut Vec<String>) -> Result<(), ExtractError> {
    match value {
        Value::String(url) => urls.push(url),
        Value::Array(items) => {
            for item in items {
                collect_urls(item, urls)?;
            }
        }
        other => return Err(ExtractError::NotAUrl(kind(&other))),
    }
    Ok(())
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
