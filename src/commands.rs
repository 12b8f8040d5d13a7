// commands.rs - 各平台的壁纸命令表
// 结构：平台 -> [桌面会话 ->] 屏幕 -> 命令模板（argv，含一个 %image% 占位符）
//
// 没有 commands.json 时使用内置的 assets/commands.json。

use crate::error::AppError;
use crate::setter::Screen;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;

/// 命令模板中代表图片路径的占位符
pub const IMAGE_PLACEHOLDER: &str = "%image%";

const BUILTIN_TABLE: &str = include_str!("../assets/commands.json");

/// 一组屏幕命令
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ScreenCommands {
    #[serde(default)]
    pub background: Option<Vec<String>>,
    #[serde(default)]
    pub screensaver: Option<Vec<String>>,
}

impl ScreenCommands {
    pub fn get(&self, screen: Screen) -> Option<&[String]> {
        match screen {
            Screen::Background => self.background.as_deref(),
            Screen::Screensaver => self.screensaver.as_deref(),
        }
    }
}

/// 平台条目：要么直接是屏幕命令，要么再按桌面会话区分
///
/// ScreenCommands 拒绝未知字段，所以以会话名为键的映射只能匹配到 Sessions。
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum PlatformEntry {
    Screens(ScreenCommands),
    Sessions(BTreeMap<String, ScreenCommands>),
}

/// 完整的命令表，键为平台（std::env::consts::OS 的取值）
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct CommandTable {
    platforms: BTreeMap<String, PlatformEntry>,
}

impl CommandTable {
    /// 内置命令表
    pub fn builtin() -> Result<Self, AppError> {
        Self::parse(BUILTIN_TABLE)
    }

    /// 读取 dir/commands.json，不存在时回退到内置命令表
    pub fn load_or_builtin(dir: &Path) -> Result<Self, AppError> {
        let path = dir.join("commands.json");
        if !path.exists() {
            log::debug!("{} not found, using builtin command table", path.display());
            return Self::builtin();
        }

        let content = fs::read_to_string(&path).map_err(|e| {
            AppError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    /// 解析并校验命令表：每条命令都不能为空
    pub fn parse(content: &str) -> Result<Self, AppError> {
        let table: CommandTable = serde_json::from_str(content)
            .map_err(|e| AppError::Config(format!("invalid command table: {}", e)))?;

        for (platform, entry) in &table.platforms {
            let sets: Vec<(&str, &ScreenCommands)> = match entry {
                PlatformEntry::Screens(commands) => vec![("", commands)],
                PlatformEntry::Sessions(sessions) => {
                    sessions.iter().map(|(s, c)| (s.as_str(), c)).collect()
                }
            };
            for (session, commands) in sets {
                for screen in Screen::ALL {
                    if commands.get(screen).is_some_and(|argv| argv.is_empty()) {
                        return Err(AppError::Config(format!(
                            "empty {} command for {} {}",
                            screen, platform, session
                        )));
                    }
                }
            }
        }

        Ok(table)
    }

    /// 查找平台（和会话）对应的命令
    ///
    /// 会话名不区分大小写；"ubuntu:GNOME" 这样的列表会逐个尝试。
    pub fn resolve(&self, platform: &str, session: Option<&str>) -> Result<&ScreenCommands, AppError> {
        let unsupported = || AppError::Unsupported {
            platform: platform.to_string(),
            session: session.unwrap_or("no session").to_string(),
        };

        match self.platforms.get(platform).ok_or_else(unsupported)? {
            PlatformEntry::Screens(commands) => Ok(commands),
            PlatformEntry::Sessions(sessions) => {
                let session = session.ok_or_else(unsupported)?.to_lowercase();
                std::iter::once(session.as_str())
                    .chain(session.split(':'))
                    .map(str::trim)
                    .find_map(|name| {
                        sessions
                            .iter()
                            .find(|(key, _)| key.eq_ignore_ascii_case(name))
                            .map(|(_, commands)| commands)
                    })
                    .ok_or_else(unsupported)
            }
        }
    }
}

/// 当前平台标识
pub fn current_platform() -> &'static str {
    env::consts::OS
}

/// 当前桌面会话：DESKTOP_SESSION 优先，其次 XDG_CURRENT_DESKTOP
pub fn current_session() -> Option<String> {
    ["DESKTOP_SESSION", "XDG_CURRENT_DESKTOP"]
        .iter()
        .filter_map(|var| env::var(var).ok())
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = r#"{
        "linux": {
            "gnome": {
                "background": ["gsettings", "set", "org.gnome.desktop.background", "picture-uri", "file://%image%"]
            },
            "xfce": {
                "background": ["xfconf-query", "-c", "xfce4-desktop", "-s", "%image%"],
                "screensaver": ["xfconf-query", "-c", "xfce4-screensaver", "-s", "%image%"]
            }
        },
        "macos": {
            "background": ["osascript", "-e", "tell application \"Finder\" to set desktop picture to POSIX file \"%image%\""]
        }
    }"#;

    #[test]
    fn test_builtin_table_parses() {
        let table = CommandTable::builtin().unwrap();
        assert!(table.resolve("linux", Some("gnome")).is_ok());
        assert!(table.resolve("macos", None).is_ok());
    }

    #[test]
    fn test_resolve_session() {
        let table = CommandTable::parse(TABLE).unwrap();
        let commands = table.resolve("linux", Some("XFCE")).unwrap();
        assert!(commands.get(Screen::Screensaver).is_some());
    }

    #[test]
    fn test_resolve_colon_separated_session() {
        let table = CommandTable::parse(TABLE).unwrap();
        let commands = table.resolve("linux", Some("ubuntu:GNOME")).unwrap();
        assert!(commands.get(Screen::Background).is_some());
        assert!(commands.get(Screen::Screensaver).is_none());
    }

    #[test]
    fn test_platform_without_sessions() {
        let table = CommandTable::parse(TABLE).unwrap();
        let commands = table.resolve("macos", Some("aqua")).unwrap();
        assert!(commands.get(Screen::Background).is_some());
    }

    #[test]
    fn test_unsupported_platform_and_session() {
        let table = CommandTable::parse(TABLE).unwrap();
        assert!(matches!(
            table.resolve("windows", None),
            Err(AppError::Unsupported { .. })
        ));
        let err = table.resolve("linux", Some("i3")).unwrap_err();
        assert_eq!(err.to_string(), "linux (i3) is not supported: no commands configured");
        assert!(matches!(
            table.resolve("linux", None),
            Err(AppError::Unsupported { .. })
        ));
    }

    #[test]
    fn test_empty_command_rejected() {
        let err = CommandTable::parse(r#"{"macos": {"background": []}}"#).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_unknown_screen_key_is_a_session() {
        // "lockscreen" 不是屏幕名，整个映射被当作会话表，里面的值又不是合法的命令集
        assert!(CommandTable::parse(r#"{"macos": {"lockscreen": ["x"]}}"#).is_err());
    }

    #[test]
    fn test_load_falls_back_to_builtin() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            CommandTable::load_or_builtin(dir.path()).unwrap(),
            CommandTable::builtin().unwrap()
        );

        fs::write(dir.path().join("commands.json"), TABLE).unwrap();
        let loaded = CommandTable::load_or_builtin(dir.path()).unwrap();
        assert!(loaded.resolve("linux", Some("xfce")).is_ok());
    }
}
