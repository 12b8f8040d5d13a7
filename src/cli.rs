// cli.rs - 命令行接口定义模块
// 使用 clap 的 derive 模式定义参数和子命令
//
// 不带子命令时执行默认动作：取图并设置到目标屏幕。

use crate::setter::Screen;
use clap::{ArgAction, Parser, Subcommand}; // Parser: 解析命令行参数的 trait; Subcommand: 定义子命令的 trait
use clap_complete::Shell; // Shell 枚举：Bash, Zsh, Fish, Elvish, PowerShell
use std::path::PathBuf;

/// 简单的屏幕图片更换工具
///
/// 从本地目录或配置好的远程图片 API 取图，
/// 调用系统命令设置桌面背景和屏保。
#[derive(Parser, Debug)]
#[command(name = "autowall")]
#[command(version)] // 自动从 Cargo.toml 读取 version 字段
#[command(disable_version_flag = true)]
#[command(about = "Simple screen image changer - local directories or remote image APIs")]
pub struct Cli {
    /// 搜索关键词（只对远程源有效，默认使用配置中的 default_query）
    #[arg(short, long)]
    pub query: Option<String>,

    /// 图片来源：目录路径或远程源名称（默认为配置中的 wallpaper_dir）
    #[arg(short, long, value_name = "PATH|REMOTE")]
    pub src: Option<String>,

    /// 要设置的屏幕
    #[arg(long, value_enum, num_args = 1.., default_values_t = Screen::ALL.to_vec())]
    pub screens: Vec<Screen>,

    /// 配置文件路径（.json 或 .toml）
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// 打印版本号
    #[arg(short = 'v', long, action = ArgAction::Version)]
    #[allow(dead_code)]
    version: Option<bool>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 生成 shell 补全脚本（支持 bash, zsh, fish, elvish, powershell）
    ///
    /// 用法示例：
    ///   autowall completions zsh > ~/.zsh/completions/_autowall
    Completions {
        /// 目标 shell 类型
        shell: Shell,
    },

    /// 列出配置中的远程源
    Sources,

    /// 配置管理操作
    ///
    /// 用法示例:
    ///   autowall config show
    ///   autowall config schema
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// 配置管理操作
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// 查看当前配置简报
    Show,
    /// 生成配置文件对应的 JSON Schema
    Schema,
    /// 以 TOML 格式打印当前完整配置内容
    Dump,
}

impl Cli {
    /// 去重后的目标屏幕，保持命令行中的顺序
    pub fn target_screens(&self) -> Vec<Screen> {
        let mut screens = Vec::with_capacity(self.screens.len());
        for screen in &self.screens {
            if !screens.contains(screen) {
                screens.push(*screen);
            }
        }
        screens
    }
}
