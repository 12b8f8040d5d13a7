// main.rs - 程序入口
// 负责初始化日志与多语言、解析命令行参数、分发子命令
//
// 默认动作的流程：
//   解析图片源 -> 列出候选 -> 随机抽取 -> (远程) 下载 -> 分配到屏幕 -> 执行命令

mod cli; // 声明 cli 模块，对应 src/cli.rs
mod commands;
mod config; // 声明 config 模块，对应 src/config.rs
mod download;
mod error;
mod extract;
mod logging;
mod select;
mod setter;
mod source;
#[cfg(test)]
mod test_support;

// 初始化多语言支持，嵌入 locales 目录下的所有翻译
rust_i18n::i18n!("locales", fallback = "en");

use clap::{CommandFactory, Parser}; // 引入 Parser trait 的 parse() 方法; CommandFactory 用于生成补全脚本
use clap_complete::generate; // 引入补全脚本生成函数
use cli::{Cli, Commands, ConfigAction}; // 引入 CLI 结构体和子命令枚举
use commands::CommandTable;
use config::AppConfig; // 引入应用配置
use download::Downloader;
use error::AppError;
use rust_i18n::t; // 引入翻译宏
use setter::{Screen, ScreenOutcome};
use source::{Candidates, RequestContext};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    // 自动检测系统语言并设置
    let locale = std::env::var("LANG").unwrap_or_else(|_| "en".to_string());
    if locale.starts_with("zh") {
        rust_i18n::set_locale("zh-CN");
    } else {
        rust_i18n::set_locale("en");
    }

    logging::init();

    // 解析命令行参数
    let cli = Cli::parse();

    match run(&cli).await {
        Ok(code) => code,
        Err(e) => {
            log::debug!("{:?}", e);
            eprintln!("{}", t!("error", reason => e));
            ExitCode::FAILURE
        }
    }
}

/// 根据子命令分发执行逻辑
async fn run(cli: &Cli) -> Result<ExitCode, AppError> {
    match &cli.command {
        Some(Commands::Completions { shell }) => {
            generate(
                *shell,
                &mut Cli::command(),
                "autowall",
                &mut std::io::stdout(),
            );
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Config { action }) => handle_config(cli.config.as_deref(), action),
        Some(Commands::Sources) => {
            let config = AppConfig::load(cli.config.as_deref())?;
            handle_sources(&config)
        }
        None => {
            let config = AppConfig::load(cli.config.as_deref())?;
            handle_apply(cli, &config).await
        }
    }
}

/// 默认动作：取图并设置到目标屏幕
async fn handle_apply(cli: &Cli, config: &AppConfig) -> Result<ExitCode, AppError> {
    let screens = cli.target_screens();
    if screens.is_empty() {
        println!("{}", t!("no_screens"));
        return Ok(ExitCode::FAILURE);
    }

    // 先确认当前平台有可用命令，避免白白下载
    let table = CommandTable::load_or_builtin(&command_dir(config)?)?;
    let session = commands::current_session();
    let screen_commands = table.resolve(commands::current_platform(), session.as_deref())?;

    let mut ctx = RequestContext::new(cli.query.as_deref(), config);
    let assignments = acquire(cli.src.as_deref(), &mut ctx, config, &screens).await?;

    for (screen, image) in &assignments {
        println!(
            "{}",
            t!("changing_screen", screen => screen, path => image.display())
        );
    }

    let outcomes = setter::apply(&assignments, screen_commands)?;
    if report(&outcomes) {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

/// 解析图片源并为每个屏幕准备一张本地图片
///
/// 远程源会先随机抽取 URL 再下载；下载失败导致图片不足时返回
/// InsufficientCandidates，不会用重复的图片补齐。
async fn acquire(
    src: Option<&str>,
    ctx: &mut RequestContext,
    config: &AppConfig,
    screens: &[Screen],
) -> Result<Vec<(Screen, PathBuf)>, AppError> {
    let token = src
        .map(str::to_string)
        .unwrap_or_else(|| config.wallpaper_dir.to_string_lossy().into_owned());

    let image_source = source::open(&token, config)?;
    println!("{}", t!("search_start", source => image_source.describe()));

    let candidates = image_source.candidates(ctx).await?;
    log::debug!(
        "{} candidates from {} (remote: {})",
        candidates.len(),
        image_source.describe(),
        candidates.is_remote()
    );
    println!("{}", t!("found_candidates", count => candidates.len()));

    let images = match candidates {
        Candidates::Local(paths) => select::sample_for_screens(&paths, screens)?,
        Candidates::Remote(urls) => {
            match &ctx.active_query {
                Some(query) => println!("{}", t!("query_used", query => query)),
                None => println!("{}", t!("curated_used")),
            }

            let picked = select::sample_for_screens(&urls, screens)?;
            let dest = config.retrieve_dir();
            println!(
                "{}",
                t!("download_start", count => picked.len(), path => dest.display())
            );

            let downloader = Downloader::new(&dest, ctx, config.timeout)?;
            successful_downloads(downloader.fetch_all(&picked).await?)
        }
    };

    select::assign(images, screens)
}

/// 取出下载成功的路径，失败的逐条提示
fn successful_downloads(results: Vec<Result<PathBuf, AppError>>) -> Vec<PathBuf> {
    results
        .into_iter()
        .filter_map(|result| match result {
            Ok(path) => Some(path),
            Err(e) => {
                println!("{}", t!("download_failed", reason => e));
                None
            }
        })
        .collect()
}

/// 逐个屏幕打印结果，返回是否全部成功
fn report(outcomes: &[ScreenOutcome]) -> bool {
    let mut ok = 0;
    for outcome in outcomes {
        match &outcome.result {
            Ok(()) => {
                ok += 1;
                println!("{}", t!("screen_done", screen => outcome.screen, path => outcome.image.display()));
            }
            Err(e) => println!(
                "{}",
                t!("screen_failed", screen => outcome.screen, reason => e)
            ),
        }
    }

    println!("{}", t!("summary", ok => ok, total => outcomes.len()));
    ok == outcomes.len()
}

/// commands.json 与配置文件放在同一目录
fn command_dir(config: &AppConfig) -> Result<PathBuf, AppError> {
    match config.config_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => Ok(dir.to_path_buf()),
        _ => Ok(AppConfig::config_dir(&config::home_dir()?)),
    }
}

/// 处理 sources 子命令：列出配置中的远程源
fn handle_sources(config: &AppConfig) -> Result<ExitCode, AppError> {
    if config.remotes.is_empty() {
        println!("{}", t!("sources_empty"));
        return Ok(ExitCode::SUCCESS);
    }

    println!("{}", t!("sources_title"));
    for (name, site) in &config.remotes {
        println!("  {:<12} {}", name, site.endpoint);
    }
    Ok(ExitCode::SUCCESS)
}

/// 处理 config 子命令：查看配置
fn handle_config(path: Option<&Path>, action: &ConfigAction) -> Result<ExitCode, AppError> {
    match action {
        ConfigAction::Schema => {
            println!("{}", AppConfig::get_schema());
        }
        ConfigAction::Dump => {
            let config = AppConfig::load(path)?;
            println!("{}", config.to_toml());
        }
        ConfigAction::Show => {
            let config = AppConfig::load(path)?;
            let none = t!("none");
            println!("{}", t!("config_title"));
            println!(
                "{}",
                t!("config_path", path => config.config_path.display())
            );
            println!(
                "{}",
                t!("config_wallpaper_dir", path => config.wallpaper_dir.display())
            );
            let query_str = config.default_query.as_deref().unwrap_or(&none);
            println!("{}", t!("config_query", query => query_str));
            println!("{}", t!("config_resolution", res => config.resolution));
            println!("{}", t!("config_timeout", secs => config.timeout.as_secs()));
            let session = commands::current_session();
            println!(
                "{}",
                t!(
                    "config_session",
                    platform => commands::current_platform(),
                    session => session.as_deref().unwrap_or(&none)
                )
            );
            let names = config.remote_names();
            let names_str: &str = if names.is_empty() { &none } else { &names };
            println!("{}", t!("config_remotes", names => names_str));
        }
    }
    Ok(ExitCode::SUCCESS)
}
