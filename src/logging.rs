// logging.rs - 日志初始化
// 诊断信息通过 log 宏输出到 stderr，面向用户的提示仍然用 println!

use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::env;

/// 控制日志级别的环境变量
pub const LOG_ENV: &str = "AUTOWALL_LOG";

/// 解析日志级别，无法识别时使用 warn
pub fn level_from(value: Option<&str>) -> LevelFilter {
    value
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(LevelFilter::Warn)
}

/// 初始化 log4rs，日志写到 stderr
///
/// 初始化失败不影响主流程，只是没有日志输出。
pub fn init() {
    let level = level_from(env::var(LOG_ENV).ok().as_deref());

    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(
            "{h({l})} {d(%Y-%m-%d %H:%M:%S)} - {m}{n}",
        )))
        .build();

    let config = Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .build(Root::builder().appender("stderr").build(level));

    match config {
        Ok(config) => {
            if let Err(e) = log4rs::init_config(config) {
                eprintln!("failed to initialize logging: {}", e);
            }
        }
        Err(e) => eprintln!("invalid logging config: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_from() {
        assert_eq!(level_from(Some("debug")), LevelFilter::Debug);
        assert_eq!(level_from(Some(" TRACE ")), LevelFilter::Trace);
        assert_eq!(level_from(Some("loud")), LevelFilter::Warn);
        assert_eq!(level_from(None), LevelFilter::Warn);
    }
}
