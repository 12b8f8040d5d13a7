// setter.rs - 屏幕图片设置模块
// 把选中的图片路径代入每个屏幕的命令模板，再通过 std::process::Command 执行

use crate::commands::{IMAGE_PLACEHOLDER, ScreenCommands};
use crate::error::AppError;
use clap::ValueEnum;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command; // 用于创建和执行子进程

/// 可以设置图片的屏幕
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Screen {
    /// 桌面背景
    Background,
    /// 锁屏 / 屏保
    Screensaver,
}

impl Screen {
    pub const ALL: [Screen; 2] = [Screen::Background, Screen::Screensaver];

    pub fn as_str(&self) -> &'static str {
        match self {
            Screen::Background => "background",
            Screen::Screensaver => "screensaver",
        }
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 代入图片路径后、可以直接执行的命令
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedCommand {
    pub screen: Screen,
    pub image: PathBuf,
    pub argv: Vec<String>,
}

/// 单个屏幕的执行结果
#[derive(Debug)]
pub struct ScreenOutcome {
    pub screen: Screen,
    pub image: PathBuf,
    pub result: Result<(), AppError>,
}

/// 把图片路径代入命令模板
///
/// 只替换第一个包含 %image% 的参数，占位符可以是整个参数，
/// 也可以嵌在参数中（如 "file://%image%"）。
pub fn substitute(screen: Screen, template: &[String], image: &Path) -> Result<Vec<String>, AppError> {
    let position = template
        .iter()
        .position(|arg| arg.contains(IMAGE_PLACEHOLDER))
        .ok_or(AppError::MissingPlaceholder(screen))?;

    let image_str = image.to_string_lossy();
    let mut argv = template.to_vec();
    argv[position] = argv[position].replacen(IMAGE_PLACEHOLDER, &image_str, 1);
    Ok(argv)
}

/// 为每个屏幕准备命令
///
/// 任意一个屏幕缺少命令或占位符都直接返回配置错误，此时不会执行任何命令。
pub fn prepare(
    assignments: &[(Screen, PathBuf)],
    commands: &ScreenCommands,
) -> Result<Vec<PreparedCommand>, AppError> {
    assignments
        .iter()
        .map(|(screen, image)| {
            let template = commands
                .get(*screen)
                .ok_or(AppError::MissingCommand(*screen))?;
            Ok(PreparedCommand {
                screen: *screen,
                image: image.clone(),
                argv: substitute(*screen, template, image)?,
            })
        })
        .collect()
}

/// 执行一条命令，非零退出码时带上 stderr 的第一行
pub fn run(command: &PreparedCommand) -> Result<(), AppError> {
    let (program, args) = command
        .argv
        .split_first()
        .ok_or(AppError::MissingCommand(command.screen))?;

    log::debug!("running {:?}", command.argv);

    // .output() 同步执行命令，等待完成，捕获 stdout 和 stderr
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|e| AppError::CommandExecution {
            screen: command.screen,
            code: "none".to_string(),
            stderr: format!("cannot run {}: {}", program, e),
        })?;

    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    Err(AppError::CommandExecution {
        screen: command.screen,
        code: output
            .status
            .code()
            .map(|c| c.to_string())
            .unwrap_or_else(|| "signal".to_string()),
        stderr: stderr.lines().next().unwrap_or("").trim().to_string(),
    })
}

/// 依次为每个屏幕设置图片
///
/// 一个屏幕失败不会影响后面的屏幕，结果按屏幕顺序返回。
pub fn apply(
    assignments: &[(Screen, PathBuf)],
    commands: &ScreenCommands,
) -> Result<Vec<ScreenOutcome>, AppError> {
    let prepared = prepare(assignments, commands)?;

    Ok(prepared
        .into_iter()
        .map(|command| {
            let result = run(&command);
            match &result {
                Ok(()) => log::info!("set {} to {}", command.screen, command.image.display()),
                Err(e) => log::warn!("{}", e),
            }
            ScreenOutcome {
                screen: command.screen,
                image: command.image,
                result,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn commands(background: Option<Vec<String>>, screensaver: Option<Vec<String>>) -> ScreenCommands {
        ScreenCommands {
            background,
            screensaver,
        }
    }

    #[test]
    fn test_substitute_whole_token() {
        let out = substitute(
            Screen::Background,
            &argv(&["feh", "--bg-fill", "%image%"]),
            Path::new("/w/a.jpg"),
        )
        .unwrap();
        assert_eq!(out, argv(&["feh", "--bg-fill", "/w/a.jpg"]));
    }

    #[test]
    fn test_substitute_embedded_token() {
        let out = substitute(
            Screen::Screensaver,
            &argv(&["gsettings", "set", "org.gnome.desktop.screensaver", "picture-uri", "file://%image%"]),
            Path::new("/w/b.png"),
        )
        .unwrap();
        assert_eq!(out[4], "file:///w/b.png");
    }

    #[test]
    fn test_missing_placeholder_does_not_run() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("ran");
        let table = commands(
            Some(argv(&["touch", marker.to_str().unwrap()])),
            None,
        );

        let err = apply(&[(Screen::Background, PathBuf::from("/w/a.jpg"))], &table).unwrap_err();
        assert!(matches!(err, AppError::MissingPlaceholder(Screen::Background)));
        assert!(!marker.exists());
    }

    #[test]
    fn test_missing_command_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("ran");
        let table = commands(
            Some(argv(&["sh", "-c", "touch \"$1\"", "sh", marker.to_str().unwrap(), "%image%"])),
            None,
        );

        let assignments = [
            (Screen::Background, PathBuf::from("/w/a.jpg")),
            (Screen::Screensaver, PathBuf::from("/w/b.jpg")),
        ];
        let err = apply(&assignments, &table).unwrap_err();
        assert_eq!(err.to_string(), "commands for screensaver not defined");
        assert!(!marker.exists());
    }

    #[test]
    fn test_failure_does_not_stop_next_screen() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("saver");
        let table = commands(
            Some(argv(&["sh", "-c", "echo \"no display for $0\" >&2; echo second >&2; exit 3", "%image%"])),
            Some(argv(&["sh", "-c", "cp /dev/null \"$1\"; test -n \"$0\"", "%image%", marker.to_str().unwrap()])),
        );

        let assignments = [
            (Screen::Background, PathBuf::from("/w/a.jpg")),
            (Screen::Screensaver, PathBuf::from("/w/b.jpg")),
        ];
        let outcomes = apply(&assignments, &table).unwrap();

        assert_eq!(outcomes.len(), 2);
        match &outcomes[0].result {
            Err(AppError::CommandExecution { screen, code, stderr }) => {
                assert_eq!(*screen, Screen::Background);
                assert_eq!(code, "3");
                assert_eq!(stderr, "no display for /w/a.jpg");
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(outcomes[1].result.is_ok());
        assert_eq!(outcomes[1].image, PathBuf::from("/w/b.jpg"));
        assert!(marker.exists());
    }

    #[test]
    fn test_unknown_program_is_execution_error() {
        let table = commands(Some(argv(&["autowall-no-such-program", "%image%"])), None);
        let outcomes = apply(&[(Screen::Background, PathBuf::from("/w/a.jpg"))], &table).unwrap();
        assert!(matches!(
            outcomes[0].result,
            Err(AppError::CommandExecution { .. })
        ));
    }
}
