use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Config;
use crate::logging::init_logging;
use crate::server::run_server;

/// GATE/NET 考试助手 - 聊天后端
#[derive(Debug, Parser)]
#[command(name = "exam-assistant", version, about)]
pub struct Cli {
    /// 配置文件路径（默认 ~/.exam-assistant/config.toml）
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// 启动 HTTP 服务（默认）
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// 生成默认配置文件
    Onboard {
        /// 覆盖已存在的配置文件
        #[arg(long)]
        force: bool,
    },
}

impl Cli {
    fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_path)
    }
}

/// Onboard 命令 - 写出默认配置
fn run_onboard(path: PathBuf, force: bool) -> Result<()> {
    if path.exists() && !force {
        println!("⚠️ 配置文件已存在：{}", path.display());
        println!("   使用 --force 覆盖");
        return Ok(());
    }

    Config::default()
        .save(&path)
        .context("保存配置文件失败")?;

    println!("✅ 保存配置：{}", path.display());
    println!();
    println!("你可以:");
    println!("  1. 在 [completion] 中填写 api_key，或设置 OPENAI_API_KEY");
    println!("  2. 在 [weather] 中填写 api_key，或设置 WEATHER_API_KEY");
    println!("  3. 运行 'exam-assistant serve' 启动服务");

    Ok(())
}

/// Serve 命令 - 加载配置并启动服务
async fn run_serve(path: PathBuf, host: Option<String>, port: Option<u16>) -> Result<()> {
    let mut config = Config::load(&path)?;
    config.apply_env();
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    init_logging(&config.logging);
    tracing::info!(
        config = %path.display(),
        live_completion = config.completion.credential().is_some(),
        live_weather = config.weather.credential().is_some(),
        "启动 GATE/NET Exam Assistant"
    );

    run_server(config).await
}

/// 主入口函数
pub async fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    let path = cli.config_path();

    match cli.command {
        Some(Command::Onboard { force }) => run_onboard(path, force),
        Some(Command::Serve { host, port }) => run_serve(path, host, port).await,
        None => run_serve(path, None, None).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_defaults_to_serve() {
        let cli = Cli::parse_from(["exam-assistant"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.config_path(), Config::default_path());
    }

    #[test]
    fn test_parse_serve_flags() {
        let cli = Cli::parse_from(["exam-assistant", "serve", "--port", "9000", "--config", "x.toml"]);
        assert_eq!(cli.config_path(), PathBuf::from("x.toml"));
        match cli.command {
            Some(Command::Serve { host, port }) => {
                assert!(host.is_none());
                assert_eq!(port, Some(9000));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_onboard_writes_config_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        run_onboard(path.clone(), false).unwrap();
        assert!(path.exists());

        std::fs::write(&path, "request_timeout_secs = 3\n").unwrap();
        run_onboard(path.clone(), false).unwrap();
        assert_eq!(Config::load(&path).unwrap().request_timeout_secs, 3);

        run_onboard(path.clone(), true).unwrap();
        assert_eq!(Config::load(&path).unwrap().request_timeout_secs, 30);
    }
}
