//! 翻译网关主程序入口

use std::path::PathBuf;
use std::process;
use std::str::FromStr;

use clap::Parser;
use translation_gateway::{
    adapters::{build_engine, build_segmenter},
    config::ConfigManager,
    env::{self, EnvVar},
    web::WebServer,
};

#[derive(Parser)]
#[command(name = "translation-gateway")]
#[command(about = "Request-batching gateway in front of a translation engine")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Configuration file path (.toml or .json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind address, overrides the config file
    #[arg(short, long)]
    bind: Option<String>,

    /// Port number, overrides the config file
    #[arg(short, long)]
    port: Option<u16>,

    /// Write a default config file to PATH and exit
    #[arg(long, value_name = "PATH")]
    generate_config: Option<PathBuf>,

    /// Print environment variable documentation and exit
    #[arg(long)]
    print_env_docs: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.print_env_docs {
        println!("{}", env::generate_env_docs());
        return Ok(());
    }

    if let Some(path) = cli.generate_config {
        ConfigManager::generate_example_config(&path)?;
        println!("已生成示例配置: {}", path.display());
        return Ok(());
    }

    ConfigManager::load_dotenv();
    setup_logging();

    let mut config = ConfigManager::load(cli.config.as_deref())?.into_config();
    if let Some(bind) = cli.bind {
        config.server.host = bind;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    let config = ConfigManager::from_config(config)?.into_config();

    tracing::info!(
        "调度参数: 每批最多 {} 个分句，最多 {} 个并发批次",
        config.engine.max_segments_per_batch,
        config.engine.max_concurrent_batches
    );

    let engine = build_engine(&config)?;
    let segmenter = build_segmenter(&config)?;

    WebServer::new(config, engine, segmenter).start().await?;

    Ok(())
}

fn setup_logging() {
    let level = env::core::LogLevel::get().unwrap_or_else(|e| {
        eprintln!("警告: {}，使用 info 级别", e);
        "info".to_string()
    });
    let level = tracing::Level::from_str(&level).unwrap_or(tracing::Level::INFO);

    if let Err(e) = tracing_subscriber::fmt().with_max_level(level).try_init() {
        eprintln!("初始化日志失败: {}", e);
        process::exit(1);
    }
}
