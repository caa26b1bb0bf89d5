pub mod cache;
pub mod classify;
mod commands;
pub mod config;
pub mod constants;
pub mod error;
pub mod external;
pub mod image_utils;
pub mod persist;
pub mod render;
pub mod service;
pub mod strategy;
pub mod thumbnail;
pub mod types;
pub mod walker;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

pub use config::Settings;
pub use error::{Error, GenerationError, Result};
pub use service::ThumbnailService;
pub use walker::{DirectoryFailure, ProcessReport};

use commands::Cli;

/// ログ初期化（RUST_LOG が優先）
pub fn init_tracing(verbose: bool, json: bool) {
    let default_filter = if verbose {
        "thumbkit_lib=debug,thumbkit=debug"
    } else {
        "thumbkit_lib=info,thumbkit=info"
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into());
    let registry = tracing_subscriber::registry().with(env_filter);

    // 標準出力はレポート用なのでログは標準エラーへ
    let result = if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
    if let Err(e) = result {
        eprintln!("ログ初期化エラー: {}", e);
    }
}

pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.json_logs);

    let settings = Settings::load(cli.config.as_deref()).context("設定の読み込みに失敗しました")?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("非同期ランタイムの起動に失敗しました")?;

    runtime.block_on(commands::execute(cli.command, settings))
}
