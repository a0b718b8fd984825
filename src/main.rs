use anyhow::{Context, Result};
use clap::Parser;
use contentdoggo::app::cli::Cli;
use contentdoggo::app::command::{execute, resolve_config};
use contentdoggo::domain::fetch::ContentFetcher;
use contentdoggo::infra::logging::{self, LogFormat};
use contentdoggo::types::ContentConfig;
use tracing::debug;

#[tokio::main]
async fn main() -> Result<()> {
    // 環境変数を読み込み（.envファイルがあれば使用）
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    logging::init(if cli.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    });

    let config = ContentConfig::from_env().context("設定の読み込みに失敗しました")?;
    let config = resolve_config(&cli, config);
    debug!(?config, "設定を読み込みました");

    let fetcher = ContentFetcher::from_config(&config);
    let output = execute(&fetcher, &cli.command).await?;

    let rendered = serde_json::to_string_pretty(&output).context("結果の整形に失敗しました")?;
    println!("{}", rendered);
    Ok(())
}
