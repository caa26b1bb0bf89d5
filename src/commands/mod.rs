//! コマンドライン

mod generate;
mod inspect;

use std::path::PathBuf;
use clap::{Parser, Subcommand};

use crate::config::Settings;

#[derive(Parser, Debug)]
#[command(name = "thumbkit", version, about = "ファイルの種類に応じたサムネイルを生成する")]
pub struct Cli {
    /// 設定ファイル（TOML）
    #[arg(short, long, value_name = "FILE", env = "THUMBKIT_CONFIG_FILE", global = true)]
    pub config: Option<PathBuf>,

    /// デバッグログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// ログを JSON で出力
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// ファイル・ディレクトリのサムネイルを生成
    Generate {
        #[arg(required = true, value_name = "PATH")]
        paths: Vec<PathBuf>,

        /// 結果を JSON で出力
        #[arg(long)]
        json: bool,
    },
    /// 判定結果と出力先を表示（生成はしない）
    Inspect {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

pub async fn execute(command: Command, settings: Settings) -> anyhow::Result<()> {
    match command {
        Command::Generate { paths, json } => generate::generate(&paths, json, settings).await,
        Command::Inspect { file } => inspect::inspect(&file, settings).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_generate_requires_path() {
        assert!(Cli::try_parse_from(["thumbkit", "generate"]).is_err());
        let cli = Cli::try_parse_from(["thumbkit", "-v", "generate", "a.png", "docs", "--json"]).unwrap();
        assert!(cli.verbose);
        match cli.command {
            Command::Generate { paths, json } => {
                assert_eq!(paths.len(), 2);
                assert!(json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
