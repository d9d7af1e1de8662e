use clap::{Parser, Subcommand};
use photo_onboard_common::CollisionPolicy;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "photo-onboard")]
#[command(about = "社員写真の照合・背景合成・一括エクスポートツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 照合・合成・エクスポートまで一括実行
    Process {
        /// 社員スプレッドシート（xlsx/xls/ods）
        #[arg(required = true)]
        sheet: PathBuf,

        /// 写真フォルダ、または写真ファイル（複数可）
        #[arg(required = true)]
        images: Vec<PathBuf>,

        /// 出力フォルダ（デフォルト: カレント）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 背景画像（640x480に引き伸ばし）
        #[arg(short, long, conflicts_with = "palette")]
        background: Option<PathBuf>,

        /// 背景色 (1: 白 / 2: 水色 / 3: 薄灰)
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=3))]
        palette: Option<u8>,

        /// 出力名が重複した場合 (overwrite/suffix/fail)
        #[arg(long)]
        collision: Option<CollisionPolicy>,

        /// 1枚あたりの制限時間（秒）
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// 照合のみ実行して結果を表示
    Match {
        /// 社員スプレッドシート
        #[arg(required = true)]
        sheet: PathBuf,

        /// 写真フォルダ、または写真ファイル（複数可）
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },

    /// 設定を表示/編集
    Config {
        /// 既定の背景色を設定 (1-3)
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=3))]
        set_palette: Option<u8>,

        /// 既定の重複時の扱いを設定
        #[arg(long)]
        set_collision: Option<CollisionPolicy>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}
