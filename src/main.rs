use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use photo_onboard::batch::{BatchOptions, BatchProcessor, CancelFlag};
use photo_onboard::common::{
    match_images, matched_only, parse_records, summarize, unmatched_only, BackgroundSpec,
    MatchOutcome, RecordTable, UploadedImage,
};
use photo_onboard::{cli, config, error, export, scanner, sheet};
use cli::{Cli, Commands};
use config::Config;
use error::{PhotoOnboardError, Result};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// スプレッドシート読み込み → レコード化（失敗したら画像処理に進まない）
fn load_records(sheet_path: &Path) -> Result<RecordTable> {
    let result = sheet::read_first_sheet(sheet_path)
        .and_then(|table| parse_records(&table).map_err(PhotoOnboardError::from));

    if let Err(e) = &result {
        if e.is_spreadsheet_error() {
            eprintln!(
                "✖ スプレッドシートを読み込めませんでした（写真は処理していません）: {}",
                sheet_path.display()
            );
        }
    }
    result
}

fn load_images(paths: &[PathBuf]) -> Result<Vec<UploadedImage>> {
    let images = scanner::collect_inputs(paths)?;
    if images.is_empty() {
        let joined = paths
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        return Err(PhotoOnboardError::NoImagesFound(joined));
    }
    Ok(images)
}

fn print_unmatched(unmatched: &[UploadedImage]) {
    if unmatched.is_empty() {
        return;
    }
    println!("⚠ 一致するレコードがない写真（処理対象外）:");
    for image in unmatched {
        println!("  - {}", image.file_name());
    }
}

fn progress_bar() -> ProgressBar {
    let bar = ProgressBar::new(100);
    let style = ProgressStyle::with_template("  [{bar:40}] {pos}%")
        .map(|s| s.progress_chars("=> "))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style);
    bar
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = Config::load()?;

    match cli.command {
        Commands::Process { sheet, images, output, background, palette, collision, timeout } => {
            println!("📸 photo-onboard - 写真一括処理\n");

            // 1. スプレッドシート
            println!("[1/4] スプレッドシートを読み込み中...");
            let records = load_records(&sheet)?;
            println!("✔ {}件の社員レコード\n", records.len());

            // 2. 照合
            println!("[2/4] 写真を照合中...");
            let images = load_images(&images)?;
            let outcomes = match_images(&records, &images);
            let summary = summarize(&outcomes);
            println!("✔ 一致: {}枚 / 不一致: {}枚", summary.matched, summary.unmatched);
            let unmatched = unmatched_only(&outcomes);
            print_unmatched(&unmatched);
            println!();

            // 3. 合成
            println!("[3/4] 背景を合成中...");
            let background = match background {
                Some(path) => {
                    if !path.is_file() {
                        return Err(PhotoOnboardError::FileNotFound(path.display().to_string()));
                    }
                    BackgroundSpec::custom(std::fs::read(&path)?)
                }
                None => BackgroundSpec::palette(palette.unwrap_or(config.default_palette)),
            };

            let cancel = CancelFlag::new();
            {
                let cancel = cancel.clone();
                tokio::spawn(async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        cancel.cancel();
                    }
                });
            }

            let processor = BatchProcessor::new(BatchOptions {
                jpeg_quality: config.jpeg_quality,
                item_timeout: timeout
                    .map(std::time::Duration::from_secs)
                    .or_else(|| config.item_timeout()),
            })
            .with_cancel_flag(cancel);

            let matched = matched_only(&outcomes);
            let bar = progress_bar();
            let report = processor
                .run(&matched, &background, |percent| bar.set_position(u64::from(percent)))
                .await;
            bar.finish_and_clear();

            println!("✔ 合成完了: {}枚", report.processed.len());
            if !report.failures.is_empty() {
                println!("⚠ 合成に失敗した写真（再実行できます）:");
                for failure in &report.failures {
                    println!("  - {} → {}: {}", failure.file_name, failure.new_name, failure.message);
                }
            }
            if report.cancelled {
                println!("⚠ 中断されました（合成済みの{}枚のみ出力します）", report.processed.len());
            }
            println!();

            // 4. エクスポート
            println!("[4/4] エクスポート中...");
            let output_dir = output.unwrap_or_else(|| PathBuf::from("."));
            let mut options = config.export_options();
            if let Some(policy) = collision {
                options.collision = policy;
            }

            let exported = export::export_results(&report.processed, &options, &output_dir);

            let run_report = export::RunReport::new(images.len(), &unmatched, &report)
                .with_export_result(
                    exported.as_ref().map(|(bundle, _)| bundle).map_err(|e| e.to_string()),
                );
            let report_path = export::write_run_report(&run_report, &output_dir)?;

            let (bundle, paths) = exported?;
            println!("✔ ZIP出力: {} ({}件)", paths.archive.display(), bundle.archive_entries);
            println!("✔ Excel出力: {} ({}行)", paths.spreadsheet.display(), bundle.rows.len());
            if !bundle.collisions.is_empty() {
                println!("⚠ 出力名の重複 ({}): {}", options.collision, bundle.collisions.join(", "));
            }
            println!("✔ レポート: {}", report_path.display());

            println!("\n✅ 完了");
        }

        Commands::Match { sheet, images } => {
            println!("🔍 photo-onboard - 照合\n");

            let records = load_records(&sheet)?;
            let images = load_images(&images)?;
            let outcomes = match_images(&records, &images);

            for outcome in &outcomes {
                if let MatchOutcome::Matched(m) = outcome {
                    println!(
                        "  ✔ {} → {} ({})",
                        m.image().file_name(),
                        m.new_name(),
                        m.record().username()
                    );
                }
            }
            print_unmatched(&unmatched_only(&outcomes));

            let summary = summarize(&outcomes);
            println!(
                "\n一致: {}枚 / 不一致: {}枚 / 合計: {}枚",
                summary.matched,
                summary.unmatched,
                summary.total()
            );
        }

        Commands::Config { set_palette, set_collision, show } => {
            let mut config = config;

            if let Some(id) = set_palette {
                config.set_default_palette(id)?;
                println!("✔ 既定の背景色を設定しました: {}", id);
            }

            if let Some(policy) = set_collision {
                config.set_collision_policy(policy)?;
                println!("✔ 重複時の扱いを設定しました: {}", policy);
            }

            if show {
                println!("設定:");
                println!("  JPEG品質: {}", config.jpeg_quality);
                println!("  重複時の扱い: {}", config.collision_policy);
                println!("  既定の背景色: {}", config.default_palette);
                match config.item_timeout_seconds {
                    Some(secs) => println!("  制限時間: {}秒/枚", secs),
                    None => println!("  制限時間: なし"),
                }
            }
        }
    }

    Ok(())
}
