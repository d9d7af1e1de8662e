//! 一括合成モジュール
//!
//! 照合済みの写真を入力順に1枚ずつ合成する。並列化はしない
//! （同時にデコードする画像を1枚に抑える）。
//!
//! - 1枚の失敗は `ItemFailure` として記録し、残りの処理は続ける
//! - 進捗は1枚ごとに1回、`round((i+1)/total*100)` を通知する
//! - `CancelFlag` が立つと次の1枚を開始せずに終了する（作成済みの結果は残す）

use photo_onboard_common::{
    BackgroundSpec, Compositor, Error as CommonError, Matched, PreparedBackground, ProcessedImage,
};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// 中断フラグ（複製しても同じフラグを指す）
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// 失敗の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    Decode,
    Encode,
    Timeout,
    Internal,
}

/// 1枚分の失敗記録
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemFailure {
    /// 照合済みリスト内の位置
    pub index: usize,
    pub file_name: String,
    pub new_name: String,
    pub kind: FailureKind,
    pub message: String,
}

impl ItemFailure {
    fn new(index: usize, item: &Matched, kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            index,
            file_name: item.image().file_name().to_string(),
            new_name: item.new_name().to_string(),
            kind,
            message: message.into(),
        }
    }

    fn from_error(index: usize, item: &Matched, error: &CommonError) -> Self {
        let kind = match error {
            CommonError::Decode { .. } => FailureKind::Decode,
            CommonError::Encode(_) => FailureKind::Encode,
            _ => FailureKind::Internal,
        };
        Self::new(index, item, kind, error.to_string())
    }
}

/// 1枚処理するごとの結果
#[derive(Debug, Clone)]
pub struct BatchStep {
    pub index: usize,
    pub percent: u8,
    pub outcome: std::result::Result<ProcessedImage, ItemFailure>,
}

/// 一括処理の結果
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// 成功分（入力順）
    pub processed: Vec<ProcessedImage>,
    pub failures: Vec<ItemFailure>,
    /// 途中で中断されたか
    pub cancelled: bool,
}

impl BatchReport {
    fn record(&mut self, step: BatchStep) {
        match step.outcome {
            Ok(image) => self.processed.push(image),
            Err(failure) => {
                warn!(
                    index = failure.index,
                    file = %failure.file_name,
                    kind = ?failure.kind,
                    error = %failure.message,
                    "item failed"
                );
                self.failures.push(failure);
            }
        }
    }

    pub fn attempted(&self) -> usize {
        self.processed.len() + self.failures.len()
    }
}

/// 進捗率（0-100）
pub fn progress_percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done as f64 / total as f64) * 100.0).round() as u8
}

/// 一括処理の設定
#[derive(Debug, Clone, Copy)]
pub struct BatchOptions {
    pub jpeg_quality: u8,
    /// 1枚あたりの制限時間（超えたら失敗扱いで次へ）
    ///
    /// 時間切れになった合成スレッドは止められず、バックグラウンドで最後まで走る。
    /// そのため次の1枚と一時的に重なり、同時デコードが2枚になることがある。
    pub item_timeout: Option<Duration>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            jpeg_quality: photo_onboard_common::layout::DEFAULT_JPEG_QUALITY,
            item_timeout: None,
        }
    }
}

type PreparedResult = std::result::Result<Arc<PreparedBackground>, String>;

/// 背景は最初に1回だけデコードする。失敗した場合は全件がその理由で失敗になる
fn prepare_background(background: &BackgroundSpec) -> PreparedResult {
    PreparedBackground::prepare(background)
        .map(Arc::new)
        .map_err(|e| e.to_string())
}

/// 同期版: 1枚ずつ処理する遅延イテレータ
///
/// 呼ぶたびに最初からやり直せる。ランタイムなしで使う場合向け。
pub fn process_iter<'a>(
    matched: &'a [Matched],
    background: &BackgroundSpec,
    compositor: Compositor,
) -> impl Iterator<Item = BatchStep> + 'a {
    let prepared = prepare_background(background);
    let total = matched.len();

    matched.iter().enumerate().map(move |(index, item)| {
        let outcome = match &prepared {
            Ok(bg) => compositor
                .process(item, bg)
                .map_err(|e| ItemFailure::from_error(index, item, &e)),
            Err(msg) => Err(ItemFailure::new(index, item, FailureKind::Decode, msg.clone())),
        };
        BatchStep {
            index,
            percent: progress_percent(index + 1, total),
            outcome,
        }
    })
}

/// 同期版の一括処理
pub fn process_all<F>(
    matched: &[Matched],
    background: &BackgroundSpec,
    compositor: Compositor,
    cancel: Option<&CancelFlag>,
    mut on_progress: F,
) -> BatchReport
where
    F: FnMut(u8),
{
    let mut report = BatchReport::default();
    let mut steps = process_iter(matched, background, compositor);

    loop {
        if cancel.map(CancelFlag::is_cancelled).unwrap_or(false) {
            report.cancelled = report.attempted() < matched.len();
            break;
        }
        let Some(step) = steps.next() else { break };
        let percent = step.percent;
        report.record(step);
        on_progress(percent);
    }

    report
}

/// 一括合成（tokio上で1枚ずつ実行）
pub struct BatchProcessor {
    compositor: Compositor,
    options: BatchOptions,
    cancel: CancelFlag,
}

impl BatchProcessor {
    pub fn new(options: BatchOptions) -> Self {
        Self {
            compositor: Compositor::new(options.jpeg_quality),
            options,
            cancel: CancelFlag::new(),
        }
    }

    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    pub async fn run<F>(
        &self,
        matched: &[Matched],
        background: &BackgroundSpec,
        mut on_progress: F,
    ) -> BatchReport
    where
        F: FnMut(u8),
    {
        let total = matched.len();
        let mut report = BatchReport::default();

        let prepared = {
            let background = background.clone();
            tokio::task::spawn_blocking(move || prepare_background(&background))
                .await
                .unwrap_or_else(|e| Err(format!("background task failed: {}", e)))
        };

        for (index, item) in matched.iter().enumerate() {
            if self.cancel.is_cancelled() {
                info!(done = index, total, "batch cancelled");
                report.cancelled = true;
                break;
            }

            let outcome = match &prepared {
                Ok(bg) => self.run_item(index, item, Arc::clone(bg)).await,
                Err(msg) => Err(ItemFailure::new(index, item, FailureKind::Decode, msg.clone())),
            };

            let percent = progress_percent(index + 1, total);
            report.record(BatchStep {
                index,
                percent,
                outcome,
            });
            on_progress(percent);
        }

        info!(
            processed = report.processed.len(),
            failed = report.failures.len(),
            cancelled = report.cancelled,
            "batch finished"
        );
        report
    }

    async fn run_item(
        &self,
        index: usize,
        item: &Matched,
        background: Arc<PreparedBackground>,
    ) -> std::result::Result<ProcessedImage, ItemFailure> {
        debug!(index, file = item.image().file_name(), "compositing");

        let compositor = self.compositor;
        let owned = item.clone();
        let task = tokio::task::spawn_blocking(move || compositor.process(&owned, &background));

        let joined = match self.options.item_timeout {
            Some(limit) => match tokio::time::timeout(limit, task).await {
                Ok(joined) => joined,
                Err(_) => {
                    return Err(ItemFailure::new(
                        index,
                        item,
                        FailureKind::Timeout,
                        format!("timed out after {:?}", limit),
                    ))
                }
            },
            None => task.await,
        };

        match joined {
            Ok(Ok(processed)) => Ok(processed),
            Ok(Err(e)) => Err(ItemFailure::from_error(index, item, &e)),
            Err(e) => Err(ItemFailure::new(index, item, FailureKind::Internal, e.to_string())),
        }
    }
}
