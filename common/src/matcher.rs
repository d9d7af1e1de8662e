//! 写真と社員レコードの照合
//!
//! ファイル名（小文字化）と社員コードを比較する。比較は2通り:
//! - `<code>.jpg` とファイル名全体
//! - `<code>` と拡張子を除いたファイル名
//!
//! 同じキーを持つレコードが複数ある場合は表の先頭に近いものが選ばれる。

use crate::types::{Matched, MatchOutcome, RecordTable, UploadedImage};
use tracing::debug;

/// 照合結果の集計
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchSummary {
    pub matched: usize,
    pub unmatched: usize,
}

impl MatchSummary {
    pub fn total(&self) -> usize {
        self.matched + self.unmatched
    }
}

/// 拡張子を除いたファイル名（最後の `.` 以降を除去。`.` がなければそのまま）
fn strip_extension(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(pos) => &file_name[..pos],
        None => file_name,
    }
}

/// 全画像を照合（出力順 = 入力順）
pub fn match_images(records: &RecordTable, images: &[UploadedImage]) -> Vec<MatchOutcome> {
    // 比較キーは先に小文字化しておく（レコード順を保持）
    let keys: Vec<(String, String)> = records
        .iter()
        .map(|r| (r.derived_code_key().to_lowercase(), r.employee_code().to_lowercase()))
        .collect();

    images
        .iter()
        .map(|image| {
            let file_name_lower = image.file_name().to_lowercase();
            let basename_lower = strip_extension(&file_name_lower);

            let found = keys
                .iter()
                .position(|(code_key, code)| *code_key == file_name_lower || code == basename_lower);

            match found {
                Some(idx) => {
                    let record = records.records[idx].clone();
                    debug!(file = image.file_name(), username = record.username(), "matched");
                    MatchOutcome::Matched(Matched::new(image.clone(), record))
                }
                None => {
                    debug!(file = image.file_name(), "no match");
                    MatchOutcome::Unmatched { image: image.clone() }
                }
            }
        })
        .collect()
}

/// 照合成功分を入力順のまま取り出す
pub fn matched_only(outcomes: &[MatchOutcome]) -> Vec<Matched> {
    outcomes
        .iter()
        .filter_map(|o| match o {
            MatchOutcome::Matched(m) => Some(m.clone()),
            MatchOutcome::Unmatched { .. } => None,
        })
        .collect()
}

/// 照合できなかった画像
pub fn unmatched_only(outcomes: &[MatchOutcome]) -> Vec<UploadedImage> {
    outcomes
        .iter()
        .filter(|o| !o.is_matched())
        .map(|o| o.image().clone())
        .collect()
}

pub fn summarize(outcomes: &[MatchOutcome]) -> MatchSummary {
    let matched = outcomes.iter().filter(|o| o.is_matched()).count();
    MatchSummary {
        matched,
        unmatched: outcomes.len() - matched,
    }
}
