//! ZIPアーカイブ生成（共通ライブラリ）
//!
//! エントリ名の重複は `CollisionPolicy` に従って解決してから書き込む。
//! ZIPに同名エントリを2つ書くことはしない。
//!
//! エントリ名は常にアーカイブ直下の1ファイル名になる（区切り文字は `_` に置換）。

use super::CollisionPolicy;
use crate::error::{Error, Result};
use crate::types::ProcessedImage;
use std::collections::{HashMap, HashSet};
use std::io::{Cursor, Write};
use tracing::warn;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Deflate圧縮レベル（中程度、固定）
pub const COMPRESSION_LEVEL: i64 = 6;

/// アーカイブに書き込むエントリ
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveEntry<'a> {
    pub name: String,
    pub bytes: &'a [u8],
}

/// 重複解決の結果
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEntries<'a> {
    /// アーカイブに書く順のエントリ
    pub entries: Vec<ArchiveEntry<'a>>,
    /// 入力1件ごとの最終エントリ名（入力順）
    pub final_names: Vec<String>,
    /// 上書き・改名の対象になった名前
    pub collisions: Vec<String>,
}

/// 出力名の重複を解決
pub fn resolve_entries(processed: &[ProcessedImage], policy: CollisionPolicy) -> Result<ResolvedEntries<'_>> {
    let mut entries: Vec<ArchiveEntry<'_>> = Vec::with_capacity(processed.len());
    let mut final_names = Vec::with_capacity(processed.len());
    let mut collisions = Vec::new();
    let mut position: HashMap<String, usize> = HashMap::new();
    let names: Vec<String> = processed.iter().map(|p| safe_entry_name(p.new_name())).collect();
    let mut taken: HashSet<String> = names.iter().cloned().collect();

    for (item, name) in processed.iter().zip(&names) {
        let name = name.as_str();
        let Some(&existing) = position.get(name) else {
            position.insert(name.to_string(), entries.len());
            entries.push(ArchiveEntry {
                name: name.to_string(),
                bytes: item.encoded_bytes(),
            });
            final_names.push(name.to_string());
            continue;
        };

        collisions.push(name.to_string());
        match policy {
            CollisionPolicy::Overwrite => {
                // 後勝ち: 位置は最初のエントリのまま内容を差し替える
                entries[existing].bytes = item.encoded_bytes();
                final_names.push(name.to_string());
            }
            CollisionPolicy::Suffix => {
                let renamed = next_free_name(name, &taken);
                taken.insert(renamed.clone());
                position.insert(renamed.clone(), entries.len());
                entries.push(ArchiveEntry {
                    name: renamed.clone(),
                    bytes: item.encoded_bytes(),
                });
                final_names.push(renamed);
            }
            CollisionPolicy::Fail => {
                return Err(Error::Archive(format!("duplicate entry name: {}", name)));
            }
        }
    }

    Ok(ResolvedEntries {
        entries,
        final_names,
        collisions,
    })
}

/// パス区切り・制御文字を `_` に置き換え、ディレクトリを含まない名前にする
fn safe_entry_name(name: &str) -> String {
    let safe: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    if safe != name {
        warn!(original = %name, entry = %safe, "entry name sanitized");
    }
    safe
}

/// `name.jpg` → `name_2.jpg`, `name_3.jpg`, ...（使用済みは飛ばす）
fn next_free_name(name: &str, taken: &HashSet<String>) -> String {
    let (stem, ext) = match name.rfind('.') {
        Some(pos) => name.split_at(pos),
        None => (name, ""),
    };
    (2..)
        .map(|n| format!("{}_{}{}", stem, n, ext))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| name.to_string())
}

/// ZIPをバッファに生成
pub fn build_archive(entries: &[ArchiveEntry<'_>]) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(COMPRESSION_LEVEL));

    for entry in entries {
        writer.start_file(entry.name.as_str(), options)?;
        writer
            .write_all(entry.bytes)
            .map_err(|e| Error::Archive(format!("{}: {}", entry.name, e)))?;
    }

    let cursor = writer.finish()?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EmployeeRecord;
    use std::io::Read;
    use zip::ZipArchive;

    fn processed(username: &str, bytes: &[u8]) -> ProcessedImage {
        let record = EmployeeRecord::new(username, "0").unwrap();
        ProcessedImage::new(record.derived_filename(), bytes.to_vec(), record)
    }

    fn read_entries(bytes: Vec<u8>) -> Vec<(String, Vec<u8>)> {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        (0..archive.len())
            .map(|i| {
                let mut file = archive.by_index(i).unwrap();
                let mut content = Vec::new();
                file.read_to_end(&mut content).unwrap();
                (file.name().to_string(), content)
            })
            .collect()
    }

    #[test]
    fn test_archive_entries_in_order() {
        let items = vec![processed("b", b"bb"), processed("a", b"aa")];
        let resolved = resolve_entries(&items, CollisionPolicy::Overwrite).unwrap();
        let zip = build_archive(&resolved.entries).unwrap();

        let entries = read_entries(zip);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], ("b.jpg".to_string(), b"bb".to_vec()));
        assert_eq!(entries[1], ("a.jpg".to_string(), b"aa".to_vec()));
    }

    #[test]
    fn test_overwrite_last_write_wins() {
        let items = vec![processed("jdoe", b"first"), processed("x", b"x"), processed("jdoe", b"second")];
        let resolved = resolve_entries(&items, CollisionPolicy::Overwrite).unwrap();

        assert_eq!(resolved.final_names, vec!["jdoe.jpg", "x.jpg", "jdoe.jpg"]);
        assert_eq!(resolved.collisions, vec!["jdoe.jpg"]);

        let entries = read_entries(build_archive(&resolved.entries).unwrap());
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], ("jdoe.jpg".to_string(), b"second".to_vec()));
    }

    #[test]
    fn test_suffix_skips_taken_names() {
        let mut items = vec![processed("jdoe", b"1"), processed("jdoe", b"2")];
        items.push(ProcessedImage::new(
            "jdoe_2.jpg".to_string(),
            b"3".to_vec(),
            EmployeeRecord::new("jdoe_2", "0").unwrap(),
        ));
        let resolved = resolve_entries(&items, CollisionPolicy::Suffix).unwrap();

        assert_eq!(resolved.final_names, vec!["jdoe.jpg", "jdoe_3.jpg", "jdoe_2.jpg"]);
        let entries = read_entries(build_archive(&resolved.entries).unwrap());
        assert_eq!(entries.len(), 3);
    }

    #[test]
    fn test_fail_policy() {
        let items = vec![processed("jdoe", b"1"), processed("jdoe", b"2")];
        let err = resolve_entries(&items, CollisionPolicy::Fail).unwrap_err();
        assert!(matches!(err, Error::Archive(ref m) if m.contains("jdoe.jpg")));
    }

    #[test]
    fn test_entries_are_deflated() {
        let items = vec![processed("jdoe", &[7u8; 4096])];
        let resolved = resolve_entries(&items, CollisionPolicy::Overwrite).unwrap();
        let zip = build_archive(&resolved.entries).unwrap();

        let mut archive = ZipArchive::new(Cursor::new(zip)).unwrap();
        let file = archive.by_index(0).unwrap();
        assert_eq!(file.compression(), CompressionMethod::Deflated);
        assert!(file.compressed_size() < file.size());
    }

    #[test]
    fn test_empty_archive_is_valid() {
        let zip = build_archive(&[]).unwrap();
        assert!(read_entries(zip).is_empty());
    }

    #[test]
    fn test_path_like_usernames_stay_in_archive_root() {
        let items = vec![processed("../x", b"1"), processed("a/b", b"2"), processed("c\\d", b"3")];
        let resolved = resolve_entries(&items, CollisionPolicy::Overwrite).unwrap();
        assert_eq!(resolved.final_names, vec![".._x.jpg", "a_b.jpg", "c_d.jpg"]);

        let entries = read_entries(build_archive(&resolved.entries).unwrap());
        for (name, _) in &entries {
            assert!(!name.contains('/') && !name.contains('\\'), "{}", name);
        }
    }

    #[test]
    fn test_sanitized_names_can_collide() {
        let items = vec![processed("a/b", b"1"), processed("a_b", b"2")];
        let resolved = resolve_entries(&items, CollisionPolicy::Suffix).unwrap();
        assert_eq!(resolved.final_names, vec!["a_b.jpg", "a_b_2.jpg"]);
    }

    #[test]
    fn test_next_free_name_without_extension() {
        let taken: HashSet<String> = ["raw".to_string()].into_iter().collect();
        assert_eq!(next_free_name("raw", &taken), "raw_2");
    }
}
