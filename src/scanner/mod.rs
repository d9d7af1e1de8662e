use crate::error::{PhotoOnboardError, Result};
use photo_onboard_common::UploadedImage;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp"];

/// 拡張子が対応画像形式か（大文字小文字を区別しない）
pub fn is_image_extension(ext: &str) -> bool {
    let ext = ext.to_lowercase();
    IMAGE_EXTENSIONS.contains(&ext.as_str())
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| is_image_extension(&ext.to_string_lossy()))
        .unwrap_or(false)
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// フォルダ直下の画像を読み込む（ファイル名順）
pub fn scan_folder(folder: &Path) -> Result<Vec<UploadedImage>> {
    if !folder.is_dir() {
        return Err(PhotoOnboardError::FolderNotFound(folder.display().to_string()));
    }

    let mut paths = Vec::new();

    for entry in WalkDir::new(folder)
        .max_depth(1)  // 直下のみ（再帰しない）
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();

        if path.is_file() && has_image_extension(path) {
            paths.push(path.to_path_buf());
        }
    }

    // ファイル名でソート
    paths.sort_by_key(|p| file_name_of(p));

    let mut images = Vec::with_capacity(paths.len());
    for path in paths {
        let bytes = std::fs::read(&path)?;
        debug!(file = %path.display(), bytes = bytes.len(), "image loaded");
        images.push(UploadedImage::new(file_name_of(&path), bytes));
    }

    Ok(images)
}

/// 指定されたファイルを指定順で読み込む
pub fn load_files<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<UploadedImage>> {
    paths
        .iter()
        .map(|p| {
            let path = p.as_ref();
            if !path.is_file() {
                return Err(PhotoOnboardError::FileNotFound(path.display().to_string()));
            }
            if !has_image_extension(path) {
                return Err(PhotoOnboardError::UnsupportedImage(path.display().to_string()));
            }
            let bytes = std::fs::read(path)?;
            Ok(UploadedImage::new(file_name_of(path), bytes))
        })
        .collect()
}

/// コマンドライン引数の順に読み込む（フォルダは直下をスキャン）
pub fn collect_inputs(paths: &[PathBuf]) -> Result<Vec<UploadedImage>> {
    let mut images = Vec::new();
    for path in paths {
        if path.is_dir() {
            images.extend(scan_folder(path)?);
        } else {
            images.extend(load_files(std::slice::from_ref(path))?);
        }
    }
    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_is_image_extension() {
        assert!(is_image_extension("jpg"));
        assert!(is_image_extension("JPG"));
        assert!(is_image_extension("jpeg"));
        assert!(is_image_extension("Png"));
        assert!(is_image_extension("webp"));
        assert!(!is_image_extension("txt"));
        assert!(!is_image_extension("pdf"));
        assert!(!is_image_extension("xlsx"));
    }

    #[test]
    fn test_scan_folder_not_found() {
        let result = scan_folder(Path::new("/nonexistent/folder"));
        assert!(matches!(result, Err(PhotoOnboardError::FolderNotFound(_))));
    }

    #[test]
    fn test_scan_folder_with_images() {
        let dir = tempdir().unwrap();

        File::create(dir.path().join("1001.jpg")).unwrap().write_all(b"one").unwrap();
        File::create(dir.path().join("1002.JPG")).unwrap().write_all(b"two").unwrap();
        File::create(dir.path().join("1003.png")).unwrap().write_all(b"three").unwrap();
        File::create(dir.path().join("readme.txt")).unwrap().write_all(b"text").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        File::create(dir.path().join("sub").join("1004.jpg")).unwrap();

        let result = scan_folder(dir.path()).unwrap();
        assert_eq!(result.len(), 3);
        assert_eq!(result[0].file_name(), "1001.jpg");
        assert_eq!(result[0].bytes(), b"one");
        assert_eq!(result[1].file_name(), "1002.JPG");
        assert_eq!(result[2].file_name(), "1003.png");
    }

    #[test]
    fn test_images_sorted_by_filename() {
        let dir = tempdir().unwrap();

        File::create(dir.path().join("c.jpg")).unwrap();
        File::create(dir.path().join("a.jpg")).unwrap();
        File::create(dir.path().join("b.jpg")).unwrap();

        let result = scan_folder(dir.path()).unwrap();
        let names: Vec<&str> = result.iter().map(|i| i.file_name()).collect();
        assert_eq!(names, vec!["a.jpg", "b.jpg", "c.jpg"]);
    }

    #[test]
    fn test_load_files_keeps_order() {
        let dir = tempdir().unwrap();
        let b = dir.path().join("b.jpg");
        let a = dir.path().join("a.png");
        fs::write(&b, b"b").unwrap();
        fs::write(&a, b"a").unwrap();

        let result = load_files(&[&b, &a]).unwrap();
        assert_eq!(result[0].file_name(), "b.jpg");
        assert_eq!(result[1].file_name(), "a.png");
    }

    #[test]
    fn test_load_files_rejects_non_images() {
        let dir = tempdir().unwrap();
        let doc = dir.path().join("notes.txt");
        fs::write(&doc, b"x").unwrap();

        let result = load_files(&[&doc]);
        assert!(matches!(result, Err(PhotoOnboardError::UnsupportedImage(_))));
    }

    #[test]
    fn test_collect_inputs_mixes_folders_and_files() {
        let dir = tempdir().unwrap();
        let folder = dir.path().join("fotos");
        fs::create_dir(&folder).unwrap();
        fs::write(folder.join("2.jpg"), b"2").unwrap();
        fs::write(folder.join("1.jpg"), b"1").unwrap();
        let single = dir.path().join("9.png");
        fs::write(&single, b"9").unwrap();

        let result = collect_inputs(&[single.clone(), folder]).unwrap();
        let names: Vec<&str> = result.iter().map(|i| i.file_name()).collect();
        assert_eq!(names, vec!["9.png", "1.jpg", "2.jpg"]);
    }
}
