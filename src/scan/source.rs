//! スキャン対象の内容を供給するソース

use std::path::{Path, PathBuf};

use crate::error::{FileError, PalimpsestError, Result};

/// UTF-8 BOM
const BOM: char = '\u{feff}';

/// スキャナに内容を渡すデリゲート
pub trait ContentSource {
    /// 表示用の名前
    fn title(&self) -> String;

    /// 内容を文字列として読み込む
    fn read_content(&self) -> Result<String>;
}

impl ContentSource for str {
    /// 先頭3文字に `...` を付けたもの
    fn title(&self) -> String {
        let head: String = self.chars().take(3).collect();
        format!("{}...", head)
    }

    fn read_content(&self) -> Result<String> {
        Ok(self.to_string())
    }
}

impl ContentSource for String {
    fn title(&self) -> String {
        self.as_str().title()
    }

    fn read_content(&self) -> Result<String> {
        Ok(self.clone())
    }
}

/// ディスク上のファイル
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ContentSource for FileSource {
    fn title(&self) -> String {
        self.path.display().to_string()
    }

    fn read_content(&self) -> Result<String> {
        let path = &self.path;

        if path.as_os_str().is_empty() {
            return Err(FileError::InvalidPath {
                path: "empty path".to_string(),
            }
            .into());
        }

        // 存在チェック
        if !path.exists() {
            return Err(FileError::NotFound {
                path: path.display().to_string(),
            }
            .into());
        }

        // ファイル種別チェック
        if !path.is_file() {
            return Err(PalimpsestError::MalformedInput {
                reason: format!("Not a regular file: {}", path.display()),
            });
        }

        let bytes = std::fs::read(path).map_err(|error| match error.kind() {
            std::io::ErrorKind::PermissionDenied => PalimpsestError::File(FileError::PermissionDenied {
                path: path.display().to_string(),
            }),
            _ => error.into(),
        })?;

        let content = String::from_utf8(bytes).map_err(|error| PalimpsestError::MalformedInput {
            reason: format!("{} is not valid UTF-8: {}", path.display(), error),
        })?;

        log::debug!("read {} chars from {}", content.chars().count(), path.display());

        // BOM除去
        Ok(match content.strip_prefix(BOM) {
            Some(stripped) => stripped.to_string(),
            None => content,
        })
    }
}
