//! エラーハンドリングシステム
//!
//! palimpsest 全体で使用される統一されたエラー型を定義
//! すべてのエラーは呼び出し側の誤用を示し、内部で回復されることはない

use crate::chain::SegmentId;
use thiserror::Error;

/// ライブラリ全体のエラー型
#[derive(Error, Debug, Clone)]
pub enum PalimpsestError {
    /// セグメントチェーン操作エラー
    #[error("Chain operation failed: {0}")]
    Chain(#[from] ChainError),

    /// ファイル操作エラー
    #[error("File operation failed: {0}")]
    File(#[from] FileError),

    /// パターンのコンパイルエラー
    #[error("Invalid pattern: {0}")]
    Pattern(String),

    /// 入力ソースが解釈できない
    #[error("Malformed input: {reason}")]
    MalformedInput { reason: String },
}

/// セグメントチェーン操作固有のエラー
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("Offset {offset} (page {page}) is out of range for visible length {len}")]
    OutOfRange { offset: usize, page: usize, len: usize },

    #[error("Range [{start:#x}->{end:#x}] crosses an edit boundary; nested edits are not supported")]
    NestedEditUnsupported { start: usize, end: usize },

    #[error("Offset {offset} has no segment with visible length")]
    NoVisibleTarget { offset: usize },

    #[error("No segment at chain index {index}")]
    NoSuchSegment { index: usize },

    #[error("Segment {id} is not part of this document")]
    UnknownSegment { id: SegmentId },
}

impl ChainError {
    /// 範囲外エラーかを判定
    pub fn is_out_of_range(&self) -> bool {
        matches!(self, ChainError::OutOfRange { .. })
    }
}

/// ファイル操作固有のエラー
#[derive(Error, Debug, Clone)]
pub enum FileError {
    #[error("File not found: {path}")]
    NotFound { path: String },

    #[error("Permission denied: {path}")]
    PermissionDenied { path: String },

    #[error("Invalid path: {path}")]
    InvalidPath { path: String },

    #[error("IO error: {message}")]
    Io { message: String },
}

/// プロジェクト標準のResult型
pub type Result<T> = std::result::Result<T, PalimpsestError>;

// std::io::Error から PalimpsestError への変換
impl From<std::io::Error> for PalimpsestError {
    fn from(error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::PermissionDenied => PalimpsestError::File(FileError::PermissionDenied {
                path: error.to_string(),
            }),
            std::io::ErrorKind::InvalidData => PalimpsestError::MalformedInput {
                reason: error.to_string(),
            },
            _ => PalimpsestError::File(FileError::Io {
                message: error.to_string(),
            }),
        }
    }
}

// 正規表現エラーの変換
impl From<regex::Error> for PalimpsestError {
    fn from(error: regex::Error) -> Self {
        PalimpsestError::Pattern(error.to_string())
    }
}
