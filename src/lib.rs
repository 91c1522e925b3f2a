//! palimpsest - 原文を保持したまま編集を重ねるテキスト
//!
//! セグメントチェーンによる可逆編集と入れ子区切り範囲スキャナ

// コアモジュール
pub mod error;
pub mod config;

// データ層
pub mod chain;

// ロジック層
pub mod scan;

// 表示層
pub mod diagnostics;

// 公開API
pub use chain::{Cell, Document, Extraction, SearchHit, Segment, SegmentId, SegmentKind, TagId};
pub use config::{DumpOptions, SearchOptions};
pub use error::{ChainError, FileError, PalimpsestError, Result};
pub use scan::{ContentSource, DelimitedRange, Delimiter, FileSource, RangeScanner};
