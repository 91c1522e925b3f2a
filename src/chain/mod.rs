//! セグメントチェーン
//!
//! 原文を保持したまま編集を積み重ねるテキスト表現

mod cell;
mod document;
mod index;
mod segment;

pub use cell::{Cell, TagId};
pub use document::{Cells, Document, Extraction, SearchHit};
pub use index::{LocationIndex, LocationRecord};
pub use segment::{Segment, SegmentId, SegmentKind};

use crate::error::ChainError;

/// チェーン操作のResult型
pub type Result<T> = std::result::Result<T, ChainError>;
