//! 区切り範囲スキャナ
//!
//! フラットな文字列から入れ子の区切り範囲を探す。ドキュメントには依存しない

mod delimiter;
mod source;

pub use delimiter::Delimiter;
pub use source::{ContentSource, FileSource};

use std::ops::Range;

use crate::error::Result;

/// 区切りで囲まれた範囲（文字単位）
///
/// `[start, end)` は区切りを含み、`[inner_start, inner_end)` は含まない
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DelimitedRange {
    pub start: usize,
    pub end: usize,
    pub inner_start: usize,
    pub inner_end: usize,
}

impl DelimitedRange {
    /// 区切りを含む範囲
    pub fn outer(&self) -> Range<usize> {
        self.start..self.end
    }

    /// 区切りを除いた範囲（終了区切りが開始区切りと重なる場合は空）
    pub fn inner(&self) -> Range<usize> {
        self.inner_start..self.inner_end.max(self.inner_start)
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// 内容を保持して区切り範囲を探すスキャナ
#[derive(Debug, Clone)]
pub struct RangeScanner {
    title: String,
    content: String,
}

impl RangeScanner {
    /// 生の文字列から作成
    pub fn new(content: impl Into<String>) -> Self {
        let content: String = content.into();
        Self {
            title: content.as_str().title(),
            content,
        }
    }

    /// ソースから内容を読み込んで作成
    pub fn from_source<S: ContentSource + ?Sized>(source: &S) -> Result<Self> {
        Ok(Self {
            title: source.title(),
            content: source.read_content()?,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// 入れ子を考慮して区切り範囲を文書順に返す
    ///
    /// 範囲内で開始区切りが再び現れた場合は深さだけを増やす。
    /// 閉じられないまま末尾に達した範囲は末尾で閉じる
    pub fn scan(&self, entry: &Delimiter, exit: &Delimiter) -> Vec<DelimitedRange> {
        let chars: Vec<char> = self.content.chars().collect();
        let mut bytes: Vec<usize> = self.content.char_indices().map(|(i, _)| i).collect();
        bytes.push(self.content.len());
        let len = chars.len();

        let mut ranges = Vec::new();
        let mut open: Option<(usize, usize)> = None;
        let mut depth = 0usize;

        for pos in 0..=len {
            if let Some((start, inner_start)) = open {
                if let Some(exit_len) = exit.match_behind(&chars, &self.content, &bytes, start, pos) {
                    depth -= 1;
                    if depth == 0 {
                        ranges.push(DelimitedRange {
                            start,
                            end: pos,
                            inner_start,
                            inner_end: pos - exit_len,
                        });
                        open = None;
                    }
                }
            }

            if let Some(entry_len) = entry.match_ahead(&chars, &self.content, &bytes, pos) {
                if open.is_none() {
                    open = Some((pos, pos + entry_len));
                }
                depth += 1;
            }
        }

        if let Some((start, inner_start)) = open {
            ranges.push(DelimitedRange {
                start,
                end: len,
                inner_start,
                inner_end: len,
            });
        }

        log::trace!(
            "scanned {} for {:?}..{:?}: {} ranges",
            self.title,
            entry.source(),
            exit.source(),
            ranges.len()
        );
        ranges
    }
}
