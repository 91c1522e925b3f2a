//! 設定値
//!
//! 検索と診断出力のオプション

use regex::{Regex, RegexBuilder};

use crate::error::Result;

/// 検索パターンのコンパイルオプション
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    /// 大文字小文字を区別する
    pub case_sensitive: bool,
    /// `^` `$` を行単位で一致させる
    pub multi_line: bool,
    /// `.` を改行にも一致させる
    pub dot_matches_new_line: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            case_sensitive: true,
            multi_line: true,
            dot_matches_new_line: false,
        }
    }
}

impl SearchOptions {
    /// 大文字小文字を区別しない設定
    pub fn case_insensitive() -> Self {
        Self {
            case_sensitive: false,
            ..Self::default()
        }
    }

    /// パターンをコンパイル
    pub fn build(&self, pattern: &str) -> Result<Regex> {
        Ok(RegexBuilder::new(pattern)
            .case_insensitive(!self.case_sensitive)
            .multi_line(self.multi_line)
            .dot_matches_new_line(self.dot_matches_new_line)
            .build()?)
    }
}

/// 診断ダンプの表示オプション
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DumpOptions {
    /// 1セルあたりの表示幅
    pub cell_width: usize,
    /// 1行に表示する最大セル数（超えた分は省略）
    pub max_columns: usize,
    /// オフセット・ページ・位置の行を表示する
    pub show_offsets: bool,
}

impl Default for DumpOptions {
    fn default() -> Self {
        Self {
            cell_width: 3,
            max_columns: 20,
            show_offsets: true,
        }
    }
}

impl DumpOptions {
    /// 位置情報を省いたコンパクトな設定
    pub fn compact() -> Self {
        Self {
            show_offsets: false,
            ..Self::default()
        }
    }
}
