//! 診断用ダンプ
//!
//! ドキュメントの公開クエリだけを使ってセグメントチェーンを文字列化する。
//! 表示専用でコアの動作には関与しない

use std::fmt;

use unicode_width::UnicodeWidthStr;

use crate::chain::{Document, Segment, SegmentKind};
use crate::config::DumpOptions;

const SPACE_SYMBOL: &str = "⎺";
const RETURN_SYMBOL: &str = "↩";
const EMPTY_SYMBOL: &str = "␀";

/// セグメントチェーンのダンプ
#[derive(Debug, Clone, Copy)]
pub struct ChainDump<'a> {
    document: &'a Document,
    options: DumpOptions,
}

impl<'a> ChainDump<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self::with_options(document, DumpOptions::default())
    }

    pub fn with_options(document: &'a Document, options: DumpOptions) -> Self {
        Self { document, options }
    }

    /// セグメントの短い識別子（種別・先頭文字・ID）
    pub fn short_id(segment: &Segment) -> String {
        let prefix = match segment.kind() {
            SegmentKind::Original => "m|",
            SegmentKind::Inserted => "+|",
            SegmentKind::Deleted => "x|",
        };
        let head = symbol(segment.cells().first().map(|cell| cell.ch));
        format!("{}{}#{}", prefix, head, segment.id())
    }

    fn write_segment(&self, f: &mut fmt::Formatter<'_>, position: usize, segment: &Segment) -> fmt::Result {
        let width = self.options.cell_width.max(1);
        let state = if segment.is_visible() { ' ' } else { '~' };
        let label = pad(&Self::short_id(segment), 12);
        let indent = " ".repeat(UnicodeWidthStr::width(label.as_str()) + 4);

        let mut cells: String = segment
            .cells()
            .iter()
            .take(self.options.max_columns)
            .map(|cell| pad(&symbol(Some(cell.ch)), width))
            .collect();
        if segment.raw_len() == 0 {
            cells = pad(EMPTY_SYMBOL, width);
        }
        let ellipsis = if segment.raw_len() > self.options.max_columns { "…" } else { "" };
        writeln!(f, "{}{} | {}{}", state, label, cells, ellipsis)?;

        if !self.options.show_offsets {
            return Ok(());
        }

        let records: Vec<_> = self
            .document
            .location_index()
            .records()
            .iter()
            .filter(|record| record.segment == position)
            .take(self.options.max_columns)
            .collect();

        let offsets: String = records
            .iter()
            .map(|record| pad(&format!("{:x}", record.offset), width))
            .collect();
        let pages: String = records.iter().map(|record| pad(&format!("{:x}", record.page), width)).collect();
        let insets: String = records.iter().map(|record| pad(&format!("{:x}", record.inset), width)).collect();

        writeln!(f, "{}{}", indent, offsets)?;
        writeln!(f, "{}{}", indent, pages)?;
        writeln!(f, "{}{}", indent, insets)
    }
}

impl fmt::Display for ChainDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, segment) in self.document.segments().iter().enumerate() {
            self.write_segment(f, position, segment)?;
        }
        write!(
            f,
            "{} segments, {} visible / {} raw chars",
            self.document.segments().len(),
            self.document.visible_len(),
            self.document.raw_len()
        )
    }
}

/// 表示用の1文字
fn symbol(ch: Option<char>) -> String {
    match ch {
        None => EMPTY_SYMBOL.to_string(),
        Some(' ') => SPACE_SYMBOL.to_string(),
        Some('\n') => RETURN_SYMBOL.to_string(),
        Some(ch) => ch.to_string(),
    }
}

/// 表示幅が `width` になるよう右を空白で埋める
fn pad(text: &str, width: usize) -> String {
    let delta = width.saturating_sub(UnicodeWidthStr::width(text));
    format!("{}{}", text, " ".repeat(delta))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_id_uses_kind_prefix() {
        let mut doc = Document::new("realms");
        doc.delete(0, 3).unwrap();

        let ids: Vec<String> = doc.segments().iter().map(ChainDump::short_id).collect();
        assert!(ids[0].starts_with("x|r#"));
        assert!(ids[1].starts_with("m|l#"));
    }

    #[test]
    fn test_symbols() {
        assert_eq!(symbol(Some(' ')), SPACE_SYMBOL);
        assert_eq!(symbol(Some('\n')), RETURN_SYMBOL);
        assert_eq!(symbol(None), EMPTY_SYMBOL);
        assert_eq!(symbol(Some('a')), "a");
    }

    #[test]
    fn test_pad_respects_display_width() {
        assert_eq!(pad("a", 3), "a  ");
        assert_eq!(pad("大", 3), "大 ");
        assert_eq!(pad("long", 2), "long");
    }

    #[test]
    fn test_dump_lists_every_segment() {
        let mut doc = Document::new("Hello world");
        doc.insert(5, ",").unwrap();
        let dump = ChainDump::new(&doc).to_string();

        assert!(dump.contains("+|,#"));
        assert!(dump.contains("H  e  l  l  o"));
        assert!(dump.ends_with("3 segments, 12 visible / 12 raw chars"));
    }

    #[test]
    fn test_position_rows_are_hex() {
        let doc = Document::new("abcdefghijkl");
        let dump = ChainDump::new(&doc).to_string();
        let rows: Vec<&str> = dump.lines().collect();

        // 原文1行 + オフセット・ページ・位置
        assert_eq!(rows.len(), 5);
        assert!(rows[1].trim_end().ends_with("a  b"));
        assert!(rows[2].trim().chars().all(|ch| ch == '0' || ch == ' '));
        assert!(rows[3].trim_end().ends_with("a  b"));
    }

    #[test]
    fn test_compact_dump_omits_offsets() {
        let doc = Document::new("ab");
        let dump = ChainDump::with_options(&doc, DumpOptions::compact()).to_string();
        assert_eq!(dump.lines().count(), 2);
    }
}
