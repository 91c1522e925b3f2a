//! セグメント実装
//!
//! 原文・挿入・削除の3種類のセル列。チェーン全体のことは知らない

use super::cell::{Cell, TagId};
use std::fmt;

/// セグメントの一意識別子（ドキュメント内で単調増加）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SegmentId(pub u64);

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:x}", self.0)
    }
}

/// セグメントの種類（状態を含まない）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    /// 原文
    Original,
    /// 挿入
    Inserted,
    /// 削除
    Deleted,
}

/// チェーンを構成するセル列
///
/// * `Original` は常に可視
/// * `Inserted` は `withdrawn` が真の間だけ不可視
/// * `Deleted` は `restored` が真の間だけ可視
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// 原文（またはマージ結果）
    Original { id: SegmentId, cells: Vec<Cell> },
    /// 編集で追加されたテキスト
    Inserted {
        id: SegmentId,
        cells: Vec<Cell>,
        withdrawn: bool,
    },
    /// 編集で削除されたテキスト（復元可能）
    Deleted {
        id: SegmentId,
        cells: Vec<Cell>,
        restored: bool,
    },
}

impl Segment {
    /// 原文セグメントを作成
    pub fn original(id: SegmentId, cells: Vec<Cell>) -> Self {
        Segment::Original { id, cells }
    }

    /// 挿入セグメントを作成
    pub fn inserted(id: SegmentId, cells: Vec<Cell>, withdrawn: bool) -> Self {
        Segment::Inserted { id, cells, withdrawn }
    }

    /// 削除セグメントを作成
    pub fn deleted(id: SegmentId, cells: Vec<Cell>, restored: bool) -> Self {
        Segment::Deleted { id, cells, restored }
    }

    pub fn id(&self) -> SegmentId {
        match self {
            Segment::Original { id, .. }
            | Segment::Inserted { id, .. }
            | Segment::Deleted { id, .. } => *id,
        }
    }

    pub fn kind(&self) -> SegmentKind {
        match self {
            Segment::Original { .. } => SegmentKind::Original,
            Segment::Inserted { .. } => SegmentKind::Inserted,
            Segment::Deleted { .. } => SegmentKind::Deleted,
        }
    }

    pub fn is_original(&self) -> bool {
        matches!(self, Segment::Original { .. })
    }

    /// 取り下げ済みの挿入か判定
    pub fn is_withdrawn(&self) -> bool {
        matches!(self, Segment::Inserted { withdrawn: true, .. })
    }

    /// 復元済みの削除か判定
    pub fn is_restored(&self) -> bool {
        matches!(self, Segment::Deleted { restored: true, .. })
    }

    /// 可視状態か判定
    pub fn is_visible(&self) -> bool {
        match self {
            Segment::Original { .. } => true,
            Segment::Inserted { withdrawn, .. } => !withdrawn,
            Segment::Deleted { restored, .. } => *restored,
        }
    }

    /// 保持しているすべてのセル（可視状態に関係なく）
    pub fn cells(&self) -> &[Cell] {
        match self {
            Segment::Original { cells, .. }
            | Segment::Inserted { cells, .. }
            | Segment::Deleted { cells, .. } => cells,
        }
    }

    fn cells_mut(&mut self) -> &mut Vec<Cell> {
        match self {
            Segment::Original { cells, .. }
            | Segment::Inserted { cells, .. }
            | Segment::Deleted { cells, .. } => cells,
        }
    }

    /// 可視セル（不可視なら空スライス）
    pub fn visible_cells(&self) -> &[Cell] {
        if self.is_visible() {
            self.cells()
        } else {
            &[]
        }
    }

    /// 保持している文字数
    pub fn raw_len(&self) -> usize {
        self.cells().len()
    }

    /// 可視文字数（0 または raw_len）
    pub fn visible_len(&self) -> usize {
        self.visible_cells().len()
    }

    /// 可視座標でセルを取得
    ///
    /// 範囲外や不可視の場合は空白（`None`）を返し、失敗はしない
    pub fn cell_at(&self, index: usize) -> Option<&Cell> {
        self.visible_cells().get(index)
    }

    /// 可視テキスト
    pub fn text(&self) -> String {
        self.visible_cells().iter().map(|cell| cell.ch).collect()
    }

    /// 保持しているテキスト（可視状態に関係なく）
    pub fn raw_text(&self) -> String {
        self.cells().iter().map(|cell| cell.ch).collect()
    }

    /// `[start, end)` のセルにタグを付与
    ///
    /// 不可視の削除セグメントでは保持中の全セルに付与し、
    /// 取り下げ済みの挿入セグメントでは何もしない
    pub fn tag_range(&mut self, tag: TagId, start: usize, end: usize) {
        let (start, end) = match self {
            Segment::Deleted { restored: false, cells, .. } => (0, cells.len()),
            Segment::Inserted { withdrawn: true, .. } => return,
            _ => {
                let len = self.raw_len();
                (start.min(len), end.min(len))
            }
        };

        if start >= end {
            return;
        }

        for cell in &mut self.cells_mut()[start..end] {
            cell.tag(tag);
        }
    }

    /// 1セルにタグを付与
    pub fn tag_at(&mut self, tag: TagId, inset: usize) {
        self.tag_range(tag, inset, inset + 1);
    }

    /// `at` の位置で分割し、後半を同種・同状態の新しいセグメントとして返す
    ///
    /// `at` が末尾以降なら何もせず `None`
    pub fn split_off(&mut self, at: usize, tail_id: SegmentId) -> Option<Segment> {
        if at >= self.raw_len() {
            return None;
        }

        let tail = self.cells_mut().split_off(at);
        Some(match self {
            Segment::Original { .. } => Segment::original(tail_id, tail),
            Segment::Inserted { withdrawn, .. } => Segment::inserted(tail_id, tail, *withdrawn),
            Segment::Deleted { restored, .. } => Segment::deleted(tail_id, tail, *restored),
        })
    }

    /// 先頭 `limit` セル内の改行数
    pub fn count_newlines(&self, limit: usize) -> usize {
        self.cells()
            .iter()
            .take(limit)
            .filter(|cell| cell.ch == '\n')
            .count()
    }

    /// セル列を取り出す
    pub(crate) fn into_cells(self) -> Vec<Cell> {
        match self {
            Segment::Original { cells, .. }
            | Segment::Inserted { cells, .. }
            | Segment::Deleted { cells, .. } => cells,
        }
    }

    /// 可視状態を設定し、変化したかを返す
    ///
    /// 原文セグメントは常に可視なので変化しない
    pub(crate) fn set_visible(&mut self, visible: bool) -> bool {
        match self {
            Segment::Original { .. } => false,
            Segment::Inserted { withdrawn, .. } => {
                let changed = *withdrawn == visible;
                *withdrawn = !visible;
                changed
            }
            Segment::Deleted { restored, .. } => {
                let changed = *restored != visible;
                *restored = visible;
                changed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn original(text: &str) -> Segment {
        Segment::original(SegmentId(0), Cell::from_text(text))
    }

    #[test]
    fn test_split_off_keeps_head_in_place() {
        let mut segment = original("abcdef");
        let tail = segment.split_off(2, SegmentId(1)).unwrap();

        assert_eq!(segment.text(), "ab");
        assert_eq!(tail.text(), "cdef");
        assert_eq!(tail.id(), SegmentId(1));
        assert_eq!(tail.kind(), SegmentKind::Original);
    }

    #[test]
    fn test_split_off_at_end_returns_none() {
        let mut segment = original("abc");
        assert!(segment.split_off(3, SegmentId(1)).is_none());
        assert!(segment.split_off(10, SegmentId(1)).is_none());
        assert_eq!(segment.text(), "abc");
    }

    #[test]
    fn test_split_off_preserves_variant_state() {
        let mut segment = Segment::inserted(SegmentId(0), Cell::from_text("xyz"), true);
        let tail = segment.split_off(1, SegmentId(1)).unwrap();
        assert!(tail.is_withdrawn());
        assert_eq!(tail.raw_text(), "yz");
    }

    #[test]
    fn test_withdrawn_insert_has_zero_visible_length() {
        let mut segment = Segment::inserted(SegmentId(0), Cell::from_text("new"), false);
        assert_eq!(segment.visible_len(), 3);

        assert!(segment.set_visible(false));
        assert_eq!(segment.visible_len(), 0);
        assert_eq!(segment.raw_len(), 3);
        assert_eq!(segment.text(), "");
        assert!(segment.cell_at(0).is_none());

        assert!(!segment.set_visible(false));
    }

    #[test]
    fn test_deleted_segment_restores() {
        let mut segment = Segment::deleted(SegmentId(0), Cell::from_text("rea"), false);
        assert_eq!(segment.visible_len(), 0);

        assert!(segment.set_visible(true));
        assert_eq!(segment.visible_len(), 3);
        assert_eq!(segment.text(), "rea");
    }

    #[test]
    fn test_original_ignores_visibility_toggle() {
        let mut segment = original("abc");
        assert!(!segment.set_visible(false));
        assert_eq!(segment.visible_len(), 3);
    }

    #[test]
    fn test_cell_at_out_of_bounds_is_blank() {
        let segment = original("ab");
        assert_eq!(segment.cell_at(1).map(|cell| cell.ch), Some('b'));
        assert!(segment.cell_at(2).is_none());
    }

    #[test]
    fn test_tag_range_clamps_to_bounds() {
        let mut segment = original("abcd");
        segment.tag_range(TagId(7), 2, 99);

        let tagged: String = segment
            .cells()
            .iter()
            .filter(|cell| cell.has_tag(TagId(7)))
            .map(|cell| cell.ch)
            .collect();
        assert_eq!(tagged, "cd");
    }

    #[test]
    fn test_hidden_deleted_segment_tags_every_cell() {
        let mut segment = Segment::deleted(SegmentId(0), Cell::from_text("gone"), false);
        segment.tag_at(TagId(1), 0);
        assert!(segment.cells().iter().all(|cell| cell.has_tag(TagId(1))));
    }

    #[test]
    fn test_withdrawn_insert_is_never_tagged() {
        let mut segment = Segment::inserted(SegmentId(0), Cell::from_text("gone"), true);
        segment.tag_range(TagId(1), 0, 4);
        assert!(segment.cells().iter().all(|cell| cell.tags.is_empty()));
    }

    #[test]
    fn test_count_newlines_respects_limit() {
        let segment = original("a\nb\nc\n");
        assert_eq!(segment.count_newlines(0), 0);
        assert_eq!(segment.count_newlines(2), 1);
        assert_eq!(segment.count_newlines(4), 2);
        assert_eq!(segment.count_newlines(100), 3);
    }
}
