//! 位置インデックス
//!
//! 可視オフセットから (セグメント, セグメント内位置, ページ) への対応表。
//! チェーンの構造が変わるたびに作り直される派生データ

use super::Result;
use crate::error::ChainError;
use super::segment::{Segment, SegmentId};

/// 可視オフセット1つ分の解決結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocationRecord {
    /// ドキュメント全体での可視オフセット
    pub offset: usize,
    /// ページ番号
    pub page: usize,
    /// セグメント内の位置
    pub inset: usize,
    /// チェーン上のセグメント位置
    pub segment: usize,
    /// セグメントID
    pub segment_id: SegmentId,
    /// セグメントの可視文字数
    pub segment_len: usize,
    /// セグメントの保持文字数
    pub segment_raw_len: usize,
}

impl LocationRecord {
    /// 可視文字を持たないセグメントの境界レコードか判定
    pub fn is_boundary(&self) -> bool {
        self.segment_len == 0
    }
}

/// チェーン全体の位置インデックス
#[derive(Debug, Clone, Default)]
pub struct LocationIndex {
    /// オフセット昇順（同一オフセットはチェーン順）
    records: Vec<LocationRecord>,
    /// 各ページ先頭レコードのオフセット
    page_offsets: Vec<usize>,
    visible_len: usize,
}

impl LocationIndex {
    /// チェーンを1回走査してインデックスを構築
    pub fn build(chain: &[Segment]) -> Self {
        let mut records = Vec::with_capacity(chain.iter().map(|s| s.visible_len().max(1)).sum());
        let mut page_offsets = Vec::new();
        let mut offset = 0;
        let mut page = 0;

        for (segment, entry) in chain.iter().enumerate() {
            let segment_len = entry.visible_len();
            let record = |offset, inset| LocationRecord {
                offset,
                page,
                inset,
                segment,
                segment_id: entry.id(),
                segment_len,
                segment_raw_len: entry.raw_len(),
            };

            if page_offsets.len() == page {
                page_offsets.push(offset);
            }

            if segment_len == 0 {
                records.push(record(offset, 0));
                continue;
            }

            for inset in 0..segment_len {
                records.push(record(offset, inset));
                offset += 1;
            }
            page += 1;
        }

        log::trace!(
            "location index rebuilt: {} records, {} pages, {} visible chars",
            records.len(),
            page_offsets.len(),
            offset
        );

        Self {
            records,
            page_offsets,
            visible_len: offset,
        }
    }

    /// 全レコード
    pub fn records(&self) -> &[LocationRecord] {
        &self.records
    }

    /// レコードを持つページ数
    pub fn page_count(&self) -> usize {
        self.page_offsets.len()
    }

    /// 可視文字数
    pub fn visible_len(&self) -> usize {
        self.visible_len
    }

    /// ページ先頭のオフセット
    pub fn page_offset(&self, page: usize) -> Option<usize> {
        self.page_offsets.get(page).copied()
    }

    /// ページ相対のオフセットを絶対オフセットに変換
    ///
    /// 可視文字数と等しいオフセット（末尾）も受け付ける
    pub fn resolve(&self, offset: usize, from_page: usize) -> Result<usize> {
        let out_of_range = || ChainError::OutOfRange {
            offset,
            page: from_page,
            len: self.visible_len,
        };

        let base = self.page_offset(from_page).ok_or_else(out_of_range)?;
        let absolute = base.checked_add(offset).ok_or_else(out_of_range)?;
        if absolute > self.visible_len {
            return Err(out_of_range());
        }
        Ok(absolute)
    }

    /// オフセットに対応するすべてのレコードを返す
    ///
    /// セグメント内位置の昇順、次に可視文字数の昇順（境界レコードが先）
    pub fn locate(&self, offset: usize, from_page: usize) -> Result<Vec<LocationRecord>> {
        let absolute = self.resolve(offset, from_page)?;
        if absolute >= self.visible_len {
            return Err(ChainError::OutOfRange {
                offset,
                page: from_page,
                len: self.visible_len,
            });
        }

        let first = self.records.partition_point(|r| r.offset < absolute);
        let last = self.records.partition_point(|r| r.offset <= absolute);
        let mut found = self.records[first..last].to_vec();
        found.sort_by_key(|r| (r.inset, r.segment_len, r.segment_raw_len, r.segment));
        Ok(found)
    }

    /// ページ上でセグメント内位置0のレコード
    pub fn page_heads(&self, page: usize) -> impl Iterator<Item = &LocationRecord> {
        self.records
            .iter()
            .filter(move |r| r.page == page && r.inset == 0)
    }

    /// ページ範囲に属するセグメントのチェーン上の範囲
    pub fn segment_span(&self, start_page: usize, end_page: usize) -> Option<(usize, usize)> {
        let mut span: Option<(usize, usize)> = None;
        for record in self
            .records
            .iter()
            .filter(|r| (start_page..=end_page).contains(&r.page))
        {
            span = Some(match span {
                Some((lo, hi)) => (lo.min(record.segment), hi.max(record.segment)),
                None => (record.segment, record.segment),
            });
        }
        span
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::cell::Cell;

    fn chain() -> Vec<Segment> {
        vec![
            Segment::original(SegmentId(0), Cell::from_text("rea")),
            Segment::deleted(SegmentId(1), Cell::from_text("l"), false),
            Segment::original(SegmentId(2), Cell::from_text("ms")),
        ]
    }

    #[test]
    fn test_boundary_record_does_not_advance_page() {
        let index = LocationIndex::build(&chain());

        assert_eq!(index.visible_len(), 5);
        assert_eq!(index.page_count(), 2);
        // 3 + 境界1 + 2
        assert_eq!(index.records().len(), 6);

        let boundary = index.records()[3];
        assert!(boundary.is_boundary());
        assert_eq!(boundary.offset, 3);
        assert_eq!(boundary.page, 1);
    }

    #[test]
    fn test_locate_orders_boundary_first() {
        let index = LocationIndex::build(&chain());
        let found = index.locate(3, 0).unwrap();

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].segment, 1);
        assert!(found[0].is_boundary());
        assert_eq!(found[1].segment, 2);
        assert_eq!(found[1].inset, 0);
    }

    #[test]
    fn test_locate_relative_to_page() {
        let index = LocationIndex::build(&chain());
        let found = index.locate(1, 1).unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].offset, 4);
        assert_eq!(found[0].inset, 1);
    }

    #[test]
    fn test_locate_out_of_range() {
        let index = LocationIndex::build(&chain());

        assert!(index.locate(5, 0).unwrap_err().is_out_of_range());
        assert!(index.locate(0, 2).unwrap_err().is_out_of_range());
        assert!(index.locate(2, 1).unwrap_err().is_out_of_range());
    }

    #[test]
    fn test_resolve_accepts_end_of_text() {
        let index = LocationIndex::build(&chain());
        assert_eq!(index.resolve(5, 0).unwrap(), 5);
        assert_eq!(index.resolve(2, 1).unwrap(), 5);
        assert!(index.resolve(6, 0).is_err());
    }

    #[test]
    fn test_empty_chain_has_single_boundary() {
        let index = LocationIndex::build(&[Segment::original(SegmentId(0), Vec::new())]);
        assert_eq!(index.visible_len(), 0);
        assert_eq!(index.page_count(), 1);
        assert_eq!(index.records().len(), 1);
        assert!(index.locate(0, 0).is_err());
    }

    #[test]
    fn test_segment_span_covers_boundaries() {
        let index = LocationIndex::build(&chain());
        assert_eq!(index.segment_span(0, 0), Some((0, 0)));
        assert_eq!(index.segment_span(1, 1), Some((1, 2)));
        assert_eq!(index.segment_span(0, 1), Some((0, 2)));
        assert_eq!(index.segment_span(5, 6), None);
    }
}
