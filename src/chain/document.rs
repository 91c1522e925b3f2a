//! ドキュメント（セグメントチェーン）
//!
//! 原文は直接書き換えず、編集をセグメントとしてチェーンに積み重ねる。
//! 各編集は履歴を失わずに個別に表示・非表示を切り替えられる

use std::cell::OnceCell;
use std::fmt;
use std::iter::FusedIterator;

use regex::Regex;

use super::cell::{Cell, TagId};
use super::index::{LocationIndex, LocationRecord};
use super::segment::{Segment, SegmentId, SegmentKind};
use super::Result;
use crate::config::SearchOptions;
use crate::error::ChainError;
use crate::scan::{DelimitedRange, Delimiter, RangeScanner};

/// 検索結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    /// マッチ開始位置のページ
    pub page: usize,
    /// マッチ開始位置のセグメント内位置
    pub inset: usize,
    /// マッチ開始位置の絶対オフセット
    pub offset: usize,
    /// キャプチャグループ（0番はマッチ全体）
    pub groups: Vec<Option<String>>,
}

/// 区切り範囲の抽出結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// 抽出前のテキスト上での範囲
    pub range: DelimitedRange,
    /// 区切りを含む内容
    pub content: String,
    /// 区切りを除いた内容
    pub inner: String,
    /// 範囲開始位置の行番号（1-based）
    pub line: usize,
}

/// セグメントチェーンで表現された編集可能テキスト
#[derive(Debug, Clone)]
pub struct Document {
    /// セグメントチェーン（空にはならない）
    chain: Vec<Segment>,
    /// 次に割り当てるセグメントID
    next_id: u64,
    /// 位置インデックスのキャッシュ（構造変更で破棄）
    index: OnceCell<LocationIndex>,
}

impl Document {
    /// 1つの原文セグメントからなるドキュメントを作成
    pub fn new(text: &str) -> Self {
        Self {
            chain: vec![Segment::original(SegmentId(0), Cell::from_text(text))],
            next_id: 1,
            index: OnceCell::new(),
        }
    }

    fn allocate_id(&mut self) -> SegmentId {
        let id = SegmentId(self.next_id);
        self.next_id += 1;
        id
    }

    fn index(&self) -> &LocationIndex {
        self.index.get_or_init(|| LocationIndex::build(&self.chain))
    }

    fn invalidate(&mut self) {
        self.index.take();
    }
}

// ========== 基本クエリ ==========

impl Document {
    /// セグメントチェーン
    pub fn segments(&self) -> &[Segment] {
        &self.chain
    }

    /// チェーン上の位置でセグメントを取得
    pub fn segment(&self, index: usize) -> Option<&Segment> {
        self.chain.get(index)
    }

    /// セグメントIDのチェーン上の位置
    pub fn position_of(&self, id: SegmentId) -> Option<usize> {
        self.chain.iter().position(|segment| segment.id() == id)
    }

    /// 可視文字数
    pub fn visible_len(&self) -> usize {
        self.chain.iter().map(Segment::visible_len).sum()
    }

    /// 保持している総文字数
    pub fn raw_len(&self) -> usize {
        self.chain.iter().map(Segment::raw_len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.visible_len() == 0
    }

    /// レコードを持つページ数
    pub fn page_count(&self) -> usize {
        self.index().page_count()
    }

    /// 現在の位置インデックス（必要なら再構築）
    pub fn location_index(&self) -> &LocationIndex {
        self.index()
    }

    /// オフセットに対応するすべての位置レコード
    pub fn locate(&self, offset: usize, from_page: usize) -> Result<Vec<LocationRecord>> {
        self.index().locate(offset, from_page)
    }

    /// ページの先頭を含むセグメント（削除、挿入、原文の順）
    pub fn page(&self, page: usize) -> Vec<&Segment> {
        let mut segments: Vec<&Segment> = self
            .index()
            .page_heads(page)
            .map(|record| &self.chain[record.segment])
            .collect();
        segments.sort_by_key(|segment| match segment.kind() {
            SegmentKind::Deleted => 0,
            SegmentKind::Inserted => 1,
            SegmentKind::Original => 2,
        });
        segments
    }
}

// ========== テキスト取得 ==========

impl Document {
    /// 指定位置から末尾までのセルを遅延列挙
    ///
    /// `from_page` が0以外の場合、オフセットはそのページ先頭からの相対位置
    pub fn materialize(&self, from_offset: usize, from_page: usize) -> Result<Cells<'_>> {
        let index = self.index();
        let start = index.resolve(from_offset, from_page)?;
        if start == index.visible_len() {
            return Ok(Cells::new(&self.chain, self.chain.len(), 0));
        }

        let records = index.locate(start, 0)?;
        let first = records
            .first()
            .ok_or(ChainError::NoVisibleTarget { offset: start })?;
        Ok(Cells::new(&self.chain, first.segment, first.inset))
    }

    /// 先頭からのセル列
    pub fn cells(&self) -> Cells<'_> {
        Cells::new(&self.chain, 0, 0)
    }

    /// 可視テキスト全体
    pub fn text(&self) -> String {
        self.cells().map(|cell| cell.ch).collect()
    }

    /// タグ付きの文字だけを連結して返す
    pub fn filter_by_tag(&self, tag: TagId) -> String {
        self.cells()
            .filter(|cell| cell.has_tag(tag))
            .map(|cell| cell.ch)
            .collect()
    }

    /// 指定位置以降で最初のマッチを検索
    ///
    /// マッチしない場合は `None`
    pub fn search(
        &self,
        pattern: &Regex,
        from_offset: usize,
        from_page: usize,
    ) -> Result<Option<SearchHit>> {
        let start = self.index().resolve(from_offset, from_page)?;
        let haystack: String = self
            .materialize(from_offset, from_page)?
            .map(|cell| cell.ch)
            .collect();

        let Some(captures) = pattern.captures(&haystack) else {
            return Ok(None);
        };
        let match_start = captures.get(0).map_or(0, |m| m.start());
        let offset = start + haystack[..match_start].chars().count();

        let (page, inset) = if offset < self.index().visible_len() {
            let records = self.index().locate(offset, 0)?;
            let first = records.first().ok_or(ChainError::NoVisibleTarget { offset })?;
            (first.page, first.inset)
        } else {
            // 末尾の空マッチ
            (self.index().page_count(), 0)
        };

        let groups = captures
            .iter()
            .map(|group| group.map(|m| m.as_str().to_string()))
            .collect();

        Ok(Some(SearchHit {
            page,
            inset,
            offset,
            groups,
        }))
    }

    /// パターン文字列で先頭から検索
    pub fn find(&self, pattern: &str, options: &SearchOptions) -> crate::Result<Option<SearchHit>> {
        let regex = options.build(pattern)?;
        Ok(self.search(&regex, 0, 0)?)
    }

    /// オフセット位置の行番号（1-based）
    ///
    /// 原文と削除セグメントを保持文字数で数える。削除が復元されていなくても
    /// その文字数を差し引くため、可視テキストの行番号とずれることがある
    pub fn line_number_at(&self, offset: usize) -> usize {
        let mut budget = offset;
        let mut line = 1;

        for segment in &self.chain {
            if segment.kind() == SegmentKind::Inserted {
                continue;
            }
            if budget == 0 {
                break;
            }
            line += segment.count_newlines(budget);
            budget = budget.saturating_sub(segment.raw_len());
        }

        line
    }
}

// ========== 構造操作 ==========

impl Document {
    /// オフセット位置でセグメントを分割し、その位置から始まるセグメントの位置を返す
    ///
    /// 可視文字数と等しいオフセットではチェーン末尾の次の位置を返す
    pub fn split(&mut self, offset: usize) -> Result<usize> {
        let index = self.index();
        if offset == index.visible_len() {
            return Ok(self.chain.len());
        }

        let target = index
            .locate(offset, 0)?
            .into_iter()
            .find(|record| record.segment_len > 0)
            .ok_or(ChainError::NoVisibleTarget { offset })?;

        if target.inset == 0 {
            return Ok(target.segment);
        }

        let tail_id = self.allocate_id();
        match self.chain[target.segment].split_off(target.inset, tail_id) {
            Some(tail) => {
                self.chain.insert(target.segment + 1, tail);
                self.invalidate();
                log::debug!(
                    "split segment {} at inset {} (offset {})",
                    target.segment_id,
                    target.inset,
                    offset
                );
                Ok(target.segment + 1)
            }
            None => Ok(target.segment),
        }
    }

    /// オフセット位置にテキストを挿入
    ///
    /// 挿入先の位置にあるセグメントが取り下げ済みなら、新しいセグメントも取り下げ状態で作成
    pub fn insert(&mut self, offset: usize, text: &str) -> Result<(usize, SegmentId)> {
        let slot = self.split(offset)?;
        let withdrawn = self.chain.get(slot).is_some_and(Segment::is_withdrawn);

        let id = self.allocate_id();
        self.chain
            .insert(slot, Segment::inserted(id, Cell::from_text(text), withdrawn));
        self.invalidate();

        log::debug!(
            "inserted segment {} ({} chars) at offset {} slot {}",
            id,
            text.chars().count(),
            offset,
            slot
        );
        Ok((slot + 1, id))
    }

    /// オフセット位置から `count` 文字を削除セグメントに置き換える
    ///
    /// 複数ページにまたがる場合、対象がすべて原文なら先にマージする。
    /// マージはページ単位で判定するため、削除範囲の外でも同じページに
    /// 不可視の編集セグメントがあれば `NestedEditUnsupported` になる
    pub fn delete(&mut self, offset: usize, count: usize) -> Result<(usize, SegmentId)> {
        let index = self.index();
        let len = index.visible_len();
        if offset >= len || count > len - offset {
            return Err(ChainError::OutOfRange {
                offset: offset.saturating_add(count),
                page: 0,
                len,
            });
        }

        let last = offset + count.saturating_sub(1);
        let first_page = Self::page_of(index, offset)?;
        let last_page = Self::page_of(index, last)?;

        if first_page != last_page {
            self.merge_pages(first_page, last_page).map_err(|error| match error {
                ChainError::NestedEditUnsupported { .. } => ChainError::NestedEditUnsupported {
                    start: offset,
                    end: offset + count,
                },
                other => other,
            })?;
        }

        let slot = self.split(offset)?;
        let mut target = self.chain.remove(slot);
        let remainder_id = self.allocate_id();
        let remainder = target.split_off(count, remainder_id);

        let id = self.allocate_id();
        self.chain
            .insert(slot, Segment::deleted(id, target.into_cells(), false));
        if let Some(remainder) = remainder {
            self.chain.insert(slot + 1, remainder);
        }
        self.invalidate();

        log::debug!("deleted {} chars at offset {} into segment {}", count, offset, id);
        Ok((slot, id))
    }

    /// ページ範囲のセグメントを1つの原文セグメントに統合
    ///
    /// 範囲内に原文以外のセグメントがあれば失敗する
    pub fn merge_pages(&mut self, start_page: usize, end_page: usize) -> Result<(usize, SegmentId)> {
        let index = self.index();
        let len = index.visible_len();
        let out_of_range = ChainError::OutOfRange {
            offset: 0,
            page: end_page,
            len,
        };

        if start_page > end_page || end_page >= index.page_count() {
            return Err(out_of_range);
        }
        let (first, last) = index
            .segment_span(start_page, end_page)
            .ok_or(out_of_range)?;

        if self.chain[first..=last].iter().any(|segment| !segment.is_original()) {
            let start = index.page_offset(start_page).unwrap_or(0);
            let end = index.page_offset(end_page + 1).unwrap_or(len);
            log::warn!(
                "refusing to merge pages {}..={}: range [{:#x}->{:#x}] contains an edit",
                start_page,
                end_page,
                start,
                end
            );
            return Err(ChainError::NestedEditUnsupported { start, end });
        }

        let cells: Vec<Cell> = self
            .chain
            .drain(first..=last)
            .flat_map(Segment::into_cells)
            .collect();
        let id = self.allocate_id();
        self.chain.insert(first, Segment::original(id, cells));
        self.invalidate();

        log::debug!(
            "merged pages {}..={} (segments {}..={}) into segment {}",
            start_page,
            end_page,
            first,
            last,
            id
        );
        Ok((first, id))
    }

    /// チェーン上の位置でセグメントの可視状態を設定し、変化したかを返す
    pub fn set_segment_visibility(&mut self, index: usize, visible: bool) -> Result<bool> {
        let segment = self
            .chain
            .get_mut(index)
            .ok_or(ChainError::NoSuchSegment { index })?;
        let id = segment.id();
        let changed = segment.set_visible(visible);

        if changed {
            self.invalidate();
            log::debug!("segment {} visibility set to {}", id, visible);
        }
        Ok(changed)
    }

    /// セグメントIDで可視状態を設定
    pub fn set_visibility(&mut self, id: SegmentId, visible: bool) -> Result<bool> {
        let index = self
            .position_of(id)
            .ok_or(ChainError::UnknownSegment { id })?;
        self.set_segment_visibility(index, visible)
    }

    /// `[start, end)` の可視文字にタグを付与
    ///
    /// 同じオフセットに複数の候補があればすべてに付与する
    pub fn tag(&mut self, start: usize, end: usize, tag: TagId) -> Result<()> {
        let len = self.visible_len();
        if start > end || end > len {
            return Err(ChainError::OutOfRange {
                offset: end,
                page: 0,
                len,
            });
        }

        for offset in start..end {
            let records = self.index().locate(offset, 0)?;
            for record in records {
                self.chain[record.segment].tag_at(tag, record.inset);
            }
        }
        Ok(())
    }

    /// 区切り範囲をすべて削除し、その内容を返す
    ///
    /// 後ろの範囲から処理するため、結果は文書順の逆になる。
    /// 途中で失敗した場合はチェーンを呼び出し前の状態に戻す
    pub fn extract_delimited(&mut self, entry: &Delimiter, exit: &Delimiter) -> Result<Vec<Extraction>> {
        let ranges = RangeScanner::new(self.text()).scan(entry, exit);
        let snapshot = self.chain.clone();

        let mut extracted = Vec::with_capacity(ranges.len());
        for range in ranges.into_iter().rev() {
            match self.extract_range(range) {
                Ok(extraction) => extracted.push(extraction),
                Err(error) => {
                    self.chain = snapshot;
                    self.invalidate();
                    return Err(error);
                }
            }
        }

        log::debug!("extracted {} delimited ranges", extracted.len());
        Ok(extracted)
    }

    fn extract_range(&mut self, range: DelimitedRange) -> Result<Extraction> {
        let count = range.len();
        let content: String = self
            .materialize(range.start, 0)?
            .take(count)
            .map(|cell| cell.ch)
            .collect();
        let inner = content
            .chars()
            .skip(range.inner_start - range.start)
            .take(range.inner().len())
            .collect();
        let line = self.line_number_at(range.start);

        self.delete(range.start, count)?;

        Ok(Extraction {
            range,
            content,
            inner,
            line,
        })
    }

    fn page_of(index: &LocationIndex, offset: usize) -> Result<usize> {
        index
            .locate(offset, 0)?
            .first()
            .map(|record| record.page)
            .ok_or(ChainError::NoVisibleTarget { offset })
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new("")
    }
}

impl From<&str> for Document {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for cell in self.cells() {
            write!(f, "{}", cell.ch)?;
        }
        Ok(())
    }
}

/// チェーン上の可視セルを順に返すイテレータ
///
/// `Clone` で同じ位置から何度でも再開できる
#[derive(Debug, Clone)]
pub struct Cells<'a> {
    chain: &'a [Segment],
    segment: usize,
    inset: usize,
}

impl<'a> Cells<'a> {
    fn new(chain: &'a [Segment], segment: usize, inset: usize) -> Self {
        Self {
            chain,
            segment,
            inset,
        }
    }
}

impl<'a> Iterator for Cells<'a> {
    type Item = &'a Cell;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(segment) = self.chain.get(self.segment) {
            if let Some(cell) = segment.cell_at(self.inset) {
                self.inset += 1;
                return Some(cell);
            }
            self.segment += 1;
            self.inset = 0;
        }
        None
    }
}

impl FusedIterator for Cells<'_> {}
