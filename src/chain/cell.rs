//! セル（文字とタグ集合）

use std::collections::BTreeSet;
use std::fmt;

/// セルに付与するタグの識別子
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TagId(pub u32);

impl From<u32> for TagId {
    fn from(value: u32) -> Self {
        TagId(value)
    }
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 1文字とそのタグ集合
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    /// 文字
    pub ch: char,
    /// 付与済みタグ
    pub tags: BTreeSet<TagId>,
}

impl Cell {
    /// タグなしのセルを作成
    pub fn new(ch: char) -> Self {
        Self {
            ch,
            tags: BTreeSet::new(),
        }
    }

    /// 文字列をセル列に変換
    pub fn from_text(text: &str) -> Vec<Cell> {
        text.chars().map(Cell::new).collect()
    }

    /// タグを付与
    pub fn tag(&mut self, tag: TagId) {
        self.tags.insert(tag);
    }

    /// タグを持っているか判定
    pub fn has_tag(&self, tag: TagId) -> bool {
        self.tags.contains(&tag)
    }
}

impl From<char> for Cell {
    fn from(ch: char) -> Self {
        Cell::new(ch)
    }
}
