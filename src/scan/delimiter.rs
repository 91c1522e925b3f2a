//! 区切り指定（リテラルまたは正規表現）

use regex::Regex;

use crate::error::Result;

/// 範囲の開始・終了を示す区切り
#[derive(Debug, Clone)]
pub enum Delimiter {
    /// 文字列そのもの
    Literal(Vec<char>),
    /// 正規表現（開始位置・終了位置に固定して照合する）
    Pattern {
        source: String,
        ahead: Regex,
        behind: Regex,
    },
}

impl Delimiter {
    pub fn literal(text: &str) -> Self {
        Delimiter::Literal(text.chars().collect())
    }

    /// 正規表現の区切りを作成
    pub fn pattern(source: &str) -> Result<Self> {
        Ok(Delimiter::Pattern {
            source: source.to_string(),
            ahead: Regex::new(&format!(r"\A(?:{})", source))?,
            behind: Regex::new(&format!(r"(?:{})\z", source))?,
        })
    }

    /// 区切りの表記
    pub fn source(&self) -> String {
        match self {
            Delimiter::Literal(chars) => chars.iter().collect(),
            Delimiter::Pattern { source, .. } => source.clone(),
        }
    }

    /// `pos` から始まる一致の文字数
    pub(crate) fn match_ahead(&self, chars: &[char], text: &str, bytes: &[usize], pos: usize) -> Option<usize> {
        match self {
            Delimiter::Literal(needle) => {
                let window = chars.get(pos..pos.checked_add(needle.len())?)?;
                (!needle.is_empty() && window == needle.as_slice()).then_some(needle.len())
            }
            Delimiter::Pattern { ahead, .. } => {
                let found = ahead.find(&text[bytes[pos]..])?;
                let len = found.as_str().chars().count();
                (len > 0).then_some(len)
            }
        }
    }

    /// `[floor, pos)` の範囲で `pos` に終わる一致の文字数
    pub(crate) fn match_behind(
        &self,
        chars: &[char],
        text: &str,
        bytes: &[usize],
        floor: usize,
        pos: usize,
    ) -> Option<usize> {
        match self {
            Delimiter::Literal(needle) => {
                let start = pos.checked_sub(needle.len())?;
                if needle.is_empty() || start < floor {
                    return None;
                }
                (chars[start..pos] == needle[..]).then_some(needle.len())
            }
            Delimiter::Pattern { behind, .. } => {
                let found = behind.find(&text[bytes[floor]..bytes[pos]])?;
                let len = found.as_str().chars().count();
                (len > 0).then_some(len)
            }
        }
    }
}

impl From<&str> for Delimiter {
    fn from(text: &str) -> Self {
        Delimiter::literal(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(text: &str) -> (Vec<char>, Vec<usize>) {
        let chars: Vec<char> = text.chars().collect();
        let mut bytes: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        bytes.push(text.len());
        (chars, bytes)
    }

    #[test]
    fn test_literal_ahead_and_behind() {
        let text = "a-->b";
        let (chars, bytes) = layout(text);
        let exit = Delimiter::literal("-->");

        assert_eq!(exit.match_ahead(&chars, text, &bytes, 1), Some(3));
        assert_eq!(exit.match_ahead(&chars, text, &bytes, 3), None);
        assert_eq!(exit.match_behind(&chars, text, &bytes, 0, 4), Some(3));
        assert_eq!(exit.match_behind(&chars, text, &bytes, 2, 4), None);
    }

    #[test]
    fn test_pattern_is_anchored() {
        let text = "xx[[yy";
        let (chars, bytes) = layout(text);
        let entry = Delimiter::pattern(r"\[+").unwrap();

        assert_eq!(entry.match_ahead(&chars, text, &bytes, 0), None);
        assert_eq!(entry.match_ahead(&chars, text, &bytes, 2), Some(2));
        assert_eq!(entry.match_behind(&chars, text, &bytes, 0, 4), Some(2));
        assert_eq!(entry.match_behind(&chars, text, &bytes, 0, 5), None);
    }

    #[test]
    fn test_zero_length_pattern_never_matches() {
        let text = "abc";
        let (chars, bytes) = layout(text);
        let entry = Delimiter::pattern("x*").unwrap();
        assert_eq!(entry.match_ahead(&chars, text, &bytes, 0), None);
    }

    #[test]
    fn test_pattern_handles_multibyte_text() {
        let text = "大変{なもの}";
        let (chars, bytes) = layout(text);
        let exit = Delimiter::pattern(r"\}").unwrap();
        assert_eq!(exit.match_behind(&chars, text, &bytes, 2, 7), Some(1));
        assert_eq!(exit.source(), r"\}");
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        assert!(Delimiter::pattern("(").is_err());
    }
}
