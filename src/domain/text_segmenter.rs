//! 文本分割器
//!
//! 将规范化后的文档文本切分为长度受限的片段，供单次 TTS 调用使用。
//!
//! 分割策略：
//! 1. 按空行（`\n\n`）切分段落，去除首尾空白
//! 2. 段落长度不超过上限时整段输出
//! 3. 否则按句末标点（`.` `!` `?` 后跟空白）切句，再把句子用单个空格拼接，
//!    超过上限前输出当前缓冲；单个超长句子独立输出，不在词中间截断

use std::borrow::Cow;
use std::collections::VecDeque;

/// 默认最大字符数
pub const DEFAULT_MAX_CHARS: usize = 1500;

/// 允许配置的最大字符数下限
pub const MIN_MAX_CHARS: usize = 500;

/// 允许配置的最大字符数上限
pub const MAX_MAX_CHARS: usize = 3000;

/// 段落分隔符
const PARAGRAPH_BREAK: &str = "\n\n";

/// 文本分割配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentConfig {
    /// 单个片段的最大字符数
    pub max_chars: usize,
}

impl SegmentConfig {
    pub fn new(max_chars: usize) -> Self {
        Self {
            max_chars: max_chars.max(1),
        }
    }

    /// 是否处于可配置范围 [500, 3000]
    pub fn is_within_bounds(&self) -> bool {
        (MIN_MAX_CHARS..=MAX_MAX_CHARS).contains(&self.max_chars)
    }
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_MAX_CHARS,
        }
    }
}

#[inline]
fn is_sentence_terminator(ch: char) -> bool {
    matches!(ch, '.' | '!' | '?')
}

#[inline]
fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// 按句末标点切句
///
/// 只在 `.` `!` `?` 之后紧跟空白处切分，标点保留在前一句末尾
fn split_sentences(paragraph: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = paragraph.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        if !is_sentence_terminator(ch) {
            continue;
        }
        let end = idx + ch.len_utf8();
        match chars.peek() {
            Some((_, next)) if next.is_whitespace() => {
                let sentence = paragraph[start..end].trim();
                if !sentence.is_empty() {
                    sentences.push(sentence);
                }
                // 跳过连续空白
                while let Some((_, ws)) = chars.peek() {
                    if !ws.is_whitespace() {
                        break;
                    }
                    chars.next();
                }
                start = chars.peek().map_or(paragraph.len(), |(i, _)| *i);
            }
            _ => {}
        }
    }

    let tail = paragraph[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }

    sentences
}

/// 把超长段落的句子打包成不超过 `max_chars` 的片段
fn pack_sentences(paragraph: &str, max_chars: usize) -> Vec<String> {
    let mut packed = Vec::new();
    let mut buffer = String::new();
    let mut buffer_len = 0;

    for sentence in split_sentences(paragraph) {
        let sentence_len = char_len(sentence);
        let separator = usize::from(!buffer.is_empty());

        if buffer_len + separator + sentence_len > max_chars && !buffer.is_empty() {
            packed.push(std::mem::take(&mut buffer));
            buffer.push_str(sentence);
            buffer_len = sentence_len;
        } else {
            if separator == 1 {
                buffer.push(' ');
            }
            buffer.push_str(sentence);
            buffer_len += separator + sentence_len;
        }
    }

    if !buffer.is_empty() {
        packed.push(buffer);
    }

    packed
}

/// 片段迭代器
///
/// 惰性产生片段；`clone()` 得到一个从当前位置重新开始的独立迭代器
#[derive(Debug, Clone)]
pub struct Segments<'a> {
    paragraphs: std::str::Split<'a, &'static str>,
    pending: VecDeque<String>,
    max_chars: usize,
}

impl Iterator for Segments<'_> {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(segment) = self.pending.pop_front() {
                return Some(segment);
            }

            let paragraph = self.paragraphs.next()?.trim();
            if paragraph.is_empty() {
                continue;
            }

            if char_len(paragraph) <= self.max_chars {
                return Some(paragraph.to_string());
            }

            self.pending
                .extend(pack_sentences(paragraph, self.max_chars));
        }
    }
}

/// 对文本进行分段
///
/// 空文本或只含空白的文本产生空序列，由调用方决定如何处理
pub fn segment_text<'a>(text: &'a str, config: &SegmentConfig) -> Segments<'a> {
    Segments {
        paragraphs: text.split(PARAGRAPH_BREAK),
        pending: VecDeque::new(),
        max_chars: config.max_chars.max(1),
    }
}

/// 补全句末标点
///
/// 片段不以 `.` `!` `?` `:` 结尾时追加句号
pub fn with_sentence_terminator(segment: &str) -> Cow<'_, str> {
    let trimmed = segment.trim();
    if trimmed.ends_with(['.', '!', '?', ':']) {
        Cow::Borrowed(trimmed)
    } else {
        Cow::Owned(format!("{}.", trimmed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(text: &str, max_chars: usize) -> Vec<String> {
        segment_text(text, &SegmentConfig::new(max_chars)).collect()
    }

    #[test]
    fn test_empty_and_whitespace_input_yield_nothing() {
        assert!(collect("", 80).is_empty());
        assert!(collect("   \n\n  \t \n\n", 80).is_empty());
    }

    #[test]
    fn test_short_paragraphs_emitted_whole() {
        let segments = collect("First paragraph.\n\nSecond one here.", 80);
        assert_eq!(segments, vec!["First paragraph.", "Second one here."]);
    }

    #[test]
    fn test_reference_sentence_split() {
        let text = "Hello world. This is a test of the chunking system that should split into pieces.";
        let segments = collect(text, 80);

        assert!(segments.len() >= 2);
        assert_eq!(segments[0], "Hello world.");
        assert!(segments[1].starts_with("This is a test"));
        for seg in &segments {
            assert!(char_len(seg) <= 80 || split_sentences(seg).len() == 1);
        }
    }

    #[test]
    fn test_sentences_accumulate_until_budget() {
        let text = "One two. Three four. Five six. Seven eight.";
        let segments = collect(text, 20);
        assert_eq!(segments, vec!["One two. Three four.", "Five six.", "Seven eight."]);
    }

    #[test]
    fn test_oversized_sentence_emitted_alone() {
        let long = "a".repeat(30);
        let text = format!("Hi. {} end. Bye.", long);
        let segments = collect(&text, 10);

        assert_eq!(segments[0], "Hi.");
        assert_eq!(segments[1], format!("{} end.", long));
        assert_eq!(segments[2], "Bye.");
    }

    #[test]
    fn test_no_mid_word_split() {
        let text = "Supercalifragilistic expialidocious words everywhere without any stop";
        let segments = collect(text, 10);
        assert_eq!(segments, vec![text.to_string()]);
    }

    #[test]
    fn test_segments_reconstitute_input() {
        let text = "Alpha beta. Gamma delta! Epsilon zeta? Eta theta.\n\nIota kappa.\n\nLambda mu nu. Xi omicron pi.";
        let segments = collect(text, 25);

        let joined = segments.join(" ");
        let expected = text.replace("\n\n", " ");
        assert_eq!(joined, expected);
    }

    #[test]
    fn test_length_bound_holds() {
        let text = "Short one. Another short sentence. A third, slightly longer sentence here. End.";
        for max in [15, 30, 45, 80] {
            for seg in collect(text, max) {
                assert!(
                    char_len(&seg) <= max || split_sentences(&seg).len() == 1,
                    "segment {:?} exceeds {}",
                    seg,
                    max
                );
            }
        }
    }

    #[test]
    fn test_split_only_after_whitespace() {
        let sentences = split_sentences("Version 1.5 is out. Really?Yes! ok");
        assert_eq!(sentences, vec!["Version 1.5 is out.", "Really?Yes!", "ok"]);
    }

    #[test]
    fn test_iterator_is_restartable() {
        let text = "One two. Three four. Five six.";
        let config = SegmentConfig::new(12);
        let first: Vec<String> = segment_text(text, &config).collect();
        let second: Vec<String> = segment_text(text, &config).collect();
        assert_eq!(first, second);

        let mut iter = segment_text(text, &config);
        let fork = iter.clone();
        iter.next();
        assert_eq!(fork.count(), first.len());
    }

    #[test]
    fn test_unicode_counted_by_chars() {
        let text = "Été déjà là. Où ça?";
        let segments = collect(text, 12);
        assert_eq!(segments, vec!["Été déjà là.", "Où ça?"]);
    }

    #[test]
    fn test_with_sentence_terminator() {
        assert_eq!(with_sentence_terminator("Hello"), "Hello.");
        assert_eq!(with_sentence_terminator("Hello!"), "Hello!");
        assert_eq!(with_sentence_terminator("Note:"), "Note:");
        assert_eq!(with_sentence_terminator("  Why? "), "Why?");
    }

    #[test]
    fn test_config_bounds() {
        assert!(SegmentConfig::default().is_within_bounds());
        assert!(!SegmentConfig::new(80).is_within_bounds());
        assert!(SegmentConfig::new(3000).is_within_bounds());
        assert!(!SegmentConfig::new(3001).is_within_bounds());
    }
}
