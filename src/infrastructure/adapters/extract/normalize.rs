//! 文本规范化
//!
//! - 去掉 `\r`
//! - 合并断行连字符（`com-\nplex` → `complex`）
//! - 段内单个换行合并为空格，空行作为段落边界，段落以 `\n\n` 连接
//! - 连续水平空白压缩为一个空格

use once_cell::sync::Lazy;
use regex::Regex;

/// 段落分隔符
pub const PARAGRAPH_BREAK: &str = "\n\n";

static HYPHENATED_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\w)-\n(\w)").expect("valid hyphenation pattern"));

static HORIZONTAL_SPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \t\x0C\x0B]+").expect("valid whitespace pattern"));

pub fn normalize_text(raw: &str) -> String {
    let text = raw.replace('\r', "");
    let text = HYPHENATED_BREAK.replace_all(&text, "$1$2");

    let mut paragraphs: Vec<String> = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in text.lines().map(str::trim) {
        if line.is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join(" "));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        paragraphs.push(current.join(" "));
    }

    let joined = paragraphs
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(PARAGRAPH_BREAK);

    HORIZONTAL_SPACE.replace_all(&joined, " ").trim().to_string()
}
