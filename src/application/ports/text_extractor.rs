//! Text Extractor Port - 文档文本提取抽象

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// 支持的文档扩展名（小写，不含点）
pub const SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "docx", "txt", "md"];

/// 提取错误
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Unsupported extension: {0}")]
    UnsupportedExtension(String),

    #[error("{format} support is not compiled in; rebuild with `--features {feature}`")]
    MissingDependency {
        format: &'static str,
        feature: &'static str,
    },

    #[error("Failed to read {path}: {message}")]
    IoError { path: String, message: String },

    #[error("Failed to parse {path}: {message}")]
    ParseError { path: String, message: String },
}

/// 判断路径扩展名是否受支持
pub fn is_supported_document(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Text Extractor Port
///
/// 返回规范化后的文本：段落之间以 `\n\n` 分隔
#[async_trait]
pub trait TextExtractorPort: Send + Sync {
    async fn extract(&self, path: &Path) -> Result<String, ExtractError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_documents() {
        assert!(is_supported_document(Path::new("book.PDF")));
        assert!(is_supported_document(Path::new("notes.md")));
        assert!(!is_supported_document(Path::new("image.png")));
        assert!(!is_supported_document(Path::new("README")));
    }
}
