//! File Text Extractor - 从 PDF / DOCX / TXT / MD 提取文本
//!
//! PDF 与 DOCX 解析依赖可选 feature（`pdf` / `docx`），在阻塞线程中执行

use async_trait::async_trait;
use std::path::Path;

use super::normalize::normalize_text;
use crate::application::ports::{ExtractError, TextExtractorPort};

/// 文件文本提取器
#[derive(Debug, Clone, Default)]
pub struct FileTextExtractor;

impl FileTextExtractor {
    pub fn new() -> Self {
        Self
    }
}

fn io_error(path: &Path, err: impl std::fmt::Display) -> ExtractError {
    ExtractError::IoError {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}

fn parse_error(path: &Path, err: impl std::fmt::Display) -> ExtractError {
    ExtractError::ParseError {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}

/// UTF-8 解码，去掉 BOM，非法字节替换
fn decode_plain_text(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    text.strip_prefix('\u{feff}').unwrap_or(&text).to_string()
}

#[cfg(feature = "pdf")]
fn extract_pdf(path: &Path, bytes: &[u8]) -> Result<String, ExtractError> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| parse_error(path, e))
}

#[cfg(not(feature = "pdf"))]
fn extract_pdf(_path: &Path, _bytes: &[u8]) -> Result<String, ExtractError> {
    Err(ExtractError::MissingDependency {
        format: "PDF",
        feature: "pdf",
    })
}

#[cfg(feature = "docx")]
fn extract_docx(path: &Path, bytes: &[u8]) -> Result<String, ExtractError> {
    use quick_xml::events::Event;
    use quick_xml::Reader;
    use std::io::Read;

    let mut archive =
        zip::ZipArchive::new(std::io::Cursor::new(bytes)).map_err(|e| parse_error(path, e))?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| parse_error(path, e))?
        .read_to_string(&mut xml)
        .map_err(|e| io_error(path, e))?;

    // 每个 w:p 一行，与常见 DOCX 阅读器的段落文本一致
    let mut reader = Reader::from_str(&xml);
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event().map_err(|e| parse_error(path, e))? {
            Event::Start(e) if e.name().as_ref() == b"w:t" => in_text = true,
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => paragraphs.push(std::mem::take(&mut current)),
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:tab" => current.push('\t'),
                b"w:br" | b"w:cr" => current.push('\n'),
                b"w:p" => paragraphs.push(String::new()),
                _ => {}
            },
            Event::Text(t) if in_text => {
                current.push_str(&t.unescape().map_err(|e| parse_error(path, e))?);
            }
            Event::Eof => break,
            _ => {}
        }
    }
    if !current.is_empty() {
        paragraphs.push(current);
    }

    Ok(paragraphs.join("\n"))
}

#[cfg(not(feature = "docx"))]
fn extract_docx(_path: &Path, _bytes: &[u8]) -> Result<String, ExtractError> {
    Err(ExtractError::MissingDependency {
        format: "DOCX",
        feature: "docx",
    })
}

#[async_trait]
impl TextExtractorPort for FileTextExtractor {
    async fn extract(&self, path: &Path) -> Result<String, ExtractError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        if !matches!(ext.as_str(), "pdf" | "docx" | "txt" | "md") {
            return Err(ExtractError::UnsupportedExtension(if ext.is_empty() {
                path.display().to_string()
            } else {
                format!(".{}", ext)
            }));
        }

        let bytes = tokio::fs::read(path).await.map_err(|e| io_error(path, e))?;

        let raw = match ext.as_str() {
            "txt" | "md" => decode_plain_text(&bytes),
            format => {
                let owned = path.to_path_buf();
                let is_pdf = format == "pdf";
                tokio::task::spawn_blocking(move || {
                    if is_pdf {
                        extract_pdf(&owned, &bytes)
                    } else {
                        extract_docx(&owned, &bytes)
                    }
                })
                .await
                .map_err(|e| parse_error(path, e))??
            }
        };

        let text = normalize_text(&raw);
        tracing::debug!(
            path = %path.display(),
            raw_chars = raw.len(),
            chars = text.len(),
            "Document text extracted"
        );
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_plain_text_strips_bom_and_normalizes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "\u{feff}Bonjour\r\nle monde.\r\n\r\nFin.").unwrap();

        let text = FileTextExtractor::new().extract(&path).await.unwrap();
        assert_eq!(text, "Bonjour le monde.\n\nFin.");
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.md");
        std::fs::write(&path, b"caf\xe9 noir").unwrap();

        let text = FileTextExtractor::new().extract(&path).await.unwrap();
        assert!(text.starts_with("caf"));
        assert!(text.ends_with("noir"));
    }

    #[tokio::test]
    async fn test_unsupported_extension() {
        let err = FileTextExtractor::new()
            .extract(Path::new("cover.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedExtension(ext) if ext == ".png"));
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let err = FileTextExtractor::new()
            .extract(Path::new("/nonexistent/book.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::IoError { .. }));
    }

    #[cfg(feature = "docx")]
    #[tokio::test]
    async fn test_docx_paragraphs() {
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("letter.docx");
        {
            let file = std::fs::File::create(&path).unwrap();
            let mut zip = zip::ZipWriter::new(file);
            zip.start_file("word/document.xml", zip::write::SimpleFileOptions::default())
                .unwrap();
            zip.write_all(
                br#"<?xml version="1.0"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>
<w:p><w:r><w:t>Cher ami,</w:t></w:r></w:p>
<w:p/>
<w:p><w:r><w:t xml:space="preserve">Tom &amp; </w:t></w:r><w:r><w:t>Jerry.</w:t></w:r></w:p>
</w:body></w:document>"#,
            )
            .unwrap();
            zip.finish().unwrap();
        }

        let text = FileTextExtractor::new().extract(&path).await.unwrap();
        assert_eq!(text, "Cher ami,\n\nTom & Jerry.");
    }

    #[cfg(not(feature = "pdf"))]
    #[tokio::test]
    async fn test_pdf_without_feature_names_it() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.pdf");
        std::fs::write(&path, b"%PDF-1.4").unwrap();

        let err = FileTextExtractor::new().extract(&path).await.unwrap_err();
        assert!(err.to_string().contains("--features pdf"));
    }
}
