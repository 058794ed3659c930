//! Piper 音色目录扫描
//!
//! 递归查找 `.onnx` 模型（忽略不超过 1 MB 的占位文件），
//! 文件名格式 `<lang>-<name...>-<quality>`，按规范路径去重

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::application::ports::{CatalogError, PiperVoice, VoiceCatalogPort};

/// 小于此大小的模型视为占位文件
const MIN_MODEL_BYTES: u64 = 1_000_000;

/// 从文件名解析音色信息
pub fn parse_voice_file(path: &Path) -> PiperVoice {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string();
    let parts: Vec<&str> = stem.split('-').collect();

    let code = parts.first().copied().unwrap_or("unknown").to_string();
    let (name, quality) = match parts.len() {
        0 | 1 => (stem.clone(), String::new()),
        2 => (parts[1].to_string(), parts[1].to_string()),
        n => (parts[1..n - 1].join("-"), parts[n - 1].to_string()),
    };

    PiperVoice {
        code,
        name,
        quality,
        path: path.display().to_string(),
    }
}

/// 本地目录音色目录
pub struct PiperVoiceCatalog {
    voices_dir: PathBuf,
    /// 额外包含的已配置模型
    configured_model: Option<PathBuf>,
}

impl PiperVoiceCatalog {
    pub fn new(voices_dir: impl Into<PathBuf>, configured_model: Option<PathBuf>) -> Self {
        Self {
            voices_dir: voices_dir.into(),
            configured_model,
        }
    }
}

fn is_model_file(path: &Path) -> bool {
    let is_onnx = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("onnx"))
        .unwrap_or(false);
    is_onnx
        && std::fs::metadata(path)
            .map(|m| m.is_file() && m.len() > MIN_MODEL_BYTES)
            .unwrap_or(false)
}

/// 递归收集模型文件，不跟随目录链接
fn scan(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::debug!(path = %dir.display(), error = %e, "Skipping unreadable entry");
                None
            }
        })
        .filter(|entry| !entry.file_type().is_dir())
        .map(|entry| entry.into_path())
        .filter(|path| is_model_file(path))
        .collect()
}

impl VoiceCatalogPort for PiperVoiceCatalog {
    fn list_piper_voices(&self) -> Result<Vec<PiperVoice>, CatalogError> {
        let mut candidates = if self.voices_dir.is_dir() {
            scan(&self.voices_dir)
        } else {
            tracing::debug!(path = %self.voices_dir.display(), "Piper voices directory not found");
            Vec::new()
        };

        if let Some(model) = &self.configured_model {
            if is_model_file(model) {
                candidates.push(model.clone());
            }
        }

        let mut seen = HashSet::new();
        let voices = candidates
            .into_iter()
            .filter_map(|path| std::fs::canonicalize(&path).ok())
            .filter(|canonical| seen.insert(canonical.clone()))
            .map(|canonical| parse_voice_file(&canonical))
            .collect();

        Ok(voices)
    }
}
