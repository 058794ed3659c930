//! Voice Catalog Port - 本地 Piper 音色目录

use serde::Serialize;
use thiserror::Error;

/// 目录错误
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    IoError(String),
}

/// 单个 Piper 音色模型
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PiperVoice {
    /// 语言代码，如 fr_FR
    pub code: String,
    /// 音色名，如 siwis
    pub name: String,
    /// 质量档位：x_low / low / medium / high
    pub quality: String,
    /// .onnx 绝对路径
    pub path: String,
}

/// Voice Catalog Port
pub trait VoiceCatalogPort: Send + Sync {
    /// 列出所有可用的 Piper 音色（顺序不保证）
    fn list_piper_voices(&self) -> Result<Vec<PiperVoice>, CatalogError>;
}
