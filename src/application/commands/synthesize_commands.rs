//! Synthesis Commands - 文档合成命令

use std::path::PathBuf;
use uuid::Uuid;

use crate::application::ports::{AudioFormat, SynthesisParams};
use crate::domain::{BackendKind, BackendRequest, DEFAULT_MAX_CHARS};

/// 把一个文档合成为一个音频文件
#[derive(Debug, Clone)]
pub struct SynthesizeDocument {
    /// 输入文档
    pub path: PathBuf,
    /// 输出目录，产物命名为 `<文档名>.wav` / `.mp3`
    pub output_dir: PathBuf,
    pub backend: BackendRequest,
    pub params: SynthesisParams,
    /// 单个片段最大字符数，范围 [500, 3000]
    pub max_chars: usize,
    pub audio_format: AudioFormat,
}

impl SynthesizeDocument {
    pub fn new(path: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            output_dir: output_dir.into(),
            backend: BackendRequest::Auto,
            params: SynthesisParams::default(),
            max_chars: DEFAULT_MAX_CHARS,
            audio_format: AudioFormat::Wav,
        }
    }
}

/// 合成结果
#[derive(Debug, Clone)]
pub struct SynthesizeDocumentResponse {
    pub job_id: Uuid,
    /// 最终产物路径（转码失败时为 WAV）
    pub output_path: PathBuf,
    pub requested: BackendRequest,
    /// 实际使用的后端
    pub backend: BackendKind,
    /// 是否回退到了其他后端
    pub fallback: bool,
    pub segments: usize,
    pub duration_ms: u64,
}
