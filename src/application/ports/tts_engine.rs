//! TTS Engine Port - TTS 合成引擎抽象
//!
//! 每个后端变体实现同一个接口：
//! - 流式后端实现 `synthesize_stream`，返回惰性的 PCM 字节块序列
//! - 批量后端实现 `synthesize_batch`，一次返回完整缓冲

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use thiserror::Error;

use crate::domain::{BackendKind, PcmBuffer};

/// TTS 错误
#[derive(Debug, Error)]
pub enum TtsError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Executable not found: {program}. Set the configured path or add it to PATH")]
    BinaryNotFound { program: String },

    #[error("Voice model unavailable: {0}")]
    MissingModel(String),

    #[error("{program} exited with {status}: {stderr}")]
    ProcessFailed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Audio decode error: {0}")]
    DecodeError(String),

    #[error("{backend} does not support {operation} synthesis")]
    Unsupported {
        backend: BackendKind,
        operation: &'static str,
    },
}

impl TtsError {
    /// 缺少依赖或模型（可通过配置修复）
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            TtsError::BinaryNotFound { .. } | TtsError::MissingModel(_)
        )
    }
}

impl From<std::io::Error> for TtsError {
    fn from(err: std::io::Error) -> Self {
        TtsError::IoError(err.to_string())
    }
}

/// 合成参数（只有支持的后端会使用）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SynthesisParams {
    /// 音色标识：神经/系统后端为音色名，Piper 为 .onnx 模型路径
    pub voice: Option<String>,
    /// 采样温度（仅流式神经后端）
    pub temperature: Option<f32>,
    /// 重复惩罚（仅流式神经后端）
    pub repetition_penalty: Option<f32>,
}

/// PCM 字节块流
pub type PcmChunkStream = BoxStream<'static, Result<Vec<u8>, TtsError>>;

/// 流式合成结果
pub struct PcmStream {
    /// 该流中所有字节块的采样率
    pub sample_rate: u32,
    /// 16 位单声道小端 PCM 字节块
    pub chunks: PcmChunkStream,
}

impl std::fmt::Debug for PcmStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PcmStream")
            .field("sample_rate", &self.sample_rate)
            .finish_non_exhaustive()
    }
}

/// 批量合成请求
#[derive(Debug, Clone, Default)]
pub struct BatchRequest {
    /// 已补全句末标点的片段（文档顺序）
    pub segments: Vec<String>,
    pub params: SynthesisParams,
}

impl BatchRequest {
    /// 以单个空格拼接全部片段
    pub fn text(&self) -> String {
        self.segments.join(" ")
    }
}

/// TTS Engine Port
#[async_trait]
pub trait TtsEnginePort: Send + Sync {
    /// 后端变体
    fn kind(&self) -> BackendKind;

    /// 流式合成单个片段
    async fn synthesize_stream(
        &self,
        _text: &str,
        _params: &SynthesisParams,
    ) -> Result<PcmStream, TtsError> {
        Err(TtsError::Unsupported {
            backend: self.kind(),
            operation: "streaming",
        })
    }

    /// 批量合成全部片段
    async fn synthesize_batch(&self, _request: &BatchRequest) -> Result<PcmBuffer, TtsError> {
        Err(TtsError::Unsupported {
            backend: self.kind(),
            operation: "batch",
        })
    }
}
