//! 应用层错误定义
//!
//! 只有配置错误、合成错误和空输入会中止任务；
//! 后端解析失败与格式转换失败在各自组件内降级处理，不会出现在这里。

use std::path::PathBuf;
use thiserror::Error;

use crate::application::ports::{AssembleError, ExtractError, TtsError};
use crate::domain::BackendKind;

/// 合成任务错误
#[derive(Debug, Error)]
pub enum SynthesisError {
    /// 文档中没有可合成的文本
    #[error("No text extracted from the document: {}", path.display())]
    EmptyInput { path: PathBuf },

    /// 配置错误（缺少依赖、模型或可执行文件）
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// 文本提取失败
    #[error(transparent)]
    Extraction(#[from] ExtractError),

    /// 后端合成失败
    #[error("Synthesis failed on {backend}: {source}")]
    Synthesis {
        backend: BackendKind,
        #[source]
        source: TtsError,
    },

    /// 音频容器写入失败
    #[error("Audio assembly failed: {0}")]
    Assembly(#[from] AssembleError),
}

impl SynthesisError {
    /// 按错误类别包装后端错误
    pub fn from_tts(backend: BackendKind, err: TtsError) -> Self {
        if err.is_configuration() {
            Self::Configuration(format!("{} backend: {}", backend, err))
        } else {
            Self::Synthesis {
                backend,
                source: err,
            }
        }
    }

    /// 创建配置错误
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn is_empty_input(&self) -> bool {
        matches!(self, Self::EmptyInput { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_binary_is_configuration_error() {
        let err = SynthesisError::from_tts(
            BackendKind::ExternalBinaryTts,
            TtsError::BinaryNotFound {
                program: "piper".into(),
            },
        );
        assert!(matches!(err, SynthesisError::Configuration(_)));
        assert!(err.to_string().contains("piper"));
    }

    #[test]
    fn test_process_failure_keeps_diagnostics() {
        let err = SynthesisError::from_tts(
            BackendKind::ExternalBinaryTts,
            TtsError::ProcessFailed {
                program: "piper".into(),
                status: "exit status: 1".into(),
                stderr: "model file corrupt".into(),
            },
        );
        assert!(matches!(err, SynthesisError::Synthesis { .. }));
        assert!(err.to_string().contains("model file corrupt"));
    }
}
