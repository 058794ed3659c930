//! Engine Probe / Factory Ports
//!
//! 探测：每个后端的依赖是否存在（不做昂贵的初始化）
//! 工厂：初始化具体引擎（可能加载模型）

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use super::tts_engine::{TtsEnginePort, TtsError};
use crate::domain::BackendKind;

/// 探测失败原因
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProbeError {
    #[error("{backend} is not configured (set {setting})")]
    NotConfigured {
        backend: BackendKind,
        setting: &'static str,
    },

    #[error("{backend} requires executable {program}, which was not found")]
    BinaryNotFound {
        backend: BackendKind,
        program: String,
    },

    #[error("{backend} is disabled")]
    Disabled { backend: BackendKind },
}

/// 后端可用性探测
pub trait EngineProbePort: Send + Sync {
    /// 检查后端依赖；Ok 表示可以尝试初始化
    fn probe(&self, kind: BackendKind) -> Result<(), ProbeError>;

    fn is_available(&self, kind: BackendKind) -> bool {
        self.probe(kind).is_ok()
    }
}

/// 引擎工厂
#[async_trait]
pub trait EngineFactoryPort: Send + Sync {
    /// 初始化指定后端
    async fn create(&self, kind: BackendKind) -> Result<Arc<dyn TtsEnginePort>, TtsError>;
}
