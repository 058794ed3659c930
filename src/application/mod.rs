//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（TtsEngine、TextExtractor、AudioSink、Transcoder 等）
//! - engine_resolver: 后端解析与引擎缓存
//! - synthesis_driver: 流式 / 批量合成驱动
//! - commands: CQRS 命令及处理器
//! - queries: CQRS 查询及处理器
//! - error: 应用层错误定义

pub mod commands;
pub mod engine_resolver;
pub mod error;
pub mod ports;
pub mod queries;
pub mod synthesis_driver;

// Re-exports
pub use commands::{
    handlers::{SynthesizeDocumentHandler, DEFAULT_BATCH_NEURAL_MAX_CHARS},
    SynthesizeDocument, SynthesizeDocumentResponse,
};

pub use engine_resolver::{EngineCache, EngineResolver, ResolvedEngine, SkippedBackend};
pub use error::SynthesisError;
pub use synthesis_driver::{DriveReport, SynthesisDriver};

pub use queries::{
    handlers::{LanguageVoices, ListPiperVoicesHandler, PiperVoiceCatalogResponse},
    ListPiperVoices,
};
