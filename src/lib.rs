//! Docvox - 文档转语音
//!
//! 架构设计: Hexagonal Architecture + CQRS
//!
//! 领域层 (domain/):
//! - 文本分段、后端种类与能力、PCM 缓冲
//!
//! 应用层 (application/):
//! - Ports: TtsEngine, EngineProbe, EngineFactory, TextExtractor, AudioAssembler, AudioTranscoder, VoiceCatalog
//! - EngineResolver / EngineCache: 后端解析与回退
//! - SynthesisDriver: 流式与批量合成驱动
//! - Commands / Queries: 文档合成命令、Piper 音色查询
//!
//! 基础设施层 (infrastructure/):
//! - Adapters: 神经网络服务客户端、Piper、系统语音、静音引擎、WAV 组装、MP3 转码、文本提取

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config_from_path, AppConfig};
