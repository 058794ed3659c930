//! Infrastructure Layer - 基础设施层
//!
//! 各端口的具体实现：TTS 引擎、探测与工厂、WAV 组装、MP3 转码、文本提取、音色目录

pub mod adapters;

pub use adapters::*;
