//! TTS 后端标识
//!
//! 后端是一个封闭集合，每个变体有固定的能力标记：
//! - streaming-neural: 流式，需要加载模型
//! - batch-neural: 批量，需要加载模型（较重的 CPU/GPU 模型）
//! - system-tts: 批量，操作系统自带语音（外部进程）
//! - external-binary-tts: 批量，外部可执行文件（Piper）
//! - silent-fallback: 流式，确定性静音，始终可用

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 后端能力
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// 可增量输出音频
    Streaming,
    /// 只能在整段生成后返回完整音频
    BatchOnly,
}

/// 具体后端变体
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    StreamingNeural,
    BatchNeural,
    SystemTts,
    ExternalBinaryTts,
    SilentFallback,
}

/// `auto` 模式下的尝试顺序（质量从高到低）
pub const AUTO_PREFERENCE: [BackendKind; 5] = [
    BackendKind::StreamingNeural,
    BackendKind::BatchNeural,
    BackendKind::ExternalBinaryTts,
    BackendKind::SystemTts,
    BackendKind::SilentFallback,
];

/// 显式请求失败后的回退链（低资源批量后端优先于静音）
pub const EXPLICIT_FALLBACK: [BackendKind; 3] = [
    BackendKind::ExternalBinaryTts,
    BackendKind::SystemTts,
    BackendKind::SilentFallback,
];

impl BackendKind {
    pub const ALL: [BackendKind; 5] = [
        BackendKind::StreamingNeural,
        BackendKind::BatchNeural,
        BackendKind::SystemTts,
        BackendKind::ExternalBinaryTts,
        BackendKind::SilentFallback,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::StreamingNeural => "streaming-neural",
            BackendKind::BatchNeural => "batch-neural",
            BackendKind::SystemTts => "system-tts",
            BackendKind::ExternalBinaryTts => "external-binary-tts",
            BackendKind::SilentFallback => "silent-fallback",
        }
    }

    pub fn capability(&self) -> Capability {
        match self {
            BackendKind::StreamingNeural | BackendKind::SilentFallback => Capability::Streaming,
            BackendKind::BatchNeural | BackendKind::SystemTts | BackendKind::ExternalBinaryTts => {
                Capability::BatchOnly
            }
        }
    }

    pub fn is_streaming(&self) -> bool {
        self.capability() == Capability::Streaming
    }

    /// 是否通过子进程合成
    pub fn requires_external_process(&self) -> bool {
        matches!(self, BackendKind::SystemTts | BackendKind::ExternalBinaryTts)
    }

    /// 初始化时是否需要加载模型（代价较高）
    pub fn requires_model_load(&self) -> bool {
        matches!(self, BackendKind::StreamingNeural | BackendKind::BatchNeural)
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 后端名称解析错误
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown TTS backend: {0} (expected auto, streaming-neural, batch-neural, system-tts, external-binary-tts or silent-fallback)")]
pub struct UnknownBackend(pub String);

impl std::str::FromStr for BackendKind {
    type Err = UnknownBackend;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "streaming-neural" | "orpheus" => Ok(BackendKind::StreamingNeural),
            "batch-neural" | "parler" => Ok(BackendKind::BatchNeural),
            "system-tts" | "system" | "pyttsx3" => Ok(BackendKind::SystemTts),
            "external-binary-tts" | "piper" => Ok(BackendKind::ExternalBinaryTts),
            "silent-fallback" | "silent" | "mock" => Ok(BackendKind::SilentFallback),
            _ => Err(UnknownBackend(s.to_string())),
        }
    }
}

/// 期望的后端（用户请求）
///
/// 引擎缓存以此为 key，而不是实际解析出的后端
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BackendRequest {
    #[default]
    Auto,
    Explicit(BackendKind),
}

impl BackendRequest {
    /// 按顺序列出本次解析要尝试的后端，每个最多出现一次，静音后端总在最后
    pub fn candidates(&self) -> Vec<BackendKind> {
        match self {
            BackendRequest::Auto => AUTO_PREFERENCE.to_vec(),
            BackendRequest::Explicit(BackendKind::SilentFallback) => {
                vec![BackendKind::SilentFallback]
            }
            BackendRequest::Explicit(kind) => {
                let mut chain = vec![*kind];
                chain.extend(EXPLICIT_FALLBACK.iter().copied().filter(|k| k != kind));
                chain
            }
        }
    }
}

impl std::fmt::Display for BackendRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendRequest::Auto => f.write_str("auto"),
            BackendRequest::Explicit(kind) => write!(f, "{}", kind),
        }
    }
}

impl std::str::FromStr for BackendRequest {
    type Err = UnknownBackend;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("auto") {
            return Ok(BackendRequest::Auto);
        }
        s.parse().map(BackendRequest::Explicit)
    }
}

impl<'de> Deserialize<'de> for BackendRequest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
