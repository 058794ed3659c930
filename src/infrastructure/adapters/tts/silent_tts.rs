//! Silent TTS Engine - 始终可用的静音后端
//!
//! 不依赖任何外部服务，按文本长度生成等比例的静音，
//! 保证没有真实后端时流水线也能产出音频

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};

use crate::application::ports::{PcmStream, SynthesisParams, TtsEnginePort, TtsError};
use crate::domain::{BackendKind, BYTES_PER_SAMPLE};

/// 静音生成配置
#[derive(Debug, Clone, PartialEq)]
pub struct SilenceConfig {
    /// 每秒音频对应的字符数
    pub chars_per_second: f64,
    /// 最短时长（秒）
    pub min_secs: f64,
    /// 采样率
    pub sample_rate: u32,
    /// 每块时长（秒）
    pub chunk_secs: f64,
}

impl Default for SilenceConfig {
    fn default() -> Self {
        Self {
            chars_per_second: 80.0,
            min_secs: 0.25,
            sample_rate: 24000,
            chunk_secs: 0.1,
        }
    }
}

impl SilenceConfig {
    /// 文本对应的静音时长
    pub fn duration_secs(&self, text: &str) -> f64 {
        let chars = text.chars().count() as f64;
        (chars / self.chars_per_second).max(self.min_secs)
    }

    /// 目标帧数
    pub fn total_frames(&self, text: &str) -> usize {
        (self.sample_rate as f64 * self.duration_secs(text)) as usize
    }

    /// 每块帧数
    pub fn chunk_frames(&self) -> usize {
        ((self.sample_rate as f64 * self.chunk_secs).round() as usize).max(1)
    }
}

/// 静音引擎
pub struct SilentTtsEngine {
    config: SilenceConfig,
}

impl SilentTtsEngine {
    pub fn new(config: SilenceConfig) -> Self {
        tracing::debug!(
            chars_per_second = config.chars_per_second,
            min_secs = config.min_secs,
            sample_rate = config.sample_rate,
            "SilentTtsEngine initialized"
        );
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(SilenceConfig::default())
    }
}

#[async_trait]
impl TtsEnginePort for SilentTtsEngine {
    fn kind(&self) -> BackendKind {
        BackendKind::SilentFallback
    }

    async fn synthesize_stream(
        &self,
        text: &str,
        _params: &SynthesisParams,
    ) -> Result<PcmStream, TtsError> {
        let total = self.config.total_frames(text);
        let chunk_frames = self.config.chunk_frames();
        // 整块输出，不足一块时向上取整
        let chunk_count = total.div_ceil(chunk_frames);

        tracing::debug!(
            text_len = text.len(),
            frames = total,
            chunks = chunk_count,
            "SilentTtsEngine: returning silence"
        );

        let chunk = vec![0u8; chunk_frames * BYTES_PER_SAMPLE];
        let chunks = stream::iter((0..chunk_count).map(move |_| Ok(chunk.clone()))).boxed();

        Ok(PcmStream {
            sample_rate: self.config.sample_rate,
            chunks,
        })
    }
}
