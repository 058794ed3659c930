//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;

use crate::application::ports::AudioFormat;
use crate::domain::{BackendRequest, DEFAULT_MAX_CHARS};
use crate::infrastructure::adapters::{
    default_piper_bin, BatchNeuralClientConfig, EngineSettings, PiperConfig, SilenceConfig,
    StreamingNeuralClientConfig,
};

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 合成参数
    #[serde(default)]
    pub tts: TtsConfig,

    /// 分段配置
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// 流式神经网络服务
    #[serde(default)]
    pub streaming_neural: StreamingNeuralConfig,

    /// 批量神经网络服务
    #[serde(default)]
    pub batch_neural: BatchNeuralConfig,

    /// Piper
    #[serde(default)]
    pub piper: PiperSection,

    /// 系统语音
    #[serde(default)]
    pub system_tts: SystemTtsConfig,

    /// 静音后端
    #[serde(default)]
    pub silence: SilenceSection,

    /// 音频输出配置
    #[serde(default)]
    pub audio: AudioConfig,

    /// 输出目录配置
    #[serde(default)]
    pub output: OutputConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

impl AppConfig {
    /// 构造各后端所需参数
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            streaming_neural: self.streaming_neural.client_config(&self.tts),
            batch_neural: self.batch_neural.client_config(),
            piper: PiperConfig {
                bin: self.piper.bin.clone(),
                model: self.piper.model.clone(),
            },
            system_program: self.system_tts.program.clone(),
            silence: self.silence.to_silence_config(),
        }
    }
}

/// 合成参数配置
#[derive(Debug, Clone, Deserialize)]
pub struct TtsConfig {
    /// 后端：auto 或具体后端名
    #[serde(default)]
    pub backend: BackendRequest,

    /// 音色
    #[serde(default)]
    pub voice: Option<String>,

    /// 采样温度
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// 重复惩罚
    #[serde(default = "default_repetition_penalty")]
    pub repetition_penalty: f32,
}

fn default_temperature() -> f32 {
    0.7
}

fn default_repetition_penalty() -> f32 {
    1.15
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            backend: BackendRequest::Auto,
            voice: None,
            temperature: default_temperature(),
            repetition_penalty: default_repetition_penalty(),
        }
    }
}

/// 分段配置
#[derive(Debug, Clone, Deserialize)]
pub struct ChunkingConfig {
    /// 单段最大字符数
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
}

fn default_max_chars() -> usize {
    DEFAULT_MAX_CHARS
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chars: default_max_chars(),
        }
    }
}

/// 流式神经网络服务配置
#[derive(Debug, Clone, Deserialize)]
pub struct StreamingNeuralConfig {
    /// 服务地址，为空表示未配置
    #[serde(default)]
    pub url: Option<String>,

    /// 模型名称
    #[serde(default = "default_streaming_model")]
    pub model: String,

    /// 健康检查超时（秒）
    #[serde(default = "default_health_timeout_secs")]
    pub health_timeout_secs: u64,

    /// 流采样率（服务未声明时）
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
}

fn default_streaming_model() -> String {
    StreamingNeuralClientConfig::default().model
}

fn default_health_timeout_secs() -> u64 {
    5
}

fn default_sample_rate() -> u32 {
    24000
}

impl Default for StreamingNeuralConfig {
    fn default() -> Self {
        Self {
            url: None,
            model: default_streaming_model(),
            health_timeout_secs: default_health_timeout_secs(),
            sample_rate: default_sample_rate(),
        }
    }
}

impl StreamingNeuralConfig {
    /// 地址为空时返回 None
    pub fn client_config(&self, tts: &TtsConfig) -> Option<StreamingNeuralClientConfig> {
        let url = non_empty(self.url.as_deref())?;
        let mut config = StreamingNeuralClientConfig::new(url).with_model(self.model.clone());
        config.temperature = tts.temperature;
        config.repetition_penalty = tts.repetition_penalty;
        config.sample_rate = self.sample_rate;
        config.health_timeout_secs = self.health_timeout_secs;
        Some(config)
    }
}

/// 批量神经网络服务配置
#[derive(Debug, Clone, Deserialize)]
pub struct BatchNeuralConfig {
    /// 服务地址，为空表示未配置
    #[serde(default)]
    pub url: Option<String>,

    /// 模型名称
    #[serde(default = "default_batch_model")]
    pub model: String,

    /// 风格描述
    #[serde(default = "default_batch_description")]
    pub description: String,

    /// 单段字符上限
    #[serde(default = "default_max_chunk_chars")]
    pub max_chunk_chars: usize,

    /// 单段请求超时（秒）
    #[serde(default = "default_batch_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_batch_model() -> String {
    BatchNeuralClientConfig::default().model
}

fn default_batch_description() -> String {
    BatchNeuralClientConfig::default().description
}

fn default_max_chunk_chars() -> usize {
    crate::application::DEFAULT_BATCH_NEURAL_MAX_CHARS
}

fn default_batch_timeout_secs() -> u64 {
    300
}

impl Default for BatchNeuralConfig {
    fn default() -> Self {
        Self {
            url: None,
            model: default_batch_model(),
            description: default_batch_description(),
            max_chunk_chars: default_max_chunk_chars(),
            timeout_secs: default_batch_timeout_secs(),
        }
    }
}

impl BatchNeuralConfig {
    pub fn client_config(&self) -> Option<BatchNeuralClientConfig> {
        let url = non_empty(self.url.as_deref())?;
        let mut config = BatchNeuralClientConfig::new(url).with_timeout(self.timeout_secs);
        config.model = self.model.clone();
        config.description = self.description.clone();
        Some(config)
    }
}

/// Piper 配置
#[derive(Debug, Clone, Deserialize)]
pub struct PiperSection {
    /// 可执行文件
    #[serde(default = "default_piper_bin_string")]
    pub bin: String,

    /// 默认音色模型
    #[serde(default)]
    pub model: Option<PathBuf>,

    /// 音色目录
    #[serde(default = "default_voices_dir")]
    pub voices_dir: PathBuf,
}

fn default_piper_bin_string() -> String {
    default_piper_bin().to_string()
}

fn default_voices_dir() -> PathBuf {
    PathBuf::from("third_party/piper")
}

impl Default for PiperSection {
    fn default() -> Self {
        Self {
            bin: default_piper_bin_string(),
            model: None,
            voices_dir: default_voices_dir(),
        }
    }
}

/// 系统语音配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SystemTtsConfig {
    /// 覆盖平台默认程序
    #[serde(default)]
    pub program: Option<String>,
}

/// 静音后端配置
#[derive(Debug, Clone, Deserialize)]
pub struct SilenceSection {
    #[serde(default = "default_chars_per_second")]
    pub chars_per_second: f64,

    #[serde(default = "default_min_secs")]
    pub min_secs: f64,

    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    #[serde(default = "default_chunk_secs")]
    pub chunk_secs: f64,
}

fn default_chars_per_second() -> f64 {
    80.0
}

fn default_min_secs() -> f64 {
    0.25
}

fn default_chunk_secs() -> f64 {
    0.1
}

impl Default for SilenceSection {
    fn default() -> Self {
        Self {
            chars_per_second: default_chars_per_second(),
            min_secs: default_min_secs(),
            sample_rate: default_sample_rate(),
            chunk_secs: default_chunk_secs(),
        }
    }
}

impl SilenceSection {
    pub fn to_silence_config(&self) -> SilenceConfig {
        SilenceConfig {
            chars_per_second: self.chars_per_second,
            min_secs: self.min_secs,
            sample_rate: self.sample_rate,
            chunk_secs: self.chunk_secs,
        }
    }
}

/// 音频输出配置
#[derive(Debug, Clone, Deserialize)]
pub struct AudioConfig {
    /// 输出格式（wav / mp3）
    #[serde(default)]
    pub format: AudioFormat,

    /// MP3 码率（kbps）
    #[serde(default = "default_mp3_bitrate_kbps")]
    pub mp3_bitrate_kbps: u32,

    /// ffmpeg 可执行文件
    #[serde(default = "default_ffmpeg_bin")]
    pub ffmpeg_bin: String,
}

fn default_mp3_bitrate_kbps() -> u32 {
    128
}

fn default_ffmpeg_bin() -> String {
    "ffmpeg".to_string()
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            format: AudioFormat::Wav,
            mp3_bitrate_kbps: default_mp3_bitrate_kbps(),
            ffmpeg_bin: default_ffmpeg_bin(),
        }
    }
}

/// 输出目录配置
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("outputs")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BackendKind;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.tts.backend, BackendRequest::Auto);
        assert_eq!(config.chunking.max_chars, 1500);
        assert_eq!(config.batch_neural.max_chunk_chars, 300);
        assert_eq!(config.audio.format, AudioFormat::Wav);
        assert_eq!(config.audio.mp3_bitrate_kbps, 128);
        assert_eq!(config.output.dir, PathBuf::from("outputs"));
    }

    #[test]
    fn test_unconfigured_services_have_no_client() {
        let settings = AppConfig::default().engine_settings();
        assert!(settings.streaming_neural.is_none());
        assert!(settings.batch_neural.is_none());
        assert_eq!(settings.silence, SilenceConfig::default());
    }

    #[test]
    fn test_streaming_client_inherits_tts_params() {
        let mut config = AppConfig::default();
        config.streaming_neural.url = Some("http://gpu:8000".to_string());
        config.tts.temperature = 0.5;

        let client = config.engine_settings().streaming_neural.unwrap();
        assert_eq!(client.base_url, "http://gpu:8000");
        assert_eq!(client.temperature, 0.5);
        assert_eq!(client.repetition_penalty, 1.15);
    }

    #[test]
    fn test_blank_url_is_unconfigured() {
        let mut config = AppConfig::default();
        config.batch_neural.url = Some("  ".to_string());
        assert!(config.engine_settings().batch_neural.is_none());
    }

    #[test]
    fn test_backend_deserializes_from_name() {
        let tts: TtsConfig = serde_json::from_str(r#"{"backend":"piper"}"#).unwrap();
        assert_eq!(tts.backend, BackendRequest::Explicit(BackendKind::ExternalBinaryTts));
        assert_eq!(tts.temperature, 0.7);
    }
}
