//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（docvox.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;
use crate::domain::{SegmentConfig, MAX_MAX_CHARS, MIN_MAX_CHARS};
use crate::infrastructure::adapters::SUPPORTED_MP3_BITRATES;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["docvox", "docvox.local"];

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `DOCVOX_`，层级分隔符 `__`）
/// 2. 配置文件（`config_path`，为 None 时搜索 docvox.toml / docvox.local.toml）
/// 3. 默认值
///
/// 不做校验，命令行覆盖之后由调用方执行 [`validate_config`]
///
/// # 环境变量示例
/// - `DOCVOX_TTS__BACKEND=piper`
/// - `DOCVOX_PIPER__MODEL=/voices/fr_FR-siwis-medium.onnx`
/// - `DOCVOX_STREAMING_NEURAL__URL=http://gpu-box:8000`
/// - `DOCVOX_CHUNKING__MAX_CHARS=1200`
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级）
    builder = builder
        .set_default("tts.backend", "auto")?
        .set_default("tts.temperature", 0.7)?
        .set_default("tts.repetition_penalty", 1.15)?
        .set_default("chunking.max_chars", 1500)?
        .set_default("streaming_neural.health_timeout_secs", 5)?
        .set_default("streaming_neural.sample_rate", 24000)?
        .set_default("batch_neural.max_chunk_chars", 300)?
        .set_default("batch_neural.timeout_secs", 300)?
        .set_default("piper.voices_dir", "third_party/piper")?
        .set_default("silence.chars_per_second", 80.0)?
        .set_default("silence.min_secs", 0.25)?
        .set_default("silence.sample_rate", 24000)?
        .set_default("silence.chunk_secs", 0.1)?
        .set_default("audio.format", "wav")?
        .set_default("audio.mp3_bitrate_kbps", 128)?
        .set_default("audio.ffmpeg_bin", "ffmpeg")?
        .set_default("output.dir", "outputs")?
        .set_default("log.level", "info")?;

    // 2. 配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量（最高优先级）
    // 例如: DOCVOX_PIPER__BIN=/opt/piper/piper
    builder = builder.add_source(
        Environment::with_prefix("DOCVOX")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    Ok(app_config)
}

/// 验证配置有效性
pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if !SegmentConfig::new(config.chunking.max_chars).is_within_bounds() {
        return Err(ConfigError::ValidationError(format!(
            "chunking.max_chars must be between {} and {}, got {}",
            MIN_MAX_CHARS, MAX_MAX_CHARS, config.chunking.max_chars
        )));
    }

    if config.batch_neural.max_chunk_chars == 0 {
        return Err(ConfigError::ValidationError(
            "batch_neural.max_chunk_chars cannot be 0".to_string(),
        ));
    }

    let silence = &config.silence;
    if !(silence.chars_per_second > 0.0 && silence.min_secs > 0.0 && silence.chunk_secs > 0.0) {
        return Err(ConfigError::ValidationError(
            "silence.chars_per_second, silence.min_secs and silence.chunk_secs must be positive"
                .to_string(),
        ));
    }

    if silence.sample_rate == 0 || config.streaming_neural.sample_rate == 0 {
        return Err(ConfigError::ValidationError(
            "Sample rates cannot be 0".to_string(),
        ));
    }

    if !SUPPORTED_MP3_BITRATES.contains(&config.audio.mp3_bitrate_kbps) {
        return Err(ConfigError::ValidationError(format!(
            "audio.mp3_bitrate_kbps must be one of {:?}, got {}",
            SUPPORTED_MP3_BITRATES, config.audio.mp3_bitrate_kbps
        )));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Docvox Configuration ===");
    tracing::info!("Backend: {}", config.tts.backend);
    tracing::info!("Voice: {}", config.tts.voice.as_deref().unwrap_or("(default)"));
    tracing::info!(
        "Temperature: {}, Repetition Penalty: {}",
        config.tts.temperature,
        config.tts.repetition_penalty
    );
    tracing::info!("Max Chars: {}", config.chunking.max_chars);
    tracing::info!(
        "Streaming Neural URL: {}",
        config.streaming_neural.url.as_deref().unwrap_or("(not configured)")
    );
    tracing::info!(
        "Batch Neural URL: {}",
        config.batch_neural.url.as_deref().unwrap_or("(not configured)")
    );
    tracing::info!("Piper Binary: {}", config.piper.bin);
    if let Some(model) = &config.piper.model {
        tracing::info!("Piper Model: {:?}", model);
    }
    tracing::info!("Audio Format: {}", config.audio.format);
    tracing::info!("Output Directory: {:?}", config.output.dir);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("============================");
}
