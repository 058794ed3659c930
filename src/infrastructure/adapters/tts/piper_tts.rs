//! Piper TTS - 外部可执行文件后端
//!
//! 文本通过 stdin 传入，`-m <model> -f <tmp.wav>` 输出到临时文件后解码

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::application::ports::{BatchRequest, TtsEnginePort, TtsError};
use crate::domain::{BackendKind, PcmBuffer};
use crate::infrastructure::adapters::audio::decode_wav_file;
use crate::infrastructure::adapters::process::{resolve_program, run_program};

/// 平台默认的 Piper 可执行文件名
pub fn default_piper_bin() -> &'static str {
    if cfg!(windows) {
        "piper.exe"
    } else {
        "piper"
    }
}

/// Piper 配置
#[derive(Debug, Clone)]
pub struct PiperConfig {
    /// 可执行文件路径或命令名
    pub bin: String,
    /// 默认音色模型（.onnx）
    pub model: Option<PathBuf>,
}

impl Default for PiperConfig {
    fn default() -> Self {
        Self {
            bin: default_piper_bin().to_string(),
            model: None,
        }
    }
}

/// Piper 引擎
pub struct PiperTtsEngine {
    program: PathBuf,
    default_model: Option<PathBuf>,
}

impl PiperTtsEngine {
    /// 定位可执行文件；模型在合成时才确定
    pub fn new(config: PiperConfig) -> Result<Self, TtsError> {
        let program = resolve_program(&config.bin).ok_or_else(|| TtsError::BinaryNotFound {
            program: format!("{} (set DOCVOX_PIPER__BIN)", config.bin),
        })?;

        tracing::info!(
            program = %program.display(),
            model = ?config.model,
            "Piper TTS initialized"
        );

        Ok(Self {
            program,
            default_model: config.model,
        })
    }

    /// 选择模型：音色是已存在的 .onnx 文件时优先使用，否则用配置的模型
    pub fn select_model(&self, voice: Option<&str>) -> Result<PathBuf, TtsError> {
        if let Some(voice) = voice {
            let candidate = Path::new(voice);
            let is_onnx = candidate
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("onnx"))
                .unwrap_or(false);
            if is_onnx && candidate.exists() {
                return Ok(candidate.to_path_buf());
            }
        }

        let model = self.default_model.as_ref().ok_or_else(|| {
            TtsError::MissingModel(
                "Piper model not configured. Set DOCVOX_PIPER__MODEL to a .onnx voice file or pass --voice with a model path".to_string(),
            )
        })?;

        if !model.exists() {
            return Err(TtsError::MissingModel(format!(
                "Piper model not found: {}",
                model.display()
            )));
        }

        Ok(model.clone())
    }
}

#[async_trait]
impl TtsEnginePort for PiperTtsEngine {
    fn kind(&self) -> BackendKind {
        BackendKind::ExternalBinaryTts
    }

    async fn synthesize_batch(&self, request: &BatchRequest) -> Result<PcmBuffer, TtsError> {
        let model = self.select_model(request.params.voice.as_deref())?;
        let text = request.text();

        let tmp = tempfile::Builder::new()
            .prefix("docvox-piper-")
            .suffix(".wav")
            .tempfile()?;

        let args = vec![
            "-m".to_string(),
            model.to_string_lossy().into_owned(),
            "-f".to_string(),
            tmp.path().to_string_lossy().into_owned(),
        ];

        tracing::info!(
            model = %model.display(),
            chars = text.chars().count(),
            "Running Piper synthesis"
        );

        run_program(&self.program, &args, Some(&text))
            .await
            .map_err(|e| e.into_tts_error(&self.program))?;

        decode_wav_file(tmp.path()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine_with_model(model: Option<PathBuf>) -> PiperTtsEngine {
        PiperTtsEngine {
            program: PathBuf::from("piper"),
            default_model: model,
        }
    }

    #[test]
    fn test_missing_binary_is_configuration_error() {
        let err = PiperTtsEngine::new(PiperConfig {
            bin: "/nonexistent/piper".to_string(),
            model: None,
        })
        .err()
        .unwrap();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("DOCVOX_PIPER__BIN"));
    }

    #[test]
    fn test_voice_onnx_path_takes_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let voice = dir.path().join("fr_FR-siwis-medium.onnx");
        std::fs::write(&voice, b"model").unwrap();
        let configured = dir.path().join("en_US-amy-low.onnx");
        std::fs::write(&configured, b"model").unwrap();

        let engine = engine_with_model(Some(configured.clone()));
        assert_eq!(engine.select_model(voice.to_str()).unwrap(), voice);
        assert_eq!(engine.select_model(Some("siwis")).unwrap(), configured);
        assert_eq!(engine.select_model(None).unwrap(), configured);
    }

    #[test]
    fn test_unconfigured_model_names_setting() {
        let err = engine_with_model(None).select_model(None).unwrap_err();
        assert!(matches!(err, TtsError::MissingModel(_)));
        assert!(err.to_string().contains("DOCVOX_PIPER__MODEL"));
    }

    #[test]
    fn test_configured_model_missing_names_path() {
        let err = engine_with_model(Some(PathBuf::from("/nowhere/voice.onnx")))
            .select_model(Some("/also/missing.onnx"))
            .unwrap_err();
        assert!(err.to_string().contains("/nowhere/voice.onnx"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_process_reports_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("voice.onnx");
        std::fs::write(&model, b"model").unwrap();

        let engine = PiperTtsEngine {
            program: resolve_program("false").unwrap(),
            default_model: Some(model),
        };
        let request = BatchRequest {
            segments: vec!["Bonjour.".to_string()],
            ..Default::default()
        };

        let err = engine.synthesize_batch(&request).await.unwrap_err();
        assert!(matches!(err, TtsError::ProcessFailed { .. }));
    }
}
