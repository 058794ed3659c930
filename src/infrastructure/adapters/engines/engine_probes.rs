//! 后端可用性探测
//!
//! 只检查依赖是否存在，不加载模型、不访问网络

use crate::application::ports::{EngineProbePort, ProbeError};
use crate::domain::BackendKind;
use crate::infrastructure::adapters::process::resolve_program;
use crate::infrastructure::adapters::tts::{
    detect_system_voice, BatchNeuralClientConfig, PiperConfig, SilenceConfig,
    StreamingNeuralClientConfig,
};

/// 所有后端的构造参数
#[derive(Debug, Clone, Default)]
pub struct EngineSettings {
    /// 未配置服务地址时为 None
    pub streaming_neural: Option<StreamingNeuralClientConfig>,
    pub batch_neural: Option<BatchNeuralClientConfig>,
    pub piper: PiperConfig,
    /// 系统语音程序覆盖值
    pub system_program: Option<String>,
    pub silence: SilenceConfig,
}

/// 基于配置与 PATH 的探测
pub struct ConfiguredEngineProbes {
    settings: EngineSettings,
}

impl ConfiguredEngineProbes {
    pub fn new(settings: EngineSettings) -> Self {
        Self { settings }
    }
}

impl EngineProbePort for ConfiguredEngineProbes {
    fn probe(&self, kind: BackendKind) -> Result<(), ProbeError> {
        match kind {
            BackendKind::StreamingNeural => self
                .settings
                .streaming_neural
                .as_ref()
                .map(|_| ())
                .ok_or(ProbeError::NotConfigured {
                    backend: kind,
                    setting: "DOCVOX_STREAMING_NEURAL__URL",
                }),
            BackendKind::BatchNeural => self
                .settings
                .batch_neural
                .as_ref()
                .map(|_| ())
                .ok_or(ProbeError::NotConfigured {
                    backend: kind,
                    setting: "DOCVOX_BATCH_NEURAL__URL",
                }),
            BackendKind::ExternalBinaryTts => resolve_program(&self.settings.piper.bin)
                .map(|_| ())
                .ok_or_else(|| ProbeError::BinaryNotFound {
                    backend: kind,
                    program: self.settings.piper.bin.clone(),
                }),
            BackendKind::SystemTts => detect_system_voice(self.settings.system_program.as_deref())
                .map(|_| ())
                .ok_or_else(|| ProbeError::BinaryNotFound {
                    backend: kind,
                    program: self
                        .settings
                        .system_program
                        .clone()
                        .unwrap_or_else(|| "system speech program".to_string()),
                }),
            BackendKind::SilentFallback => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unconfigured() -> EngineSettings {
        EngineSettings {
            piper: PiperConfig {
                bin: "/nonexistent/piper".to_string(),
                model: None,
            },
            system_program: Some("/nonexistent/espeak-ng".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_nothing_configured_only_silence_available() {
        let probes = ConfiguredEngineProbes::new(unconfigured());
        for kind in BackendKind::ALL {
            assert_eq!(
                probes.is_available(kind),
                kind == BackendKind::SilentFallback,
                "{}",
                kind
            );
        }
    }

    #[test]
    fn test_neural_needs_service_url() {
        let mut settings = unconfigured();
        settings.streaming_neural = Some(StreamingNeuralClientConfig::default());
        let probes = ConfiguredEngineProbes::new(settings);

        assert!(probes.is_available(BackendKind::StreamingNeural));
        assert_eq!(
            probes.probe(BackendKind::BatchNeural),
            Err(ProbeError::NotConfigured {
                backend: BackendKind::BatchNeural,
                setting: "DOCVOX_BATCH_NEURAL__URL",
            })
        );
    }

    #[test]
    fn test_piper_binary_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("piper");
        std::fs::write(&bin, b"").unwrap();

        let mut settings = unconfigured();
        settings.piper.bin = bin.to_string_lossy().into_owned();
        let probes = ConfiguredEngineProbes::new(settings);
        assert!(probes.is_available(BackendKind::ExternalBinaryTts));
    }
}
