//! 引擎工厂 - 按后端变体构造具体引擎

use async_trait::async_trait;
use std::sync::Arc;

use super::engine_probes::EngineSettings;
use crate::application::ports::{EngineFactoryPort, TtsEnginePort, TtsError};
use crate::domain::BackendKind;
use crate::infrastructure::adapters::tts::{
    BatchNeuralClient, PiperTtsEngine, SilentTtsEngine, StreamingNeuralClient, SystemTtsEngine,
};

pub struct DefaultEngineFactory {
    settings: EngineSettings,
}

impl DefaultEngineFactory {
    pub fn new(settings: EngineSettings) -> Self {
        Self { settings }
    }

    /// 终极回退使用的静音引擎
    pub fn silent_engine(&self) -> Arc<dyn TtsEnginePort> {
        Arc::new(SilentTtsEngine::new(self.settings.silence.clone()))
    }
}

fn not_configured(setting: &str) -> TtsError {
    TtsError::ServiceError(format!("service URL not configured ({})", setting))
}

#[async_trait]
impl EngineFactoryPort for DefaultEngineFactory {
    async fn create(&self, kind: BackendKind) -> Result<Arc<dyn TtsEnginePort>, TtsError> {
        tracing::debug!(
            backend = %kind,
            model_load = kind.requires_model_load(),
            external_process = kind.requires_external_process(),
            "Initializing TTS backend"
        );

        let engine: Arc<dyn TtsEnginePort> = match kind {
            BackendKind::StreamingNeural => {
                let config = self
                    .settings
                    .streaming_neural
                    .clone()
                    .ok_or_else(|| not_configured("DOCVOX_STREAMING_NEURAL__URL"))?;
                Arc::new(StreamingNeuralClient::connect(config).await?)
            }
            BackendKind::BatchNeural => {
                let config = self
                    .settings
                    .batch_neural
                    .clone()
                    .ok_or_else(|| not_configured("DOCVOX_BATCH_NEURAL__URL"))?;
                Arc::new(BatchNeuralClient::connect(config).await?)
            }
            BackendKind::ExternalBinaryTts => {
                Arc::new(PiperTtsEngine::new(self.settings.piper.clone())?)
            }
            BackendKind::SystemTts => Arc::new(SystemTtsEngine::new(
                self.settings.system_program.as_deref(),
            )?),
            BackendKind::SilentFallback => self.silent_engine(),
        };

        Ok(engine)
    }
}
