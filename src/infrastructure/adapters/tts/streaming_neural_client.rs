//! Streaming Neural Client - 流式神经网络 TTS 推理服务客户端
//!
//! 实现 TtsEnginePort trait，通过 HTTP 调用推理服务，响应体按块惰性读取
//!
//! 推理服务 API:
//! GET  {base_url}/health                 模型加载完成后返回 2xx
//! POST {base_url}/v1/tts/stream
//! Request: {"prompt": "...", "voice": "...", "temperature": 0.7, "repetition_penalty": 1.15, "model": "..."}
//! Response: 16 位单声道小端 PCM（chunked），采样率见 `X-TTS-Sample-Rate` header

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use crate::application::ports::{PcmStream, SynthesisParams, TtsEnginePort, TtsError};
use crate::domain::BackendKind;

/// 流式推理请求体 (JSON)
#[derive(Debug, Serialize)]
struct StreamRequest<'a> {
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    voice: Option<&'a str>,
    temperature: f32,
    repetition_penalty: f32,
    model: &'a str,
}

/// 流式神经网络客户端配置
#[derive(Debug, Clone)]
pub struct StreamingNeuralClientConfig {
    /// 推理服务基础 URL
    pub base_url: String,
    /// 模型名称
    pub model: String,
    /// 默认采样温度
    pub temperature: f32,
    /// 默认重复惩罚
    pub repetition_penalty: f32,
    /// 服务未声明采样率时使用的采样率
    pub sample_rate: u32,
    /// 连接超时（秒）；流式响应本身不设总超时
    pub connect_timeout_secs: u64,
    /// 健康检查超时（秒）
    pub health_timeout_secs: u64,
}

impl Default for StreamingNeuralClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            model: "canopylabs/3b-fr-ft-research_release".to_string(),
            temperature: 0.7,
            repetition_penalty: 1.15,
            sample_rate: 24000,
            connect_timeout_secs: 10,
            health_timeout_secs: 5,
        }
    }
}

impl StreamingNeuralClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

/// 流式神经网络 TTS 客户端
pub struct StreamingNeuralClient {
    client: Client,
    config: StreamingNeuralClientConfig,
}

impl StreamingNeuralClient {
    /// 创建客户端（不访问网络）
    pub fn new(config: StreamingNeuralClientConfig) -> Result<Self, TtsError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| TtsError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// 创建客户端并确认服务已加载模型
    pub async fn connect(config: StreamingNeuralClientConfig) -> Result<Self, TtsError> {
        let client = Self::new(config)?;
        client.health_check().await?;
        tracing::info!(
            url = %client.config.base_url,
            model = %client.config.model,
            "Streaming neural TTS service ready"
        );
        Ok(client)
    }

    fn stream_url(&self) -> String {
        format!("{}/v1/tts/stream", self.config.base_url.trim_end_matches('/'))
    }

    fn health_url(&self) -> String {
        format!("{}/health", self.config.base_url.trim_end_matches('/'))
    }

    async fn health_check(&self) -> Result<(), TtsError> {
        let response = self
            .client
            .get(self.health_url())
            .timeout(Duration::from_secs(self.config.health_timeout_secs))
            .send()
            .await
            .map_err(map_request_error)?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(TtsError::ServiceError(format!(
                "Health check returned HTTP {}",
                response.status()
            )))
        }
    }
}

/// reqwest 错误归类
pub(super) fn map_request_error(e: reqwest::Error) -> TtsError {
    if e.is_timeout() {
        TtsError::Timeout
    } else if e.is_connect() {
        TtsError::NetworkError(format!("Cannot connect to TTS service: {}", e))
    } else {
        TtsError::NetworkError(e.to_string())
    }
}

#[async_trait]
impl TtsEnginePort for StreamingNeuralClient {
    fn kind(&self) -> BackendKind {
        BackendKind::StreamingNeural
    }

    async fn synthesize_stream(
        &self,
        text: &str,
        params: &SynthesisParams,
    ) -> Result<PcmStream, TtsError> {
        let body = StreamRequest {
            prompt: text,
            voice: params.voice.as_deref(),
            temperature: params.temperature.unwrap_or(self.config.temperature),
            repetition_penalty: params
                .repetition_penalty
                .unwrap_or(self.config.repetition_penalty),
            model: &self.config.model,
        };

        tracing::debug!(
            url = %self.stream_url(),
            text_len = text.len(),
            voice = ?body.voice,
            "Sending streaming TTS request"
        );

        let response = self
            .client
            .post(self.stream_url())
            .json(&body)
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(TtsError::ServiceError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let sample_rate = response
            .headers()
            .get("X-TTS-Sample-Rate")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .unwrap_or(self.config.sample_rate);

        let chunks = response
            .bytes_stream()
            .map(|chunk| {
                chunk
                    .map(|bytes| bytes.to_vec())
                    .map_err(|e| TtsError::InvalidResponse(format!("Stream interrupted: {}", e)))
            })
            .boxed();

        Ok(PcmStream {
            sample_rate,
            chunks,
        })
    }
}
