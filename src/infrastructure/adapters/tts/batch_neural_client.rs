//! Batch Neural Client - 较重的神经网络 TTS 服务客户端
//!
//! 模型只能整段生成，因此按片段逐个请求，
//! 每段返回一个 WAV，解码后重采样到首段采样率再拼接
//!
//! 推理服务 API:
//! POST {base_url}/api/tts/infer
//! Request: {"text": "...", "description": "...", "model": "..."}  (JSON)
//! Response: audio/wav binary

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use super::streaming_neural_client::map_request_error;
use crate::application::ports::{BatchRequest, TtsEnginePort, TtsError};
use crate::domain::{BackendKind, PcmBuffer};
use crate::infrastructure::adapters::audio::decode_wav;

/// TTS 推理请求体 (JSON)
#[derive(Debug, Serialize)]
struct InferHttpRequest<'a> {
    /// 要合成的文本
    text: &'a str,
    /// 风格描述（音色）
    description: &'a str,
    model: &'a str,
}

/// 批量神经网络客户端配置
#[derive(Debug, Clone)]
pub struct BatchNeuralClientConfig {
    /// 推理服务基础 URL
    pub base_url: String,
    /// 模型名称
    pub model: String,
    /// 未指定音色时的风格描述
    pub description: String,
    /// 单段请求超时（秒）
    pub timeout_secs: u64,
    /// 健康检查超时（秒）
    pub health_timeout_secs: u64,
}

impl Default for BatchNeuralClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8001".to_string(),
            model: "parler-tts/parler-tts-mini-multilingual".to_string(),
            description: "A clear, natural French voice with expressive, warm tone.".to_string(),
            timeout_secs: 300,
            health_timeout_secs: 5,
        }
    }
}

impl BatchNeuralClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// 批量神经网络 TTS 客户端
pub struct BatchNeuralClient {
    client: Client,
    config: BatchNeuralClientConfig,
}

impl BatchNeuralClient {
    pub fn new(config: BatchNeuralClientConfig) -> Result<Self, TtsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TtsError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// 创建客户端并确认模型已加载
    pub async fn connect(config: BatchNeuralClientConfig) -> Result<Self, TtsError> {
        let client = Self::new(config)?;
        let response = client
            .client
            .get(client.health_url())
            .timeout(Duration::from_secs(client.config.health_timeout_secs))
            .send()
            .await
            .map_err(map_request_error)?;

        if !response.status().is_success() {
            return Err(TtsError::ServiceError(format!(
                "Health check returned HTTP {}",
                response.status()
            )));
        }

        tracing::info!(
            url = %client.config.base_url,
            model = %client.config.model,
            "Batch neural TTS service ready"
        );
        Ok(client)
    }

    fn infer_url(&self) -> String {
        format!("{}/api/tts/infer", self.config.base_url.trim_end_matches('/'))
    }

    fn health_url(&self) -> String {
        format!("{}/health", self.config.base_url.trim_end_matches('/'))
    }

    /// 合成单个片段
    async fn infer_segment(&self, text: &str, description: &str) -> Result<PcmBuffer, TtsError> {
        let body = InferHttpRequest {
            text,
            description,
            model: &self.config.model,
        };

        let response = self
            .client
            .post(self.infer_url())
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

        let audio_data = response
            .bytes()
            .await
            .map_err(|e| TtsError::InvalidResponse(format!("Failed to read audio: {}", e)))?
            .to_vec();

        tokio::task::spawn_blocking(move || decode_wav(audio_data))
            .await
            .map_err(|e| TtsError::DecodeError(format!("Decode task failed: {}", e)))?
            .map_err(TtsError::from)
    }
}

#[async_trait]
impl TtsEnginePort for BatchNeuralClient {
    fn kind(&self) -> BackendKind {
        BackendKind::BatchNeural
    }

    async fn synthesize_batch(&self, request: &BatchRequest) -> Result<PcmBuffer, TtsError> {
        let description = request
            .params
            .voice
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(&self.config.description);

        let mut output = PcmBuffer::default();
        for (index, segment) in request.segments.iter().enumerate() {
            let buffer = self.infer_segment(segment, description).await?;
            if output.sample_rate != 0 && buffer.sample_rate != output.sample_rate {
                tracing::debug!(
                    segment = index + 1,
                    from = buffer.sample_rate,
                    to = output.sample_rate,
                    "Resampling segment to first segment rate"
                );
            }
            output.append(buffer);
            tracing::debug!(
                segment = index + 1,
                total = request.segments.len(),
                "Batch neural segment synthesized"
            );
        }

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = BatchNeuralClientConfig::default();
        assert_eq!(config.timeout_secs, 300);
        assert!(!config.description.is_empty());
    }

    #[test]
    fn test_urls() {
        let client =
            BatchNeuralClient::new(BatchNeuralClientConfig::new("http://cpu-box:8001/").with_timeout(30))
                .unwrap();
        assert_eq!(client.infer_url(), "http://cpu-box:8001/api/tts/infer");
        assert_eq!(client.config.timeout_secs, 30);
    }

    #[tokio::test]
    async fn test_connect_fails_without_service() {
        let mut config = BatchNeuralClientConfig::new("http://127.0.0.1:1").with_timeout(1);
        config.health_timeout_secs = 1;
        assert!(BatchNeuralClient::connect(config).await.is_err());
    }

    use crate::application::ports::SynthesisParams;
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    fn wav(sample_rate: u32, samples: &[i16]) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = std::io::Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for s in samples {
                writer.write_sample(*s).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    async fn read_body(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                return String::new();
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
                let len = head
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + len {
                    return String::from_utf8_lossy(&buf[end + 4..end + 4 + len]).into_owned();
                }
            }
        }
    }

    /// 本地假推理服务：按顺序为每个请求返回一个 WAV，记录请求体
    async fn fake_service(responses: Vec<Vec<u8>>) -> (String, Arc<Mutex<Vec<String>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let bodies = Arc::new(Mutex::new(Vec::new()));
        let seen = bodies.clone();

        tokio::spawn(async move {
            for audio in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                let body = read_body(&mut socket).await;
                seen.lock().unwrap().push(body);
                let head = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: audio/wav\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    audio.len()
                );
                socket.write_all(head.as_bytes()).await.unwrap();
                socket.write_all(&audio).await.unwrap();
                let _ = socket.shutdown().await;
            }
        });

        (format!("http://{}", addr), bodies)
    }

    #[tokio::test]
    async fn test_segments_resampled_to_first_segment_rate() {
        let (url, bodies) = fake_service(vec![
            wav(16000, &[1000; 1600]),
            wav(8000, &[-1000; 800]),
        ])
        .await;
        let client = BatchNeuralClient::new(BatchNeuralClientConfig::new(url)).unwrap();

        let request = BatchRequest {
            segments: vec!["Premier.".to_string(), "Second.".to_string()],
            params: SynthesisParams::default(),
        };
        let buffer = client.synthesize_batch(&request).await.unwrap();

        assert_eq!(buffer.sample_rate, 16000);
        // 8 kHz 的 800 帧重采样为 16 kHz 的 1600 帧
        assert_eq!(buffer.frames(), 3200);
        // 解码经 f32 往返，允许 1 的误差
        assert!((buffer.samples[0] - 1000).abs() <= 1);
        assert!((buffer.samples[3199] + 1000).abs() <= 1);

        let bodies = bodies.lock().unwrap();
        assert_eq!(bodies.len(), 2);
        assert!(bodies[0].contains("Premier."));
        assert!(bodies[1].contains("Second."));
    }
}
