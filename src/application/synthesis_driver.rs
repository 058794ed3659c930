//! Synthesis Driver - 驱动引擎生成音频并写入 sink
//!
//! 按后端能力选择协议：
//! - 流式：逐个片段请求音频流，每个字节块写入 sink 后才拉取下一块，
//!   当前片段的流耗尽后才请求下一个片段（内存中最多一个块）
//! - 批量：所有片段补全句末标点后一次性交给引擎

use futures_util::StreamExt;

use crate::application::error::SynthesisError;
use crate::application::ports::{AudioSink, BatchRequest, SynthesisParams, TtsEnginePort};
use crate::domain::{with_sentence_terminator, Capability};

/// 驱动统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriveReport {
    /// 提交给引擎的片段数
    pub segments: usize,
    /// 写入 sink 的块数（批量模式为 1）
    pub chunks: usize,
}

/// 合成驱动器
pub struct SynthesisDriver;

impl SynthesisDriver {
    /// 把片段合成为音频写入 `sink`
    pub async fn drive(
        engine: &dyn TtsEnginePort,
        segments: &[String],
        params: &SynthesisParams,
        sink: &mut dyn AudioSink,
    ) -> Result<DriveReport, SynthesisError> {
        match engine.kind().capability() {
            Capability::Streaming => Self::drive_stream(engine, segments, params, sink).await,
            Capability::BatchOnly => Self::drive_batch(engine, segments, params, sink).await,
        }
    }

    async fn drive_stream(
        engine: &dyn TtsEnginePort,
        segments: &[String],
        params: &SynthesisParams,
        sink: &mut dyn AudioSink,
    ) -> Result<DriveReport, SynthesisError> {
        let backend = engine.kind();
        let mut report = DriveReport::default();

        for (index, segment) in segments.iter().enumerate() {
            if segment.trim().is_empty() {
                continue;
            }
            let text = with_sentence_terminator(segment);

            tracing::debug!(
                backend = %backend,
                segment = index + 1,
                total = segments.len(),
                chars = text.chars().count(),
                "Synthesizing segment"
            );

            let mut stream = engine
                .synthesize_stream(&text, params)
                .await
                .map_err(|e| SynthesisError::from_tts(backend, e))?;

            while let Some(chunk) = stream.chunks.next().await {
                let chunk = chunk.map_err(|e| SynthesisError::from_tts(backend, e))?;
                sink.write_pcm(stream.sample_rate, &chunk)?;
                report.chunks += 1;
            }

            report.segments += 1;
            tracing::info!(
                backend = %backend,
                segment = index + 1,
                total = segments.len(),
                "Segment synthesized"
            );
        }

        Ok(report)
    }

    async fn drive_batch(
        engine: &dyn TtsEnginePort,
        segments: &[String],
        params: &SynthesisParams,
        sink: &mut dyn AudioSink,
    ) -> Result<DriveReport, SynthesisError> {
        let backend = engine.kind();
        let request = BatchRequest {
            segments: segments
                .iter()
                .filter(|s| !s.trim().is_empty())
                .map(|s| with_sentence_terminator(s).into_owned())
                .collect(),
            params: params.clone(),
        };

        tracing::info!(
            backend = %backend,
            segments = request.segments.len(),
            "Running batch synthesis"
        );

        let buffer = engine
            .synthesize_batch(&request)
            .await
            .map_err(|e| SynthesisError::from_tts(backend, e))?;
        sink.write_buffer(&buffer)?;

        tracing::info!(
            backend = %backend,
            sample_rate = buffer.sample_rate,
            duration_ms = buffer.duration_ms(),
            "Batch synthesis completed"
        );

        Ok(DriveReport {
            segments: request.segments.len(),
            chunks: 1,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use futures_util::stream;
    use std::sync::Mutex;

    use crate::application::ports::{AssembleError, AssembledAudio, PcmStream, TtsError};
    use crate::domain::{samples_from_le_bytes, BackendKind, PcmBuffer};

    /// 记录调用顺序的假引擎
    struct ScriptedEngine {
        kind: BackendKind,
        calls: Mutex<Vec<String>>,
        fail_on: Option<String>,
    }

    impl ScriptedEngine {
        fn new(kind: BackendKind) -> Self {
            Self {
                kind,
                calls: Mutex::new(Vec::new()),
                fail_on: None,
            }
        }
    }

    #[async_trait]
    impl TtsEnginePort for ScriptedEngine {
        fn kind(&self) -> BackendKind {
            self.kind
        }

        async fn synthesize_stream(
            &self,
            text: &str,
            _params: &SynthesisParams,
        ) -> Result<PcmStream, TtsError> {
            self.calls.lock().unwrap().push(text.to_string());
            if self.fail_on.as_deref() == Some(text) {
                return Err(TtsError::ServiceError("boom".into()));
            }
            let tag = self.calls.lock().unwrap().len() as i16;
            let chunks: Vec<Result<Vec<u8>, TtsError>> = (0..3)
                .map(|i| Ok((tag * 10 + i).to_le_bytes().to_vec()))
                .collect();
            Ok(PcmStream {
                sample_rate: 24000,
                chunks: stream::iter(chunks).boxed(),
            })
        }

        async fn synthesize_batch(&self, request: &BatchRequest) -> Result<PcmBuffer, TtsError> {
            self.calls.lock().unwrap().push(request.text());
            Ok(PcmBuffer::new(22050, vec![1; 100]))
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        writes: Vec<(u32, Vec<u8>)>,
    }

    impl AudioSink for RecordingSink {
        fn write_pcm(&mut self, sample_rate: u32, bytes: &[u8]) -> Result<(), AssembleError> {
            self.writes.push((sample_rate, bytes.to_vec()));
            Ok(())
        }

        fn write_buffer(&mut self, buffer: &PcmBuffer) -> Result<(), AssembleError> {
            self.writes.push((buffer.sample_rate, buffer.to_le_bytes()));
            Ok(())
        }

        fn finish(self: Box<Self>) -> Result<AssembledAudio, AssembleError> {
            unreachable!("not used by the driver")
        }
    }

    fn segments(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_streaming_preserves_segment_and_chunk_order() {
        let engine = ScriptedEngine::new(BackendKind::StreamingNeural);
        let mut sink = RecordingSink::default();

        let report = SynthesisDriver::drive(
            &engine,
            &segments(&["First part", "Second part!"]),
            &SynthesisParams::default(),
            &mut sink,
        )
        .await
        .unwrap();

        assert_eq!(report, DriveReport { segments: 2, chunks: 6 });
        assert_eq!(
            *engine.calls.lock().unwrap(),
            vec!["First part.".to_string(), "Second part!".to_string()]
        );

        let samples: Vec<i16> = sink
            .writes
            .iter()
            .flat_map(|(_, bytes)| samples_from_le_bytes(bytes))
            .collect();
        assert_eq!(samples, vec![10, 11, 12, 20, 21, 22]);
        assert!(sink.writes.iter().all(|(rate, _)| *rate == 24000));
    }

    #[tokio::test]
    async fn test_batch_invokes_engine_once_with_joined_text() {
        let engine = ScriptedEngine::new(BackendKind::ExternalBinaryTts);
        let mut sink = RecordingSink::default();

        let report = SynthesisDriver::drive(
            &engine,
            &segments(&["Hello world", "How are you?", "Fine: thanks"]),
            &SynthesisParams::default(),
            &mut sink,
        )
        .await
        .unwrap();

        assert_eq!(report.segments, 3);
        assert_eq!(
            *engine.calls.lock().unwrap(),
            vec!["Hello world. How are you? Fine: thanks.".to_string()]
        );
        assert_eq!(sink.writes.len(), 1);
        assert_eq!(sink.writes[0].0, 22050);
    }

    #[tokio::test]
    async fn test_stream_failure_is_fatal_and_stops() {
        let mut engine = ScriptedEngine::new(BackendKind::StreamingNeural);
        engine.fail_on = Some("Second.".to_string());
        let mut sink = RecordingSink::default();

        let err = SynthesisDriver::drive(
            &engine,
            &segments(&["First", "Second", "Third"]),
            &SynthesisParams::default(),
            &mut sink,
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            SynthesisError::Synthesis {
                backend: BackendKind::StreamingNeural,
                ..
            }
        ));
        assert_eq!(engine.calls.lock().unwrap().len(), 2);
        assert_eq!(sink.writes.len(), 3);
    }
}
