//! Synthesis Command Handlers
//!
//! 单个任务的完整流程：提取 → 分段 → 解析后端 → 驱动合成 → 组装 → 转码

use std::sync::Arc;
use uuid::Uuid;

use crate::application::commands::synthesize_commands::*;
use crate::application::engine_resolver::EngineCache;
use crate::application::error::SynthesisError;
use crate::application::ports::{AudioAssemblerPort, AudioTranscoderPort, TextExtractorPort};
use crate::application::synthesis_driver::SynthesisDriver;
use crate::domain::{segment_text, BackendKind, SegmentConfig, MAX_MAX_CHARS, MIN_MAX_CHARS};

/// 批量神经网络后端的默认片段上限
pub const DEFAULT_BATCH_NEURAL_MAX_CHARS: usize = 300;

/// SynthesizeDocument Handler
pub struct SynthesizeDocumentHandler {
    extractor: Arc<dyn TextExtractorPort>,
    engines: Arc<EngineCache>,
    assembler: Arc<dyn AudioAssemblerPort>,
    transcoder: Arc<dyn AudioTranscoderPort>,
    batch_neural_max_chars: usize,
}

impl SynthesizeDocumentHandler {
    pub fn new(
        extractor: Arc<dyn TextExtractorPort>,
        engines: Arc<EngineCache>,
        assembler: Arc<dyn AudioAssemblerPort>,
        transcoder: Arc<dyn AudioTranscoderPort>,
    ) -> Self {
        Self {
            extractor,
            engines,
            assembler,
            transcoder,
            batch_neural_max_chars: DEFAULT_BATCH_NEURAL_MAX_CHARS,
        }
    }

    /// 批量神经网络后端逐段合成，片段需要更短
    pub fn with_batch_neural_max_chars(mut self, max_chars: usize) -> Self {
        self.batch_neural_max_chars = max_chars.max(1);
        self
    }

    fn chunk_budget(&self, backend: BackendKind, max_chars: usize) -> usize {
        if backend == BackendKind::BatchNeural {
            max_chars.min(self.batch_neural_max_chars)
        } else {
            max_chars
        }
    }

    pub async fn handle(
        &self,
        cmd: SynthesizeDocument,
    ) -> Result<SynthesizeDocumentResponse, SynthesisError> {
        let job_id = Uuid::new_v4();

        if !SegmentConfig::new(cmd.max_chars).is_within_bounds() {
            return Err(SynthesisError::configuration(format!(
                "max_chars must be between {} and {}, got {}",
                MIN_MAX_CHARS, MAX_MAX_CHARS, cmd.max_chars
            )));
        }

        tracing::info!(
            job_id = %job_id,
            path = %cmd.path.display(),
            requested = %cmd.backend,
            "Starting document synthesis"
        );

        let text = self.extractor.extract(&cmd.path).await?;
        if text.trim().is_empty() {
            return Err(SynthesisError::EmptyInput { path: cmd.path });
        }

        let resolved = self.engines.get(cmd.backend).await;

        let budget = self.chunk_budget(resolved.kind, cmd.max_chars);
        let segments: Vec<String> = segment_text(&text, &SegmentConfig::new(budget)).collect();
        if segments.is_empty() {
            return Err(SynthesisError::EmptyInput { path: cmd.path });
        }

        tracing::info!(
            job_id = %job_id,
            backend = %resolved.kind,
            segments = segments.len(),
            max_chars = budget,
            "Document segmented"
        );

        let stem = cmd
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| job_id.to_string());
        let wav_path = cmd.output_dir.join(format!("{}.wav", stem));

        // 出错时 sink 被丢弃，临时文件随之删除
        let mut sink = self.assembler.create(&wav_path)?;
        let report =
            SynthesisDriver::drive(resolved.engine.as_ref(), &segments, &cmd.params, sink.as_mut())
                .await?;
        let audio = sink.finish()?;

        let output_path = self.transcoder.convert(&audio.path, cmd.audio_format).await;

        tracing::info!(
            job_id = %job_id,
            backend = %resolved.kind,
            segments = report.segments,
            duration_ms = audio.duration_ms(),
            output = %output_path.display(),
            "Document synthesis completed"
        );

        Ok(SynthesizeDocumentResponse {
            job_id,
            output_path,
            requested: cmd.backend,
            backend: resolved.kind,
            fallback: resolved.is_fallback(),
            segments: report.segments,
            duration_ms: audio.duration_ms(),
        })
    }
}
