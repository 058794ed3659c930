//! MP3 Transcoder - WAV → MP3
//!
//! 依次尝试编码策略：
//! - LAME 库编码（mp3lame-encoder）
//! - 外部 ffmpeg
//!
//! 任一成功即删除原 WAV；全部失败时保留 WAV 并返回其路径

use async_trait::async_trait;
use mp3lame_encoder::{Bitrate, Builder, FlushNoGap, MonoPcm};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::application::ports::{AudioFormat, AudioTranscoderPort, Mp3EncoderPort, TranscodeError};
use crate::infrastructure::adapters::process::{resolve_program, run_program, ProcessError};

/// LAME 支持的恒定码率（kbps）
pub const SUPPORTED_MP3_BITRATES: &[u32] = &[
    8, 16, 24, 32, 40, 48, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320,
];

/// kbps 转 LAME 码率档位
fn lame_bitrate(kbps: u32) -> Option<Bitrate> {
    let bitrate = match kbps {
        8 => Bitrate::Kbps8,
        16 => Bitrate::Kbps16,
        24 => Bitrate::Kbps24,
        32 => Bitrate::Kbps32,
        40 => Bitrate::Kbps40,
        48 => Bitrate::Kbps48,
        64 => Bitrate::Kbps64,
        80 => Bitrate::Kbps80,
        96 => Bitrate::Kbps96,
        112 => Bitrate::Kbps112,
        128 => Bitrate::Kbps128,
        160 => Bitrate::Kbps160,
        192 => Bitrate::Kbps192,
        224 => Bitrate::Kbps224,
        256 => Bitrate::Kbps256,
        320 => Bitrate::Kbps320,
        _ => return None,
    };
    Some(bitrate)
}

/// LAME 库编码
pub struct LameMp3Encoder {
    bitrate_kbps: u32,
}

impl LameMp3Encoder {
    pub fn new(bitrate_kbps: u32) -> Self {
        Self { bitrate_kbps }
    }

    fn encode_blocking(wav_path: &Path, mp3_path: &Path, kbps: u32) -> Result<(), TranscodeError> {
        let mut reader = hound::WavReader::open(wav_path)
            .map_err(|e| TranscodeError::DecodingError(e.to_string()))?;
        let spec = reader.spec();
        if spec.channels != 1 || spec.bits_per_sample != 16 {
            return Err(TranscodeError::InvalidInput(format!(
                "Expected 16-bit mono WAV, got {} channel(s) at {} bits",
                spec.channels, spec.bits_per_sample
            )));
        }

        let samples = reader
            .samples::<i16>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| TranscodeError::DecodingError(e.to_string()))?;

        let mut builder = Builder::new()
            .ok_or_else(|| TranscodeError::Unavailable("LAME builder allocation failed".into()))?;
        builder
            .set_num_channels(1)
            .map_err(|e| TranscodeError::EncodingError(format!("{:?}", e)))?;
        builder
            .set_sample_rate(spec.sample_rate)
            .map_err(|e| TranscodeError::EncodingError(format!("{:?}", e)))?;
        builder
            .set_brate(lame_bitrate(kbps).ok_or_else(|| {
                TranscodeError::InvalidInput(format!("unsupported MP3 bitrate: {} kbps", kbps))
            })?)
            .map_err(|e| TranscodeError::EncodingError(format!("{:?}", e)))?;
        let mut encoder = builder
            .build()
            .map_err(|e| TranscodeError::EncodingError(format!("{:?}", e)))?;

        let mut mp3 = Vec::with_capacity(mp3lame_encoder::max_required_buffer_size(samples.len()));
        encoder
            .encode_to_vec(MonoPcm(&samples), &mut mp3)
            .map_err(|e| TranscodeError::EncodingError(format!("{:?}", e)))?;
        encoder
            .flush_to_vec::<FlushNoGap>(&mut mp3)
            .map_err(|e| TranscodeError::EncodingError(format!("{:?}", e)))?;

        std::fs::write(mp3_path, &mp3)?;
        Ok(())
    }
}

#[async_trait]
impl Mp3EncoderPort for LameMp3Encoder {
    fn name(&self) -> &'static str {
        "lame"
    }

    async fn encode(&self, wav_path: &Path, mp3_path: &Path) -> Result<(), TranscodeError> {
        let wav = wav_path.to_path_buf();
        let mp3 = mp3_path.to_path_buf();
        let kbps = self.bitrate_kbps;
        tokio::task::spawn_blocking(move || Self::encode_blocking(&wav, &mp3, kbps))
            .await
            .map_err(|e| TranscodeError::EncodingError(format!("Encode task failed: {}", e)))?
    }
}

/// 外部 ffmpeg 转码
pub struct FfmpegMp3Encoder {
    bin: String,
    bitrate_kbps: u32,
}

impl FfmpegMp3Encoder {
    pub fn new(bin: impl Into<String>, bitrate_kbps: u32) -> Self {
        Self {
            bin: bin.into(),
            bitrate_kbps,
        }
    }

    fn args(&self, wav_path: &Path, mp3_path: &Path) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-i".to_string(),
            wav_path.to_string_lossy().into_owned(),
            "-b:a".to_string(),
            format!("{}k", self.bitrate_kbps),
            mp3_path.to_string_lossy().into_owned(),
        ]
    }
}

#[async_trait]
impl Mp3EncoderPort for FfmpegMp3Encoder {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    async fn encode(&self, wav_path: &Path, mp3_path: &Path) -> Result<(), TranscodeError> {
        let program = resolve_program(&self.bin)
            .ok_or_else(|| TranscodeError::Unavailable(format!("{} not found", self.bin)))?;

        run_program(&program, &self.args(wav_path, mp3_path), None)
            .await
            .map_err(|e| match e {
                ProcessError::Spawn(err) => TranscodeError::IoError(err.to_string()),
                ProcessError::Failed { status, stderr } => {
                    TranscodeError::EncodingError(format!("ffmpeg exited with {}: {}", status, stderr))
                }
            })
    }
}

/// MP3 转码器
pub struct Mp3Transcoder {
    encoders: Vec<Arc<dyn Mp3EncoderPort>>,
}

impl Mp3Transcoder {
    /// 按给定顺序尝试编码器
    pub fn new(encoders: Vec<Arc<dyn Mp3EncoderPort>>) -> Self {
        Self { encoders }
    }

    /// LAME 优先，ffmpeg 兜底
    pub fn with_defaults(ffmpeg_bin: impl Into<String>, bitrate_kbps: u32) -> Self {
        Self::new(vec![
            Arc::new(LameMp3Encoder::new(bitrate_kbps)),
            Arc::new(FfmpegMp3Encoder::new(ffmpeg_bin, bitrate_kbps)),
        ])
    }
}

#[async_trait]
impl AudioTranscoderPort for Mp3Transcoder {
    async fn convert(&self, wav_path: &Path, format: AudioFormat) -> PathBuf {
        if format == AudioFormat::Wav {
            return wav_path.to_path_buf();
        }

        let mp3_path = wav_path.with_extension(format.extension());

        for encoder in &self.encoders {
            match encoder.encode(wav_path, &mp3_path).await {
                Ok(()) => {
                    if let Err(e) = tokio::fs::remove_file(wav_path).await {
                        tracing::warn!(path = %wav_path.display(), error = %e, "Failed to remove intermediate WAV");
                    }
                    tracing::info!(encoder = encoder.name(), output = %mp3_path.display(), "MP3 conversion completed");
                    return mp3_path;
                }
                Err(e) => {
                    tracing::warn!(encoder = encoder.name(), error = %e, "MP3 encoder failed");
                    let _ = tokio::fs::remove_file(&mp3_path).await;
                }
            }
        }

        tracing::warn!(
            output = %wav_path.display(),
            "MP3 conversion unavailable, keeping WAV output"
        );
        wav_path.to_path_buf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FailingEncoder(AtomicUsize);

    #[async_trait]
    impl Mp3EncoderPort for FailingEncoder {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn encode(&self, _wav: &Path, mp3: &Path) -> Result<(), TranscodeError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            // 留下半成品，转码器应清理
            std::fs::write(mp3, b"partial")?;
            Err(TranscodeError::Unavailable("no encoder".into()))
        }
    }

    struct CopyEncoder;

    #[async_trait]
    impl Mp3EncoderPort for CopyEncoder {
        fn name(&self) -> &'static str {
            "copy"
        }

        async fn encode(&self, wav: &Path, mp3: &Path) -> Result<(), TranscodeError> {
            std::fs::copy(wav, mp3)?;
            Ok(())
        }
    }

    fn write_wav(path: &Path, sample_rate: u32, frames: usize) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for i in 0..frames {
            writer.write_sample(((i % 50) as i16 - 25) * 400).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[tokio::test]
    async fn test_wav_format_is_passthrough() {
        let transcoder = Mp3Transcoder::new(vec![]);
        let path = Path::new("/tmp/out.wav");
        assert_eq!(transcoder.convert(path, AudioFormat::Wav).await, path);
    }

    #[tokio::test]
    async fn test_all_encoders_failing_keeps_wav() {
        let dir = tempfile::tempdir().unwrap();
        let wav = dir.path().join("book.wav");
        write_wav(&wav, 24000, 2400);

        let first = Arc::new(FailingEncoder(AtomicUsize::new(0)));
        let second = Arc::new(FailingEncoder(AtomicUsize::new(0)));
        let encoders: Vec<Arc<dyn Mp3EncoderPort>> = vec![first.clone(), second.clone()];
        let transcoder = Mp3Transcoder::new(encoders);

        let out = transcoder.convert(&wav, AudioFormat::Mp3).await;
        assert_eq!(out, wav);
        assert!(wav.exists());
        assert!(!dir.path().join("book.mp3").exists());
        assert_eq!(first.0.load(Ordering::SeqCst), 1);
        assert_eq!(second.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fallback_encoder_success_removes_wav() {
        let dir = tempfile::tempdir().unwrap();
        let wav = dir.path().join("book.wav");
        write_wav(&wav, 24000, 2400);

        let transcoder = Mp3Transcoder::new(vec![
            Arc::new(FailingEncoder(AtomicUsize::new(0))),
            Arc::new(CopyEncoder),
        ]);

        let out = transcoder.convert(&wav, AudioFormat::Mp3).await;
        assert_eq!(out, dir.path().join("book.mp3"));
        assert!(out.exists());
        assert!(!wav.exists());
    }

    #[tokio::test]
    async fn test_lame_encodes_mono_wav() {
        let dir = tempfile::tempdir().unwrap();
        let wav = dir.path().join("speech.wav");
        let mp3 = dir.path().join("speech.mp3");
        write_wav(&wav, 24000, 24000);

        LameMp3Encoder::new(128).encode(&wav, &mp3).await.unwrap();
        let size = std::fs::metadata(&mp3).unwrap().len();
        assert!(size > 0);
    }

    #[test]
    fn test_every_supported_bitrate_maps_to_lame() {
        for kbps in SUPPORTED_MP3_BITRATES {
            assert_eq!(lame_bitrate(*kbps).map(|b| b as u32), Some(*kbps));
        }
        assert!(lame_bitrate(100).is_none());
    }

    #[tokio::test]
    async fn test_unsupported_bitrate_is_rejected_not_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let wav = dir.path().join("book.wav");
        write_wav(&wav, 24000, 2400);

        let err = LameMp3Encoder::new(100)
            .encode(&wav, &dir.path().join("book.mp3"))
            .await
            .unwrap_err();
        assert!(matches!(err, TranscodeError::InvalidInput(_)));
    }

    #[test]
    fn test_ffmpeg_args() {
        let encoder = FfmpegMp3Encoder::new("ffmpeg", 128);
        let args = encoder.args(Path::new("a.wav"), Path::new("a.mp3"));
        assert_eq!(args, vec!["-y", "-i", "a.wav", "-b:a", "128k", "a.mp3"]);
    }

    #[tokio::test]
    async fn test_missing_ffmpeg_is_unavailable() {
        let encoder = FfmpegMp3Encoder::new("/nonexistent/ffmpeg", 128);
        let err = encoder
            .encode(Path::new("a.wav"), Path::new("a.mp3"))
            .await
            .unwrap_err();
        assert!(matches!(err, TranscodeError::Unavailable(_)));
    }
}
