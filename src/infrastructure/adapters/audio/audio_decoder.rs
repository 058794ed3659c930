//! 基于 symphonia 的 WAV 解码
//!
//! 批量后端（推理服务、Piper、系统语音）都返回 WAV，
//! 这里统一解码为单声道 16 位 PCM 缓冲

use std::io::Cursor;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use thiserror::Error;

use crate::application::ports::TtsError;
use crate::domain::{f32_to_i16, PcmBuffer};

#[derive(Debug, Error)]
#[error("{0}")]
pub struct DecodeError(String);

impl From<DecodeError> for TtsError {
    fn from(err: DecodeError) -> Self {
        TtsError::DecodeError(err.0)
    }
}

/// 解码内存中的 WAV，多声道取平均混为单声道
pub fn decode_wav(data: Vec<u8>) -> Result<PcmBuffer, DecodeError> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(data)), Default::default());

    let mut hint = Hint::new();
    hint.with_extension("wav");

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| DecodeError(format!("Probe failed: {}", e)))?;

    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| DecodeError("No audio track found".to_string()))?;

    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| DecodeError("Unknown sample rate".to_string()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| DecodeError(format!("Decoder creation failed: {}", e)))?;

    let track_id = track.id;
    let mut samples: Vec<i16> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(symphonia::core::errors::Error::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(DecodeError(format!("Packet read error: {}", e))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!("Decode error (skipping packet): {}", e);
                continue;
            }
        };

        let spec = *decoded.spec();
        let num_frames = decoded.frames();
        let channels = spec.channels.count().max(1);
        let mut sample_buf = SampleBuffer::<f32>::new(num_frames as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);

        let interleaved = &sample_buf.samples()[..num_frames * channels];
        samples.extend(interleaved.chunks_exact(channels).map(|frame| {
            let mixed = frame.iter().sum::<f32>() / channels as f32;
            f32_to_i16(mixed)
        }));
    }

    Ok(PcmBuffer::new(sample_rate, samples))
}

/// 读取并解码 WAV 文件（在阻塞线程中执行）
pub async fn decode_wav_file(path: &Path) -> Result<PcmBuffer, TtsError> {
    let data = tokio::fs::read(path).await?;
    tokio::task::spawn_blocking(move || decode_wav(data))
        .await
        .map_err(|e| TtsError::DecodeError(format!("Decode task failed: {}", e)))?
        .map_err(TtsError::from)
}
