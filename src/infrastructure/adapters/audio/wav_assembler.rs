//! WAV Assembler - 增量写入单声道 16 位 WAV
//!
//! 写入同目录下的临时文件，`finish` 时 finalize 头部并原子重命名到最终路径；
//! sink 未 finish 就被丢弃时临时文件自动删除，最终路径不会出现半成品。

use hound::{SampleFormat, WavSpec, WavWriter};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempPath};

use crate::application::ports::{AssembleError, AssembledAudio, AudioAssemblerPort, AudioSink};
use crate::domain::{resample_linear, samples_from_le_bytes, PcmBuffer};

impl From<hound::Error> for AssembleError {
    fn from(err: hound::Error) -> Self {
        match err {
            hound::Error::IoError(e) => AssembleError::IoError(e.to_string()),
            other => AssembleError::EncodingError(other.to_string()),
        }
    }
}

/// WAV 组装器
#[derive(Debug, Clone)]
pub struct WavAssembler {
    /// 没有任何写入时容器使用的采样率
    default_sample_rate: u32,
}

impl WavAssembler {
    pub fn new(default_sample_rate: u32) -> Self {
        Self {
            default_sample_rate,
        }
    }
}

impl Default for WavAssembler {
    fn default() -> Self {
        Self::new(24000)
    }
}

impl AudioAssemblerPort for WavAssembler {
    fn create(&self, final_path: &Path) -> Result<Box<dyn AudioSink>, AssembleError> {
        let parent = final_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(parent)?;

        let (file, temp_path) = NamedTempFile::new_in(parent)?.into_parts();

        tracing::debug!(
            output = %final_path.display(),
            temp = %temp_path.display(),
            "WAV sink created"
        );

        Ok(Box::new(WavSink {
            final_path: final_path.to_path_buf(),
            state: SinkState::Pending(file),
            temp_path,
            default_sample_rate: self.default_sample_rate,
            carry: None,
            frames: 0,
        }))
    }
}

enum SinkState {
    /// 尚未写入，采样率未定
    Pending(File),
    Writing {
        writer: WavWriter<BufWriter<File>>,
        sample_rate: u32,
    },
    /// 只在状态转换的瞬间出现
    Poisoned,
}

/// 单个任务的 WAV 写入端
pub struct WavSink {
    final_path: PathBuf,
    // 先于 temp_path 释放，文件句柄关闭后才删除临时文件
    state: SinkState,
    temp_path: TempPath,
    default_sample_rate: u32,
    /// 上一块遗留的奇数字节
    carry: Option<u8>,
    frames: u64,
}

fn spec(sample_rate: u32) -> WavSpec {
    WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    }
}

impl WavSink {
    /// 按需打开 writer，返回容器采样率
    fn ensure_writer(&mut self, sample_rate: u32) -> Result<u32, AssembleError> {
        if let SinkState::Writing { sample_rate, .. } = &self.state {
            return Ok(*sample_rate);
        }

        match std::mem::replace(&mut self.state, SinkState::Poisoned) {
            SinkState::Pending(file) => {
                let writer = WavWriter::new(BufWriter::new(file), spec(sample_rate))?;
                tracing::debug!(sample_rate, "WAV container sample rate fixed");
                self.state = SinkState::Writing {
                    writer,
                    sample_rate,
                };
                Ok(sample_rate)
            }
            _ => Err(AssembleError::IoError(
                "WAV sink is in an invalid state".to_string(),
            )),
        }
    }

    fn write_samples(&mut self, sample_rate: u32, samples: &[i16]) -> Result<(), AssembleError> {
        if samples.is_empty() {
            return Ok(());
        }

        let target_rate = self.ensure_writer(sample_rate)?;
        let resampled;
        let samples = if sample_rate != target_rate {
            resampled = resample_linear(samples, sample_rate, target_rate);
            &resampled[..]
        } else {
            samples
        };

        let SinkState::Writing { writer, .. } = &mut self.state else {
            return Err(AssembleError::IoError(
                "WAV sink is in an invalid state".to_string(),
            ));
        };

        for sample in samples {
            writer.write_sample(*sample)?;
        }

        self.frames += samples.len() as u64;
        Ok(())
    }
}

impl AudioSink for WavSink {
    fn write_pcm(&mut self, sample_rate: u32, bytes: &[u8]) -> Result<(), AssembleError> {
        let mut joined;
        let mut data = bytes;
        if let Some(first) = self.carry.take() {
            joined = Vec::with_capacity(bytes.len() + 1);
            joined.push(first);
            joined.extend_from_slice(bytes);
            data = &joined;
        }

        if data.len() % 2 == 1 {
            self.carry = data.last().copied();
        }

        let samples = samples_from_le_bytes(data);
        self.write_samples(sample_rate, &samples)
    }

    fn write_buffer(&mut self, buffer: &PcmBuffer) -> Result<(), AssembleError> {
        if self.carry.take().is_some() {
            tracing::debug!("Dropping dangling PCM byte before buffer write");
        }
        self.write_samples(buffer.sample_rate, &buffer.samples)
    }

    fn finish(mut self: Box<Self>) -> Result<AssembledAudio, AssembleError> {
        if self.carry.take().is_some() {
            tracing::debug!("Dropping dangling PCM byte at end of stream");
        }

        let default_rate = self.default_sample_rate;
        let sample_rate = self.ensure_writer(default_rate)?;

        if let SinkState::Writing { writer, .. } =
            std::mem::replace(&mut self.state, SinkState::Poisoned)
        {
            writer.finalize()?;
        }

        let WavSink {
            final_path,
            temp_path,
            frames,
            ..
        } = *self;

        temp_path
            .persist(&final_path)
            .map_err(|e| AssembleError::IoError(e.to_string()))?;

        tracing::info!(
            output = %final_path.display(),
            sample_rate,
            frames,
            "WAV file written"
        );

        Ok(AssembledAudio {
            path: final_path,
            sample_rate,
            frames,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_wav(path: &Path) -> (WavSpec, Vec<i16>) {
        let mut reader = hound::WavReader::open(path).unwrap();
        let spec = reader.spec();
        let samples = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        (spec, samples)
    }

    fn le(samples: &[i16]) -> Vec<u8> {
        crate::domain::samples_to_le_bytes(samples)
    }

    #[test]
    fn test_final_path_appears_only_after_finish() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("book.wav");

        let mut sink = WavAssembler::default().create(&out).unwrap();
        sink.write_pcm(24000, &le(&[1, 2, 3])).unwrap();
        assert!(!out.exists());

        let audio = sink.finish().unwrap();
        assert!(out.exists());
        assert_eq!(audio.frames, 3);

        let (spec, samples) = read_wav(&out);
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(spec.sample_rate, 24000);
        assert_eq!(samples, vec![1, 2, 3]);
    }

    #[test]
    fn test_dropped_sink_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("book.wav");

        {
            let mut sink = WavAssembler::default().create(&out).unwrap();
            sink.write_pcm(24000, &le(&[5; 100])).unwrap();
        }

        assert!(!out.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_odd_length_chunks_are_rejoined() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("odd.wav");
        let bytes = le(&[100, -200, 300]);

        let mut sink = WavAssembler::default().create(&out).unwrap();
        sink.write_pcm(24000, &bytes[..1]).unwrap();
        sink.write_pcm(24000, &bytes[1..4]).unwrap();
        sink.write_pcm(24000, &bytes[4..]).unwrap();
        sink.finish().unwrap();

        let (_, samples) = read_wav(&out);
        assert_eq!(samples, vec![100, -200, 300]);
    }

    #[test]
    fn test_first_write_fixes_sample_rate() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("mixed.wav");

        let mut sink = WavAssembler::default().create(&out).unwrap();
        sink.write_buffer(&PcmBuffer::new(22050, vec![0; 22050]))
            .unwrap();
        sink.write_buffer(&PcmBuffer::new(44100, vec![0; 44100]))
            .unwrap();
        let audio = sink.finish().unwrap();

        assert_eq!(audio.sample_rate, 22050);
        assert_eq!(audio.frames, 44100);
        assert_eq!(audio.duration_ms(), 2000);
        assert_eq!(read_wav(&out).0.sample_rate, 22050);
    }

    #[test]
    fn test_empty_sink_produces_valid_wav() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested").join("empty.wav");

        let audio = WavAssembler::new(16000).create(&out).unwrap().finish().unwrap();
        assert_eq!(audio.frames, 0);

        let (spec, samples) = read_wav(&out);
        assert_eq!(spec.sample_rate, 16000);
        assert!(samples.is_empty());
    }
}
