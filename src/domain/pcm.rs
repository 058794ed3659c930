//! PCM 音频缓冲
//!
//! 单声道 16 位有符号小端 PCM

/// 每个采样的字节数（16 位）
pub const BYTES_PER_SAMPLE: usize = 2;

/// 单声道 PCM 缓冲
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PcmBuffer {
    /// 采样率（Hz）
    pub sample_rate: u32,
    /// 采样数据
    pub samples: Vec<i16>,
}

impl PcmBuffer {
    pub fn new(sample_rate: u32, samples: Vec<i16>) -> Self {
        Self {
            sample_rate,
            samples,
        }
    }

    /// 帧数（单声道下等于采样数）
    pub fn frames(&self) -> usize {
        self.samples.len()
    }

    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        (self.samples.len() as u64 * 1000) / self.sample_rate as u64
    }

    /// 追加另一段音频，采样率不一致时先重采样到当前采样率
    pub fn append(&mut self, other: PcmBuffer) {
        if self.samples.is_empty() && self.sample_rate == 0 {
            *self = other;
            return;
        }
        if other.sample_rate == self.sample_rate {
            self.samples.extend(other.samples);
        } else {
            self.samples.extend(resample_linear(
                &other.samples,
                other.sample_rate,
                self.sample_rate,
            ));
        }
    }

    pub fn to_le_bytes(&self) -> Vec<u8> {
        samples_to_le_bytes(&self.samples)
    }
}

/// 小端字节转采样（末尾不足一个采样的字节被忽略）
pub fn samples_from_le_bytes(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(BYTES_PER_SAMPLE)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}

pub fn samples_to_le_bytes(samples: &[i16]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * BYTES_PER_SAMPLE);
    for sample in samples {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    bytes
}

/// f32 采样转 i16（截断到 [-1, 1]）
#[inline]
pub fn f32_to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * 32767.0) as i16
}

/// 简单线性重采样
///
/// 目标位置按比例映射回源索引，在相邻两个源采样之间线性插值
pub fn resample_linear(samples: &[i16], from_rate: u32, to_rate: u32) -> Vec<i16> {
    if from_rate == to_rate || samples.is_empty() || from_rate == 0 || to_rate == 0 {
        return samples.to_vec();
    }

    let ratio = to_rate as f64 / from_rate as f64;
    let frame_count = samples.len();
    let new_frame_count = ((frame_count as f64) * ratio) as usize;
    let mut resampled = Vec::with_capacity(new_frame_count);

    for i in 0..new_frame_count {
        let src_pos = i as f64 / ratio;
        let src_idx = (src_pos as usize).min(frame_count - 1);
        let frac = src_pos - src_idx as f64;

        let s0 = samples[src_idx] as f64;
        let s1 = samples[(src_idx + 1).min(frame_count - 1)] as f64;

        let value = s0 + (s1 - s0) * frac;
        resampled.push(value.round().clamp(i16::MIN as f64, i16::MAX as f64) as i16);
    }

    resampled
}
