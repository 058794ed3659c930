//! Audio Sink Port - 音频容器组装抽象
//!
//! 一次合成任务对应一个 sink：只追加写入，`finish` 恰好调用一次。
//! 写入期间最终路径不可见，`finish` 成功后才出现完整文件。

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::PcmBuffer;

/// 组装错误
#[derive(Debug, Error)]
pub enum AssembleError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}

impl From<std::io::Error> for AssembleError {
    fn from(err: std::io::Error) -> Self {
        AssembleError::IoError(err.to_string())
    }
}

/// 组装完成的音频文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledAudio {
    pub path: PathBuf,
    /// 容器声明的采样率
    pub sample_rate: u32,
    /// 写入的帧数
    pub frames: u64,
}

impl AssembledAudio {
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        self.frames * 1000 / self.sample_rate as u64
    }
}

/// 单个任务的音频写入端
pub trait AudioSink: Send {
    /// 追加 16 位单声道小端 PCM 字节
    ///
    /// 容器采样率由第一次写入决定，之后采样率不同的数据会先重采样
    fn write_pcm(&mut self, sample_rate: u32, bytes: &[u8]) -> Result<(), AssembleError>;

    /// 追加完整缓冲
    fn write_buffer(&mut self, buffer: &PcmBuffer) -> Result<(), AssembleError>;

    /// 收尾并把文件暴露到最终路径
    fn finish(self: Box<Self>) -> Result<AssembledAudio, AssembleError>;
}

/// Audio Assembler Port
pub trait AudioAssemblerPort: Send + Sync {
    /// 为最终路径创建一个新的写入端
    fn create(&self, final_path: &Path) -> Result<Box<dyn AudioSink>, AssembleError>;
}
