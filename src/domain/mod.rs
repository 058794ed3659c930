//! Domain Layer - 领域层
//!
//! 纯逻辑，不依赖 I/O:
//! - text_segmenter: 文档文本分段
//! - backend: 后端变体与能力标记、解析顺序
//! - pcm: PCM 缓冲与重采样

mod backend;
mod pcm;
mod text_segmenter;

pub use backend::{
    BackendKind, BackendRequest, Capability, UnknownBackend, AUTO_PREFERENCE, EXPLICIT_FALLBACK,
};
pub use pcm::{
    f32_to_i16, resample_linear, samples_from_le_bytes, samples_to_le_bytes, PcmBuffer,
    BYTES_PER_SAMPLE,
};
pub use text_segmenter::{
    segment_text, with_sentence_terminator, SegmentConfig, Segments, DEFAULT_MAX_CHARS,
    MAX_MAX_CHARS, MIN_MAX_CHARS,
};
