//! Transcoder Adapter - 输出格式转换

mod mp3_transcoder;

pub use mp3_transcoder::{
    FfmpegMp3Encoder, LameMp3Encoder, Mp3Transcoder, SUPPORTED_MP3_BITRATES,
};
