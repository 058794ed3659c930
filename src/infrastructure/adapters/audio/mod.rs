//! Audio Adapters - WAV 解码与组装

mod audio_decoder;
mod wav_assembler;

pub use audio_decoder::{decode_wav, decode_wav_file, DecodeError};
pub use wav_assembler::{WavAssembler, WavSink};
