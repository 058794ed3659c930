//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod audio_sink;
mod audio_transcoder;
mod engine_probe;
mod text_extractor;
mod tts_engine;
mod voice_catalog;

pub use audio_sink::{AssembleError, AssembledAudio, AudioAssemblerPort, AudioSink};
pub use audio_transcoder::{AudioFormat, AudioTranscoderPort, Mp3EncoderPort, TranscodeError};
pub use engine_probe::{EngineFactoryPort, EngineProbePort, ProbeError};
pub use text_extractor::{
    is_supported_document, ExtractError, TextExtractorPort, SUPPORTED_EXTENSIONS,
};
pub use tts_engine::{
    BatchRequest, PcmChunkStream, PcmStream, SynthesisParams, TtsEnginePort, TtsError,
};
pub use voice_catalog::{CatalogError, PiperVoice, VoiceCatalogPort};
