//! Voice Adapters - 本地音色目录

mod piper_voice_catalog;

pub use piper_voice_catalog::{parse_voice_file, PiperVoiceCatalog};
