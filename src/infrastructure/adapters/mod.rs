//! Infrastructure Adapters
//!
//! 六边形架构的适配器实现

pub mod audio;
pub mod engines;
pub mod extract;
pub mod process;
pub mod transcoder;
pub mod tts;
pub mod voices;

pub use audio::*;
pub use engines::*;
pub use extract::*;
pub use transcoder::*;
pub use tts::*;
pub use voices::*;
