//! TTS Adapters - 各后端变体的引擎实现

mod batch_neural_client;
mod piper_tts;
mod silent_tts;
mod streaming_neural_client;
mod system_tts;

pub use batch_neural_client::{BatchNeuralClient, BatchNeuralClientConfig};
pub use piper_tts::{default_piper_bin, PiperConfig, PiperTtsEngine};
pub use silent_tts::{SilenceConfig, SilentTtsEngine};
pub use streaming_neural_client::{StreamingNeuralClient, StreamingNeuralClientConfig};
pub use system_tts::{detect_system_voice, SystemTtsEngine, SystemVoiceProgram};
