//! Engine Adapters - 后端探测与引擎构造

mod engine_factory;
mod engine_probes;

pub use engine_factory::DefaultEngineFactory;
pub use engine_probes::{ConfiguredEngineProbes, EngineSettings};
