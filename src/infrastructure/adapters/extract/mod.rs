//! Extract Adapters - 文档文本提取

mod file_text_extractor;
mod input_collector;
mod normalize;

pub use file_text_extractor::FileTextExtractor;
pub use input_collector::expand_inputs;
pub use normalize::{normalize_text, PARAGRAPH_BREAK};
