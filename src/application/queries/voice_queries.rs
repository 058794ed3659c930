//! Voice Queries - 本地音色查询

/// 列出本地可用的 Piper 音色
#[derive(Debug, Clone, Copy, Default)]
pub struct ListPiperVoices;
