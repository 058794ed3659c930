//! Voice Query Handlers

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::application::ports::{CatalogError, PiperVoice, VoiceCatalogPort};
use crate::application::queries::ListPiperVoices;

// ============================================================================
// Response DTOs
// ============================================================================

/// 单个语言下的音色
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageVoices {
    pub code: String,
    pub count: usize,
    pub voices: Vec<PiperVoice>,
}

/// 音色目录（按语言代码排序）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PiperVoiceCatalogResponse {
    pub languages: Vec<LanguageVoices>,
}

impl PiperVoiceCatalogResponse {
    /// 按语言分组，组内按 (名称, 质量) 忽略大小写排序
    pub fn from_voices(voices: Vec<PiperVoice>) -> Self {
        let mut by_code: BTreeMap<String, Vec<PiperVoice>> = BTreeMap::new();
        for voice in voices {
            by_code.entry(voice.code.clone()).or_default().push(voice);
        }

        let languages = by_code
            .into_iter()
            .map(|(code, mut voices)| {
                voices.sort_by_key(|v| (v.name.to_lowercase(), v.quality.to_lowercase()));
                LanguageVoices {
                    code,
                    count: voices.len(),
                    voices,
                }
            })
            .collect();

        Self { languages }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// ListPiperVoices Handler
pub struct ListPiperVoicesHandler {
    catalog: Arc<dyn VoiceCatalogPort>,
}

impl ListPiperVoicesHandler {
    pub fn new(catalog: Arc<dyn VoiceCatalogPort>) -> Self {
        Self { catalog }
    }

    pub fn handle(&self, _query: ListPiperVoices) -> Result<PiperVoiceCatalogResponse, CatalogError> {
        let voices = self.catalog.list_piper_voices()?;
        tracing::debug!(count = voices.len(), "Piper voices found");
        Ok(PiperVoiceCatalogResponse::from_voices(voices))
    }
}
