//! Engine Resolver - 后端解析与引擎缓存
//!
//! 解析策略（确定、有序）：
//! - 显式请求：先尝试请求的后端，失败后沿固定回退链尝试低资源批量后端
//! - auto：从最高质量的流式后端开始，按质量降序尝试
//! - 静音后端始终可用，是最终回退
//!
//! 同一次解析中每个后端最多尝试一次，失败只记录警告，不返回错误。

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::application::ports::{EngineFactoryPort, EngineProbePort, TtsEnginePort};
use crate::domain::{BackendKind, BackendRequest};

/// 被跳过的后端及原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedBackend {
    pub kind: BackendKind,
    pub reason: String,
}

/// 解析结果
pub struct ResolvedEngine {
    /// 用户请求的后端
    pub requested: BackendRequest,
    /// 实际使用的后端
    pub kind: BackendKind,
    pub engine: Arc<dyn TtsEnginePort>,
    /// 解析过程中放弃的后端
    pub skipped: Vec<SkippedBackend>,
}

impl ResolvedEngine {
    /// 是否发生了回退
    pub fn is_fallback(&self) -> bool {
        match self.requested {
            BackendRequest::Auto => false,
            BackendRequest::Explicit(kind) => kind != self.kind,
        }
    }
}

impl std::fmt::Debug for ResolvedEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedEngine")
            .field("requested", &self.requested)
            .field("kind", &self.kind)
            .field("skipped", &self.skipped)
            .finish_non_exhaustive()
    }
}

/// 后端解析器
pub struct EngineResolver {
    probes: Arc<dyn EngineProbePort>,
    factory: Arc<dyn EngineFactoryPort>,
    /// 始终可用的静音引擎
    silent: Arc<dyn TtsEnginePort>,
}

impl EngineResolver {
    pub fn new(
        probes: Arc<dyn EngineProbePort>,
        factory: Arc<dyn EngineFactoryPort>,
        silent: Arc<dyn TtsEnginePort>,
    ) -> Self {
        Self {
            probes,
            factory,
            silent,
        }
    }

    /// 解析请求的后端
    pub async fn resolve(&self, requested: BackendRequest) -> ResolvedEngine {
        let mut skipped = Vec::new();

        for kind in requested.candidates() {
            if kind == BackendKind::SilentFallback {
                break;
            }

            if let Err(e) = self.probes.probe(kind) {
                tracing::warn!(backend = %kind, requested = %requested, reason = %e, "TTS backend unavailable");
                skipped.push(SkippedBackend {
                    kind,
                    reason: e.to_string(),
                });
                continue;
            }

            match self.factory.create(kind).await {
                Ok(engine) => {
                    if !skipped.is_empty() {
                        tracing::warn!(
                            requested = %requested,
                            backend = %kind,
                            skipped = skipped.len(),
                            "Falling back to lower-priority TTS backend"
                        );
                    }
                    tracing::info!(requested = %requested, backend = %kind, "TTS backend resolved");
                    return ResolvedEngine {
                        requested,
                        kind,
                        engine,
                        skipped,
                    };
                }
                Err(e) => {
                    tracing::warn!(backend = %kind, requested = %requested, error = %e, "TTS backend initialization failed");
                    skipped.push(SkippedBackend {
                        kind,
                        reason: e.to_string(),
                    });
                }
            }
        }

        if requested != BackendRequest::Explicit(BackendKind::SilentFallback) {
            tracing::warn!(
                requested = %requested,
                "No TTS backend available, output will be silence"
            );
        }

        ResolvedEngine {
            requested,
            kind: BackendKind::SilentFallback,
            engine: self.silent.clone(),
            skipped,
        }
    }
}

/// 引擎缓存
///
/// 以期望的后端（请求值）为 key 缓存最近一次解析结果，请求值变化时才重新解析。
/// 由顶层调用方持有并显式传入；多个任务共享同一引擎实例时，
/// 引擎本身的并发安全由各适配器保证。
pub struct EngineCache {
    resolver: EngineResolver,
    current: Mutex<Option<Arc<ResolvedEngine>>>,
}

impl EngineCache {
    pub fn new(resolver: EngineResolver) -> Self {
        Self {
            resolver,
            current: Mutex::new(None),
        }
    }

    /// 获取引擎，请求值与缓存一致时直接复用
    pub async fn get(&self, requested: BackendRequest) -> Arc<ResolvedEngine> {
        let mut current = self.current.lock().await;

        if let Some(cached) = current.as_ref() {
            if cached.requested == requested {
                tracing::debug!(requested = %requested, backend = %cached.kind, "Reusing cached TTS engine");
                return cached.clone();
            }
            tracing::info!(
                previous = %cached.requested,
                requested = %requested,
                "Requested backend changed, rebuilding TTS engine"
            );
        }

        let resolved = Arc::new(self.resolver.resolve(requested).await);
        *current = Some(resolved.clone());
        resolved
    }

    /// 丢弃缓存的引擎
    pub async fn invalidate(&self) {
        self.current.lock().await.take();
    }
}
