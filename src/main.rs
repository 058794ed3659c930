//! Docvox - 文档转语音命令行
//!
//! - `docvox convert <inputs>...`：逐个文档合成音频
//! - `docvox voices`：以 JSON 列出本地 Piper 音色

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use docvox::application::ports::{AudioFormat, SynthesisParams};
use docvox::application::{
    EngineCache, EngineResolver, ListPiperVoices, ListPiperVoicesHandler, SynthesizeDocument,
    SynthesizeDocumentHandler,
};
use docvox::config::{load_config_from_path, print_config, validate_config, AppConfig};
use docvox::domain::BackendRequest;
use docvox::infrastructure::adapters::{
    expand_inputs, ConfiguredEngineProbes, DefaultEngineFactory, FileTextExtractor,
    Mp3Transcoder, PiperVoiceCatalog, WavAssembler,
};

#[derive(Parser)]
#[command(name = "docvox")]
#[command(about = "Convert PDF, DOCX, TXT and Markdown documents to speech", long_about = None)]
struct Cli {
    /// Configuration file (defaults to docvox.toml / docvox.local.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Synthesize documents (files or directories) into audio files
    Convert(ConvertArgs),
    /// List local Piper voices as JSON
    Voices,
}

#[derive(Args)]
struct ConvertArgs {
    /// Files or directories to convert
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Voice name, or a .onnx model path for Piper
    #[arg(long)]
    voice: Option<String>,

    /// Sampling temperature (streaming neural backend)
    #[arg(long)]
    temperature: Option<f32>,

    /// Repetition penalty (streaming neural backend)
    #[arg(long)]
    repetition_penalty: Option<f32>,

    /// Maximum characters per segment (500-3000)
    #[arg(long)]
    max_chars: Option<usize>,

    /// Output format: wav or mp3
    #[arg(long)]
    audio_format: Option<AudioFormat>,

    /// Backend: auto, streaming-neural, batch-neural, system-tts, piper, silent
    #[arg(long)]
    backend: Option<BackendRequest>,

    /// Output directory
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

impl ConvertArgs {
    /// 命令行参数覆盖已加载的配置
    fn apply(&self, config: &mut AppConfig) {
        if let Some(voice) = &self.voice {
            config.tts.voice = Some(voice.clone());
        }
        if let Some(temperature) = self.temperature {
            config.tts.temperature = temperature;
        }
        if let Some(penalty) = self.repetition_penalty {
            config.tts.repetition_penalty = penalty;
        }
        if let Some(max_chars) = self.max_chars {
            config.chunking.max_chars = max_chars;
        }
        if let Some(format) = self.audio_format {
            config.audio.format = format;
        }
        if let Some(backend) = self.backend {
            config.tts.backend = backend;
        }
        if let Some(dir) = &self.output_dir {
            config.output.dir = dir.clone();
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 加载配置（优先级：命令行 > 环境变量 > 配置文件 > 默认值）
    let mut config = load_config_from_path(cli.config.as_deref())
        .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    let log_filter = format!("warn,docvox={}", config.log.level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Convert(args) => {
            args.apply(&mut config);
            validate_config(&config).map_err(|e| anyhow::anyhow!("{}", e))?;
            print_config(&config);
            convert(&config, &args.inputs).await
        }
        Commands::Voices => list_voices(&config),
    }
}

async fn convert(config: &AppConfig, inputs: &[PathBuf]) -> anyhow::Result<()> {
    let files = expand_inputs(inputs);
    if files.is_empty() {
        println!("No files to process.");
        return Ok(());
    }

    // 引擎缓存在整个进程内共享，所有文档复用同一个已初始化的后端
    let settings = config.engine_settings();
    let factory = Arc::new(DefaultEngineFactory::new(settings.clone()));
    let resolver = EngineResolver::new(
        Arc::new(ConfiguredEngineProbes::new(settings)),
        factory.clone(),
        factory.silent_engine(),
    );
    let engines = Arc::new(EngineCache::new(resolver));

    let handler = SynthesizeDocumentHandler::new(
        Arc::new(FileTextExtractor::new()),
        engines,
        Arc::new(WavAssembler::new(config.silence.sample_rate)),
        Arc::new(Mp3Transcoder::with_defaults(
            config.audio.ffmpeg_bin.clone(),
            config.audio.mp3_bitrate_kbps,
        )),
    )
    .with_batch_neural_max_chars(config.batch_neural.max_chunk_chars);

    let params = SynthesisParams {
        voice: config.tts.voice.clone(),
        temperature: Some(config.tts.temperature),
        repetition_penalty: Some(config.tts.repetition_penalty),
    };

    for path in files {
        let cmd = SynthesizeDocument {
            path: path.clone(),
            output_dir: config.output.dir.clone(),
            backend: config.tts.backend,
            params: params.clone(),
            max_chars: config.chunking.max_chars,
            audio_format: config.audio.format,
        };

        let response = handler
            .handle(cmd)
            .await
            .with_context(|| format!("Failed to convert {}", path.display()))?;

        if response.fallback {
            tracing::warn!(
                requested = %response.requested,
                backend = %response.backend,
                "Requested backend unavailable, used fallback"
            );
        }
        println!("{}", response.output_path.display());
    }

    Ok(())
}

fn list_voices(config: &AppConfig) -> anyhow::Result<()> {
    let catalog = PiperVoiceCatalog::new(config.piper.voices_dir.clone(), config.piper.model.clone());
    let response = ListPiperVoicesHandler::new(Arc::new(catalog))
        .handle(ListPiperVoices)
        .context("Failed to list Piper voices")?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
