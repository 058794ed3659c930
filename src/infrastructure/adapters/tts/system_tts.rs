//! System TTS - 操作系统自带语音
//!
//! - Linux: espeak-ng / espeak
//! - macOS: say
//! - Windows: PowerShell + System.Speech
//!
//! 文本经 stdin 传入，WAV 写入临时文件后解码

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::application::ports::{BatchRequest, TtsEnginePort, TtsError};
use crate::domain::{BackendKind, PcmBuffer};
use crate::infrastructure::adapters::audio::decode_wav_file;
use crate::infrastructure::adapters::process::{resolve_program, run_program};

/// 系统语音程序
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemVoiceProgram {
    Espeak,
    Say,
    PowerShell,
}

impl SystemVoiceProgram {
    /// 当前平台依次尝试的程序名
    pub fn platform_candidates() -> &'static [&'static str] {
        if cfg!(target_os = "macos") {
            &["say"]
        } else if cfg!(windows) {
            &["powershell", "pwsh"]
        } else {
            &["espeak-ng", "espeak"]
        }
    }

    /// 根据程序名判断调用方式
    pub fn from_program_name(program: &Path) -> Self {
        let stem = program
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_lowercase();
        match stem.as_str() {
            "say" => SystemVoiceProgram::Say,
            "powershell" | "pwsh" => SystemVoiceProgram::PowerShell,
            _ => SystemVoiceProgram::Espeak,
        }
    }

    /// 构造命令行参数
    pub fn args(&self, output: &Path, voice: Option<&str>) -> Vec<String> {
        let output = output.to_string_lossy().into_owned();
        let voice = voice.map(str::trim).filter(|v| !v.is_empty());
        match self {
            SystemVoiceProgram::Espeak => {
                let mut args = vec!["-w".to_string(), output];
                if let Some(voice) = voice {
                    args.push("-v".to_string());
                    args.push(voice.to_string());
                }
                args.push("--stdin".to_string());
                args
            }
            SystemVoiceProgram::Say => {
                let mut args = vec![
                    "-o".to_string(),
                    output,
                    "--file-format=WAVE".to_string(),
                    "--data-format=LEI16@22050".to_string(),
                ];
                if let Some(voice) = voice {
                    args.push("-v".to_string());
                    args.push(voice.to_string());
                }
                args.push("-f".to_string());
                args.push("-".to_string());
                args
            }
            SystemVoiceProgram::PowerShell => {
                let select = voice
                    .map(|v| format!("$s.SelectVoice('{}'); ", v.replace('\'', "''")))
                    .unwrap_or_default();
                let script = format!(
                    "Add-Type -AssemblyName System.Speech; \
                     $s = New-Object System.Speech.Synthesis.SpeechSynthesizer; \
                     {}$s.SetOutputToWaveFile('{}'); \
                     $s.Speak([Console]::In.ReadToEnd()); $s.Dispose()",
                    select,
                    output.replace('\'', "''")
                );
                vec![
                    "-NoProfile".to_string(),
                    "-NonInteractive".to_string(),
                    "-Command".to_string(),
                    script,
                ]
            }
        }
    }
}

/// 定位系统语音程序：优先使用配置的覆盖值，否则按平台候选查找
pub fn detect_system_voice(program_override: Option<&str>) -> Option<(SystemVoiceProgram, PathBuf)> {
    if let Some(name) = program_override.filter(|p| !p.trim().is_empty()) {
        let path = resolve_program(name)?;
        return Some((SystemVoiceProgram::from_program_name(&path), path));
    }

    SystemVoiceProgram::platform_candidates()
        .iter()
        .find_map(|name| resolve_program(name))
        .map(|path| (SystemVoiceProgram::from_program_name(&path), path))
}

/// 系统语音引擎
pub struct SystemTtsEngine {
    variant: SystemVoiceProgram,
    program: PathBuf,
}

impl SystemTtsEngine {
    pub fn new(program_override: Option<&str>) -> Result<Self, TtsError> {
        let (variant, program) =
            detect_system_voice(program_override).ok_or_else(|| TtsError::BinaryNotFound {
                program: program_override
                    .map(str::to_string)
                    .unwrap_or_else(|| SystemVoiceProgram::platform_candidates().join(" / ")),
            })?;

        tracing::info!(
            program = %program.display(),
            variant = ?variant,
            "System TTS initialized"
        );

        Ok(Self { variant, program })
    }
}

#[async_trait]
impl TtsEnginePort for SystemTtsEngine {
    fn kind(&self) -> BackendKind {
        BackendKind::SystemTts
    }

    async fn synthesize_batch(&self, request: &BatchRequest) -> Result<PcmBuffer, TtsError> {
        let text = request.text();
        let tmp = tempfile::Builder::new()
            .prefix("docvox-system-")
            .suffix(".wav")
            .tempfile()?;

        let args = self
            .variant
            .args(tmp.path(), request.params.voice.as_deref());

        tracing::info!(
            program = %self.program.display(),
            chars = text.chars().count(),
            "Running system TTS"
        );

        run_program(&self.program, &args, Some(&text))
            .await
            .map_err(|e| e.into_tts_error(&self.program))?;

        decode_wav_file(tmp.path()).await
    }
}
