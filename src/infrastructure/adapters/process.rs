//! 外部进程工具
//!
//! Piper、系统语音、ffmpeg 都通过子进程调用

use std::path::{Path, PathBuf};
use std::process::Stdio;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::application::ports::TtsError;

/// 子进程运行失败
#[derive(Debug, Error)]
pub enum ProcessError {
    /// 无法启动（通常是找不到可执行文件）
    #[error("Failed to run process: {0}")]
    Spawn(#[source] std::io::Error),
    /// 退出码非零
    #[error("Process exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
}

impl ProcessError {
    /// 可执行文件不存在
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProcessError::Spawn(e) if e.kind() == std::io::ErrorKind::NotFound)
    }

    /// 转换为引擎错误，找不到可执行文件属于配置错误
    pub fn into_tts_error(self, program: &Path) -> TtsError {
        let program = program.display().to_string();
        match self {
            err if err.is_not_found() => TtsError::BinaryNotFound { program },
            ProcessError::Spawn(err) => TtsError::IoError(err.to_string()),
            ProcessError::Failed { status, stderr } => TtsError::ProcessFailed {
                program,
                status,
                stderr,
            },
        }
    }
}

/// 定位可执行文件
///
/// `name` 含路径分隔符时按路径检查，否则在 `PATH` 中查找
pub fn resolve_program(name: &str) -> Option<PathBuf> {
    let candidate = Path::new(name);
    if candidate.components().count() > 1 || candidate.is_absolute() {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }

    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths).find_map(|dir| {
        let full = dir.join(name);
        if full.is_file() {
            return Some(full);
        }
        if cfg!(windows) {
            let exe = full.with_extension("exe");
            if exe.is_file() {
                return Some(exe);
            }
        }
        None
    })
}

/// 运行子进程直到退出
///
/// `stdin` 为 Some 时写入后关闭管道；stdout 被丢弃，stderr 在失败时返回
pub async fn run_program(
    program: &Path,
    args: &[String],
    stdin: Option<&str>,
) -> Result<(), ProcessError> {
    tracing::debug!(program = %program.display(), args = ?args, "Spawning process");

    let mut child = Command::new(program)
        .args(args)
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(ProcessError::Spawn)?;

    // 写 stdin 的同时读取 stderr，子进程先写满 stderr 管道时双方不会互相等待
    let pipe = child.stdin.take();
    let feed = async move {
        if let (Some(text), Some(mut pipe)) = (stdin, pipe) {
            // 进程提前退出时管道已断开，交给退出码判断
            match pipe.write_all(text.as_bytes()).await {
                Err(e) if e.kind() != std::io::ErrorKind::BrokenPipe => return Err(e),
                _ => {}
            }
            // 关闭 stdin，进程才会开始处理
            drop(pipe);
        }
        Ok(())
    };

    let (fed, output) = tokio::join!(feed, child.wait_with_output());
    fed.map_err(ProcessError::Spawn)?;
    let output = output.map_err(ProcessError::Spawn)?;
    if output.status.success() {
        Ok(())
    } else {
        Err(ProcessError::Failed {
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}
