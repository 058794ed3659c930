//! 应用层 - 命令（写操作）
//!
//! CQRS 命令侧：文档合成

mod synthesize_commands;

pub mod handlers;

pub use synthesize_commands::*;
