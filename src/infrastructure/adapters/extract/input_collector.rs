//! 输入路径展开
//!
//! 目录递归查找受支持的文档，不存在的路径记录警告后跳过

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::application::ports::is_supported_document;

/// 把命令行输入展开为文档列表（目录内按路径排序，保持输入顺序）
pub fn expand_inputs(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut found = Vec::new();
            collect_documents(input, &mut found);
            found.sort();
            files.extend(found);
        } else if input.is_file() {
            files.push(input.clone());
        } else {
            tracing::warn!(path = %input.display(), "Input not found, skipping");
        }
    }
    files
}

/// 不跟随符号链接，目录环不会重复产出同一文件
fn collect_documents(dir: &Path, found: &mut Vec<PathBuf>) {
    for entry in WalkDir::new(dir) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(path = %dir.display(), error = %e, "Cannot read directory entry");
                continue;
            }
        };
        // 指向文件的链接照常收录
        let is_file = entry.file_type().is_file()
            || (entry.path_is_symlink() && entry.path().is_file());
        if is_file && is_supported_document(entry.path()) {
            found.push(entry.into_path());
        }
    }
}
