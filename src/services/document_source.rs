//! 文档来源 - 业务能力层
//!
//! 只负责"列出待处理的 PDF"能力

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs;
use tracing::{debug, warn};

use crate::error::ConfigError;

/// 列出目录下所有 PDF 文件（扩展名不区分大小写），保持目录遍历顺序
///
/// 符号链接按其指向的目标判断是否为文件。
/// 目录不存在时返回 [`ConfigError::InputDirNotFound`]；空目录返回空列表；
/// 其余 I/O 错误（如权限不足）原样向上传递。
pub async fn list_pdf_files(folder_path: &Path) -> Result<Vec<PathBuf>> {
    match fs::metadata(folder_path).await {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => {
            return Err(ConfigError::InputDirNotFound {
                path: folder_path.to_path_buf(),
            }
            .into())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(ConfigError::InputDirNotFound {
                path: folder_path.to_path_buf(),
            }
            .into())
        }
        Err(e) => {
            return Err(e).with_context(|| format!("无法访问输入目录: {}", folder_path.display()));
        }
    }

    let mut pdf_files = Vec::new();
    let mut entries = fs::read_dir(folder_path)
        .await
        .with_context(|| format!("无法读取文件夹: {}", folder_path.display()))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if !is_pdf(&path) {
            continue;
        }
        // fs::metadata 会跟随符号链接
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => {
                debug!("发现 PDF: {}", path.display());
                pdf_files.push(path);
            }
            Ok(_) => {}
            Err(e) => warn!("⚠️ 跳过无法访问的文件 {}: {}", path.display(), e),
        }
    }

    Ok(pdf_files)
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// 取文件名用于报告和日志
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}
