//! 文档处理上下文
//!
//! 封装"我正在处理第几个文档、是哪个文件"这一信息

use std::fmt::Display;
use std::path::PathBuf;

use crate::services::document_source::display_name;

/// 文档处理上下文
#[derive(Debug, Clone)]
pub struct DocumentCtx {
    /// 文件路径
    pub path: PathBuf,

    /// 文件名（报告首列）
    pub filename: String,

    /// 文档序号（从1开始，仅用于日志显示）
    pub index: usize,

    /// 本批文档总数
    pub total: usize,
}

impl DocumentCtx {
    /// 创建新的文档上下文
    pub fn new(path: PathBuf, index: usize, total: usize) -> Self {
        let filename = display_name(&path);
        Self {
            path,
            filename,
            index,
            total,
        }
    }
}

impl Display for DocumentCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[文档 {}/{}]", self.index, self.total)
    }
}
