//! 报告写入服务 - 业务能力层
//!
//! 只负责"把整批结果写成 CSV"能力。先写同目录下的临时文件，
//! 刷盘后再重命名覆盖目标路径，目标路径上不会出现写了一半的文件。

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::ReportError;
use crate::models::{Batch, ExtractionSchema};

/// CSV 报告写入服务
pub struct ReportWriter {
    output_path: PathBuf,
}

impl ReportWriter {
    pub fn new(output_path: impl Into<PathBuf>) -> Self {
        Self {
            output_path: output_path.into(),
        }
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// 写入整批结果
    pub fn write(&self, schema: &ExtractionSchema, batch: &Batch) -> Result<(), ReportError> {
        let dir = match self.output_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut tmp = NamedTempFile::new_in(&dir).map_err(|source| ReportError::CreateTemp {
            dir: dir.clone(),
            source,
        })?;

        render_csv(schema, batch, tmp.as_file_mut())?;

        tmp.as_file_mut()
            .sync_all()
            .map_err(|source| ReportError::Io {
                path: tmp.path().to_path_buf(),
                source,
            })?;

        tmp.persist(&self.output_path).map_err(|e| ReportError::Io {
            path: self.output_path.clone(),
            source: e.error,
        })?;

        debug!(
            "报告已写入 {} ({} 行)",
            self.output_path.display(),
            batch.len()
        );
        Ok(())
    }
}

/// 将整批结果渲染为 CSV 写入任意 writer
pub fn render_csv<W: Write>(schema: &ExtractionSchema, batch: &Batch, writer: W) -> Result<(), ReportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(schema.header())?;
    for record in batch.records() {
        csv_writer.write_record(record.to_row(schema))?;
    }
    csv_writer.flush().map_err(|source| ReportError::Io {
        path: PathBuf::new(),
        source,
    })?;
    Ok(())
}
