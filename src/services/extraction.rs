//! 提取服务 - 业务能力层
//!
//! 只负责"对一个文件做一次提取"能力：上传 → 结构化提取 → 校验 → 删除。
//! 不重试，不关心批次，不出现文档序号。

use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

use tokio::fs;
use tracing::{debug, warn};

use crate::error::ExtractError;
use crate::models::{ExtractionResult, ExtractionSchema};
use crate::services::analysis::{AnalysisService, FileHandle, StructuredRequest};

/// 提取服务
pub struct ExtractionClient {
    service: Arc<dyn AnalysisService>,
    schema: Arc<ExtractionSchema>,
    page_limit: u32,
    prompt: String,
}

impl ExtractionClient {
    pub fn new(service: Arc<dyn AnalysisService>, schema: Arc<ExtractionSchema>, page_limit: u32) -> Self {
        let prompt = build_prompt(&schema, page_limit);
        Self {
            service,
            schema,
            page_limit,
            prompt,
        }
    }

    /// 对单个文件做一次提取
    ///
    /// 上传成功后，无论提取成败都会删除远端文件；删除失败只记录警告。
    pub async fn extract(&self, path: &Path, filename: &str) -> Result<ExtractionResult, ExtractError> {
        let bytes = fs::read(path).await.map_err(|source| ExtractError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;

        let handle = self.service.upload(filename, bytes).await?;
        debug!("已上传 {} (ID: {})", filename, handle);

        let outcome = self.extract_uploaded(&handle, filename).await;

        self.release(&handle, filename).await;

        outcome
    }

    async fn extract_uploaded(&self, handle: &FileHandle, filename: &str) -> Result<ExtractionResult, ExtractError> {
        let request = StructuredRequest {
            handle,
            schema: &self.schema,
            page_limit: self.page_limit,
            prompt: &self.prompt,
        };

        let text = self.service.extract(request).await?;
        let fields = self.schema.conform(&text)?;
        Ok(ExtractionResult::success(filename, fields))
    }

    async fn release(&self, handle: &FileHandle, filename: &str) {
        match self.service.delete(handle).await {
            Ok(()) => debug!("已删除远端文件 {} ({})", handle, filename),
            Err(e) => warn!("⚠️ 删除远端文件失败 {} ({}): {}", handle, filename, e),
        }
    }
}

/// 构建提取提示词
fn build_prompt(schema: &ExtractionSchema, page_limit: u32) -> String {
    let mut prompt = String::from("Extract the following structured data from the PDF document:\n");
    for field in &schema.fields {
        let _ = writeln!(prompt, "- {}: {}", field.name, field.description);
    }
    let _ = write!(
        prompt,
        "\nAnalyze only the first {} pages of the document.\n\
         Return ONLY a JSON object that conforms exactly to the provided schema.",
        page_limit
    );
    if !schema.required.is_empty() {
        let _ = write!(prompt, " Required fields: {}.", schema.required.join(", "));
    }
    prompt
}
