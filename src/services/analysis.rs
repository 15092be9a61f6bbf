//! 外部分析服务接口 - 业务能力层
//!
//! 只描述"上传 / 结构化提取 / 删除"三种能力，不关心重试与流程。
//! 生产实现见 [`crate::clients::OpenAiClient`]，测试中用脚本化的假服务替换。

use async_trait::async_trait;

use crate::error::ServiceError;
use crate::models::ExtractionSchema;

/// 上传后服务返回的文件句柄
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileHandle(String);

impl FileHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FileHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// 一次结构化提取请求
#[derive(Debug, Clone, Copy)]
pub struct StructuredRequest<'a> {
    pub handle: &'a FileHandle,
    pub schema: &'a ExtractionSchema,
    /// 只分析前 N 页
    pub page_limit: u32,
    /// 用户提示词（已包含页数限制说明）
    pub prompt: &'a str,
}

/// 文件分析服务
#[async_trait]
pub trait AnalysisService: Send + Sync {
    /// 上传文件，返回句柄
    async fn upload(&self, filename: &str, bytes: Vec<u8>) -> Result<FileHandle, ServiceError>;

    /// 对已上传的文件做结构化提取，返回服务给出的 JSON 文本
    async fn extract(&self, request: StructuredRequest<'_>) -> Result<String, ServiceError>;

    /// 删除已上传的文件
    async fn delete(&self, handle: &FileHandle) -> Result<(), ServiceError>;
}
