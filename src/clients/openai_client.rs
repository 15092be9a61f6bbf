//! 文件分析 API 客户端
//!
//! 封装 OpenAI 兼容服务的文件上传、结构化提取（Responses API）和文件删除
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 文件上传 / 删除走 Files API 的类型化接口
//! - 结构化提取走 Responses API，请求体按 `json_schema` 文本格式构建
//! - 支持自定义 API 端点和模型

use std::future::Future;
use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::files::{CreateFileRequestArgs, FileInput, FilePurpose},
    Client,
};
use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};
use tokio::time::timeout;
use tracing::debug;

use crate::config::Config;
use crate::error::ServiceError;
use crate::services::analysis::{AnalysisService, FileHandle, StructuredRequest};
use crate::utils::logging::truncate_text;

const SYSTEM_INSTRUCTIONS: &str = "You are an expert at extracting structured data from PDF documents.";

/// OpenAI 兼容的文件分析客户端
pub struct OpenAiClient {
    client: Client<OpenAIConfig>,
    model_name: String,
    request_timeout: Duration,
}

impl OpenAiClient {
    /// 创建新的客户端
    pub fn new(config: &Config) -> Self {
        // 配置 OpenAI 客户端（兼容 OpenAI API 的服务）
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.api_key)
            .with_api_base(&config.api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: config.model_name.clone(),
            request_timeout: config.request_timeout,
        }
    }

    /// 执行一次调用，超过 `request_timeout` 视为超时
    async fn call<T, F>(&self, endpoint: &str, request: F) -> Result<T, ServiceError>
    where
        F: Future<Output = Result<T, OpenAIError>>,
    {
        match timeout(self.request_timeout, request).await {
            Ok(result) => result.map_err(|e| service_error(endpoint, e)),
            Err(_) => Err(ServiceError::Timeout {
                endpoint: endpoint.to_string(),
                timeout: self.request_timeout,
            }),
        }
    }
}

#[async_trait]
impl AnalysisService for OpenAiClient {
    async fn upload(&self, filename: &str, bytes: Vec<u8>) -> Result<FileHandle, ServiceError> {
        const ENDPOINT: &str = "/files";
        debug!("上传文件 {} ({} 字节)", filename, bytes.len());

        let request = CreateFileRequestArgs::default()
            .file(FileInput::from_vec_u8(filename.to_string(), bytes))
            .purpose(FilePurpose::UserData)
            .build()
            .map_err(|e| service_error(ENDPOINT, e))?;

        let file = self.call(ENDPOINT, self.client.files().create(request)).await?;
        Ok(FileHandle::new(file.id))
    }

    async fn extract(&self, request: StructuredRequest<'_>) -> Result<String, ServiceError> {
        const ENDPOINT: &str = "/responses";
        debug!(
            "调用结构化提取，模型: {}，文件: {}，页数上限: {}",
            self.model_name, request.handle, request.page_limit
        );

        let body = build_request_body(&self.model_name, &request);
        let response: JsonValue = self
            .call(ENDPOINT, self.client.responses().create_byot(body))
            .await?;

        output_text(&response).map_err(|message| ServiceError::MalformedResponse {
            endpoint: ENDPOINT.to_string(),
            message,
        })
    }

    async fn delete(&self, handle: &FileHandle) -> Result<(), ServiceError> {
        let endpoint = format!("/files/{}", handle.id());
        let deleted = self.call(&endpoint, self.client.files().delete(handle.id())).await?;

        if !deleted.deleted {
            return Err(ServiceError::MalformedResponse {
                endpoint,
                message: "服务未确认删除".to_string(),
            });
        }
        Ok(())
    }
}

/// 将 `OpenAIError` 映射为区分瞬时 / 永久的 `ServiceError`
fn service_error(endpoint: &str, error: OpenAIError) -> ServiceError {
    let endpoint = endpoint.to_string();
    match &error {
        OpenAIError::ApiError(api) => ServiceError::Api {
            endpoint,
            code: api
                .code
                .clone()
                .or_else(|| api.r#type.clone())
                .unwrap_or_else(|| "unknown".to_string()),
            message: truncate_text(&api.message, 200),
        },
        OpenAIError::JSONDeserialize(..) => ServiceError::MalformedResponse {
            endpoint,
            message: error.to_string(),
        },
        OpenAIError::InvalidArgument(message) => ServiceError::InvalidRequest {
            endpoint,
            message: message.clone(),
        },
        _ => ServiceError::Transport {
            endpoint,
            message: error.to_string(),
        },
    }
}

fn build_request_body(model: &str, request: &StructuredRequest<'_>) -> JsonValue {
    json!({
        "model": model,
        "instructions": SYSTEM_INSTRUCTIONS,
        "input": [{
            "role": "user",
            "content": [
                { "type": "input_file", "file_id": request.handle.id() },
                { "type": "input_text", "text": request.prompt },
            ],
        }],
        "text": {
            "format": {
                "type": "json_schema",
                "name": request.schema.name,
                "description": request.schema.description,
                "schema": request.schema.to_json_schema(),
                // 非严格模式，允许可选字段缺省
                "strict": false,
            },
        },
    })
}

/// 从 Responses API 的输出中取出第一段文本
fn output_text(response: &JsonValue) -> Result<String, String> {
    if let Some(error) = response.get("error").filter(|e| !e.is_null()) {
        return Err(format!("服务返回错误: {}", error));
    }
    if let Some(status) = response["status"].as_str() {
        if status != "completed" {
            return Err(format!("响应状态为 {}", status));
        }
    }

    let mut refusal = None;
    let messages = response["output"]
        .as_array()
        .into_iter()
        .flatten()
        .filter(|item| item["type"] == "message");
    for item in messages {
        for content in item["content"].as_array().into_iter().flatten() {
            match content["type"].as_str() {
                Some("output_text") => {
                    if let Some(text) = content["text"].as_str().filter(|t| !t.trim().is_empty()) {
                        return Ok(text.to_string());
                    }
                }
                Some("refusal") => refusal = content["refusal"].as_str().map(str::to_string),
                _ => {}
            }
        }
    }

    match refusal {
        Some(reason) => Err(format!("模型拒绝回答: {}", reason)),
        None => Err("响应中没有结构化数据".to_string()),
    }
}
