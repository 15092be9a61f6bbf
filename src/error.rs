//! 错误类型
//!
//! 按照出错的位置划分：
//! - [`ConfigError`]：配置错误，启动阶段直接终止
//! - [`SchemaError`]：字段定义文件非法，同样在启动阶段终止
//! - [`ServiceError`]：外部分析服务调用失败，区分瞬时 / 永久
//! - [`ExtractError`]：单次提取尝试失败（服务错误 + 响应不符合字段定义）
//! - [`ReportError`]：CSV 报告写入失败，运行结束时终止

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量不存在或为空
    #[error("环境变量 {var_name} 不存在或为空")]
    EnvVarNotFound { var_name: String },

    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },

    /// `.env` 文件存在但无法读取或解析
    #[error(".env 文件读取失败 ({}): {source}", .path.display())]
    Dotenv {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },

    /// 输入目录不存在
    #[error("输入目录不存在: {}", .path.display())]
    InputDirNotFound { path: PathBuf },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// 字段定义错误
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("读取字段定义文件失败 ({}): {source}", .path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("字段定义文件解析失败 ({}): {source}", .path.display())]
    ParseFailed {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("字段定义为空")]
    NoFields,

    #[error("字段名重复: {0}")]
    DuplicateField(String),

    /// `filename` / `error` 是报告保留列
    #[error("字段名与报告保留列冲突: {0}")]
    ReservedField(String),

    #[error("必填字段 {0} 未在字段列表中声明")]
    UnknownRequired(String),
}

/// 外部分析服务错误
#[derive(Debug, Error)]
pub enum ServiceError {
    /// 网络层失败（连接中断、DNS 等）
    #[error("请求 {endpoint} 失败: {message}")]
    Transport { endpoint: String, message: String },

    /// 服务返回的 API 错误，`code` 取错误码，缺省时取错误类型
    #[error("{endpoint} 返回错误 ({code}): {message}")]
    Api {
        endpoint: String,
        code: String,
        message: String,
    },

    /// 请求超时
    #[error("{endpoint} 请求超时 ({timeout:?})")]
    Timeout { endpoint: String, timeout: Duration },

    /// 响应体无法解析
    #[error("{endpoint} 响应无法解析: {message}")]
    MalformedResponse { endpoint: String, message: String },

    /// 请求本身不合法（参数错误、本地构造失败）
    #[error("{endpoint} 请求无效: {message}")]
    InvalidRequest { endpoint: String, message: String },
}

/// 重试可能成功的 API 错误码
const TRANSIENT_API_CODES: &[&str] = &[
    "rate_limit_exceeded",
    "server_error",
    "service_unavailable",
    "overloaded",
    "timeout",
    "conflict",
];

impl ServiceError {
    /// 是否为瞬时错误（重试可能成功）
    ///
    /// 限流、服务端错误、网络和超时错误视为瞬时错误；
    /// 鉴权、额度、参数等其余 API 错误视为永久错误。
    pub fn is_transient(&self) -> bool {
        match self {
            ServiceError::Transport { .. } => true,
            ServiceError::Api { code, .. } => TRANSIENT_API_CODES.contains(&code.as_str()),
            ServiceError::Timeout { .. } => true,
            ServiceError::MalformedResponse { .. } => true,
            ServiceError::InvalidRequest { .. } => false,
        }
    }
}

/// 单次提取尝试的错误
#[derive(Debug, Error)]
pub enum ExtractError {
    /// 读取本地 PDF 失败
    #[error("读取文件失败 ({}): {source}", .path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Service(#[from] ServiceError),

    /// 响应不是合法的 JSON 对象
    #[error("结构化响应不是合法的 JSON 对象: {0}")]
    MalformedPayload(String),

    /// 缺少必填字段
    #[error("结构化响应缺少必填字段: {0}")]
    MissingRequired(String),

    /// 字段类型不符
    #[error("字段 {field} 类型不符: 期望 {expected}")]
    WrongType { field: String, expected: &'static str },
}

impl ExtractError {
    /// 是否值得重试
    ///
    /// 不符合字段定义的响应也重试：模型输出本身不稳定。
    pub fn is_retryable(&self) -> bool {
        match self {
            ExtractError::ReadFile { .. } => false,
            ExtractError::Service(e) => e.is_transient(),
            ExtractError::MalformedPayload(_)
            | ExtractError::MissingRequired(_)
            | ExtractError::WrongType { .. } => true,
        }
    }
}

/// 报告写入错误
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("创建临时报告文件失败 ({}): {source}", .dir.display())]
    CreateTemp {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("写入 CSV 失败: {0}")]
    Csv(#[from] csv::Error),

    #[error("写入报告文件失败 ({}): {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
