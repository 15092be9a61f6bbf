//! # PDF Metadata Extractor
//!
//! 批量提取 PDF 元数据（标题、作者、日期、关键词、摘要、页数）并汇总为 CSV 报告。
//! 文档理解交给外部的大模型文件分析服务完成。
//!
//! ## 架构设计
//!
//! ### ① 外部服务层（Clients）
//! - `clients/` - 外部分析服务的 HTTP 实现
//! - `OpenAiClient` - 上传 / 结构化提取 / 删除
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个文件
//! - `AnalysisService` - 外部分析服务接口
//! - `ExtractionClient` - 对一个文件做一次提取，保证删除远端文件
//! - `document_source` - 列出待处理的 PDF
//! - `ReportWriter` - 原子写入 CSV 报告
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个文档"的完整处理流程
//! - `DocumentCtx` - 上下文封装（序号 + 文件）
//! - `RetryPolicy` - 尝试次数上限与指数退避
//! - `DocumentFlow` - 流程编排（提取 → 重试 → 记录）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量处理器，顺序处理并写入报告
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{ConfigError, ExtractError, ReportError, SchemaError, ServiceError};
pub use models::{Batch, ExtractionResult, ExtractionSchema, FieldDef, FieldType, FieldValue};
pub use orchestrator::{App, RunSummary};
pub use services::{AnalysisService, FileHandle, StructuredRequest};
pub use workflow::{DocumentCtx, DocumentFlow, RetryPolicy};
