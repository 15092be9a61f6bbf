//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和流程调度，是整个系统的"指挥中心"。
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<PathBuf>)
//!     ↓
//! workflow::DocumentFlow (处理单个文档，含重试)
//!     ↓
//! services (能力层：extraction / document_source / report_writer)
//!     ↓
//! clients (外部分析服务)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一职责**：batch_processor 管批量，DocumentFlow 管单个
//! 2. **向下依赖**：编排层 → workflow → services → clients
//! 3. **无业务逻辑**：只做调度和统计，不做具体提取判断

pub mod batch_processor;

// 重新导出主要类型
pub use batch_processor::{App, RunSummary};
