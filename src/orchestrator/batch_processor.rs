//! 批量文档处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责批量文档的处理和资源管理。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：加载字段定义、创建分析服务客户端
//! 2. **批量扫描**：列出输入目录下的所有 PDF
//! 3. **顺序处理**：逐个文档交给 `DocumentFlow`，一个完成后再处理下一个
//! 4. **结果汇总**：每个文档恰好一条记录，按发现顺序保存在内存中
//! 5. **报告写入**：全部完成后一次性写入 CSV
//! 6. **全局统计**：输出成功 / 失败数量
//!
//! ## 设计特点
//!
//! - **顶层编排**：不处理单个文档的细节
//! - **失败隔离**：单个文档失败不会中断批次，只有配置错误和报告写入错误会终止运行
//! - **中途中断会丢失结果**：报告只在批次结束时写入

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::clients::OpenAiClient;
use crate::config::Config;
use crate::models::{load_schema, Batch, ExtractionSchema};
use crate::services::{list_pdf_files, AnalysisService, ExtractionClient, ReportWriter};
use crate::utils::logging::{log_documents_found, log_startup, print_final_stats};
use crate::workflow::{DocumentCtx, DocumentFlow, RetryPolicy};

/// 应用主结构
pub struct App {
    config: Config,
    schema: Arc<ExtractionSchema>,
    flow: DocumentFlow,
    report_writer: ReportWriter,
}

/// 一次运行的统计
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub report_path: PathBuf,
}

impl App {
    /// 初始化应用（使用真实的分析服务）
    pub async fn initialize(config: Config) -> Result<Self> {
        log_startup(&config);

        let client = OpenAiClient::new(&config);
        Self::with_service(config, Arc::new(client)).await
    }

    /// 使用指定的分析服务初始化应用
    pub async fn with_service(config: Config, service: Arc<dyn AnalysisService>) -> Result<Self> {
        let schema = Arc::new(
            load_schema(config.schema_file.as_deref())
                .await
                .context("加载字段定义失败")?,
        );

        let client = ExtractionClient::new(service, schema.clone(), config.page_limit);
        let flow = DocumentFlow::new(client, RetryPolicy::from_config(&config));
        let report_writer = ReportWriter::new(config.output_csv.clone());

        Ok(Self {
            config,
            schema,
            flow,
            report_writer,
        })
    }

    pub fn schema(&self) -> &ExtractionSchema {
        &self.schema
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<RunSummary> {
        // 扫描待处理的文档
        let documents = self.load_documents().await?;

        if documents.is_empty() {
            warn!("⚠️ 输入目录中没有找到 PDF 文件，将只写入表头");
        } else {
            log_documents_found(documents.len());
        }

        // 逐个处理
        let batch = self.process_all_documents(documents).await;

        // 一次性写入报告
        self.report_writer
            .write(&self.schema, &batch)
            .with_context(|| format!("写入报告失败: {}", self.report_writer.output_path().display()))?;

        let summary = RunSummary {
            total: batch.len(),
            success: batch.success_count(),
            failed: batch.failed_count(),
            report_path: self.report_writer.output_path().to_path_buf(),
        };

        print_final_stats(
            summary.success,
            summary.failed,
            summary.total,
            &summary.report_path,
            &self.config.output_log_file,
        );

        Ok(summary)
    }

    /// 加载文档列表
    async fn load_documents(&self) -> Result<Vec<PathBuf>> {
        info!("\n📁 正在扫描待处理的 PDF...");
        list_pdf_files(&self.config.input_dir).await
    }

    /// 顺序处理所有文档
    async fn process_all_documents(&self, documents: Vec<PathBuf>) -> Batch {
        let total = documents.len();
        let mut batch = Batch::new();

        for (idx, path) in documents.into_iter().enumerate() {
            let ctx = DocumentCtx::new(path, idx + 1, total);
            log_document_start(&ctx);

            let record = self.flow.run(&ctx).await;
            batch.push(record);
        }

        batch
    }
}

// ========== 日志辅助函数 ==========

fn log_document_start(ctx: &DocumentCtx) {
    info!("\n{} {}", ctx, "─".repeat(30));
}
