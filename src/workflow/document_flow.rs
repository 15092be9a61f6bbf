//! 文档处理流程 - 流程层
//!
//! 核心职责：定义"一个文档"的完整处理流程
//!
//! 状态流转：
//! 等待 → 尝试（成功 / 瞬时失败→再次尝试 / 永久失败）→ 完成
//!
//! 无论成功还是失败，完成时都恰好产出一条 `ExtractionResult`。

use tracing::{debug, error, info};

use crate::models::ExtractionResult;
use crate::services::ExtractionClient;
use crate::workflow::document_ctx::DocumentCtx;
use crate::workflow::retry::{run_with_retry, RetryPolicy};

/// 文档处理流程
///
/// - 编排单个文档的提取与重试
/// - 单个文档的失败不会向上传播，只会体现在记录的 error 列
pub struct DocumentFlow {
    client: ExtractionClient,
    policy: RetryPolicy,
}

impl DocumentFlow {
    /// 创建新的文档处理流程
    pub fn new(client: ExtractionClient, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    pub async fn run(&self, ctx: &DocumentCtx) -> ExtractionResult {
        info!("{} 📄 开始处理: {}", ctx, ctx.filename);

        let client = &self.client;
        let outcome = run_with_retry(&self.policy, &ctx.to_string(), |attempt| async move {
            debug!("{} 第 {}/{} 次尝试", ctx, attempt, self.policy.max_attempts());
            client.extract(&ctx.path, &ctx.filename).await
        })
        .await;

        match outcome.result {
            Ok(record) => {
                info!(
                    "{} ✓ 提取成功 (尝试 {} 次, 页数: {})",
                    ctx,
                    outcome.attempts,
                    record
                        .page_count()
                        .map(|n| n.to_string())
                        .unwrap_or_else(|| "未知".to_string())
                );
                record
            }
            Err(e) => {
                error!(
                    "{} ❌ 最终失败 {} (尝试 {} 次): {}",
                    ctx, ctx.filename, outcome.attempts, e
                );
                ExtractionResult::failure(&ctx.filename, e.to_string())
            }
        }
    }
}
