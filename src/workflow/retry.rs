//! 重试包装
//!
//! 有上限的尝试次数 + 指数退避（封顶）。只有可重试的错误才会再次尝试，
//! 最后一次尝试的错误原样交给调用方。

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::warn;

use crate::config::Config;
use crate::error::ExtractError;

/// 可判断是否值得重试的错误
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

impl Retryable for ExtractError {
    fn is_retryable(&self) -> bool {
        ExtractError::is_retryable(self)
    }
}

/// 重试策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl RetryPolicy {
    /// `max_attempts` 至少为 1
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.max_attempts, config.backoff_base, config.backoff_max)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// 第 `attempt` 次（从 1 开始）失败后的等待时间：`base × 2^(attempt-1)`，不超过上限
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// 重试结果：最终结果 + 实际尝试次数
#[derive(Debug)]
pub struct Attempts<T, E> {
    pub result: Result<T, E>,
    pub attempts: u32,
}

/// 按策略执行 `operation`，参数为当前尝试序号（从 1 开始）
pub async fn run_with_retry<T, E, F, Fut>(policy: &RetryPolicy, label: &str, mut operation: F) -> Attempts<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + Display,
{
    let mut attempt = 1;
    loop {
        match operation(attempt).await {
            Ok(value) => {
                return Attempts {
                    result: Ok(value),
                    attempts: attempt,
                }
            }
            Err(e) if attempt < policy.max_attempts && e.is_retryable() => {
                let delay = policy.delay_after(attempt);
                warn!(
                    "{} 第 {}/{} 次尝试失败: {}，{:?} 后重试...",
                    label, attempt, policy.max_attempts, e, delay
                );
                sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                return Attempts {
                    result: Err(e),
                    attempts: attempt,
                }
            }
        }
    }
}
