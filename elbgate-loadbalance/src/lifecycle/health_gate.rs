use super::context::{HookContext, LifecycleError};
use crate::client::{InstanceHealth, LoadBalancerClient};
use elbgate_core::HealthCheckSettings;
use std::time::Duration;
use tracing::debug;

/// 健康检查轮询策略
///
/// 每个负载均衡器最多查询 `max_attempts` 次，两次查询之间固定等待
/// `retry_interval`，最坏情况下等待 `max_attempts * retry_interval`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthPolicy {
    pub max_attempts: u32,
    pub retry_interval: Duration,
}

impl Default for HealthPolicy {
    fn default() -> Self {
        Self::from(&HealthCheckSettings::default())
    }
}

impl From<&HealthCheckSettings> for HealthPolicy {
    fn from(settings: &HealthCheckSettings) -> Self {
        Self {
            max_attempts: settings.max_attempts,
            retry_interval: Duration::from_secs(settings.retry_interval_seconds),
        }
    }
}

/// 单个负载均衡器的健康检查结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthCheckOutcome {
    pub load_balancer: String,
    pub state: InstanceHealth,
    /// 实际发出的健康查询次数
    pub checks: u32,
}

impl<C: LoadBalancerClient> HookContext<C> {
    /// 等待本实例在缓存中的每个负载均衡器上进入 InService
    ///
    /// 按缓存顺序逐个检查；某个负载均衡器用完重试次数仍未就绪时立即返回
    /// `LifecycleError::NotInService`，后面的负载均衡器不会再被查询。
    /// 调用方应当以非零状态码结束进程。
    pub async fn wait_until_healthy(&self) -> Result<Vec<HealthCheckOutcome>, LifecycleError> {
        let record = self.cache.load().await?;
        let instance_id = self.identity.instance_id.as_str();
        let mut outcomes = Vec::with_capacity(record.len());

        for load_balancer in &record {
            let outcome = self.poll_until_in_service(load_balancer).await?;

            if !outcome.state.is_in_service() {
                return Err(LifecycleError::NotInService {
                    instance_id: instance_id.to_string(),
                    load_balancer: load_balancer.clone(),
                    last_state: outcome.state.to_string(),
                    attempts: outcome.checks,
                });
            }

            self.reporter.ok(format!("instance {instance_id}, is now in service"));
            outcomes.push(outcome);
        }

        Ok(outcomes)
    }

    async fn poll_until_in_service(
        &self,
        load_balancer: &str,
    ) -> Result<HealthCheckOutcome, LifecycleError> {
        let instance_id = self.identity.instance_id.as_str();
        let mut recheck = true;
        let mut attempt = 0;
        let mut checks = 0;
        let mut state = InstanceHealth::Unchecked;

        while recheck && attempt < self.policy.max_attempts {
            state = self.client.describe_health(load_balancer, instance_id).await?;
            checks += 1;
            debug!(
                "Health of {} on {} (check {}): {}",
                instance_id, load_balancer, checks, state
            );

            if state.is_in_service() {
                recheck = false;
            } else {
                attempt += 1;
                tokio::time::sleep(self.policy.retry_interval).await;
                self.reporter.warn(format!("instance {instance_id} not in service yet, retrying"));
            }
        }

        Ok(HealthCheckOutcome {
            load_balancer: load_balancer.to_string(),
            state,
            checks,
        })
    }
}
