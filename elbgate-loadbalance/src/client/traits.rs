use super::types::{ElbClientError, InstanceHealth, LoadBalancerMembership};
use async_trait::async_trait;

/// 负载均衡器控制API接口
///
/// 只做透传，不重试也不改写错误；生命周期操作通过这个trait调用，
/// 测试中可以替换为记录调用的实现
#[async_trait]
pub trait LoadBalancerClient: Send + Sync {
    /// 列出账户下所有负载均衡器及其注册的实例
    async fn list_all(&self) -> Result<Vec<LoadBalancerMembership>, ElbClientError>;

    /// 注册实例，返回注册后该负载均衡器上的实例列表
    async fn register(
        &self,
        load_balancer: &str,
        instance_id: &str,
    ) -> Result<Vec<String>, ElbClientError>;

    /// 注销实例，返回注销后仍在该负载均衡器上的实例列表
    async fn deregister(
        &self,
        load_balancer: &str,
        instance_id: &str,
    ) -> Result<Vec<String>, ElbClientError>;

    /// 查询实例在指定负载均衡器上的健康状态
    async fn describe_health(
        &self,
        load_balancer: &str,
        instance_id: &str,
    ) -> Result<InstanceHealth, ElbClientError>;
}
