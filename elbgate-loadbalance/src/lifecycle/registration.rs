use super::context::{HookContext, LifecycleError};
use crate::client::LoadBalancerClient;
use tracing::debug;

impl<C: LoadBalancerClient> HookContext<C> {
    /// 从缓存中的每个负载均衡器注销本实例
    ///
    /// 按缓存顺序逐个调用，任何一次API错误都会中止整个操作
    pub async fn deregister_all(&self) -> Result<(), LifecycleError> {
        let record = self.cache.load().await?;
        let instance_id = self.identity.instance_id.as_str();

        for load_balancer in &record {
            debug!("Deregistering {} from {}", instance_id, load_balancer);
            let remaining = self.client.deregister(load_balancer, instance_id).await?;
            self.reporter.plain(format!(
                "deregistered instance from elb, instance: {instance_id}, elb: {load_balancer}; registered instances: {remaining:?}"
            ));
        }

        Ok(())
    }

    /// 将本实例重新注册到缓存中的每个负载均衡器
    pub async fn register_all(&self) -> Result<(), LifecycleError> {
        let record = self.cache.load().await?;
        let instance_id = self.identity.instance_id.as_str();

        for load_balancer in &record {
            debug!("Registering {} with {}", instance_id, load_balancer);
            let registered = self.client.register(load_balancer, instance_id).await?;
            self.reporter.plain(format!(
                "registered instance with elb, instance: {instance_id}, elb: {load_balancer}; registered instances: {registered:?}"
            ));
        }

        Ok(())
    }
}
