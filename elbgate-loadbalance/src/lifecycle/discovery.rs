use super::context::{HookContext, LifecycleError};
use crate::client::{LoadBalancerClient, LoadBalancerMembership};
use elbgate_core::AssociationRecord;
use tracing::info;

/// 从负载均衡器列表中找出包含指定实例的负载均衡器
///
/// 每个匹配的实例条目都会追加一次名称，匹配后继续扫描同一负载均衡器的
/// 剩余实例，而不是跳到下一个负载均衡器
pub fn associated_load_balancers(
    memberships: &[LoadBalancerMembership],
    instance_id: &str,
) -> AssociationRecord {
    let mut record = AssociationRecord::default();
    for membership in memberships {
        for registered in &membership.instance_ids {
            if registered == instance_id {
                record.push(membership.name.clone());
                continue;
            }
        }
    }
    record
}

impl<C: LoadBalancerClient> HookContext<C> {
    /// 发现本实例所属的负载均衡器并写入缓存，覆盖旧内容
    pub async fn discover(&self) -> Result<AssociationRecord, LifecycleError> {
        let memberships = self.client.list_all().await?;
        let record = associated_load_balancers(&memberships, &self.identity.instance_id);

        self.cache.store(&record).await?;

        info!(
            "Instance {} belongs to {} of {} load balancers: {:?}",
            self.identity.instance_id,
            record.len(),
            memberships.len(),
            record.names()
        );
        Ok(record)
    }
}
