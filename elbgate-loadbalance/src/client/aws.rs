use super::traits::LoadBalancerClient;
use super::types::{ElbClientError, InstanceHealth, LoadBalancerMembership};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_elasticloadbalancing::types::Instance;
use aws_sdk_elasticloadbalancing::Client;
use tracing::{debug, warn};

/// 基于AWS SDK的经典负载均衡器客户端
#[derive(Clone, Debug)]
pub struct AwsElbClient {
    client: Client,
}

impl AwsElbClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// 使用默认凭证链为指定region创建客户端
    pub async fn from_region(region: impl Into<String>) -> Self {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.into()))
            .load()
            .await;
        Self::new(Client::new(&sdk_config))
    }

    fn instance(instance_id: &str) -> Instance {
        Instance::builder().instance_id(instance_id).build()
    }

    fn instance_ids(instances: &[Instance]) -> Vec<String> {
        instances
            .iter()
            .filter_map(|instance| instance.instance_id().map(str::to_string))
            .collect()
    }
}

#[async_trait]
impl LoadBalancerClient for AwsElbClient {
    async fn list_all(&self) -> Result<Vec<LoadBalancerMembership>, ElbClientError> {
        let mut memberships = Vec::new();
        let mut marker: Option<String> = None;

        // 按分页标记取完所有页
        loop {
            let output = self
                .client
                .describe_load_balancers()
                .set_marker(marker.take())
                .send()
                .await
                .map_err(|e| ElbClientError::provider("DescribeLoadBalancers", e))?;

            for description in output.load_balancer_descriptions() {
                let Some(name) = description.load_balancer_name() else {
                    warn!("Skipping load balancer description without a name");
                    continue;
                };
                memberships.push(LoadBalancerMembership::new(
                    name,
                    Self::instance_ids(description.instances()),
                ));
            }

            match output.next_marker() {
                Some(next) if !next.is_empty() => marker = Some(next.to_string()),
                _ => break,
            }
        }

        debug!("Listed {} load balancers", memberships.len());
        Ok(memberships)
    }

    async fn register(
        &self,
        load_balancer: &str,
        instance_id: &str,
    ) -> Result<Vec<String>, ElbClientError> {
        let output = self
            .client
            .register_instances_with_load_balancer()
            .load_balancer_name(load_balancer)
            .instances(Self::instance(instance_id))
            .send()
            .await
            .map_err(|e| ElbClientError::provider("RegisterInstancesWithLoadBalancer", e))?;

        Ok(Self::instance_ids(output.instances()))
    }

    async fn deregister(
        &self,
        load_balancer: &str,
        instance_id: &str,
    ) -> Result<Vec<String>, ElbClientError> {
        let output = self
            .client
            .deregister_instances_from_load_balancer()
            .load_balancer_name(load_balancer)
            .instances(Self::instance(instance_id))
            .send()
            .await
            .map_err(|e| ElbClientError::provider("DeregisterInstancesFromLoadBalancer", e))?;

        Ok(Self::instance_ids(output.instances()))
    }

    async fn describe_health(
        &self,
        load_balancer: &str,
        instance_id: &str,
    ) -> Result<InstanceHealth, ElbClientError> {
        const OPERATION: &str = "DescribeInstanceHealth";

        let output = self
            .client
            .describe_instance_health()
            .load_balancer_name(load_balancer)
            .instances(Self::instance(instance_id))
            .send()
            .await
            .map_err(|e| ElbClientError::provider(OPERATION, e))?;

        let state = output
            .instance_states()
            .first()
            .and_then(|state| state.state())
            .ok_or_else(|| ElbClientError::malformed(OPERATION, "no instance state returned"))?;

        Ok(InstanceHealth::from_provider(state))
    }
}
