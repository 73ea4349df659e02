use crate::client::{ElbClientError, InstanceHealth, LoadBalancerClient, LoadBalancerMembership};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListAll,
    Register(String, String),
    Deregister(String, String),
    DescribeHealth(String, String),
}

/// 记录所有调用的模拟客户端
///
/// 健康状态按负载均衡器预先编排，队列耗尽后返回 `OutOfService`
#[derive(Default)]
pub struct RecordingClient {
    memberships: Vec<LoadBalancerMembership>,
    health: Mutex<HashMap<String, VecDeque<InstanceHealth>>>,
    failing: Option<String>,
    calls: Mutex<Vec<Call>>,
}

impl RecordingClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_membership(mut self, name: &str, instance_ids: &[&str]) -> Self {
        self.memberships.push(LoadBalancerMembership::new(
            name,
            instance_ids.iter().map(|id| id.to_string()).collect(),
        ));
        self
    }

    pub fn with_health(self, load_balancer: &str, states: &[&str]) -> Self {
        self.health.lock().unwrap().insert(
            load_balancer.to_string(),
            states.iter().map(|s| InstanceHealth::from_provider(s)).collect(),
        );
        self
    }

    /// 对该负载均衡器的任何调用都返回错误
    pub fn failing_on(mut self, load_balancer: &str) -> Self {
        self.failing = Some(load_balancer.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn health_queries(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::DescribeHealth(lb, _) => Some(lb),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn check_failure(
        &self,
        operation: &'static str,
        load_balancer: &str,
    ) -> Result<(), ElbClientError> {
        if self.failing.as_deref() == Some(load_balancer) {
            return Err(ElbClientError::malformed(operation, "simulated failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl LoadBalancerClient for RecordingClient {
    async fn list_all(&self) -> Result<Vec<LoadBalancerMembership>, ElbClientError> {
        self.record(Call::ListAll);
        Ok(self.memberships.clone())
    }

    async fn register(
        &self,
        load_balancer: &str,
        instance_id: &str,
    ) -> Result<Vec<String>, ElbClientError> {
        self.record(Call::Register(load_balancer.to_string(), instance_id.to_string()));
        self.check_failure("RegisterInstancesWithLoadBalancer", load_balancer)?;
        Ok(vec![instance_id.to_string()])
    }

    async fn deregister(
        &self,
        load_balancer: &str,
        instance_id: &str,
    ) -> Result<Vec<String>, ElbClientError> {
        self.record(Call::Deregister(load_balancer.to_string(), instance_id.to_string()));
        self.check_failure("DeregisterInstancesFromLoadBalancer", load_balancer)?;
        Ok(vec![])
    }

    async fn describe_health(
        &self,
        load_balancer: &str,
        instance_id: &str,
    ) -> Result<InstanceHealth, ElbClientError> {
        self.record(Call::DescribeHealth(
            load_balancer.to_string(),
            instance_id.to_string(),
        ));
        self.check_failure("DescribeInstanceHealth", load_balancer)?;

        let state = self
            .health
            .lock()
            .unwrap()
            .get_mut(load_balancer)
            .and_then(|states| states.pop_front())
            .unwrap_or_else(|| InstanceHealth::Other("OutOfService".to_string()));
        Ok(state)
    }
}
