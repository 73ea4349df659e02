use super::health_gate::HealthPolicy;
use crate::client::{ElbClientError, LoadBalancerClient};
use elbgate_core::{AssociationCache, CacheError, InstanceIdentity, Reporter};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error(transparent)]
    Client(#[from] ElbClientError),
    #[error(
        "instance {instance_id} failed to register with elb, elb: {load_balancer}, last state: {last_state} after {attempts} checks"
    )]
    NotInService {
        instance_id: String,
        load_balancer: String,
        last_state: String,
        attempts: u32,
    },
    #[error("unknown lifecycle event '{0}'")]
    UnknownEvent(String),
    #[error("environment variable {0} is not set")]
    MissingEvent(&'static str),
}

/// 生命周期钩子上下文
///
/// 进程启动时构建一次，之后只读：实例身份、负载均衡器客户端、
/// 关联缓存、健康检查策略和结果输出端都从这里显式传给各个操作
pub struct HookContext<C> {
    pub(crate) identity: InstanceIdentity,
    pub(crate) client: C,
    pub(crate) cache: AssociationCache,
    pub(crate) policy: HealthPolicy,
    pub(crate) reporter: Reporter,
}

impl<C: LoadBalancerClient> HookContext<C> {
    pub fn new(
        identity: InstanceIdentity,
        client: C,
        cache: AssociationCache,
        policy: HealthPolicy,
    ) -> Self {
        Self {
            identity,
            client,
            cache,
            policy,
            reporter: Reporter::stdout(),
        }
    }

    /// 替换结果行输出端
    pub fn with_reporter(mut self, reporter: Reporter) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn identity(&self) -> &InstanceIdentity {
        &self.identity
    }

    pub fn cache(&self) -> &AssociationCache {
        &self.cache
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn policy(&self) -> &HealthPolicy {
        &self.policy
    }

    pub fn reporter(&self) -> &Reporter {
        &self.reporter
    }
}
