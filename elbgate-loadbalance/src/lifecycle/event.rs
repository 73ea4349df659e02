use super::context::{HookContext, LifecycleError};
use crate::client::LoadBalancerClient;
use std::fmt;
use std::str::FromStr;
use tracing::info;

/// 部署代理为每个钩子脚本设置的生命周期事件环境变量
pub const LIFECYCLE_EVENT_VAR: &str = "LIFECYCLE_EVENT";

/// 四个生命周期操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookAction {
    Discover,
    Deregister,
    Register,
    WaitUntilHealthy,
}

impl fmt::Display for HookAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HookAction::Discover => "discover",
            HookAction::Deregister => "deregister",
            HookAction::Register => "register",
            HookAction::WaitUntilHealthy => "wait-healthy",
        };
        f.write_str(name)
    }
}

/// 部署代理的生命周期事件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    BeforeInstall,
    BeforeBlockTraffic,
    AfterInstall,
    ApplicationStart,
    AfterAllowTraffic,
    ValidateService,
}

impl LifecycleEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleEvent::BeforeInstall => "BeforeInstall",
            LifecycleEvent::BeforeBlockTraffic => "BeforeBlockTraffic",
            LifecycleEvent::AfterInstall => "AfterInstall",
            LifecycleEvent::ApplicationStart => "ApplicationStart",
            LifecycleEvent::AfterAllowTraffic => "AfterAllowTraffic",
            LifecycleEvent::ValidateService => "ValidateService",
        }
    }

    /// 事件对应的操作
    pub fn action(&self) -> HookAction {
        match self {
            LifecycleEvent::BeforeInstall => HookAction::Discover,
            LifecycleEvent::BeforeBlockTraffic => HookAction::Deregister,
            LifecycleEvent::AfterInstall | LifecycleEvent::ApplicationStart => HookAction::Register,
            LifecycleEvent::AfterAllowTraffic | LifecycleEvent::ValidateService => {
                HookAction::WaitUntilHealthy
            }
        }
    }

    pub fn from_env() -> Result<Self, LifecycleError> {
        let value = std::env::var(LIFECYCLE_EVENT_VAR)
            .map_err(|_| LifecycleError::MissingEvent(LIFECYCLE_EVENT_VAR))?;
        value.parse()
    }
}

impl FromStr for LifecycleEvent {
    type Err = LifecycleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "BeforeInstall" => Ok(LifecycleEvent::BeforeInstall),
            "BeforeBlockTraffic" => Ok(LifecycleEvent::BeforeBlockTraffic),
            "AfterInstall" => Ok(LifecycleEvent::AfterInstall),
            "ApplicationStart" => Ok(LifecycleEvent::ApplicationStart),
            "AfterAllowTraffic" => Ok(LifecycleEvent::AfterAllowTraffic),
            "ValidateService" => Ok(LifecycleEvent::ValidateService),
            other => Err(LifecycleError::UnknownEvent(other.to_string())),
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<C: LoadBalancerClient> HookContext<C> {
    /// 执行指定的生命周期操作
    pub async fn run(&self, action: HookAction) -> Result<(), LifecycleError> {
        info!("Running {} for instance {}", action, self.identity.instance_id);

        match action {
            HookAction::Discover => self.discover().await.map(|_| ()),
            HookAction::Deregister => self.deregister_all().await,
            HookAction::Register => self.register_all().await,
            HookAction::WaitUntilHealthy => self.wait_until_healthy().await.map(|_| ()),
        }
    }
}
