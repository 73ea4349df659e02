use std::fmt;
use thiserror::Error;

// 负载均衡器客户端错误类型
#[derive(Error, Debug)]
pub enum ElbClientError {
    #[error("{operation} failed: {source}")]
    Provider {
        operation: &'static str,
        #[source]
        source: aws_sdk_elasticloadbalancing::Error,
    },
    #[error("{operation} returned a malformed response: {reason}")]
    MalformedResponse {
        operation: &'static str,
        reason: String,
    },
}

impl ElbClientError {
    pub fn provider<E>(operation: &'static str, error: E) -> Self
    where
        E: Into<aws_sdk_elasticloadbalancing::Error>,
    {
        Self::Provider {
            operation,
            source: error.into(),
        }
    }

    pub fn malformed(operation: &'static str, reason: impl Into<String>) -> Self {
        Self::MalformedResponse {
            operation,
            reason: reason.into(),
        }
    }
}

/// 负载均衡器及其当前注册的实例
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadBalancerMembership {
    pub name: String,
    pub instance_ids: Vec<String>,
}

impl LoadBalancerMembership {
    pub fn new(name: impl Into<String>, instance_ids: Vec<String>) -> Self {
        Self {
            name: name.into(),
            instance_ids,
        }
    }
}

/// 实例健康状态
///
/// `Unchecked` 只是轮询前的初始值，不会由API返回；
/// 除 `InService` 之外的状态原样保留
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstanceHealth {
    Unchecked,
    InService,
    Other(String),
}

impl InstanceHealth {
    pub const IN_SERVICE: &'static str = "InService";

    pub fn from_provider(state: &str) -> Self {
        if state == Self::IN_SERVICE {
            InstanceHealth::InService
        } else {
            InstanceHealth::Other(state.to_string())
        }
    }

    pub fn is_in_service(&self) -> bool {
        matches!(self, InstanceHealth::InService)
    }

    pub fn as_str(&self) -> &str {
        match self {
            InstanceHealth::Unchecked => "UNCHECKED",
            InstanceHealth::InService => Self::IN_SERVICE,
            InstanceHealth::Other(state) => state,
        }
    }
}

impl fmt::Display for InstanceHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
