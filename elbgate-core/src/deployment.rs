use std::fmt;
use thiserror::Error;

/// 部署代理注入的部署组ID环境变量
pub const DEPLOYMENT_GROUP_ID_VAR: &str = "DEPLOYMENT_GROUP_ID";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DeploymentGroupError {
    #[error("environment variable {0} is not set")]
    Missing(&'static str),
    #[error("deployment group id is empty")]
    Empty,
    #[error("deployment group id '{0}' cannot be used in a file name")]
    Unsafe(String),
}

/// 部署组ID
///
/// 会被拼接进缓存文件路径，因此拒绝包含路径分隔符的值以及 `.`、`..`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeploymentGroupId(String);

impl DeploymentGroupId {
    pub fn new(value: impl Into<String>) -> Result<Self, DeploymentGroupError> {
        let value = value.into();

        if value.trim().is_empty() {
            return Err(DeploymentGroupError::Empty);
        }

        if value.contains(['/', '\\']) || value == "." || value == ".." {
            return Err(DeploymentGroupError::Unsafe(value));
        }

        Ok(Self(value))
    }

    pub fn from_env() -> Result<Self, DeploymentGroupError> {
        let value = std::env::var(DEPLOYMENT_GROUP_ID_VAR)
            .map_err(|_| DeploymentGroupError::Missing(DEPLOYMENT_GROUP_ID_VAR))?;
        Self::new(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeploymentGroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
