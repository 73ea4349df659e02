use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub metadata: MetadataSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub health_check: HealthCheckSettings,
    #[serde(default)]
    pub aws: AwsSettings,
}

/// 实例元数据端点配置
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MetadataSettings {
    #[serde(default = "default_document_url")]
    pub document_url: String,
    #[serde(default = "default_token_url")]
    pub token_url: String,
    /// 先申请会话令牌再读取身份文档
    #[serde(default = "default_true")]
    pub use_token: bool,
    #[serde(default = "default_token_ttl")]
    pub token_ttl_seconds: u64,
    #[serde(default = "default_metadata_timeout")]
    pub timeout_seconds: u64,
}

impl Default for MetadataSettings {
    fn default() -> Self {
        Self {
            document_url: default_document_url(),
            token_url: default_token_url(),
            use_token: true,
            token_ttl_seconds: default_token_ttl(),
            timeout_seconds: default_metadata_timeout(),
        }
    }
}

/// 负载均衡器关联缓存配置
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CacheSettings {
    #[serde(default = "default_cache_directory")]
    pub directory: String,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            directory: default_cache_directory(),
        }
    }
}

/// 健康检查轮询配置
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HealthCheckSettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_retry_interval")]
    pub retry_interval_seconds: u64,
}

impl Default for HealthCheckSettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_interval_seconds: default_retry_interval(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AwsSettings {
    /// 覆盖身份文档中的region
    #[serde(default)]
    pub region: Option<String>,
}

fn default_document_url() -> String {
    "http://169.254.169.254/latest/dynamic/instance-identity/document".to_string()
}

fn default_token_url() -> String {
    "http://169.254.169.254/latest/api/token".to_string()
}

fn default_true() -> bool {
    true
}

fn default_token_ttl() -> u64 {
    21600
}

fn default_metadata_timeout() -> u64 {
    5
}

fn default_cache_directory() -> String {
    "/tmp".to_string()
}

fn default_max_attempts() -> u32 {
    10
}

fn default_retry_interval() -> u64 {
    4
}

impl Settings {
    /// 验证配置的有效性
    pub fn validate(&self) -> Result<()> {
        self.validate_metadata()?;

        if self.cache.directory.trim().is_empty() {
            anyhow::bail!("cache.directory cannot be empty");
        }

        if self.health_check.max_attempts == 0 {
            anyhow::bail!("health_check.max_attempts cannot be 0");
        }

        if self.health_check.max_attempts > 100 {
            anyhow::bail!(
                "health_check.max_attempts too large: {} (maximum 100)",
                self.health_check.max_attempts
            );
        }

        if let Some(region) = &self.aws.region {
            if region.trim().is_empty() {
                anyhow::bail!("aws.region is set but empty");
            }
        }

        Ok(())
    }

    fn validate_metadata(&self) -> Result<()> {
        let metadata = &self.metadata;

        for (field, url) in [
            ("metadata.document_url", &metadata.document_url),
            ("metadata.token_url", &metadata.token_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                anyhow::bail!(
                    "{} has invalid format: '{}'. Must start with http:// or https://",
                    field,
                    url
                );
            }
        }

        if metadata.timeout_seconds == 0 || metadata.timeout_seconds > 60 {
            anyhow::bail!(
                "metadata.timeout_seconds must be between 1 and 60, got {}",
                metadata.timeout_seconds
            );
        }

        if metadata.token_ttl_seconds == 0 || metadata.token_ttl_seconds > 21600 {
            anyhow::bail!(
                "metadata.token_ttl_seconds must be between 1 and 21600, got {}",
                metadata.token_ttl_seconds
            );
        }

        Ok(())
    }

    /// 实际使用的region：配置优先，否则使用身份文档中的值
    pub fn effective_region<'a>(&'a self, reported: &'a str) -> &'a str {
        self.aws.region.as_deref().unwrap_or(reported)
    }
}
