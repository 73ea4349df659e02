//! Instance identity resolution
//!
//! Reads the identity document served by the local metadata endpoint once at
//! startup. There is no retry: an unreachable endpoint or a malformed document
//! means the host environment is broken and the hook cannot proceed.

use crate::config::model::MetadataSettings;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

const TOKEN_HEADER: &str = "X-aws-ec2-metadata-token";
const TOKEN_TTL_HEADER: &str = "X-aws-ec2-metadata-token-ttl-seconds";

#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("failed to build metadata HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    #[error("metadata endpoint {url} is unreachable: {source}")]
    Unreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("metadata endpoint {url} returned status {status}")]
    Status { url: String, status: u16 },
    #[error("identity document is malformed: {0}")]
    Malformed(String),
}

/// 当前主机的实例身份，启动时获取一次，只保存在内存中
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InstanceIdentity {
    #[serde(rename = "instanceId")]
    pub instance_id: String,
    pub region: String,
}

impl InstanceIdentity {
    pub fn new(instance_id: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            region: region.into(),
        }
    }

    /// 解析身份文档，忽略其余字段
    pub fn from_document(body: &str) -> Result<Self, IdentityError> {
        let identity: InstanceIdentity =
            serde_json::from_str(body).map_err(|e| IdentityError::Malformed(e.to_string()))?;

        if identity.instance_id.is_empty() {
            return Err(IdentityError::Malformed("instanceId is empty".to_string()));
        }
        if identity.region.is_empty() {
            return Err(IdentityError::Malformed("region is empty".to_string()));
        }

        Ok(identity)
    }
}

/// 元数据端点客户端
pub struct MetadataClient {
    client: Client,
    settings: MetadataSettings,
}

impl MetadataClient {
    pub fn new(settings: &MetadataSettings) -> Result<Self, IdentityError> {
        // 元数据端点是链路本地地址，不能走系统代理
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .no_proxy()
            .build()
            .map_err(IdentityError::ClientBuild)?;

        Ok(Self {
            client,
            settings: settings.clone(),
        })
    }

    /// 获取实例身份
    pub async fn resolve(&self) -> Result<InstanceIdentity, IdentityError> {
        let url = &self.settings.document_url;
        let token = if self.settings.use_token {
            self.fetch_token().await
        } else {
            None
        };

        let mut request = self.client.get(url);
        if let Some(token) = &token {
            request = request.header(TOKEN_HEADER, token);
        }

        let response = request
            .send()
            .await
            .map_err(|source| IdentityError::Unreachable {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(IdentityError::Status {
                url: url.clone(),
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|source| IdentityError::Unreachable {
                url: url.clone(),
                source,
            })?;

        let identity = InstanceIdentity::from_document(&body)?;
        info!(
            "Resolved instance identity: {} in {}",
            identity.instance_id, identity.region
        );
        Ok(identity)
    }

    /// 申请会话令牌，失败时回退到无令牌请求
    async fn fetch_token(&self) -> Option<String> {
        let response = self
            .client
            .put(&self.settings.token_url)
            .header(TOKEN_TTL_HEADER, self.settings.token_ttl_seconds.to_string())
            .send()
            .await;

        match response {
            Ok(response) if response.status().is_success() => match response.text().await {
                Ok(token) if !token.trim().is_empty() => Some(token.trim().to_string()),
                Ok(_) => {
                    debug!("Metadata token response was empty, continuing without token");
                    None
                }
                Err(e) => {
                    debug!("Failed to read metadata token: {}", e);
                    None
                }
            },
            Ok(response) => {
                debug!(
                    "Metadata token request returned status {}, continuing without token",
                    response.status().as_u16()
                );
                None
            }
            Err(e) => {
                debug!("Metadata token request failed: {}", e);
                None
            }
        }
    }
}
