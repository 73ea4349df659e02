use crate::deployment::DeploymentGroupId;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("load balancer cache {path} does not exist; run discovery first")]
    Missing { path: PathBuf },
    #[error("load balancer cache {path} is not a JSON array of names: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to read load balancer cache {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write load balancer cache {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode load balancer cache: {0}")]
    Encode(#[from] serde_json::Error),
}

/// 发现时刻本实例所属的负载均衡器名称快照
///
/// 序列化为JSON字符串数组，保持发现时的顺序
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssociationRecord(Vec<String>);

impl AssociationRecord {
    pub fn new(names: Vec<String>) -> Self {
        Self(names)
    }

    pub fn push(&mut self, name: impl Into<String>) {
        self.0.push(name.into());
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<String> for AssociationRecord {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a AssociationRecord {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// 负载均衡器关联缓存
///
/// 每个部署组一个文件。发现阶段写入一次，之后的生命周期阶段只读，
/// 不做文件锁。
#[derive(Debug, Clone)]
pub struct AssociationCache {
    path: PathBuf,
}

impl AssociationCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<directory>/deploy_<group>_elbs.json`
    pub fn for_group(directory: impl AsRef<Path>, group: &DeploymentGroupId) -> Self {
        let file_name = format!("deploy_{}_elbs.json", group.as_str());
        Self::new(directory.as_ref().join(file_name))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 写入缓存，覆盖已有内容
    pub async fn store(&self, record: &AssociationRecord) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|source| CacheError::Write {
                        path: self.path.clone(),
                        source,
                    })?;
            }
        }

        let body = serde_json::to_string(record)?;
        tokio::fs::write(&self.path, body)
            .await
            .map_err(|source| CacheError::Write {
                path: self.path.clone(),
                source,
            })?;

        debug!(
            "Stored {} load balancer names in {}",
            record.len(),
            self.path.display()
        );
        Ok(())
    }

    /// 读取缓存；文件不存在时返回 `CacheError::Missing` 而不是空列表
    pub async fn load(&self) -> Result<AssociationRecord, CacheError> {
        let body = match tokio::fs::read_to_string(&self.path).await {
            Ok(body) => body,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CacheError::Missing {
                    path: self.path.clone(),
                });
            }
            Err(source) => {
                return Err(CacheError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        serde_json::from_str(&body).map_err(|source| CacheError::Invalid {
            path: self.path.clone(),
            source,
        })
    }
}
