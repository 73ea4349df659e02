//! elbgate Core Library
//!
//! This library provides core functionality for elbgate including:
//! - Configuration management
//! - Instance identity resolution from the metadata endpoint
//! - The per-deployment-group load balancer association cache
//! - Tagged hook output

pub mod cache;
pub mod config;
pub mod deployment;
pub mod identity;
pub mod report;

// Re-export commonly used types
pub use cache::{AssociationCache, AssociationRecord, CacheError};
pub use config::model::{
    AwsSettings, CacheSettings, HealthCheckSettings, MetadataSettings, Settings,
};
pub use deployment::{DeploymentGroupError, DeploymentGroupId};
pub use identity::{IdentityError, InstanceIdentity, MetadataClient};
pub use report::{MemorySink, Reporter};
