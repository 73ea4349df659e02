//! elbgate Load Balance Library
//!
//! This library provides the load balancer side of elbgate including:
//! - A client trait over the classic load balancer control API
//! - The AWS SDK implementation of that trait
//! - The four deployment lifecycle operations and event dispatch

pub mod client;
pub mod lifecycle;

// Re-export commonly used types
pub use client::{
    AwsElbClient, ElbClientError, InstanceHealth, LoadBalancerClient, LoadBalancerMembership,
};
pub use lifecycle::{
    HealthCheckOutcome, HealthPolicy, HookAction, HookContext, LifecycleError, LifecycleEvent,
};
