pub mod context;
pub mod discovery;
pub mod event;
pub mod health_gate;
pub mod registration;

#[cfg(test)]
mod mock;
#[cfg(test)]
mod lifecycle_tests;

pub use context::{HookContext, LifecycleError};
pub use discovery::associated_load_balancers;
pub use event::{HookAction, LifecycleEvent, LIFECYCLE_EVENT_VAR};
pub use health_gate::{HealthCheckOutcome, HealthPolicy};
