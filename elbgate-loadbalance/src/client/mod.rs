pub mod aws;
pub mod traits;
pub mod types;

pub use aws::AwsElbClient;
pub use traits::LoadBalancerClient;
pub use types::*;
