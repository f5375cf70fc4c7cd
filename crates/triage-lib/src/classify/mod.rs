//! Rule-based health classifiers
//!
//! Each classifier maps one snapshot record to either `None` (healthy) or an
//! [`Issue`](crate::issue::Issue) describing the first disqualifying
//! condition. Classifiers are pure: classifying the same record twice yields
//! equal issues.

mod deployment;
mod pod;
mod service;

pub use deployment::{classify_deployment, INSUFFICIENT_READY_REPLICAS, STALLED_ROLLOUT};
pub use pod::{classify_pod, HIGH_RESTART_COUNT, MAX_HEALTHY_RESTARTS};
pub use service::{
    classify_service, endpoints_unavailable, is_skipped, selector_string, ENDPOINTS_UNAVAILABLE,
    NO_ENDPOINTS_MESSAGE, NO_ENDPOINTS_REASON,
};
