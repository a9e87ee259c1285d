//! Content policy: tiered classification and PHI redaction.

pub mod classifier;
pub mod phi;

pub use classifier::{Classification, MessageAction, MessageCategory, Priority, PolicyClassifier};
pub use phi::{PhiDetection, PhiGuard, PhiType, RedactionMode};
