//! Client profile entity, merge semantics, and scoring.

pub mod model;
pub mod quality;

pub use model::{Profile, ProfileField, ProfileFragment, VerificationStatus};
pub use quality::data_quality_score;
