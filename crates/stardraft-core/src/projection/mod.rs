pub mod estimator;
pub mod policy;

pub use estimator::{ProjectionInput, SMOOTHING_ALPHA, ScoreAlgorithm, estimate, project_card};
pub use policy::{OneStarOnlyPolicy, ScorePolicies, ScorePolicy};
