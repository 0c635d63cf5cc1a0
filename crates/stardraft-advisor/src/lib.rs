pub mod advisor;

pub use advisor::{AdvisorContext, AdvisorFeatures, AdvisorProfile, DraftPlan, DraftPlanner};
