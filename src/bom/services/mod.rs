pub mod hash_combiner;
pub mod trust_policy;

pub use hash_combiner::HashCombiner;
pub use trust_policy::{TrustPolicyEngine, TrustPolicyOptions};
