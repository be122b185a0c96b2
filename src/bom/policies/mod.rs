pub mod unsupported_threshold;

pub use unsupported_threshold::UnsupportedThreshold;
