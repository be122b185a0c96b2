pub mod error;
pub mod result;
pub mod security;
pub mod worker_pool;

pub use result::Result;
