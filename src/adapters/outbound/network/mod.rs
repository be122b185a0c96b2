mod caching_hash_source;
mod http;
mod maven_client;
mod pypi_client;
mod sumdb_client;

pub use caching_hash_source::CachingHashSource;
pub use maven_client::{MavenChecksumSource, DEFAULT_MAVEN_REPO};
pub use pypi_client::{PyPiHashSource, DEFAULT_PYPI_URL};
pub use sumdb_client::{SumDbClient, DEFAULT_SUMDB};
