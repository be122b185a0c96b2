/// Ports module defining interfaces for hexagonal architecture
///
/// The CLI drives the application layer directly, so only outbound
/// (driven) ports are defined here.
pub mod outbound;
