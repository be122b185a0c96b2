/// BOM domain layer
///
/// Pure business logic: the hash and dependency model, hash
/// canonicalization and the trust policy. Nothing here touches the
/// filesystem or network directly; I/O happens through ports.
pub mod domain;
pub mod policies;
pub mod services;
