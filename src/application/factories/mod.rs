mod artifact_factory;

pub use artifact_factory::ArtifactFactory;
