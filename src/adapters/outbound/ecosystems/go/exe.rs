use super::buildinfo::{read_build_info, BuildInfo};
use crate::bom::domain::{ArtifactKind, Dependency};
use crate::bom::services::HashCombiner;
use crate::ports::outbound::Artifact;
use crate::shared::error::BomError;
use crate::shared::security::{validate_file_size, validate_regular_file, MAX_FILE_SIZE};
use crate::shared::Result;
use async_trait::async_trait;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tokio::sync::OnceCell;
use tracing::debug;

/// Leading bytes of ELF, PE and Mach-O (thin and fat) images
const EXECUTABLE_MAGICS: [&[u8]; 7] = [
    b"\x7fELF",
    b"MZ",
    b"\xfe\xed\xfa\xce",
    b"\xfe\xed\xfa\xcf",
    b"\xce\xfa\xed\xfe",
    b"\xcf\xfa\xed\xfe",
    b"\xca\xfe\xba\xbe",
];

/// GoBinaryArtifact reads the module list the Go linker embeds in executables
pub struct GoBinaryArtifact {
    path: PathBuf,
    build_info: BuildInfo,
    dependencies: OnceCell<Vec<Dependency>>,
}

impl GoBinaryArtifact {
    /// Returns an artifact when `path` is an executable with Go build information
    ///
    /// Only the first bytes of the file are read unless they carry an
    /// executable magic number.
    ///
    /// # Errors
    /// Returns an error when an executable exceeds `MAX_FILE_SIZE` or cannot
    /// be read.
    pub fn detect(path: &Path) -> Result<Option<Self>> {
        let metadata = validate_regular_file(path, "executable")?;
        let read_error = |e: std::io::Error| BomError::FileReadError {
            path: path.to_path_buf(),
            details: e.to_string(),
        };

        let mut file = File::open(path).map_err(read_error)?;
        let mut magic = [0u8; 4];
        let len = read_prefix(&mut file, &mut magic).map_err(read_error)?;
        if !is_executable(&magic[..len]) {
            return Ok(None);
        }
        validate_file_size(metadata.len(), path, MAX_FILE_SIZE)?;

        let mut data = magic[..len].to_vec();
        file.take(MAX_FILE_SIZE)
            .read_to_end(&mut data)
            .map_err(read_error)?;

        let Some(build_info) = read_build_info(&data)? else {
            debug!(path = %path.display(), "Executable carries no Go build information");
            return Ok(None);
        };
        debug!(path = %path.display(), go_version = %build_info.go_version, "Found Go build information");

        Ok(Some(Self {
            path: path.to_path_buf(),
            build_info,
            dependencies: OnceCell::new(),
        }))
    }

    pub fn go_version(&self) -> &str {
        &self.build_info.go_version
    }
}

/// Fills `buf` from the start of `file`, stopping early at end of file
fn read_prefix(file: &mut File, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match file.read(&mut buf[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}

fn is_executable(prefix: &[u8]) -> bool {
    EXECUTABLE_MAGICS.iter().any(|magic| prefix.starts_with(magic))
}

/// Parses `dep` and `=>` lines of the embedded module information
///
/// Each accepted line has four tab-separated fields: tag, module path,
/// version and `h1:` hash. Lines without a hash (local replacements) are
/// skipped.
pub(crate) fn parse_mod_info(mod_info: &str) -> Result<Vec<Dependency>> {
    let mut dependencies = Vec::new();
    for line in mod_info.lines() {
        let fields: Vec<&str> = line.split('\t').collect();
        let [tag, name, version, hash] = fields.as_slice() else {
            continue;
        };
        if *tag != "dep" && *tag != "=>" {
            continue;
        }

        let hash = HashCombiner::decode_mod_hash(hash).map_err(|e| BomError::MalformedHash {
            dependency: format!("{}@{}", name, version),
            details: e.to_string(),
        })?;
        dependencies.push(Dependency::new(*name, *version, hash)?);
    }
    Ok(dependencies)
}

#[async_trait]
impl Artifact for GoBinaryArtifact {
    fn path(&self) -> &Path {
        &self.path
    }

    fn kind(&self) -> ArtifactKind {
        ArtifactKind::Go
    }

    async fn dependencies(&self) -> Result<&[Dependency]> {
        self.dependencies
            .get_or_try_init(|| async { parse_mod_info(&self.build_info.mod_info) })
            .await
            .map(Vec::as_slice)
    }
}
