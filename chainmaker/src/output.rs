//! Output-format dispatch and the tar/zip packagers.
//!
//! The requested format arrives as a string from the CLI or config file and
//! is resolved once into [`OutputFormat`]. [`package`] then runs exactly one
//! packaging action; there is no fallback format.

use std::fmt;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::chain::ChainFiles;
use crate::error::Error;

/// Issue tracking Kubernetes manifest output.
pub const KUBERNETES_ISSUE: &str = "#1272";

/// Distributable output format for a materialized chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputFormat {
    /// Tar bundle of the chain directory.
    Tar,
    /// Zip bundle of the chain directory.
    Zip,
    /// Kubernetes manifests. Recognized but not implemented.
    Kubernetes,
    /// Anything else, kept verbatim for the error message.
    Unsupported(String),
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s {
            "tar" => Self::Tar,
            "zip" => Self::Zip,
            "kubernetes" => Self::Kubernetes,
            other => Self::Unsupported(other.to_owned()),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tar => f.write_str("tar"),
            Self::Zip => f.write_str("zip"),
            Self::Kubernetes => f.write_str("kubernetes"),
            Self::Unsupported(other) => f.write_str(other),
        }
    }
}

/// The requested output format cannot be produced.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OutputError {
    /// The format is known but packaging for it does not exist yet.
    #[error("{format} output is not yet implemented, see issue {issue}")]
    NotImplemented {
        /// Requested format.
        format: String,
        /// Tracking issue reference.
        issue: &'static str,
    },

    /// The format is not one this tool knows about.
    #[error("output must be one of [tar,zip,kubernetes], got '{0}'")]
    Unsupported(String),
}

/// A packaged chain artifact on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Location of the archive.
    pub path: PathBuf,
}

/// Packaging actions for each implemented [`OutputFormat`].
pub trait Packager {
    /// Bundle the chain's files into a tar archive.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Package`] if the archive cannot be written.
    fn tar(&self, chain: &ChainFiles) -> Result<Artifact, Error>;

    /// Bundle the chain's files into a zip archive.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Package`] if the archive cannot be written.
    fn zip(&self, chain: &ChainFiles) -> Result<Artifact, Error>;
}

/// Package `chain` in the requested `format`.
///
/// # Errors
///
/// Returns the packager's error unmodified for `tar` and `zip`, and an
/// [`OutputError`] for `kubernetes` or any unrecognized format.
pub fn package<P: Packager + ?Sized>(
    format: &OutputFormat,
    chain: &ChainFiles,
    packager: &P,
) -> Result<Artifact, Error> {
    match format {
        OutputFormat::Tar => packager.tar(chain),
        OutputFormat::Zip => packager.zip(chain),
        OutputFormat::Kubernetes => Err(OutputError::NotImplemented {
            format: format.to_string(),
            issue: KUBERNETES_ISSUE,
        }
        .into()),
        OutputFormat::Unsupported(other) => Err(OutputError::Unsupported(other.clone()).into()),
    }
}

/// Writes `<out_dir>/<chain>.tar` or `<out_dir>/<chain>.zip`, placing every
/// chain file under a top-level `<chain>/` directory.
#[derive(Debug, Clone)]
pub struct ArchivePackager {
    out_dir: PathBuf,
}

impl ArchivePackager {
    /// Creates a packager writing archives into `out_dir`.
    #[must_use]
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    fn create(&self, chain: &ChainFiles, extension: &str) -> Result<(PathBuf, File), Error> {
        fs::create_dir_all(&self.out_dir).map_err(|e| {
            Error::package_with(format!("failed to create '{}'", self.out_dir.display()), e)
        })?;
        let path = self.out_dir.join(format!("{}.{extension}", chain.name));
        let file = File::create(&path)
            .map_err(|e| Error::package_with(format!("failed to create '{}'", path.display()), e))?;
        Ok((path, file))
    }
}

/// Archive entry name for `rel`, always `/`-separated.
fn entry_name(chain: &str, rel: &Path) -> String {
    let mut name = String::from(chain);
    for component in rel.components() {
        name.push('/');
        name.push_str(&component.as_os_str().to_string_lossy());
    }
    name
}

impl Packager for ArchivePackager {
    fn tar(&self, chain: &ChainFiles) -> Result<Artifact, Error> {
        let (path, file) = self.create(chain, "tar")?;
        let write = || -> io::Result<()> {
            let mut builder = tar::Builder::new(file);
            for rel in &chain.files {
                builder.append_path_with_name(chain.root.join(rel), entry_name(&chain.name, rel))?;
            }
            builder.into_inner()?.sync_all()
        };
        write().map_err(|e| Error::package_with(format!("failed to write '{}'", path.display()), e))?;
        tracing::debug!(path = %path.display(), files = chain.files.len(), "tar archive written");
        Ok(Artifact { path })
    }

    fn zip(&self, chain: &ChainFiles) -> Result<Artifact, Error> {
        let (path, file) = self.create(chain, "zip")?;
        let write = || -> zip::result::ZipResult<()> {
            let options = zip::write::SimpleFileOptions::default()
                .compression_method(zip::CompressionMethod::Deflated)
                .unix_permissions(0o644);
            let mut writer = zip::ZipWriter::new(file);
            for rel in &chain.files {
                writer.start_file(entry_name(&chain.name, rel), options)?;
                let mut source = File::open(chain.root.join(rel))?;
                io::copy(&mut source, &mut writer)?;
            }
            writer.finish()?.sync_all()?;
            Ok(())
        };
        write().map_err(|e| Error::package_with(format!("failed to write '{}'", path.display()), e))?;
        tracing::debug!(path = %path.display(), files = chain.files.len(), "zip archive written");
        Ok(Artifact { path })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::io::Read;

    use super::*;

    #[derive(Default)]
    struct CountingPackager {
        tars: Cell<usize>,
        zips: Cell<usize>,
    }

    impl Packager for CountingPackager {
        fn tar(&self, chain: &ChainFiles) -> Result<Artifact, Error> {
            self.tars.set(self.tars.get() + 1);
            Ok(Artifact {
                path: PathBuf::from(format!("{}.tar", chain.name)),
            })
        }

        fn zip(&self, _chain: &ChainFiles) -> Result<Artifact, Error> {
            self.zips.set(self.zips.get() + 1);
            Err(Error::Package("disk full".into()))
        }
    }

    fn sample_chain(dir: &Path) -> ChainFiles {
        let root = dir.join("testchain");
        fs::create_dir_all(root.join("testchain_full_000")).unwrap();
        fs::write(root.join("genesis.json"), b"{\"chain_id\":\"testchain\"}").unwrap();
        fs::write(root.join("testchain_full_000/config.toml"), b"moniker = \"a\"\n").unwrap();
        ChainFiles {
            name: "testchain".into(),
            root,
            files: vec![
                PathBuf::from("genesis.json"),
                PathBuf::from("testchain_full_000").join("config.toml"),
            ],
        }
    }

    #[test]
    fn resolves_format_strings() {
        assert_eq!(OutputFormat::from("tar"), OutputFormat::Tar);
        assert_eq!(OutputFormat::from("zip"), OutputFormat::Zip);
        assert_eq!(OutputFormat::from("kubernetes"), OutputFormat::Kubernetes);
        assert_eq!(
            OutputFormat::from("TAR"),
            OutputFormat::Unsupported("TAR".into())
        );
    }

    #[test]
    fn tar_and_zip_invoke_exactly_one_action() {
        let chain = ChainFiles {
            name: "x".into(),
            root: PathBuf::from("x"),
            files: Vec::new(),
        };
        let packager = CountingPackager::default();

        let artifact = package(&OutputFormat::Tar, &chain, &packager).unwrap();
        assert_eq!(artifact.path, PathBuf::from("x.tar"));
        assert_eq!((packager.tars.get(), packager.zips.get()), (1, 0));

        let err = package(&OutputFormat::Zip, &chain, &packager).unwrap_err();
        assert_eq!(err.to_string(), "package: disk full");
        assert_eq!((packager.tars.get(), packager.zips.get()), (1, 1));
    }

    #[test]
    fn kubernetes_is_not_yet_implemented() {
        let chain = ChainFiles {
            name: "x".into(),
            root: PathBuf::from("x"),
            files: Vec::new(),
        };
        let packager = CountingPackager::default();
        let err = package(&OutputFormat::Kubernetes, &chain, &packager).unwrap_err();
        assert!(matches!(
            err,
            Error::Output(OutputError::NotImplemented { issue: KUBERNETES_ISSUE, .. })
        ));
        assert!(err.to_string().contains("not yet implemented, see issue #1272"));
        assert_eq!((packager.tars.get(), packager.zips.get()), (0, 0));
    }

    #[test]
    fn unknown_format_is_unsupported() {
        let chain = ChainFiles {
            name: "x".into(),
            root: PathBuf::from("x"),
            files: Vec::new(),
        };
        let packager = CountingPackager::default();
        for raw in ["docker", "", "Tar"] {
            let err = package(&OutputFormat::from(raw), &chain, &packager).unwrap_err();
            assert!(
                matches!(err, Error::Output(OutputError::Unsupported(ref got)) if got == raw),
                "{raw}: {err}"
            );
        }
        assert_eq!((packager.tars.get(), packager.zips.get()), (0, 0));
    }

    #[test]
    fn tar_bundle_holds_chain_files_under_chain_dir() {
        let dir = tempfile::tempdir().unwrap();
        let chain = sample_chain(dir.path());
        let packager = ArchivePackager::new(dir.path().join("out"));

        let artifact = packager.tar(&chain).unwrap();
        assert_eq!(artifact.path, dir.path().join("out/testchain.tar"));

        let mut archive = tar::Archive::new(File::open(&artifact.path).unwrap());
        let names: Vec<String> = archive
            .entries()
            .unwrap()
            .map(|e| e.unwrap().path().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            ["testchain/genesis.json", "testchain/testchain_full_000/config.toml"]
        );
    }

    #[test]
    fn zip_bundle_holds_chain_files_under_chain_dir() {
        let dir = tempfile::tempdir().unwrap();
        let chain = sample_chain(dir.path());
        let packager = ArchivePackager::new(dir.path());

        let artifact = packager.zip(&chain).unwrap();
        assert_eq!(artifact.path, dir.path().join("testchain.zip"));

        let mut archive = zip::ZipArchive::new(File::open(&artifact.path).unwrap()).unwrap();
        assert_eq!(archive.len(), 2);
        let mut genesis = String::new();
        archive
            .by_name("testchain/genesis.json")
            .unwrap()
            .read_to_string(&mut genesis)
            .unwrap();
        assert_eq!(genesis, "{\"chain_id\":\"testchain\"}");
        assert!(archive
            .by_name("testchain/testchain_full_000/config.toml")
            .is_ok());
    }

    #[test]
    fn missing_source_file_is_a_package_error() {
        let dir = tempfile::tempdir().unwrap();
        let chain = ChainFiles {
            name: "ghost".into(),
            root: dir.path().join("ghost"),
            files: vec![PathBuf::from("genesis.json")],
        };
        let err = ArchivePackager::new(dir.path()).tar(&chain).unwrap_err();
        assert!(matches!(err, Error::Package(_)), "{err}");
    }
}
