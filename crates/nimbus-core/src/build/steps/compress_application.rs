use std::fs::{self, File};
use std::io::{self, BufWriter};

use anyhow::Context;
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

use crate::build::{BuildPaths, BuildStep};
use crate::config::{EnvironmentConfiguration, ProjectConfiguration};
use crate::error::{DeployError, Result};
use crate::fs::walk_files;

/// Largest uncompressed application accepted for zip deployments (250 MiB)
pub const MAX_APPLICATION_SIZE: u64 = 250 * 1024 * 1024;

/// Compress the build directory into the zip artifact.
pub struct CompressApplication {
    paths: BuildPaths,
    max_size: u64,
}

impl CompressApplication {
    pub fn new(paths: BuildPaths) -> Self {
        Self::with_size_limit(paths, MAX_APPLICATION_SIZE)
    }

    pub fn with_size_limit(paths: BuildPaths, max_size: u64) -> Self {
        Self { paths, max_size }
    }
}

impl BuildStep for CompressApplication {
    fn description(&self) -> String {
        "Compressing application".to_string()
    }

    fn perform(
        &self,
        _environment: &EnvironmentConfiguration,
        _project: &ProjectConfiguration,
    ) -> Result<()> {
        let app_dir = self.paths.app_dir();
        let artifact = self.paths.artifact_path();

        if artifact.exists() {
            fs::remove_file(&artifact)
                .with_context(|| format!("Failed to remove {}", artifact.display()))?;
        }

        let files = walk_files(&app_dir)?;
        let mut total = 0u64;
        for file in &files {
            total += fs::metadata(&file.path)
                .with_context(|| format!("Failed to stat {}", file.path.display()))?
                .len();
        }
        if total > self.max_size {
            return Err(DeployError::Build(format!(
                "application is {} MiB uncompressed, over the {} MiB limit for zip deployments. \
                 Use an image deployment instead",
                total / (1024 * 1024),
                self.max_size / (1024 * 1024)
            )));
        }

        let out = File::create(&artifact)
            .with_context(|| format!("Failed to create {}", artifact.display()))?;
        let mut zip = zip::ZipWriter::new(BufWriter::new(out));
        let base = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for file in &files {
            #[cfg(unix)]
            let options = {
                use std::os::unix::fs::PermissionsExt;
                let mode = fs::metadata(&file.path)
                    .with_context(|| format!("Failed to stat {}", file.path.display()))?
                    .permissions()
                    .mode();
                base.unix_permissions(mode)
            };
            #[cfg(not(unix))]
            let options = base;

            zip.start_file(file.relative.as_str(), options)
                .with_context(|| format!("Failed to add {} to archive", file.relative))?;
            let mut input = File::open(&file.path)
                .with_context(|| format!("Failed to open {}", file.path.display()))?;
            io::copy(&mut input, &mut zip)
                .with_context(|| format!("Failed to compress {}", file.path.display()))?;
        }

        zip.finish()
            .with_context(|| format!("Failed to finish {}", artifact.display()))?;

        tracing::info!(
            files = files.len(),
            bytes = total,
            artifact = %artifact.display(),
            "compressed application"
        );
        Ok(())
    }
}
