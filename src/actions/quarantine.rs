//! Moving duplicates into a quarantine directory.
//!
//! The quarantine directory is a flat folder. A duplicate keeps its file
//! name unless that name is taken, in which case `_copy` is appended to the
//! stem (`photo.jpg` → `photo_copy.jpg` → `photo_copy_copy.jpg` …) until a
//! free name is found. Names are claimed with create-new semantics, so an
//! existing file is never overwritten, not even by a concurrent run.
//!
//! The source is removed only after its contents were fully copied. An
//! interruption in between leaves an extra copy behind, never a lost file.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised while quarantining a file.
#[derive(Debug, Error)]
pub enum QuarantineError {
    /// The quarantine directory could not be created.
    #[error("cannot create quarantine directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The source has no file name to reuse.
    #[error("no file name to quarantine: {0}")]
    NoFileName(PathBuf),

    /// No target name could be claimed.
    #[error("cannot claim {path}: {source}")]
    Claim {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Copying the contents failed; the source is untouched.
    #[error("copy of {from} to {to} failed: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The copy succeeded but the source could not be removed.
    #[error("copied to {copy} but could not remove {path}: {source}")]
    RemoveSource {
        path: PathBuf,
        copy: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// `stem_copy.ext` for `stem.ext`.
fn copy_name(name: &Path) -> OsString {
    let mut next = name.file_stem().map(OsString::from).unwrap_or_default();
    next.push("_copy");
    if let Some(ext) = name.extension() {
        next.push(".");
        next.push(ext);
    }
    next
}

/// Claim a free name for `file_name` inside `dir`.
///
/// Returns the claimed path and the freshly created (empty) file.
///
/// # Errors
///
/// Returns [`QuarantineError::Claim`] on any error other than the name
/// already being taken.
pub fn claim_unique_target(dir: &Path, file_name: &Path) -> Result<(PathBuf, File), QuarantineError> {
    let mut name = file_name.as_os_str().to_os_string();
    loop {
        let candidate = dir.join(&name);
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
        {
            Ok(file) => return Ok((candidate, file)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                log::debug!("{} is taken", candidate.display());
                name = copy_name(Path::new(&name));
            }
            Err(e) => {
                return Err(QuarantineError::Claim {
                    path: candidate,
                    source: e,
                })
            }
        }
    }
}

/// Move `path` into `dir`, returning where it ended up.
///
/// # Errors
///
/// See [`QuarantineError`]. On `Copy` the partial target is removed again;
/// on `RemoveSource` both files remain.
pub fn quarantine_file(path: &Path, dir: &Path) -> Result<PathBuf, QuarantineError> {
    fs::create_dir_all(dir).map_err(|e| QuarantineError::CreateDir {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let file_name = path
        .file_name()
        .ok_or_else(|| QuarantineError::NoFileName(path.to_path_buf()))?;
    let (target, mut out) = claim_unique_target(dir, Path::new(file_name))?;

    let copied = File::open(path).and_then(|mut src| {
        io::copy(&mut src, &mut out)?;
        out.sync_all()?;
        src.metadata()
    });
    let metadata = match copied {
        Ok(m) => m,
        Err(e) => {
            drop(out);
            if let Err(cleanup) = fs::remove_file(&target) {
                log::warn!("Could not remove partial copy {}: {}", target.display(), cleanup);
            }
            return Err(QuarantineError::Copy {
                from: path.to_path_buf(),
                to: target,
                source: e,
            });
        }
    };
    drop(out);

    if let Err(e) = fs::set_permissions(&target, metadata.permissions()) {
        log::debug!("Could not copy permissions to {}: {}", target.display(), e);
    }

    fs::remove_file(path).map_err(|e| QuarantineError::RemoveSource {
        path: path.to_path_buf(),
        copy: target.clone(),
        source: e,
    })?;

    log::info!("Quarantined {} as {}", path.display(), target.display());
    Ok(target)
}
