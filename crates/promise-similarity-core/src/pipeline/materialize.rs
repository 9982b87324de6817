//! Cache-or-compute for a single artifact

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use tempfile::NamedTempFile;

use super::codec::ArtifactCodec;
use crate::error::{PromiseError, Result};

/// Where a stage's value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Decoded from an existing artifact
    Cached,
    /// Computed and written this run
    Computed,
}

/// A stage value together with how it was obtained
#[derive(Debug, Clone)]
pub struct Materialized<T> {
    pub value: T,
    pub outcome: Outcome,
}

/// Load `path` with `codec` unless it is missing or `force` is set, in which
/// case run `compute` and persist its value.
///
/// A failed compute or encode leaves whatever was at `path` untouched.
pub fn materialize<T, C, F>(path: &Path, force: bool, codec: &C, compute: F) -> Result<Materialized<T>>
where
    C: ArtifactCodec<T> + ?Sized,
    F: FnOnce() -> Result<T>,
{
    if !force && path.exists() {
        let file = File::open(path)
            .map_err(|e| PromiseError::io_operation("open artifact", path.display(), e))?;
        let value = codec.decode(&mut BufReader::new(file))?;
        tracing::debug!(path = %path.display(), "using cached artifact");
        return Ok(Materialized {
            value,
            outcome: Outcome::Cached,
        });
    }

    let value = compute()?;
    write_atomic(path, &value, codec)?;
    tracing::debug!(path = %path.display(), "wrote artifact");

    Ok(Materialized {
        value,
        outcome: Outcome::Computed,
    })
}

/// Run `produce` unless `path` already exists and `force` is unset.
///
/// For artifacts written by something else (downloads), where the value
/// itself is read back by the caller.
pub fn materialize_file<F>(path: &Path, force: bool, produce: F) -> Result<Outcome>
where
    F: FnOnce(&Path) -> Result<()>,
{
    if !force && path.exists() {
        tracing::debug!(path = %path.display(), "using cached file");
        return Ok(Outcome::Cached);
    }

    ensure_parent(path)?;
    produce(path)?;
    Ok(Outcome::Computed)
}

/// Encode `value` next to `path` and rename it into place
pub fn write_atomic<T, C>(path: &Path, value: &T, codec: &C) -> Result<()>
where
    C: ArtifactCodec<T> + ?Sized,
{
    write_atomic_with(path, |file| {
        let mut writer = BufWriter::new(file);
        codec.encode(value, &mut writer)?;
        writer.flush()?;
        Ok(())
    })
}

/// Let `write` fill a temp file in the destination directory, then rename it
/// over `path`. The temp file is removed if `write` fails.
pub fn write_atomic_with<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut File) -> Result<()>,
{
    let parent = ensure_parent(path)?;
    let mut temp = NamedTempFile::new_in(parent)
        .map_err(|e| PromiseError::io_operation("create temp file in", parent.display(), e))?;

    write(temp.as_file_mut())?;

    temp.as_file()
        .sync_all()
        .map_err(|e| PromiseError::io_operation("sync", temp.path().display(), e))?;
    temp.persist(path)
        .map_err(|e| PromiseError::io_operation("write", path.display(), e.error))?;

    Ok(())
}

fn ensure_parent(path: &Path) -> Result<&Path> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)
        .map_err(|e| PromiseError::io_operation("create directory", parent.display(), e))?;
    Ok(parent)
}
