use std::path::PathBuf;

use log::{info, warn};

use crate::error::RetrievalError;

/// A materialized repository: the local tree to scan. For remote
/// references the temp dir keeps the clone alive for the duration of the
/// run and is removed on drop.
#[derive(Debug)]
pub struct Workspace {
    pub path: PathBuf,
    _clone_dir: Option<tempfile::TempDir>,
}

/// Resolve a repository reference to a local directory. Local paths are
/// canonicalized; `http(s)` references are cloned into a temp dir.
pub fn materialize(reference: &str) -> Result<Workspace, RetrievalError> {
    if reference.starts_with("http://") || reference.starts_with("https://") {
        let dir = tempfile::tempdir()?;
        info!("cloning {} into {}", reference, dir.path().display());
        git2::Repository::clone(reference, dir.path()).map_err(|source| {
            RetrievalError::Clone { url: reference.to_string(), source }
        })?;
        return Ok(Workspace {
            path: dir.path().to_path_buf(),
            _clone_dir: Some(dir),
        });
    }

    let path = PathBuf::from(reference);
    if !path.exists() {
        return Err(RetrievalError::NotFound(path));
    }
    if !path.is_dir() {
        return Err(RetrievalError::NotADirectory(path));
    }
    let path = path.canonicalize()?;
    Ok(Workspace { path, _clone_dir: None })
}

/// Bounded retry before the failure surfaces as fatal.
pub fn materialize_with_retry(
    reference: &str,
    attempts: u32,
) -> Result<Workspace, RetrievalError> {
    for attempt in 1..attempts {
        match materialize(reference) {
            Ok(workspace) => return Ok(workspace),
            Err(err) => warn!("materialization attempt {} failed: {}", attempt, err),
        }
    }
    materialize(reference)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_local_path_materializes() {
        let tmp = TempDir::new().unwrap();
        let workspace = materialize(tmp.path().to_str().unwrap()).unwrap();
        assert!(workspace.path.is_dir());
    }

    #[test]
    fn test_missing_path_is_retrieval_error() {
        let err = materialize("/definitely/not/here").unwrap_err();
        assert!(matches!(err, RetrievalError::NotFound(_)));
    }

    #[test]
    fn test_retry_surfaces_last_error() {
        let err = materialize_with_retry("/definitely/not/here", 3).unwrap_err();
        assert!(matches!(err, RetrievalError::NotFound(_)));
    }
}
