use std::path::PathBuf;

use studygroup_domain::DomainResult;
use studygroup_domain::error::DomainError;
use studygroup_domain::ports::BoxFuture;
use studygroup_domain::ports::files::FileStore;

/// Writes attachment bytes under a flat upload directory. Stored names
/// are server-generated uuids, so no path traversal can come in through
/// client-supplied names.
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl FileStore for LocalFileStore {
    fn put(&self, stored_name: &str, bytes: Vec<u8>) -> BoxFuture<'_, DomainResult<String>> {
        let path = self.root.join(stored_name);
        Box::pin(async move {
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|err| storage_error("create upload dir", err))?;
            }
            tokio::fs::write(&path, bytes)
                .await
                .map_err(|err| storage_error("write upload", err))?;
            Ok(path.to_string_lossy().into_owned())
        })
    }

    fn delete(&self, path: &str) -> BoxFuture<'_, DomainResult<()>> {
        let path = PathBuf::from(path);
        Box::pin(async move {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => Ok(()),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(err) => Err(storage_error("remove upload", err)),
            }
        })
    }
}

fn storage_error(context: &str, err: std::io::Error) -> DomainError {
    tracing::error!(error = %err, "file storage failure: {context}");
    DomainError::Validation(format!("file storage failure: {context}"))
}
