use crate::DomainResult;
use crate::files::FileAttachment;
use crate::ports::BoxFuture;

pub trait FileRepository: Send + Sync {
    fn create_file(&self, file: &FileAttachment) -> BoxFuture<'_, DomainResult<FileAttachment>>;

    fn list_files(&self, group_id: &str) -> BoxFuture<'_, DomainResult<Vec<FileAttachment>>>;

    fn delete_files_by_group(&self, group_id: &str) -> BoxFuture<'_, DomainResult<()>>;
}

/// External storage collaborator holding the actual bytes. The store only
/// keeps the returned `path`.
pub trait FileStore: Send + Sync {
    fn put(&self, stored_name: &str, bytes: Vec<u8>) -> BoxFuture<'_, DomainResult<String>>;

    fn delete(&self, path: &str) -> BoxFuture<'_, DomainResult<()>>;
}
