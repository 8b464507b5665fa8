use crate::DomainResult;
use crate::ports::BoxFuture;
use crate::resources::Resource;

pub trait ResourceRepository: Send + Sync {
    fn create_resource(&self, resource: &Resource) -> BoxFuture<'_, DomainResult<Resource>>;

    fn list_resources(&self, group_id: &str) -> BoxFuture<'_, DomainResult<Vec<Resource>>>;

    fn delete_resources_by_group(&self, group_id: &str) -> BoxFuture<'_, DomainResult<()>>;
}
