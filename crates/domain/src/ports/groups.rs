use crate::DomainResult;
use crate::groups::Group;
use crate::ports::BoxFuture;

/// Durable store for groups and their embedded memberships. The single
/// source of truth consulted by both the REST layer and the realtime
/// gateway.
pub trait GroupRepository: Send + Sync {
    fn create_group(&self, group: &Group) -> BoxFuture<'_, DomainResult<Group>>;

    fn get_group(&self, group_id: &str) -> BoxFuture<'_, DomainResult<Option<Group>>>;

    fn get_group_by_join_code(&self, join_code: &str)
    -> BoxFuture<'_, DomainResult<Option<Group>>>;

    fn get_group_by_course(&self, course_id: &str) -> BoxFuture<'_, DomainResult<Option<Group>>>;

    fn join_code_exists(&self, join_code: &str) -> BoxFuture<'_, DomainResult<bool>>;

    /// Whole-record replace; membership mutations go through this.
    fn update_group(&self, group: &Group) -> BoxFuture<'_, DomainResult<Group>>;

    fn delete_group(&self, group_id: &str) -> BoxFuture<'_, DomainResult<()>>;

    fn list_groups_by_user(&self, user_id: &str) -> BoxFuture<'_, DomainResult<Vec<Group>>>;
}
