use crate::DomainResult;
use crate::polls::Poll;
use crate::ports::BoxFuture;

pub trait PollRepository: Send + Sync {
    fn create_poll(&self, poll: &Poll) -> BoxFuture<'_, DomainResult<Poll>>;

    fn get_poll(&self, group_id: &str, poll_id: &str)
    -> BoxFuture<'_, DomainResult<Option<Poll>>>;

    fn update_poll(&self, poll: &Poll) -> BoxFuture<'_, DomainResult<Poll>>;

    fn list_polls(&self, group_id: &str) -> BoxFuture<'_, DomainResult<Vec<Poll>>>;

    fn delete_polls_by_group(&self, group_id: &str) -> BoxFuture<'_, DomainResult<()>>;
}
