use crate::DomainResult;
use crate::messages::Message;
use crate::ports::BoxFuture;

pub trait MessageRepository: Send + Sync {
    fn create_message(&self, message: &Message) -> BoxFuture<'_, DomainResult<Message>>;

    /// Messages in creation order; ties on `created_at_ms` resolve by
    /// insertion order.
    fn list_messages(&self, group_id: &str) -> BoxFuture<'_, DomainResult<Vec<Message>>>;

    fn delete_messages_by_group(&self, group_id: &str) -> BoxFuture<'_, DomainResult<()>>;
}
