use std::future::Future;
use std::pin::Pin;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub mod files;
pub mod groups;
pub mod messages;
pub mod polls;
pub mod resources;
pub mod tasks;
