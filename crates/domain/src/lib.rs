pub mod error;
pub mod files;
pub mod groups;
pub mod identity;
pub mod invite;
pub mod messages;
pub mod polls;
pub mod ports;
pub mod resources;
pub mod tasks;
#[cfg(test)]
pub(crate) mod testing;
pub mod util;

pub type DomainResult<T> = Result<T, error::DomainError>;
