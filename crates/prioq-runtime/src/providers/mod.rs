//! Backend implementations of the [`QueueClient`](crate::client::QueueClient)
//! contract.

pub mod memory;
pub mod redis;

pub use memory::InMemoryProvider;
pub use redis::UpstashRedisProvider;
