//! In-memory adapters for tests and database-less local runs.

mod in_memory_user_repository;

pub use in_memory_user_repository::InMemoryUserRepository;
