pub mod sqlite;

pub use sqlite::{connect, connect_in_memory, run_migrations};
