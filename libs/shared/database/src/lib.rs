pub mod memory;

pub use memory::{Collection, LockRegistry};
