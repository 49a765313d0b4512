// todostore - To-do list store with write-through JSON persistence

pub mod config;
pub mod filter;
pub mod slot;
pub mod store;
pub mod task;

// Re-export main types for convenience
pub use config::Config;
pub use filter::{StatusFilter, visible_tasks};
pub use slot::{FileSlot, MemorySlot, Slot};
pub use store::{Edit, SLOT_KEY, StoreOptions, TaskListStore, ViewState, now_ms};
pub use task::{Priority, Stamp, Task, TaskId};
