/// Database models for TaskDesk
///
/// # Models
///
/// - `user`: accounts, roles and persisted tokens
/// - `task`: user-owned tasks with soft delete
/// - `audit`: per-request audit trail
///
/// `User` and `Task` implement [`crate::repository::Entity`] so they can be
/// read through the generic repository.

pub mod audit;
pub mod task;
pub mod user;
