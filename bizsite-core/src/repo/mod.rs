//! Typed accessors over the store, one module per table.
//!
//! Every mutation here is a single statement or a single transaction.

pub mod analytics;
pub mod blog;
pub mod messages;
pub mod projects;
pub mod sessions;
pub mod testimonials;
pub mod users;
