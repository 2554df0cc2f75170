//! To-do list web application.
//!
//! An HTML front end over a single task collection: list, add, edit, delete,
//! delete-all and exact-match search, plus a deployment webhook.

pub mod api;
pub mod domain;
pub mod infrastructure;
