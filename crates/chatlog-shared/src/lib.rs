//! # chatlog-shared
//!
//! Domain types shared by every layer of the chat log backend: the chat,
//! message, call and profile models, the request schemas accepted at the HTTP
//! boundary, and the validation rules applied before anything touches
//! storage.

pub mod constants;
pub mod error;
pub mod forms;
pub mod models;
pub mod validation;

pub use error::ValidationError;
pub use models::*;
