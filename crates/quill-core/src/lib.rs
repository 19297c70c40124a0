//! # Quill Core
//!
//! The domain layer of the Quill blog.
//! This crate contains pure business logic with zero infrastructure dependencies:
//! posts, users, pagination, and the authorship checks that gate every mutation.

pub mod authz;
pub mod domain;
pub mod error;
pub mod pagination;
pub mod ports;
pub mod service;

pub use authz::Requester;
pub use error::DomainError;
pub use service::PostService;
