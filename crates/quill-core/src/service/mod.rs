//! Use-case services.
//!
//! Services orchestrate repository calls and the authorship guard into the
//! operations the HTTP layer exposes. They never touch storage details.

mod post_service;

pub use post_service::{AuthoredPost, PostService};
