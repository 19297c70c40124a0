//! Domain entities - the core business objects.

mod user;

mod post;

pub use post::{Post, PostDraft, TITLE_MAX_LEN};
pub use user::{USERNAME_MAX_LEN, User, validate_username};
