//! # services
//!
//! Application logic of rusty-blog. Depends only on `domains` ports; the
//! adapters are injected by the binary.

pub mod cover;
pub mod posts;
pub mod slug;
pub mod users;

pub use self::cover::{
    is_accepted_media_type, CoverPolicy, CoverProcessor, NoopReporter, UuidTokenSource,
};
pub use self::posts::{CreatePost, EditPost, PostService};
pub use self::slug::{slugify, SlugResolver};
pub use self::users::{Session, UserService};
