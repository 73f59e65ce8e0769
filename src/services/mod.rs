//! Business logic services layer

pub mod auth_service;
pub mod authorization;
pub mod comment_service;
pub mod group_service;
pub mod post_service;
pub mod user_service;

pub use auth_service::AuthService;
pub use authorization::{AuthorizationPolicy, OwnershipPolicy};
pub use comment_service::CommentService;
pub use group_service::GroupService;
pub use post_service::PostService;
pub use user_service::UserService;
