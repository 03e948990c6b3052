pub mod auth;
pub mod search;

pub use auth::{AuthService, Claims};
pub use search::{contains_as_text, contains_ci, Page, PaginationInfo};
