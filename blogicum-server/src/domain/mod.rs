pub mod category;
pub mod comment;
pub mod error;
pub mod location;
pub mod page;
pub mod policy;
pub mod post;
pub mod user;
