pub mod auth;
pub mod catalog;
pub mod comment;
pub mod post;
pub mod profile;
