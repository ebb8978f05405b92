pub mod auth_service;
pub mod catalog_service;
pub mod comment_service;
pub mod post_service;

use uuid::Uuid;

/// Result of an edit or delete that passed the existence check. When the
/// requester is not the author nothing is written and the caller should send
/// them to the post instead.
#[derive(Debug)]
pub enum MutationOutcome<T> {
    Applied(T),
    RedirectToPost(Uuid),
}
