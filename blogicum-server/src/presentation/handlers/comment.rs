use crate::application::MutationOutcome;
use crate::application::comment_service::CommentService;
use crate::domain::error::DomainError;
use crate::presentation::dto::CommentRequest;
use crate::presentation::utils::{AuthenticatedUser, redirect_to_post, request_id};
use actix_web::{HttpRequest, HttpResponse, delete, post, put, web};
use tracing::info;
use uuid::Uuid;

#[post("/posts/{id}/comments")]
pub async fn create_comment(
    req: HttpRequest,
    user: AuthenticatedUser,
    comments: web::Data<CommentService>,
    payload: web::Json<CommentRequest>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, DomainError> {
    let comment = comments
        .add_comment(user.id, path.into_inner(), payload.into_inner().text)
        .await?;

    info!(
        request_id = %request_id(&req),
        username = %user.username,
        comment_id = %comment.id,
        "comment created"
    );

    Ok(HttpResponse::Created().json(comment))
}

#[put("/posts/{id}/comments/{comment_id}")]
pub async fn update_comment(
    req: HttpRequest,
    user: AuthenticatedUser,
    comments: web::Data<CommentService>,
    payload: web::Json<CommentRequest>,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse, DomainError> {
    let (post_id, comment_id) = path.into_inner();
    match comments
        .update_comment(&user.requester(), post_id, comment_id, payload.into_inner().text)
        .await?
    {
        MutationOutcome::Applied(comment) => {
            info!(
                request_id = %request_id(&req),
                username = %user.username,
                comment_id = %comment.id,
                "comment updated"
            );
            Ok(HttpResponse::Ok().json(comment))
        }
        MutationOutcome::RedirectToPost(id) => Ok(redirect_to_post(id)),
    }
}

#[delete("/posts/{id}/comments/{comment_id}")]
pub async fn delete_comment(
    req: HttpRequest,
    user: AuthenticatedUser,
    comments: web::Data<CommentService>,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse, DomainError> {
    let (post_id, comment_id) = path.into_inner();
    match comments
        .delete_comment(&user.requester(), post_id, comment_id)
        .await?
    {
        MutationOutcome::Applied(()) => {
            info!(
                request_id = %request_id(&req),
                username = %user.username,
                comment_id = %comment_id,
                "comment deleted"
            );
            Ok(HttpResponse::NoContent().finish())
        }
        MutationOutcome::RedirectToPost(id) => Ok(redirect_to_post(id)),
    }
}
