use crate::application::MutationOutcome;
use crate::application::post_service::PostService;
use crate::domain::error::DomainError;
use crate::domain::policy::Requester;
use crate::domain::post::{PostChanges, PostDraft};
use crate::presentation::dto::PageQuery;
use crate::presentation::utils::{AuthenticatedUser, post_path, redirect_to_post, request_id};
use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse, delete, get, post, put, web};
use tracing::info;
use uuid::Uuid;

#[get("/posts")]
pub async fn get_posts(
    req: HttpRequest,
    posts: web::Data<PostService>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, DomainError> {
    let page = posts.home_feed(query.page).await?;

    info!(
        request_id = %request_id(&req),
        page = page.page,
        total = page.total,
        "feed retrieved"
    );

    Ok(HttpResponse::Ok().json(page))
}

#[get("/posts/{id}")]
pub async fn get_post(
    requester: Requester,
    posts: web::Data<PostService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, DomainError> {
    let detail = posts.post_detail(path.into_inner(), &requester).await?;
    Ok(HttpResponse::Ok().json(detail))
}

#[post("/posts")]
pub async fn create_post(
    req: HttpRequest,
    user: AuthenticatedUser,
    posts: web::Data<PostService>,
    payload: web::Json<PostDraft>,
) -> Result<HttpResponse, DomainError> {
    let post = posts.create_post(user.id, payload.into_inner()).await?;

    info!(
        request_id = %request_id(&req),
        username = %user.username,
        post_id = %post.id,
        "post created"
    );

    Ok(HttpResponse::Created()
        .insert_header((header::LOCATION, post_path(post.id)))
        .json(post))
}

#[put("/posts/{id}")]
pub async fn update_post(
    req: HttpRequest,
    user: AuthenticatedUser,
    posts: web::Data<PostService>,
    payload: web::Json<PostChanges>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, DomainError> {
    let post_id = path.into_inner();
    match posts
        .update_post(&user.requester(), post_id, payload.into_inner())
        .await?
    {
        MutationOutcome::Applied(post) => {
            info!(
                request_id = %request_id(&req),
                username = %user.username,
                post_id = %post.id,
                "post updated"
            );
            Ok(HttpResponse::Ok().json(post))
        }
        MutationOutcome::RedirectToPost(id) => Ok(redirect_to_post(id)),
    }
}

#[delete("/posts/{id}")]
pub async fn delete_post(
    req: HttpRequest,
    user: AuthenticatedUser,
    posts: web::Data<PostService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, DomainError> {
    let post_id = path.into_inner();
    match posts.delete_post(&user.requester(), post_id).await? {
        MutationOutcome::Applied(()) => {
            info!(
                request_id = %request_id(&req),
                username = %user.username,
                post_id = %post_id,
                "post deleted"
            );
            Ok(HttpResponse::NoContent().finish())
        }
        MutationOutcome::RedirectToPost(id) => Ok(redirect_to_post(id)),
    }
}
