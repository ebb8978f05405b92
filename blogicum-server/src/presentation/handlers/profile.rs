use crate::application::auth_service::AuthService;
use crate::application::post_service::PostService;
use crate::domain::error::DomainError;
use crate::domain::policy::Requester;
use crate::domain::user::ProfileChanges;
use crate::presentation::dto::PageQuery;
use crate::presentation::utils::{AuthenticatedUser, request_id};
use actix_web::{HttpRequest, HttpResponse, get, put, web};
use tracing::info;

#[get("/profile/{username}")]
pub async fn get_profile(
    requester: Requester,
    posts: web::Data<PostService>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, DomainError> {
    let feed = posts
        .profile_feed(&path.into_inner(), &requester, query.page)
        .await?;
    Ok(HttpResponse::Ok().json(feed))
}

#[put("/profile")]
pub async fn update_profile(
    req: HttpRequest,
    user: AuthenticatedUser,
    auth: web::Data<AuthService>,
    payload: web::Json<ProfileChanges>,
) -> Result<HttpResponse, DomainError> {
    let updated = auth.update_profile(user.id, payload.into_inner()).await?;

    info!(
        request_id = %request_id(&req),
        user_id = %updated.id,
        "profile updated"
    );

    Ok(HttpResponse::Ok().json(updated))
}
