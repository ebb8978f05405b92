use crate::application::catalog_service::CatalogService;
use crate::application::post_service::PostService;
use crate::domain::error::DomainError;
use crate::presentation::dto::PageQuery;
use actix_web::{HttpResponse, get, web};

#[get("/categories")]
pub async fn list_categories(
    catalog: web::Data<CatalogService>,
) -> Result<HttpResponse, DomainError> {
    Ok(HttpResponse::Ok().json(catalog.list_categories().await?))
}

#[get("/categories/{slug}")]
pub async fn category_posts(
    posts: web::Data<PostService>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, DomainError> {
    let feed = posts.category_feed(&path.into_inner(), query.page).await?;
    Ok(HttpResponse::Ok().json(feed))
}

#[get("/locations")]
pub async fn list_locations(catalog: web::Data<CatalogService>) -> Result<HttpResponse, DomainError> {
    Ok(HttpResponse::Ok().json(catalog.list_locations().await?))
}
