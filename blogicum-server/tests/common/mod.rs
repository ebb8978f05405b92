use std::sync::Arc;

use actix_web::test::TestRequest;
use blogicum_server::data::Repositories;
use blogicum_server::data::memory::InMemoryStore;
use blogicum_server::domain::category::Category;
use blogicum_server::infrastructure::security::JwtKeys;
use blogicum_server::presentation::server::AppServices;
use chrono::{DateTime, Duration, Utc};
use serde_json::{Value, json};
use uuid::Uuid;

pub const PAGE_SIZE: u32 = 10;

pub fn setup() -> (Repositories, AppServices) {
    let repos = Repositories::in_memory(Arc::new(InMemoryStore::new()));
    let services = AppServices::new(
        repos.clone(),
        JwtKeys::new("integration-secret".into(), 60),
        PAGE_SIZE,
    );
    (repos, services)
}

pub async fn category(repos: &Repositories, slug: &str, published: bool) -> Category {
    repos
        .categories
        .create(Category {
            is_published: published,
            ..Category::new(slug.to_uppercase(), format!("About {slug}"), slug.into())
        })
        .await
        .expect("seed category")
}

pub fn register(username: &str) -> TestRequest {
    TestRequest::post().uri("/api/auth/register").set_json(json!({
        "username": username,
        "email": format!("{username}@example.org"),
        "password": "sup3r-secret",
    }))
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {token}"))
}

pub fn yesterday() -> DateTime<Utc> {
    Utc::now() - Duration::days(1)
}

pub fn tomorrow() -> DateTime<Utc> {
    Utc::now() + Duration::days(1)
}

pub fn new_post(
    token: &str,
    title: &str,
    category_id: Uuid,
    pub_date: DateTime<Utc>,
    is_published: bool,
) -> TestRequest {
    TestRequest::post()
        .uri("/api/posts")
        .insert_header(bearer(token))
        .set_json(json!({
            "title": title,
            "text": format!("{title} body"),
            "category_id": category_id,
            "pub_date": pub_date,
            "is_published": is_published,
        }))
}

pub fn titles(page: &Value) -> Vec<String> {
    page["items"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|p| p["title"].as_str().map(str::to_owned))
                .collect()
        })
        .unwrap_or_default()
}
