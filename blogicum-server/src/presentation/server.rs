use crate::application::auth_service::AuthService;
use crate::application::catalog_service::CatalogService;
use crate::application::comment_service::CommentService;
use crate::application::post_service::PostService;
use crate::data::Repositories;
use crate::domain::error::DomainError;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::security::JwtKeys;
use crate::presentation::handlers;
use crate::presentation::middleware::{IdentityMiddleware, RequestIdMiddleware, TimingMiddleware};
use actix_cors::Cors;
use actix_web::middleware::{DefaultHeaders, Logger};
use actix_web::{App, HttpResponse, HttpServer, Responder, web};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

/// The application services shared by every worker.
#[derive(Clone)]
pub struct AppServices {
    pub auth: AuthService,
    pub posts: PostService,
    pub comments: CommentService,
    pub catalog: CatalogService,
}

impl AppServices {
    pub fn new(repos: Repositories, keys: JwtKeys, posts_per_page: u32) -> Self {
        Self {
            auth: AuthService::new(repos.users.clone(), keys),
            posts: PostService::new(repos.clone(), posts_per_page),
            comments: CommentService::new(repos.clone()),
            catalog: CatalogService::new(repos),
        }
    }
}

/// Registers the services and the `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig, services: AppServices) {
    let keys = services.auth.keys().clone();
    // An unparsable `?page=` is a missing page, like page 0.
    let query_config = web::QueryConfig::default().error_handler(|_, req| {
        DomainError::PageNotFound(req.query_string().to_owned()).into()
    });
    cfg.app_data(query_config)
        .app_data(web::Data::new(services.auth))
        .app_data(web::Data::new(services.posts))
        .app_data(web::Data::new(services.comments))
        .app_data(web::Data::new(services.catalog))
        .service(
            web::scope("/api")
                .wrap(IdentityMiddleware::new(keys))
                .route("/health", web::get().to(health))
                .service(handlers::auth::scope())
                .service(handlers::post::get_posts)
                .service(handlers::post::create_post)
                .service(handlers::post::get_post)
                .service(handlers::post::update_post)
                .service(handlers::post::delete_post)
                .service(handlers::comment::create_comment)
                .service(handlers::comment::update_comment)
                .service(handlers::comment::delete_comment)
                .service(handlers::catalog::list_categories)
                .service(handlers::catalog::category_posts)
                .service(handlers::catalog::list_locations)
                .service(handlers::profile::update_profile)
                .service(handlers::profile::get_profile),
        );
}

pub async fn start_rest_server(config: AppConfig, services: AppServices) -> anyhow::Result<()> {
    let bind_address = (config.host.clone(), config.port);

    info!(host = %bind_address.0, port = bind_address.1, "HTTP server starting");

    HttpServer::new(move || {
        let cors = build_cors(&config);
        let services = services.clone();

        App::new()
            .wrap(Logger::default())
            .wrap(TimingMiddleware)
            .wrap(RequestIdMiddleware)
            .wrap(
                DefaultHeaders::new()
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("Referrer-Policy", "no-referrer"))
                    .add(("Permissions-Policy", "geolocation=()"))
                    .add(("Cross-Origin-Opener-Policy", "same-origin")),
            )
            .wrap(cors)
            .configure(|cfg| configure(cfg, services))
    })
    .bind(bind_address)?
    .run()
    .await
    .map_err(anyhow::Error::new)?;

    Ok(())
}

fn build_cors(config: &AppConfig) -> Cors {
    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
        .allowed_headers(vec![
            actix_web::http::header::CONTENT_TYPE,
            actix_web::http::header::AUTHORIZATION,
        ])
        .expose_headers(vec![actix_web::http::header::LOCATION])
        .max_age(3600);

    for origin in &config.cors_origins {
        cors = if origin == "*" {
            cors.allow_any_origin()
        } else {
            cors.allowed_origin(origin).supports_credentials()
        };
    }

    cors
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
}

async fn health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        timestamp: Utc::now(),
    })
}
