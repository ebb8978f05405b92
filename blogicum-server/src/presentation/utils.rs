use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{FromRequest, HttpMessage, HttpRequest, HttpResponse};
use futures_util::future::{Ready, ready};
use uuid::Uuid;

use crate::domain::error::DomainError;
use crate::domain::policy::Requester;
use crate::presentation::middleware::RequestId;

/// The caller, as established by the identity middleware. Extracting it on a
/// route makes the route require a bearer token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub username: String,
}

impl AuthenticatedUser {
    pub fn requester(&self) -> Requester {
        Requester::User(self.id)
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = DomainError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        match req.extensions().get::<AuthenticatedUser>() {
            Some(user) => ready(Ok(user.clone())),
            None => ready(Err(DomainError::Unauthorized)),
        }
    }
}

/// Anonymous unless the request carried a valid token.
impl FromRequest for Requester {
    type Error = DomainError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let requester = req
            .extensions()
            .get::<AuthenticatedUser>()
            .map(AuthenticatedUser::requester)
            .unwrap_or(Requester::Anonymous);
        ready(Ok(requester))
    }
}

pub fn post_path(post_id: Uuid) -> String {
    format!("/api/posts/{post_id}")
}

/// Where a refused edit or delete sends the requester.
pub fn redirect_to_post(post_id: Uuid) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, post_path(post_id)))
        .finish()
}

pub fn request_id(req: &HttpRequest) -> String {
    req.extensions()
        .get::<RequestId>()
        .map(|rid| rid.0.clone())
        .unwrap_or_else(|| "unknown".into())
}
