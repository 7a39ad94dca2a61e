pub mod auth;
pub mod health;
pub mod users;

use actix_web::web;

use crate::auth::AuthMiddleware;
use crate::config::AuthConfig;
use crate::error::AppError;

/// Registers the API routes.
///
/// `/auth` is public. Everything under `/api/v1/user` requires a token
/// carrying `ROLE_ADMIN`. Malformed JSON bodies and path segments are
/// answered as `400` with the usual `{"error": ...}` body.
pub fn config(cfg: &mut web::ServiceConfig, auth: &AuthConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .service(
        web::scope("/auth")
            .service(auth::login)
            .service(auth::register)
            .service(auth::change_password),
    )
    .service(
        web::scope("/api/v1/user")
            .wrap(AuthMiddleware::admin(auth.clone()))
            .service(users::get_users)
            .service(users::create_user)
            .service(users::update_user)
            .service(users::update_roles)
            .service(users::get_user)
            .service(users::delete_user)
            .service(users::enable_disable),
    );
}
