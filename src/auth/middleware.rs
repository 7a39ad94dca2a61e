use std::rc::Rc;

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage, ResponseError,
};
use futures::future::{ready, LocalBoxFuture, Ready};

use crate::auth::token::{verify_token, Claims};
use crate::config::AuthConfig;
use crate::error::AppError;
use crate::models::ROLE_ADMIN;

/// Bearer-token guard for a scope.
///
/// A missing or invalid token is answered with 401. When a role is required
/// and the token's `roles` claim lacks it, the answer is 403. On success the
/// decoded [`Claims`] are stored in the request extensions.
#[derive(Clone)]
pub struct AuthMiddleware {
    auth: Rc<AuthConfig>,
    required_role: Option<&'static str>,
}

impl AuthMiddleware {
    pub fn new(auth: AuthConfig) -> Self {
        Self {
            auth: Rc::new(auth),
            required_role: None,
        }
    }

    pub fn require_role(mut self, role: &'static str) -> Self {
        self.required_role = Some(role);
        self
    }

    /// Guard for the administration API.
    pub fn admin(auth: AuthConfig) -> Self {
        Self::new(auth).require_role(ROLE_ADMIN)
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service,
            auth: Rc::clone(&self.auth),
            required_role: self.required_role,
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
    auth: Rc<AuthConfig>,
    required_role: Option<&'static str>,
}

impl<S> AuthMiddlewareService<S> {
    fn authorize(&self, req: &ServiceRequest) -> Result<Claims, AppError> {
        let token = req
            .headers()
            .get("Authorization")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| AppError::Unauthorized("Missing token".into()))?;

        let claims = verify_token(token.trim(), &self.auth)?;

        if let Some(role) = self.required_role {
            if !claims.has_role(role) {
                return Err(AppError::Forbidden(format!("{} required", role)));
            }
        }
        Ok(claims)
    }
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        match self.authorize(&req) {
            Ok(claims) => {
                req.extensions_mut().insert(claims);
                let fut = self.service.call(req);
                Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
            }
            Err(app_err) => {
                log::debug!("Rejected {} {}: {}", req.method(), req.path(), app_err);
                let response = req
                    .into_response(app_err.error_response())
                    .map_into_right_body();
                Box::pin(async move { Ok(response) })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::token::generate_token;
    use crate::models::{User, ROLE_USER};
    use actix_web::{http::StatusCode, test, web, App, HttpResponse};

    fn auth() -> AuthConfig {
        AuthConfig::new("middleware_secret", 1)
    }

    async fn whoami(req: actix_web::HttpRequest) -> HttpResponse {
        match req.extensions().get::<Claims>() {
            Some(claims) => HttpResponse::Ok().body(claims.email.clone()),
            None => HttpResponse::InternalServerError().finish(),
        }
    }

    fn bearer(roles: &[&str]) -> String {
        let user = User::new("someone@example.com").with_roles(roles.iter().copied());
        format!("Bearer {}", generate_token(&user, &auth()).unwrap())
    }

    #[actix_rt::test]
    async fn test_admin_guard() {
        let app = test::init_service(
            App::new().service(
                web::scope("/admin")
                    .wrap(AuthMiddleware::admin(auth()))
                    .route("", web::get().to(whoami)),
            ),
        )
        .await;

        let req = test::TestRequest::get().uri("/admin").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::get()
            .uri("/admin")
            .insert_header(("Authorization", "Bearer garbage"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::get()
            .uri("/admin")
            .insert_header(("Authorization", bearer(&[ROLE_USER])))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::get()
            .uri("/admin")
            .insert_header(("Authorization", bearer(&[ROLE_USER, ROLE_ADMIN])))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = test::read_body(resp).await;
        assert_eq!(body, "someone@example.com");
    }

    #[actix_rt::test]
    async fn test_token_only_guard() {
        let app = test::init_service(
            App::new().service(
                web::scope("/me")
                    .wrap(AuthMiddleware::new(auth()))
                    .route("", web::get().to(whoami)),
            ),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/me")
            .insert_header(("Authorization", bearer(&[])))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
