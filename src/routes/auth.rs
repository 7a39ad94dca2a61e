use crate::{
    auth::{ChangePasswordRequest, SignInRequest, SignInResponse, SignUpResponse},
    error::AppError,
    models::CreateUserRequest,
    service::UserService,
};
use actix_web::{post, web, HttpResponse, Responder};
use validator::Validate;

/// Register a new user
///
/// Creates an enabled account holding `ROLE_USER` and returns its id.
#[post("/register")]
pub async fn register(
    service: web::Data<UserService>,
    register_data: web::Json<CreateUserRequest>,
) -> Result<impl Responder, AppError> {
    register_data.validate()?;

    let id = service.sign_up(register_data.into_inner()).await?;

    Ok(HttpResponse::Created().json(SignUpResponse { id }))
}

/// Login user
///
/// Authenticates a user and returns a bearer token.
#[post("/login")]
pub async fn login(
    service: web::Data<UserService>,
    login_data: web::Json<SignInRequest>,
) -> Result<impl Responder, AppError> {
    login_data.validate()?;

    let token = service.sign_in(&login_data).await?;

    Ok(HttpResponse::Ok().json(SignInResponse { token }))
}

/// Change password
///
/// Requires the current password; no token needed.
#[post("/password")]
pub async fn change_password(
    service: web::Data<UserService>,
    password_data: web::Json<ChangePasswordRequest>,
) -> Result<impl Responder, AppError> {
    password_data.validate()?;

    service.change_password(&password_data).await?;

    Ok(HttpResponse::NoContent().finish())
}
