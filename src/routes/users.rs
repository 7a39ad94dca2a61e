use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;
use crate::models::{CreateUserRequest, RolesCommand, UpdateUserRequest, UserDto, UserRolesRequest};
use crate::pagination::Pageable;
use crate::service::UserService;

/// List users
///
/// Accepts `size`, `offset` and `sort` query parameters and answers with a page envelope.
#[get("")]
pub async fn get_users(
    service: web::Data<UserService>,
    pageable: Pageable,
) -> Result<impl Responder, AppError> {
    let page = service.get_page(&pageable).await?;
    Ok(HttpResponse::Ok().json(page))
}

#[get("/{id}")]
pub async fn get_user(
    service: web::Data<UserService>,
    id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let user = service.get_by_id(id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(UserDto::from(user)))
}

/// Create a user
///
/// Same payload as sign-up; the new user holds `ROLE_USER`.
#[post("")]
pub async fn create_user(
    service: web::Data<UserService>,
    user_data: web::Json<CreateUserRequest>,
) -> Result<impl Responder, AppError> {
    user_data.validate()?;
    let user = service.create(user_data.into_inner()).await?;
    Ok(HttpResponse::Created().json(UserDto::from(user)))
}

#[put("")]
pub async fn update_user(
    service: web::Data<UserService>,
    user_data: web::Json<UpdateUserRequest>,
) -> Result<impl Responder, AppError> {
    user_data.validate()?;
    let user = service.update(user_data.into_inner()).await?;
    Ok(HttpResponse::Ok().json(UserDto::from(user)))
}

#[delete("/{id}")]
pub async fn delete_user(
    service: web::Data<UserService>,
    id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    service.delete_by_id(id.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Grant or revoke roles
///
/// `ADD` answers 201, `DELETE` answers 204.
#[post("/roles")]
pub async fn update_roles(
    service: web::Data<UserService>,
    roles_data: web::Json<UserRolesRequest>,
) -> Result<impl Responder, AppError> {
    roles_data.validate()?;
    let response = match service.update_roles(&roles_data).await? {
        RolesCommand::Add => HttpResponse::Created().finish(),
        RolesCommand::Delete => HttpResponse::NoContent().finish(),
    };
    Ok(response)
}

#[post("/{id}/enabledisable")]
pub async fn enable_disable(
    service: web::Data<UserService>,
    id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    service.enable_disable(id.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
