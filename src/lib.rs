#![doc = "The `starter_kit` library crate."]
#![doc = ""]
#![doc = "User administration and authentication backend: paginated user listings,"]
#![doc = "JWT sign-in, role management and PostgreSQL persistence. The binary"]
#![doc = "(`main.rs`) wires these pieces into an actix-web server."]

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod pagination;
pub mod repository;
pub mod routes;
pub mod service;

pub use error::AppError;
pub use service::UserService;
