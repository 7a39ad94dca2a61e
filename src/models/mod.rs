pub mod credentials;
pub mod role;
pub mod user;

pub use credentials::Credentials;
pub use role::{contains_role, ROLE_ADMIN, ROLE_USER};
pub use user::{
    CreateUserRequest, Gender, RolesCommand, UpdateUserRequest, User, UserDto, UserRolesRequest,
    USER_SORTABLE_COLUMNS,
};
