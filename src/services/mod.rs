pub mod auth_service;
pub mod product_service;

pub use auth_service::{AuthService, LoginRequest, LoginResponse, RegisterRequest};
pub use product_service::ProductService;
