use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::auth::{self, JwtManager};
use crate::database::models::{NewUser, User};
use crate::database::repository::UserStore;
use crate::error::{ApiError, FieldErrors};

const NAME_LENGTH: std::ops::RangeInclusive<usize> = 2..=50;
const MAX_EMAIL_LENGTH: usize = 100;
const MAX_PHONE_LENGTH: usize = 20;
const MAX_AVATAR_LENGTH: usize = 255;

pub const VALIDATION_MESSAGE: &str = "Unprocessable entity";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub phone_number: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

/// Registration fields after validation, password still in clear text.
#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub phone_number: Option<String>,
    pub avatar: Option<String>,
}

impl RegisterRequest {
    pub fn validate(self) -> Result<Registration, FieldErrors> {
        let mut errors = FieldErrors::new();

        let first_name = check_name(&mut errors, "firstName", "First name", self.first_name);
        let last_name = check_name(&mut errors, "lastName", "Last name", self.last_name);

        let email = trimmed(self.email);
        match email.as_deref() {
            None => {
                errors.insert("email".into(), "Email is required".into());
            }
            Some(e) if e.chars().count() > MAX_EMAIL_LENGTH => {
                errors.insert("email".into(), format!("Email must be at most {} characters", MAX_EMAIL_LENGTH));
            }
            Some(e) if !is_valid_email(e) => {
                errors.insert("email".into(), "Email must be a valid email address".into());
            }
            Some(_) => {}
        }

        let password = self.password.filter(|p| !p.is_empty());
        match password.as_deref() {
            None => {
                errors.insert("password".into(), "Password is required".into());
            }
            Some(p) if !auth::validate_password_strength(p).valid => {
                errors.insert(
                    "password".into(),
                    "Password must be at least 8 characters and contain three of: uppercase, lowercase, numbers, special characters".into(),
                );
            }
            Some(_) => {}
        }

        let phone_number = trimmed(self.phone_number);
        if phone_number.as_deref().is_some_and(|p| p.chars().count() > MAX_PHONE_LENGTH) {
            errors.insert("phoneNumber".into(), format!("Phone number must be at most {} characters", MAX_PHONE_LENGTH));
        }
        let avatar = trimmed(self.avatar);
        if avatar.as_deref().is_some_and(|a| a.chars().count() > MAX_AVATAR_LENGTH) {
            errors.insert("avatar".into(), format!("Avatar must be at most {} characters", MAX_AVATAR_LENGTH));
        }

        match (first_name, last_name, email, password) {
            (Some(first_name), Some(last_name), Some(email), Some(password)) if errors.is_empty() => Ok(Registration {
                first_name,
                last_name,
                email,
                password,
                phone_number,
                avatar,
            }),
            _ => Err(errors),
        }
    }
}

impl LoginRequest {
    pub fn validate(self) -> Result<(String, String), FieldErrors> {
        let mut errors = FieldErrors::new();
        let email = trimmed(self.email);
        if email.is_none() {
            errors.insert("email".into(), "Email is required".into());
        }
        let password = self.password.filter(|p| !p.is_empty());
        if password.is_none() {
            errors.insert("password".into(), "Password is required".into());
        }
        match (email, password) {
            (Some(email), Some(password)) => Ok((email, password)),
            _ => Err(errors),
        }
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn check_name(errors: &mut FieldErrors, field: &str, label: &str, value: Option<String>) -> Option<String> {
    match trimmed(value) {
        Some(name) if NAME_LENGTH.contains(&name.chars().count()) => Some(name),
        Some(_) => {
            errors.insert(field.into(), format!("{} must be between 2 and 50 characters", label));
            None
        }
        None => {
            errors.insert(field.into(), format!("{} is required", label));
            None
        }
    }
}

/// Structural check: one `@`, non-empty local part, dotted domain, no whitespace.
fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain.split('.').count() >= 2
        && domain.split('.').all(|label| !label.is_empty())
}

pub struct AuthService {
    users: Arc<dyn UserStore>,
    jwt: JwtManager,
    bcrypt_cost: Option<u32>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, jwt: JwtManager) -> Self {
        Self { users, jwt, bcrypt_cost: None }
    }

    /// Override the bcrypt cost; lower costs keep tests fast.
    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = Some(cost);
        self
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<User, ApiError> {
        let registration = request
            .validate()
            .map_err(|errors| ApiError::unprocessable_entity(VALIDATION_MESSAGE, errors))?;

        if self.users.email_exists(&registration.email).await? {
            return Err(ApiError::conflict("Email already registered"));
        }

        let password_hash = auth::hash_password(&registration.password, self.bcrypt_cost).await?;
        let user = self
            .users
            .create(NewUser {
                first_name: registration.first_name,
                last_name: registration.last_name,
                email: registration.email,
                password_hash,
                phone_number: registration.phone_number,
                avatar: registration.avatar,
            })
            .await?;

        tracing::info!(user_id = %user.id, "registered user");
        Ok(user)
    }

    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, ApiError> {
        let (email, password) = request
            .validate()
            .map_err(|errors| ApiError::unprocessable_entity(VALIDATION_MESSAGE, errors))?;

        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or_else(|| ApiError::unauthorized("Invalid email or password"))?;

        if !user.is_active {
            return Err(ApiError::forbidden("Account is deactivated"));
        }

        if !auth::verify_password(&password, &user.password).await? {
            tracing::debug!(user_id = %user.id, "password mismatch");
            return Err(ApiError::unauthorized("Invalid email or password"));
        }

        self.users.record_login(user.id).await?;
        let token = self.jwt.create_access_token(user.id, &user.email)?;

        tracing::info!(user_id = %user.id, "user logged in");
        Ok(LoginResponse { token })
    }
}
