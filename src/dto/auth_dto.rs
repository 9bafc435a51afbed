use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{Role, User};
use crate::utils::validation::validate_phone;

// Registro de usuario
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(custom = "validate_phone")]
    pub phone: String,
    #[validate(length(min = 6, max = 72))]
    pub password: String,
    #[validate(length(max = 32))]
    pub nickname: Option<String>,
}

// Login (formulario `username` + `password`, el username es el teléfono)
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

// Login response
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user_id: i64,
    pub role: Role,
}

impl TokenResponse {
    pub fn bearer(access_token: String, expires_in: i64, user: &User) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
            expires_in,
            user_id: user.id,
            role: user.role,
        }
    }
}

// Datos públicos del usuario
#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub phone: String,
    pub nickname: Option<String>,
    pub role: Role,
    pub deposit: Decimal,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            phone: user.phone,
            nickname: user.nickname,
            role: user.role,
            deposit: user.deposit,
        }
    }
}
