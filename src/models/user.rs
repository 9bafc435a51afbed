//! Modelo de User
//!
//! Usuarios del sistema: arrendatarios, operadores de mantenimiento y
//! administradores. El hash de la contraseña nunca sale del servicio.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::auth::Role;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: i64,
    pub phone: String,
    pub nickname: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub deposit: Decimal,
}

/// Datos para registrar un usuario
#[derive(Debug, Clone)]
pub struct NewUser {
    pub phone: String,
    pub nickname: Option<String>,
    pub password_hash: String,
    pub role: Role,
    pub deposit: Decimal,
}
