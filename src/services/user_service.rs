//! Servicio de usuarios
//!
//! Registro con contraseña bcrypt, login que emite un JWT y consulta del
//! usuario autenticado. Hashear y verificar se ejecuta fuera del runtime
//! async con `spawn_blocking`.

use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, warn};
use validator::Validate;

use crate::dto::auth_dto::RegisterRequest;
use crate::models::{Caller, NewUser, Role, User};
use crate::repositories::FleetStore;
use crate::services::jwt_service::JwtService;
use crate::services::store_guard::{GuardedStore, StorePolicy};
use crate::utils::errors::{not_found_error, AppError, AppResult};

/// Resultado de un login correcto
#[derive(Debug, Clone)]
pub struct Session {
    pub access_token: String,
    pub expires_in: i64,
    pub user: User,
}

#[derive(Clone)]
pub struct UserService {
    store: GuardedStore,
    jwt: JwtService,
    hash_cost: u32,
}

impl UserService {
    pub fn new(store: Arc<dyn FleetStore>, jwt: JwtService, policy: StorePolicy) -> Self {
        Self {
            store: GuardedStore::new(store, policy),
            jwt,
            hash_cost: bcrypt::DEFAULT_COST,
        }
    }

    /// Coste bcrypt para contraseñas nuevas
    pub fn with_hash_cost(mut self, hash_cost: u32) -> Self {
        self.hash_cost = hash_cost;
        self
    }

    pub fn jwt(&self) -> &JwtService {
        &self.jwt
    }

    /// Registrar un visitante nuevo
    pub async fn register(&self, request: RegisterRequest) -> AppResult<User> {
        request.validate()?;

        let password = request.password;
        let cost = self.hash_cost;
        let password_hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))?
            .map_err(|e| AppError::Internal(format!("Error hashing password: {}", e)))?;

        let new_user = NewUser {
            phone: request.phone,
            nickname: request.nickname.filter(|n| !n.trim().is_empty()),
            password_hash,
            role: Role::Guest,
            deposit: Decimal::ZERO,
        };

        let user = self
            .store
            .call("create_user", |store| {
                let new_user = new_user.clone();
                async move { store.create_user(new_user).await }
            })
            .await?;

        info!("👤 Usuario {} registrado ({})", user.id, user.phone);
        Ok(user)
    }

    /// Verificar credenciales y emitir un token de acceso
    pub async fn login(&self, phone: &str, password: &str) -> AppResult<Session> {
        let invalid = || AppError::Unauthorized("Invalid phone or password".to_string());

        let phone = phone.trim().to_string();
        let user = self
            .store
            .call("find_user_by_phone", |store| {
                let phone = phone.clone();
                async move { store.find_user_by_phone(&phone).await }
            })
            .await?;

        let Some(user) = user else {
            warn!("🔒 Login fallido: teléfono {} no registrado", phone);
            return Err(invalid());
        };

        let candidate = password.to_string();
        let hash = user.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || bcrypt::verify(candidate, &hash))
            .await
            .map_err(|e| AppError::Internal(format!("Password check task failed: {}", e)))?
            .unwrap_or(false);

        if !matches {
            warn!("🔒 Login fallido para usuario {}", user.id);
            return Err(invalid());
        }

        let access_token = self.jwt.generate_access_token(user.id, user.role)?;
        info!("✅ Login correcto: usuario {} ({})", user.id, user.role.as_str());

        Ok(Session {
            access_token,
            expires_in: self.jwt.expires_in(),
            user,
        })
    }

    /// Usuario asociado a la identidad que llama
    pub async fn me(&self, caller: &Caller) -> AppResult<User> {
        let user_id = caller.user_id;
        self.store
            .call("get_user", move |store| async move {
                store.get_user(user_id).await
            })
            .await?
            .ok_or_else(|| not_found_error("User", user_id))
    }
}
