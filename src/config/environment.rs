//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del entorno y variables de configuración.
//! Todas las variables tienen un valor por defecto salvo `JWT_SECRET` fuera
//! de desarrollo; un valor mal formado es un error de arranque.

use anyhow::{anyhow, bail, Result};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::time::Duration;

use crate::services::fee_calculator::FeeCalculator;
use crate::services::jwt_service::MAX_TOKEN_LIFETIME_SECS;
use crate::services::store_guard::StorePolicy;
use crate::services::status_broadcaster::BroadcastConfig;

const DEV_JWT_SECRET: &str = "scenic-rental-dev-secret-change-me";

/// Decimales que admite la columna `fee`
const MAX_FEE_SCALE: u32 = 2;

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    pub cors_origins: Vec<String>,
    pub public_base_url: String,
    // Tarifa
    pub per_minute_rate: Decimal,
    pub minimum_fee: Decimal,
    // Broadcaster de estado
    pub broadcast_interval: Duration,
    pub observer_send_timeout: Duration,
    pub observer_buffer: usize,
    // Acceso al store
    pub store_timeout: Duration,
    pub store_retries: u32,
}

impl EnvironmentConfig {
    /// Leer la configuración del entorno del proceso
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Construir la configuración a partir de una función de lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string());

        let jwt_secret = match lookup("JWT_SECRET") {
            Some(secret) if !secret.trim().is_empty() => secret,
            _ if environment == "development" || environment == "test" => {
                DEV_JWT_SECRET.to_string()
            }
            _ => bail!("JWT_SECRET must be set when ENVIRONMENT={}", environment),
        };

        let config = Self {
            port: parse_or(&lookup, "PORT", 8000)?,
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            jwt_secret,
            jwt_expiration: parse_or(&lookup, "JWT_EXPIRATION", 1800)?,
            cors_origins: lookup("CORS_ORIGINS")
                .map(|origins| {
                    origins
                        .split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            public_base_url: lookup("PUBLIC_BASE_URL")
                .unwrap_or_else(|| "http://localhost:8000".to_string())
                .trim_end_matches('/')
                .to_string(),
            per_minute_rate: parse_or(&lookup, "PER_MINUTE_RATE", Decimal::new(5, 1))?,
            minimum_fee: parse_or(&lookup, "MINIMUM_FEE", Decimal::ONE)?,
            broadcast_interval: Duration::from_millis(parse_or(
                &lookup,
                "BROADCAST_INTERVAL_MS",
                1000,
            )?),
            observer_send_timeout: Duration::from_millis(parse_or(
                &lookup,
                "OBSERVER_SEND_TIMEOUT_MS",
                250,
            )?),
            observer_buffer: parse_or(&lookup, "OBSERVER_BUFFER", 16)?,
            store_timeout: Duration::from_millis(parse_or(&lookup, "STORE_TIMEOUT_MS", 5000)?),
            store_retries: parse_or(&lookup, "STORE_RETRIES", 2)?,
            environment,
        };

        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<()> {
        if self.per_minute_rate < Decimal::ZERO || self.minimum_fee < Decimal::ZERO {
            bail!("PER_MINUTE_RATE and MINIMUM_FEE must not be negative");
        }
        if self.per_minute_rate.normalize().scale() > MAX_FEE_SCALE
            || self.minimum_fee.normalize().scale() > MAX_FEE_SCALE
        {
            bail!(
                "PER_MINUTE_RATE and MINIMUM_FEE allow at most {} decimal places",
                MAX_FEE_SCALE
            );
        }
        if self.jwt_expiration == 0 || self.jwt_expiration > MAX_TOKEN_LIFETIME_SECS {
            bail!(
                "JWT_EXPIRATION must be between 1 and {} seconds",
                MAX_TOKEN_LIFETIME_SECS
            );
        }
        if self.broadcast_interval.is_zero() {
            bail!("BROADCAST_INTERVAL_MS must be greater than zero");
        }
        if self.observer_buffer == 0 {
            bail!("OBSERVER_BUFFER must be greater than zero");
        }
        Ok(())
    }

    /// Verificar si estamos en modo desarrollo
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Obtener la dirección del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn fee_calculator(&self) -> FeeCalculator {
        FeeCalculator::new(self.per_minute_rate, self.minimum_fee)
    }

    pub fn broadcast_config(&self) -> BroadcastConfig {
        BroadcastConfig {
            interval: self.broadcast_interval,
            send_timeout: self.observer_send_timeout,
            observer_buffer: self.observer_buffer,
        }
    }

    pub fn store_policy(&self) -> StorePolicy {
        StorePolicy {
            timeout: self.store_timeout,
            max_retries: self.store_retries,
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("{} has an invalid value '{}': {}", key, raw, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_in_development() {
        let config = EnvironmentConfig::from_lookup(lookup_from(&[])).unwrap();
        assert!(config.is_development());
        assert_eq!(config.port, 8000);
        assert_eq!(config.per_minute_rate, Decimal::new(5, 1));
        assert_eq!(config.minimum_fee, Decimal::ONE);
        assert_eq!(config.broadcast_interval, Duration::from_secs(1));
        assert_eq!(config.jwt_expiration, 1800);
        assert!(config.cors_origins.is_empty());
    }

    #[test]
    fn test_production_requires_secret() {
        let result = EnvironmentConfig::from_lookup(lookup_from(&[("ENVIRONMENT", "production")]));
        assert!(result.is_err());

        let config = EnvironmentConfig::from_lookup(lookup_from(&[
            ("ENVIRONMENT", "production"),
            ("JWT_SECRET", "s3cret"),
            ("CORS_ORIGINS", "https://a.example, https://b.example"),
            ("PUBLIC_BASE_URL", "https://fleet.example/"),
        ]))
        .unwrap();
        assert_eq!(config.cors_origins.len(), 2);
        assert_eq!(config.public_base_url, "https://fleet.example");
    }

    #[test]
    fn test_malformed_value_is_error() {
        let result = EnvironmentConfig::from_lookup(lookup_from(&[("PORT", "eighty")]));
        assert!(result.is_err());

        let result = EnvironmentConfig::from_lookup(lookup_from(&[("MINIMUM_FEE", "-1")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_huge_jwt_expiration_is_rejected() {
        let result = EnvironmentConfig::from_lookup(lookup_from(&[(
            "JWT_EXPIRATION",
            "18446744073709551615",
        )]));
        assert!(result.is_err());

        let result = EnvironmentConfig::from_lookup(lookup_from(&[("JWT_EXPIRATION", "0")]));
        assert!(result.is_err());

        let max = MAX_TOKEN_LIFETIME_SECS.to_string();
        let config =
            EnvironmentConfig::from_lookup(lookup_from(&[("JWT_EXPIRATION", max.as_str())]))
                .unwrap();
        assert_eq!(config.jwt_expiration, MAX_TOKEN_LIFETIME_SECS);
    }

    #[test]
    fn test_fee_settings_keep_cent_precision() {
        let result = EnvironmentConfig::from_lookup(lookup_from(&[("MINIMUM_FEE", "1.004")]));
        assert!(result.is_err());

        let result =
            EnvironmentConfig::from_lookup(lookup_from(&[("PER_MINUTE_RATE", "0.125")]));
        assert!(result.is_err());

        let config = EnvironmentConfig::from_lookup(lookup_from(&[
            ("MINIMUM_FEE", "1.500"),
            ("PER_MINUTE_RATE", "0.25"),
        ]))
        .unwrap();
        assert_eq!(config.minimum_fee, Decimal::new(15, 1));
    }
}
