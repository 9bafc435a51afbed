//! Utilidades de validación
//!
//! Validadores custom usados por los DTOs con `#[validate(custom = ...)]`
//! y por los servicios antes de tocar el store.

use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

/// Nivel de batería mínimo admitido (porcentaje)
pub const MIN_BATTERY_LEVEL: i32 = 0;
/// Nivel de batería máximo admitido (porcentaje)
pub const MAX_BATTERY_LEVEL: i32 = 100;

lazy_static! {
    static ref PHONE_RE: Regex = Regex::new(r"^\+?[0-9]{6,15}$").unwrap();
    static ref PLATE_RE: Regex = Regex::new(r"^[A-Z0-9][A-Z0-9-]{2,14}$").unwrap();
}

/// Validar que un string no esté vacío
pub fn validate_not_empty(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("not_empty");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

/// Validar formato de teléfono (solo dígitos, prefijo internacional opcional)
pub fn validate_phone(value: &str) -> Result<(), ValidationError> {
    if !PHONE_RE.is_match(value) {
        let mut error = ValidationError::new("phone");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

/// Validar formato de matrícula (mayúsculas, dígitos y guiones)
pub fn validate_license_plate(value: &str) -> Result<(), ValidationError> {
    if !PLATE_RE.is_match(value) {
        let mut error = ValidationError::new("license_plate");
        error.add_param("value".into(), &value.to_string());
        error.add_param("format".into(), &"A-Z, 0-9 and '-', 3-15 characters".to_string());
        return Err(error);
    }
    Ok(())
}

/// Validar que el nivel de batería esté en [0, 100]
pub fn validate_battery_level(value: i32) -> Result<(), ValidationError> {
    if !(MIN_BATTERY_LEVEL..=MAX_BATTERY_LEVEL).contains(&value) {
        let mut error = ValidationError::new("battery_level");
        error.add_param("min".into(), &MIN_BATTERY_LEVEL);
        error.add_param("max".into(), &MAX_BATTERY_LEVEL);
        error.add_param("actual".into(), &value);
        return Err(error);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_not_empty() {
        assert!(validate_not_empty("西湖0101").is_ok());
        assert!(validate_not_empty("   ").is_err());
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("13800138001").is_ok());
        assert!(validate_phone("+8613800138001").is_ok());
        assert!(validate_phone("138-0013").is_err());
        assert!(validate_phone("123").is_err());
    }

    #[test]
    fn test_validate_license_plate() {
        assert!(validate_license_plate("SC0001").is_ok());
        assert!(validate_license_plate("AB-123-CD").is_ok());
        assert!(validate_license_plate("sc0001").is_err());
        assert!(validate_license_plate("A").is_err());
    }

    #[test]
    fn test_validate_battery_level() {
        assert!(validate_battery_level(0).is_ok());
        assert!(validate_battery_level(100).is_ok());
        assert!(validate_battery_level(-1).is_err());
        assert!(validate_battery_level(101).is_err());
    }
}
