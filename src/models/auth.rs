use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::utils::errors::{forbidden_error, AppError};

/// Roles del sistema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Guest,
    Operator,
    Admin,
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "guest" => Ok(Role::Guest),
            "operator" => Ok(Role::Operator),
            "admin" => Ok(Role::Admin),
            other => Err(AppError::InvalidInput(format!("Unknown role '{}'", other))),
        }
    }
}

/// Capacidades que se comprueban en la frontera de los servicios
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Alquilar un vehículo disponible
    RentVehicle,
    /// Devolver órdenes de cualquier arrendatario
    ReturnAnyOrder,
    /// Listar las órdenes de toda la flota
    ViewAllOrders,
    /// Consultar el detalle de cualquier orden
    ViewAnyOrder,
    /// Alta de vehículos, batería y mantenimiento
    ManageFleet,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::RentVehicle => "rent_vehicle",
            Capability::ReturnAnyOrder => "return_any_order",
            Capability::ViewAllOrders => "view_all_orders",
            Capability::ViewAnyOrder => "view_any_order",
            Capability::ManageFleet => "manage_fleet",
        }
    }
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Guest => "guest",
            Role::Operator => "operator",
            Role::Admin => "admin",
        }
    }

    /// Código numérico persistido (0 visitante, 1 operador, 2 administrador)
    pub fn code(&self) -> i16 {
        match self {
            Role::Guest => 0,
            Role::Operator => 1,
            Role::Admin => 2,
        }
    }

    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            0 => Some(Role::Guest),
            1 => Some(Role::Operator),
            2 => Some(Role::Admin),
            _ => None,
        }
    }

    /// Capacidades concedidas a cada rol
    pub fn capabilities(&self) -> &'static [Capability] {
        match self {
            Role::Guest => &[Capability::RentVehicle],
            Role::Operator => &[Capability::RentVehicle, Capability::ManageFleet],
            Role::Admin => &[
                Capability::RentVehicle,
                Capability::ReturnAnyOrder,
                Capability::ViewAllOrders,
                Capability::ViewAnyOrder,
                Capability::ManageFleet,
            ],
        }
    }

    pub fn can(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }
}

/// Identidad resuelta de quien hace la llamada
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: i64,
    pub role: Role,
}

impl Caller {
    pub fn new(user_id: i64, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn can(&self, capability: Capability) -> bool {
        self.role.can(capability)
    }

    /// Falla con Forbidden si el rol no tiene la capacidad
    pub fn require(&self, capability: Capability) -> Result<(), AppError> {
        if self.can(capability) {
            Ok(())
        } else {
            Err(forbidden_error(
                capability.as_str(),
                &format!("role '{}' lacks this capability", self.role.as_str()),
            ))
        }
    }

    /// El dueño del recurso, o un rol con la capacidad indicada
    pub fn owns_or_can(&self, owner_id: i64, capability: Capability) -> bool {
        self.user_id == owner_id || self.can(capability)
    }
}

/// Claims del JWT
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String, // user_id
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_capabilities() {
        let guest = Caller::new(1, Role::Guest);
        let operator = Caller::new(2, Role::Operator);
        let admin = Caller::new(3, Role::Admin);

        assert!(guest.can(Capability::RentVehicle));
        assert!(!guest.can(Capability::ReturnAnyOrder));
        assert!(!guest.can(Capability::ManageFleet));

        assert!(operator.can(Capability::ManageFleet));
        assert!(!operator.can(Capability::ReturnAnyOrder));
        assert!(!operator.can(Capability::ViewAllOrders));

        assert!(admin.can(Capability::ReturnAnyOrder));
        assert!(admin.can(Capability::ViewAllOrders));
    }

    #[test]
    fn test_require_yields_forbidden() {
        let guest = Caller::new(1, Role::Guest);
        let err = guest.require(Capability::ManageFleet).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert!(guest.require(Capability::RentVehicle).is_ok());
    }

    #[test]
    fn test_owner_or_capability() {
        let guest = Caller::new(7, Role::Guest);
        assert!(guest.owns_or_can(7, Capability::ReturnAnyOrder));
        assert!(!guest.owns_or_can(8, Capability::ReturnAnyOrder));
        assert!(Caller::new(1, Role::Admin).owns_or_can(8, Capability::ReturnAnyOrder));
    }

    #[test]
    fn test_role_codes() {
        for role in [Role::Guest, Role::Operator, Role::Admin] {
            assert_eq!(Role::from_code(role.code()), Some(role));
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert_eq!(Role::from_code(9), None);
        assert!(matches!(
            "superuser".parse::<Role>(),
            Err(AppError::InvalidInput(_))
        ));
    }
}
