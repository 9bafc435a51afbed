//! DTOs de la API HTTP
//!
//! Formas de petición y respuesta; los modelos de dominio nunca se
//! serializan directamente hacia el cliente.

pub mod auth_dto;
pub mod order_dto;
pub mod vehicle_dto;
