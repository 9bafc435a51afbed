//! Alquiler de vehículos en zonas turísticas
//!
//! Backend de la flota: máquina de estados de alquiler sobre un
//! `FleetStore` atómico, cálculo de tarifas y reparto periódico del estado
//! de la flota a observadores conectados por WebSocket.

pub mod config;
pub mod database;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;
