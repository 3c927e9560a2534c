//! # Sistema de Métricas
//! src/metrics/mod.rs
//!
//! Recolección y agregación de métricas del servidor:
//! - Contadores de requests por método y código de estado
//! - Latencias (p50, p99, promedio, máximo)
//! - Workers ocupados

pub mod collector;

pub use collector::{MetricsCollector, MetricsSnapshot};
