//! # Módulo del Servidor HTTP
//! src/server/mod.rs
//!
//! Este módulo implementa el servidor que:
//! 1. Escucha en un puerto (`tcp`)
//! 2. Acepta conexiones y las encola (dispatcher en `tcp`)
//! 3. Las atiende con un pool fijo de threads (`workers`)
//! 4. Resuelve GET/PUT bajo el lock del recurso (`handlers`)

pub mod handlers;
pub mod tcp;
pub mod workers;

// Re-exportar para facilitar el uso
pub use handlers::ServerContext;
pub use tcp::{Server, ServerError, ShutdownHandle};
pub use workers::WorkerPool;
