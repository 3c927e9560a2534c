//! # httpserver
//! src/lib.rs
//!
//! Servidor HTTP/1.1 de archivos, multi-thread, con locks lector/escritor
//! por recurso. Implementado sobre la std para practicar conceptos de
//! sistemas operativos: productor/consumidor, exclusión mutua y políticas
//! de prioridad entre lectores y escritores.
//!
//! ## Arquitectura
//!
//! - `sync`: cola acotada, lock lector/escritor y registro de locks
//! - `http`: parsing de requests, respuestas y streaming de bodies
//! - `server`: dispatcher, pool de workers y handlers GET/PUT
//! - `audit`: una línea por request en stderr
//! - `metrics`: contadores y latencias del servidor
//! - `config`: argumentos CLI y variables de entorno
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use httpserver::config::Config;
//! use httpserver::server::Server;
//!
//! let config = Config::from_args(["httpserver", "-t", "4", "8080"]).unwrap();
//! let server = Server::bind(config).expect("Error al iniciar servidor");
//! server.run().expect("Error fatal");
//! ```

pub mod audit;
pub mod config;
pub mod http;
pub mod metrics;
pub mod server;
pub mod sync;
