//! # Módulo HTTP
//!
//! Implementa el subconjunto de HTTP/1.1 que necesita el servidor de
//! archivos, sin librerías de alto nivel:
//!
//! - Parsing del head de requests GET/PUT
//! - Construcción de responses de estado
//! - Transferencia de bodies entre socket y archivo
//!
//! ### Formato de Request
//!
//! ```text
//! GET /archivo.txt HTTP/1.1\r\n
//! Request-Id: 7\r\n
//! \r\n
//! ```
//!
//! ### Formato de Response
//!
//! ```text
//! HTTP/1.1 200 OK\r\n
//! Content-Length: 5\r\n
//! \r\n
//! hello
//! ```
//!
//! No hay keep-alive: cada conexión lleva exactamente un request.

pub mod connection; // Lectura del head y transferencia de bodies
pub mod request; // Parsing de HTTP requests
pub mod response; // Construcción de HTTP responses
pub mod status; // Códigos de estado HTTP

// Re-exportamos los tipos principales para facilitar su uso
pub use connection::{Connection, ConnectionError};
pub use request::{Method, ParseError, Request};
pub use response::Response;
pub use status::StatusCode;
