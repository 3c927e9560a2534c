//! # Audit Log
//! src/audit.rs
//!
//! Registra una línea por request completado:
//!
//! ```text
//! METHOD,/URI,STATUS,REQUEST-ID
//! ```
//!
//! Las líneas de distintos workers nunca se intercalan: cada escritura
//! ocurre completa bajo el mutex del sink.

use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

/// Una línea del audit log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry<'a> {
    pub method: &'a str,
    pub uri: &'a str,
    pub status: u16,
    pub request_id: &'a str,
}

impl std::fmt::Display for AuditEntry<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{},{},{}", self.method, self.uri, self.status, self.request_id)
    }
}

/// Sink serializado para el audit log
pub struct AuditLog {
    sink: Mutex<Box<dyn Write + Send>>,
}

impl AuditLog {
    pub fn new<W: Write + Send + 'static>(sink: W) -> Self {
        Self {
            sink: Mutex::new(Box::new(sink)),
        }
    }

    /// Audit log sobre stderr (modo normal del servidor)
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }

    /// Escribe la línea completa y hace flush
    ///
    /// Un error de escritura se reporta por `log` pero no afecta al request.
    pub fn record(&self, entry: &AuditEntry<'_>) {
        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        let line = format!("{}\n", entry);

        if let Err(e) = sink.write_all(line.as_bytes()).and_then(|_| sink.flush()) {
            log::warn!("⚠️  No se pudo escribir el audit log: {}", e);
        }
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::stderr()
    }
}
