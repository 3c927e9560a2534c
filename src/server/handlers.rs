//! # Handlers de Conexión
//! src/server/handlers.rs
//!
//! Lo que hace un worker con cada conexión:
//!
//! ```text
//! parse → validar URI → lock del registro → read/write lock
//!       → I/O de archivo → soltar lock → responder → audit
//! ```
//!
//! Un worker nunca sostiene dos locks de recurso a la vez, y el mutex del
//! registro se suelta antes de adquirir el lock del recurso.

use crate::audit::{AuditEntry, AuditLog};
use crate::config::Config;
use crate::http::{Connection, ConnectionError, Method, Request, Response, StatusCode};
use crate::metrics::MetricsCollector;
use crate::sync::ResourceLockRegistry;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Estado compartido por todos los workers
pub struct ServerContext {
    /// Locks por nombre de recurso
    pub registry: ResourceLockRegistry,

    pub audit: AuditLog,

    pub metrics: MetricsCollector,

    /// Directorio raíz de los recursos
    pub data_dir: PathBuf,

    /// Timeout de socket aplicado por los workers
    pub io_timeout: Option<Duration>,
}

impl ServerContext {
    pub fn new(data_dir: impl Into<PathBuf>, audit: AuditLog) -> Self {
        Self {
            registry: ResourceLockRegistry::default(),
            audit,
            metrics: MetricsCollector::new(),
            data_dir: data_dir.into(),
            io_timeout: None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let mut context = Self::new(&config.data_dir, AuditLog::stderr());
        context.io_timeout = config.io_timeout();
        context
    }
}

/// Status decidido para el request y resultado de enviarlo
type Outcome = (StatusCode, io::Result<()>);

/// Atiende un request completo sobre `stream`
///
/// Todo request que se llega a parsear (bien o mal) termina con una sola
/// línea de audit, con el status decidido aunque la respuesta no se haya
/// podido enviar. Una conexión que se corta antes de terminar el head solo
/// se loguea.
pub fn handle_connection<S: Read + Write>(stream: S, ctx: &ServerContext) {
    let start = Instant::now();
    let mut conn = Connection::new(stream);

    let request = match conn.parse() {
        Ok(request) => request,
        Err(ConnectionError::Disconnected) => {
            log::debug!("🔌 Conexión cerrada sin request");
            return;
        }
        Err(ConnectionError::Io(e)) => {
            log::warn!("❌ Error leyendo request: {}", e);
            return;
        }
        Err(ConnectionError::Parse(e)) => {
            log::debug!("❌ Parse error: {}", e);
            let (status, sent) = respond(&mut conn, e.status());

            let (method, uri) = conn.target();
            if let Err(e) = sent {
                log::warn!("❌ Error enviando respuesta a {} {}: {}", method, uri, e);
            }
            finish(ctx, method, uri, status, "0", start);
            return;
        }
    };

    let (status, sent) = match request.method() {
        Method::GET => handle_get(&mut conn, &request, ctx),
        Method::PUT => handle_put(&mut conn, &request, ctx),
    };

    if let Err(e) = sent {
        log::warn!(
            "❌ Error de transporte en {} {}: {}",
            request.method().as_str(),
            request.uri(),
            e
        );
    }

    finish(
        ctx,
        request.method().as_str(),
        request.uri(),
        status,
        request.request_id(),
        start,
    );
}

/// Audit + métricas de un request completado
fn finish(ctx: &ServerContext, method: &str, uri: &str, status: StatusCode, request_id: &str, start: Instant) {
    ctx.audit.record(&AuditEntry {
        method,
        uri,
        status: status.as_u16(),
        request_id,
    });
    ctx.metrics.record_request(method, status.as_u16(), start.elapsed());
}

fn respond<S: Read + Write>(conn: &mut Connection<S>, status: StatusCode) -> Outcome {
    (status, conn.send_response(&Response::status_only(status)))
}

/// GET: lock de lectura mientras se transmite el archivo
fn handle_get<S: Read + Write>(conn: &mut Connection<S>, request: &Request, ctx: &ServerContext) -> Outcome {
    let name = match request.resource_name() {
        Ok(name) => name,
        Err(_) => return respond(conn, StatusCode::BadRequest),
    };

    let lock = ctx.registry.lookup_or_create(name);
    let _guard = lock.reader_lock();

    let mut file = match File::open(ctx.data_dir.join(name)) {
        Ok(file) => file,
        Err(e) => return respond(conn, classify_get_error(&e)),
    };

    let metadata = match file.metadata() {
        Ok(metadata) => metadata,
        Err(_) => return respond(conn, StatusCode::InternalServerError),
    };

    // En Linux `open` sobre un directorio funciona; hay que mirar el tipo
    if metadata.is_dir() {
        return respond(conn, StatusCode::Forbidden);
    }

    (StatusCode::Ok, conn.send_file(&mut file, metadata.len()))
}

/// PUT: lock de escritura mientras se recibe el body
fn handle_put<S: Read + Write>(conn: &mut Connection<S>, request: &Request, ctx: &ServerContext) -> Outcome {
    let name = match request.resource_name() {
        Ok(name) => name,
        Err(_) => return respond(conn, StatusCode::BadRequest),
    };
    let expected = request.content_length().unwrap_or(0);

    let lock = ctx.registry.lookup_or_create(name);
    let guard = lock.writer_lock();
    let path = ctx.data_dir.join(name);

    // La existencia previa decide 200 vs 201
    let existed = match fs::metadata(&path) {
        Ok(metadata) if metadata.is_dir() => return respond(conn, StatusCode::Forbidden),
        Ok(_) => true,
        Err(_) => false,
    };

    let mut file = match OpenOptions::new().write(true).create(true).truncate(true).open(&path) {
        Ok(file) => file,
        Err(e) => return respond(conn, classify_put_error(&e)),
    };

    let received = conn.recv_file(&mut file, expected);
    drop(file);
    drop(guard);

    let status = match received {
        Ok(n) if n == expected => {
            if existed {
                StatusCode::Ok
            } else {
                StatusCode::Created
            }
        }
        Ok(n) => {
            log::warn!("⚠️  Body incompleto para {}: {} de {} bytes", request.uri(), n, expected);
            StatusCode::InternalServerError
        }
        Err(e) => {
            log::warn!("⚠️  Error recibiendo body de {}: {}", request.uri(), e);
            StatusCode::InternalServerError
        }
    };

    respond(conn, status)
}

fn classify_get_error(e: &io::Error) -> StatusCode {
    match e.kind() {
        io::ErrorKind::NotFound => StatusCode::NotFound,
        io::ErrorKind::PermissionDenied | io::ErrorKind::IsADirectory => StatusCode::Forbidden,
        _ => StatusCode::InternalServerError,
    }
}

fn classify_put_error(e: &io::Error) -> StatusCode {
    match e.kind() {
        io::ErrorKind::PermissionDenied | io::ErrorKind::IsADirectory | io::ErrorKind::NotFound => {
            StatusCode::Forbidden
        }
        _ => StatusCode::InternalServerError,
    }
}
