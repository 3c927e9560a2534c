//! # Configuración del Servidor
//! src/config.rs
//!
//! Configuración del servidor con soporte para argumentos CLI y variables
//! de entorno.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./httpserver -t 8 8080
//! ./httpserver --dir ./files --queue 32 --timeout 5000 8080
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! HTTP_THREADS=8 DATA_DIR=./files ./httpserver 8080
//! ```

use clap::Parser;
use std::ffi::OsString;
use std::time::Duration;

/// Configuración del servidor de archivos
#[derive(Debug, Clone, Parser)]
#[command(name = "httpserver")]
#[command(about = "Servidor HTTP/1.1 de archivos con locks lector/escritor por recurso")]
#[command(version = "0.1.0")]
pub struct Config {
    /// Puerto en el que escucha el servidor (1-65535)
    #[arg(value_name = "PORT")]
    pub port: String,

    /// Número de worker threads
    #[arg(short = 't', long = "threads", default_value = "4", env = "HTTP_THREADS")]
    pub threads: usize,

    /// Host/IP en el que escucha
    #[arg(long, default_value = "0.0.0.0", env = "HTTP_HOST")]
    pub host: String,

    /// Directorio donde se guardan/leen los recursos
    #[arg(long = "dir", default_value = ".", env = "DATA_DIR")]
    pub data_dir: String,

    /// Capacidad de la cola de conexiones (por defecto = threads)
    #[arg(long = "queue", env = "HTTP_QUEUE")]
    pub queue_capacity: Option<usize>,

    /// Timeout de lectura/escritura del socket en ms (0 = sin timeout)
    #[arg(long = "timeout", default_value = "0", env = "HTTP_TIMEOUT")]
    pub io_timeout_ms: u64,
}

impl Config {
    /// Parsea los argumentos del proceso
    pub fn new() -> Result<Self, clap::Error> {
        Self::try_parse()
    }

    /// Parsea argumentos explícitos (el primero es el nombre del programa)
    ///
    /// # Ejemplo
    /// ```rust
    /// use httpserver::config::Config;
    ///
    /// let config = Config::from_args(["httpserver", "-t", "8", "8080"]).unwrap();
    /// assert_eq!(config.threads, 8);
    /// assert_eq!(config.port_number(), Ok(8080));
    /// ```
    pub fn from_args<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Self::try_parse_from(args)
    }

    /// Puerto numérico validado en [1, 65535]
    pub fn port_number(&self) -> Result<u16, String> {
        match self.port.parse::<u16>() {
            Ok(port) if port != 0 => Ok(port),
            _ => Err("Invalid Port".to_string()),
        }
    }

    /// Dirección completa para bind (host:port)
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Capacidad efectiva de la cola
    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity.unwrap_or(self.threads)
    }

    pub fn io_timeout(&self) -> Option<Duration> {
        match self.io_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }

    /// Valida la configuración
    ///
    /// Retorna errores si hay valores inválidos
    pub fn validate(&self) -> Result<(), String> {
        self.port_number()?;

        if self.threads == 0 {
            return Err("Threads must be >= 1".to_string());
        }

        if self.queue_capacity == Some(0) {
            return Err("Queue capacity must be >= 1".to_string());
        }

        Ok(())
    }

    /// Loguea un resumen de la configuración
    pub fn print_summary(&self) {
        log::info!("🌐 Address:   {}", self.address());
        log::info!("📁 Data dir:  {}", self.data_dir);
        log::info!("👷 Workers:   {}", self.threads);
        log::info!("📥 Queue cap: {}", self.queue_capacity());

        match self.io_timeout() {
            Some(t) => log::info!("⏱️  Timeout:   {} ms", t.as_millis()),
            None => log::info!("⏱️  Timeout:   disabled"),
        }
    }
}

impl Default for Config {
    /// Configuración por defecto
    fn default() -> Self {
        Self {
            port: "8080".to_string(),
            threads: 4,
            host: "0.0.0.0".to_string(),
            data_dir: ".".to_string(),
            queue_capacity: None,
            io_timeout_ms: 0,
        }
    }
}
