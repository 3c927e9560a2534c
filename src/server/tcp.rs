//! # Servidor TCP con Dispatcher y Pool de Workers
//! src/server/tcp.rs
//!
//! Un único thread dispatcher acepta conexiones y las empuja a una
//! `BoundedQueue`; un pool fijo de workers las consume. Si todos los workers
//! están ocupados y la cola se llena, el `push` bloquea y el dispatcher deja
//! de aceptar (backpressure).
//!
//! El apagado es explícito con `ShutdownHandle`: marca el flag, cierra la
//! cola y despierta al `accept` con una conexión local.

use super::handlers::ServerContext;
use super::workers::WorkerPool;
use crate::config::Config;
use crate::sync::{BoundedQueue, QueueError};
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Errores fatales del servidor
#[derive(Debug)]
pub enum ServerError {
    /// No se pudo hacer bind/listen
    Bind(io::Error),

    /// No se pudo crear la cola de conexiones
    Queue(QueueError),

    /// No se pudieron lanzar los workers
    Spawn(io::Error),
}

impl std::fmt::Display for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerError::Bind(e) => write!(f, "Failed to initialize listener: {}", e),
            ServerError::Queue(e) => write!(f, "Failed to create connection queue: {}", e),
            ServerError::Spawn(e) => write!(f, "Failed to spawn workers: {}", e),
        }
    }
}

impl std::error::Error for ServerError {}

/// Señal de apagado, clonable entre threads
#[derive(Clone)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
    queue: Arc<BoundedQueue<TcpStream>>,

    /// Dirección para despertar al `accept` bloqueado
    wake_addr: SocketAddr,
}

impl ShutdownHandle {
    /// Pide al dispatcher y a los workers que terminen
    ///
    /// Las conexiones ya encoladas se atienden antes de salir.
    pub fn shutdown(&self) {
        if self.flag.swap(true, Ordering::SeqCst) {
            return;
        }

        self.queue.close();

        if let Err(e) = TcpStream::connect_timeout(&self.wake_addr, Duration::from_secs(1)) {
            log::debug!("No se pudo despertar al dispatcher: {}", e);
        }
    }

    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Servidor de archivos concurrente
pub struct Server {
    config: Config,
    listener: TcpListener,
    context: Arc<ServerContext>,
    queue: Arc<BoundedQueue<TcpStream>>,
    shutdown: ShutdownHandle,
}

impl Server {
    /// Hace bind con el contexto por defecto (audit log en stderr)
    pub fn bind(config: Config) -> Result<Self, ServerError> {
        let context = ServerContext::from_config(&config);
        Self::with_context(config, context)
    }

    /// Hace bind con un contexto provisto por el caller
    pub fn with_context(config: Config, context: ServerContext) -> Result<Self, ServerError> {
        let queue = Arc::new(BoundedQueue::new(config.queue_capacity()).map_err(ServerError::Queue)?);

        let listener = TcpListener::bind(config.address()).map_err(ServerError::Bind)?;
        let local_addr = listener.local_addr().map_err(ServerError::Bind)?;

        let shutdown = ShutdownHandle {
            flag: Arc::new(AtomicBool::new(false)),
            queue: Arc::clone(&queue),
            wake_addr: wake_address(local_addr),
        };

        Ok(Self {
            config,
            listener,
            context: Arc::new(context),
            queue,
            shutdown,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    pub fn context(&self) -> Arc<ServerContext> {
        Arc::clone(&self.context)
    }

    /// Lanza los workers y corre el dispatcher en el thread actual
    ///
    /// Retorna cuando se llama a `ShutdownHandle::shutdown` y todos los
    /// workers terminaron.
    pub fn run(self) -> Result<(), ServerError> {
        let address = self.local_addr().map_err(ServerError::Bind)?;
        log::info!("[+] Servidor escuchando en {}", address);
        log::info!(
            "[*] {} workers, cola de {} conexiones",
            self.config.threads,
            self.queue.capacity()
        );

        let workers = WorkerPool::spawn(
            self.config.threads,
            Arc::clone(&self.queue),
            Arc::clone(&self.context),
        )
        .map_err(ServerError::Spawn)?;

        for stream in self.listener.incoming() {
            if self.shutdown.is_shutdown() {
                break;
            }

            match stream {
                Ok(stream) => {
                    // Bloquea si la cola está llena
                    if self.queue.push(stream).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    log::warn!("❌ Error al aceptar conexión: {}", e);
                }
            }
        }

        log::info!("[*] Dispatcher detenido, esperando workers");
        self.queue.close();
        workers.join();

        log::info!("[*] Métricas finales: {}", self.context.metrics.to_json());
        Ok(())
    }
}

/// Dirección a la que conectarse para despertar al `accept`
fn wake_address(local: SocketAddr) -> SocketAddr {
    match local.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => {
            SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), local.port())
        }
        IpAddr::V6(ip) if ip.is_unspecified() => {
            SocketAddr::new(IpAddr::V6(Ipv6Addr::LOCALHOST), local.port())
        }
        _ => local,
    }
}
