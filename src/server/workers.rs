//! # Pool de Workers
//! src/server/workers.rs
//!
//! N threads fijos que consumen conexiones de la `BoundedQueue`. No se crea
//! ningún thread por request: el paralelismo lo limita el tamaño del pool y
//! la cola acotada le da backpressure al dispatcher.

use super::handlers::{self, ServerContext};
use crate::sync::BoundedQueue;
use std::io;
use std::net::TcpStream;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Pool de worker threads
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Lanza `size` workers que leen de `queue`
    ///
    /// Cada worker termina cuando la cola se cierra y queda vacía.
    pub fn spawn(
        size: usize,
        queue: Arc<BoundedQueue<TcpStream>>,
        ctx: Arc<ServerContext>,
    ) -> io::Result<Self> {
        let mut handles = Vec::with_capacity(size);

        for i in 0..size {
            let queue = Arc::clone(&queue);
            let ctx = Arc::clone(&ctx);
            let name = format!("worker-{}", i);

            let handle = thread::Builder::new()
                .name(name.clone())
                .spawn(move || Self::worker_loop(name, queue, ctx))?;

            handles.push(handle);
        }

        Ok(Self { handles })
    }

    /// Loop principal del worker
    fn worker_loop(name: String, queue: Arc<BoundedQueue<TcpStream>>, ctx: Arc<ServerContext>) {
        log::debug!("🔧 Worker {} started", name);

        while let Some(stream) = queue.pop() {
            if let Some(timeout) = ctx.io_timeout {
                let applied = stream
                    .set_read_timeout(Some(timeout))
                    .and_then(|_| stream.set_write_timeout(Some(timeout)));
                if let Err(e) = applied {
                    log::warn!("⚠️  Worker {} no pudo aplicar timeout: {}", name, e);
                }
            }

            ctx.metrics.worker_busy();
            handlers::handle_connection(&stream, &ctx);
            ctx.metrics.worker_idle();
            // El stream se cierra al salir de scope
        }

        log::debug!("🛑 Worker {} stopped", name);
    }

    pub fn size(&self) -> usize {
        self.handles.len()
    }

    /// Espera a que terminen todos los workers
    pub fn join(self) {
        for handle in self.handles {
            if let Err(e) = handle.join() {
                log::error!("💥 Un worker terminó con panic: {:?}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditLog;
    use std::io::{Read, Write};
    use std::net::TcpListener;

    #[test]
    fn test_workers_exit_when_queue_closed() {
        let queue = Arc::new(BoundedQueue::new(2).unwrap());
        let ctx = Arc::new(ServerContext::new(std::env::temp_dir(), AuditLog::new(io::sink())));

        let pool = WorkerPool::spawn(3, Arc::clone(&queue), ctx).unwrap();
        assert_eq!(pool.size(), 3);

        queue.close();
        pool.join();
    }

    #[test]
    fn test_worker_serves_queued_connection() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let queue = Arc::new(BoundedQueue::new(1).unwrap());
        let ctx = Arc::new(ServerContext::new(std::env::temp_dir(), AuditLog::new(io::sink())));
        let pool = WorkerPool::spawn(1, Arc::clone(&queue), ctx).unwrap();

        let mut client = TcpStream::connect(addr).unwrap();
        let (accepted, _) = listener.accept().unwrap();
        queue.push(accepted).unwrap();

        client.write_all(b"HEAD /x HTTP/1.1\r\n\r\n").unwrap();
        let mut buf = String::new();
        client.read_to_string(&mut buf).unwrap();
        assert!(buf.starts_with("HTTP/1.1 501 Not Implemented\r\n"));

        queue.close();
        pool.join();
    }
}
