//! # Primitivas de Sincronización
//! src/sync/mod.rs
//!
//! - `queue`: cola acotada bloqueante dispatcher → workers
//! - `rwlock`: lock lector/escritor con prioridad configurable
//! - `registry`: tabla de locks por nombre de recurso

pub mod queue;
pub mod registry;
pub mod rwlock;

pub use queue::{BoundedQueue, QueueError};
pub use registry::ResourceLockRegistry;
pub use rwlock::{LockStats, Priority, ReadGuard, ReaderWriterLock, WriteGuard};
