//! # Lock Lector/Escritor con Prioridad Configurable
//! src/sync/rwlock.rs
//!
//! Implementa un lock que permite múltiples lectores concurrentes o un único
//! escritor exclusivo, con contadores explícitos de activos y en espera.
//!
//! ## Máquina de estados
//!
//! ```text
//! Idle ──reader_lock──► ReadersActive(n) ──último reader_unlock──► Idle
//!  │                                                                ▲
//!  └──writer_lock──► WriterActive ──writer_unlock───────────────────┘
//! ```
//!
//! ## Políticas
//!
//! - `Readers`: al soltar un escritor se despierta a todos los lectores en
//!   espera antes que a cualquier escritor.
//! - `Writers`: un lector nuevo no entra mientras haya escritores esperando.
//! - `NWay(n)`: al soltar un escritor se prefiere a otro escritor en espera;
//!   los lectores no ceden el paso al entrar. Solo `n = 1` está definido,
//!   valores mayores se comportan igual.
//!
//! Los lectores esperan en `readers_ok` y los escritores en `writers_ok`.
//! No hay timeouts ni cancelación: quien espera, espera hasta que lo
//! despierten legítimamente.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// Política de prioridad del lock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    /// Prioridad a lectores
    Readers,

    /// Prioridad a escritores
    Writers,

    /// Fairness "N-way" con parámetro `n`
    NWay(u32),
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Readers => "readers",
            Priority::Writers => "writers",
            Priority::NWay(_) => "n-way",
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::NWay(1)
    }
}

/// Contadores internos del lock
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LockStats {
    pub active_readers: usize,
    pub active_writers: usize,
    pub waiting_readers: usize,
    pub waiting_writers: usize,
}

/// Lock lector/escritor con contadores de espera
pub struct ReaderWriterLock {
    state: Mutex<LockStats>,
    readers_ok: Condvar,
    writers_ok: Condvar,
    priority: Priority,
}

impl ReaderWriterLock {
    /// Crea un lock con la política indicada
    ///
    /// # Ejemplo
    /// ```
    /// use httpserver::sync::{Priority, ReaderWriterLock};
    ///
    /// let lock = ReaderWriterLock::new(Priority::Writers);
    /// {
    ///     let _a = lock.reader_lock();
    ///     let _b = lock.reader_lock();
    ///     assert_eq!(lock.stats().active_readers, 2);
    /// }
    /// let _w = lock.writer_lock();
    /// assert_eq!(lock.stats().active_writers, 1);
    /// ```
    pub fn new(priority: Priority) -> Self {
        Self {
            state: Mutex::new(LockStats::default()),
            readers_ok: Condvar::new(),
            writers_ok: Condvar::new(),
            priority,
        }
    }

    fn state(&self) -> MutexGuard<'_, LockStats> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Parámetro de fairness; 0 si la política no es `NWay`
    pub fn fairness(&self) -> u32 {
        match self.priority {
            Priority::NWay(n) => n,
            _ => 0,
        }
    }

    /// Snapshot consistente de los contadores
    pub fn stats(&self) -> LockStats {
        *self.state()
    }

    /// Adquiere el lock en modo lectura
    ///
    /// Bloquea mientras haya un escritor activo o, con prioridad a
    /// escritores, mientras haya escritores esperando.
    pub fn reader_lock(&self) -> ReadGuard<'_> {
        let mut state = self.state();
        state.waiting_readers += 1;

        while state.active_writers > 0
            || (self.priority == Priority::Writers && state.waiting_writers > 0)
        {
            state = self.readers_ok.wait(state).unwrap_or_else(PoisonError::into_inner);
        }

        state.waiting_readers -= 1;
        state.active_readers += 1;

        ReadGuard { lock: self }
    }

    fn reader_unlock(&self) {
        let mut state = self.state();
        state.active_readers -= 1;

        if state.active_readers == 0 && state.waiting_writers > 0 {
            self.writers_ok.notify_one();
        }
    }

    /// Adquiere el lock en modo escritura exclusiva
    pub fn writer_lock(&self) -> WriteGuard<'_> {
        let mut state = self.state();
        state.waiting_writers += 1;

        while state.active_readers > 0 || state.active_writers > 0 {
            state = self.writers_ok.wait(state).unwrap_or_else(PoisonError::into_inner);
        }

        state.waiting_writers -= 1;
        state.active_writers = 1;

        WriteGuard { lock: self }
    }

    fn writer_unlock(&self) {
        let mut state = self.state();
        state.active_writers = 0;

        if self.priority == Priority::Readers && state.waiting_readers > 0 {
            self.readers_ok.notify_all();
        } else if state.waiting_writers > 0 {
            self.writers_ok.notify_one();
        } else {
            self.readers_ok.notify_all();
        }
    }
}

impl Default for ReaderWriterLock {
    fn default() -> Self {
        Self::new(Priority::default())
    }
}

impl std::fmt::Debug for ReaderWriterLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReaderWriterLock")
            .field("priority", &self.priority)
            .field("state", &self.stats())
            .finish()
    }
}

/// Guard de lectura; libera con `reader_unlock` al salir de scope
#[must_use = "el lock se libera inmediatamente si el guard no se guarda"]
pub struct ReadGuard<'a> {
    lock: &'a ReaderWriterLock,
}

impl Drop for ReadGuard<'_> {
    fn drop(&mut self) {
        self.lock.reader_unlock();
    }
}

/// Guard de escritura; libera con `writer_unlock` al salir de scope
#[must_use = "el lock se libera inmediatamente si el guard no se guarda"]
pub struct WriteGuard<'a> {
    lock: &'a ReaderWriterLock,
}

impl Drop for WriteGuard<'_> {
    fn drop(&mut self) {
        self.lock.writer_unlock();
    }
}
