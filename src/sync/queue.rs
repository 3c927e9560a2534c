//! # Cola Acotada Bloqueante
//! src/sync/queue.rs
//!
//! Cola FIFO de capacidad fija que conecta al dispatcher (productor) con
//! los workers (consumidores).
//!
//! - `push` bloquea mientras no haya slots libres (backpressure)
//! - `pop` bloquea mientras no haya elementos
//! - Cada operación despierta a un solo waiter del otro lado
//!
//! El buffer es circular: `input` y `output` avanzan módulo la capacidad.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// Errores al construir la cola
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// La capacidad debe ser >= 1
    InvalidCapacity(usize),
}

impl std::fmt::Display for QueueError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueueError::InvalidCapacity(c) => write!(f, "Invalid queue capacity: {}", c),
        }
    }
}

impl std::error::Error for QueueError {}

/// Estado protegido por el mutex
struct Slots<T> {
    /// Buffer circular; `None` significa slot libre
    buf: Vec<Option<T>>,

    /// Próximo slot a escribir
    input: usize,

    /// Próximo slot a leer
    output: usize,

    /// Slots ocupados, siempre en [0, capacity]
    occupied: usize,

    /// Cerrada para shutdown
    closed: bool,
}

/// Cola acotada thread-safe con push/pop bloqueantes
pub struct BoundedQueue<T> {
    slots: Mutex<Slots<T>>,

    /// Señal para pushers: hay un slot libre
    not_full: Condvar,

    /// Señal para poppers: hay un elemento
    not_empty: Condvar,

    capacity: usize,
}

impl<T> BoundedQueue<T> {
    /// Crea una cola con `capacity` slots
    ///
    /// # Ejemplo
    /// ```
    /// use httpserver::sync::BoundedQueue;
    ///
    /// let queue = BoundedQueue::new(2).unwrap();
    /// queue.push(1).unwrap();
    /// assert_eq!(queue.pop(), Some(1));
    /// assert!(BoundedQueue::<u8>::new(0).is_err());
    /// ```
    pub fn new(capacity: usize) -> Result<Self, QueueError> {
        if capacity == 0 {
            return Err(QueueError::InvalidCapacity(capacity));
        }

        let mut buf = Vec::with_capacity(capacity);
        buf.resize_with(capacity, || None);

        Ok(Self {
            slots: Mutex::new(Slots {
                buf,
                input: 0,
                output: 0,
                occupied: 0,
                closed: false,
            }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
            capacity,
        })
    }

    fn lock(&self) -> MutexGuard<'_, Slots<T>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Encola un elemento, bloqueando mientras la cola esté llena
    ///
    /// Retorna `Err(item)` solo si la cola fue cerrada; el elemento se
    /// devuelve al caller para que decida qué hacer con él.
    pub fn push(&self, item: T) -> Result<(), T> {
        let mut slots = self.lock();

        while slots.occupied == self.capacity && !slots.closed {
            slots = self.not_full.wait(slots).unwrap_or_else(PoisonError::into_inner);
        }

        if slots.closed {
            return Err(item);
        }

        let at = slots.input;
        slots.buf[at] = Some(item);
        slots.input = (at + 1) % self.capacity;
        slots.occupied += 1;
        drop(slots);

        self.not_empty.notify_one();
        Ok(())
    }

    /// Desencola el elemento más antiguo, bloqueando mientras esté vacía
    ///
    /// Retorna `None` únicamente cuando la cola está cerrada y ya no
    /// quedan elementos pendientes.
    pub fn pop(&self) -> Option<T> {
        let mut slots = self.lock();

        while slots.occupied == 0 {
            if slots.closed {
                return None;
            }
            slots = self.not_empty.wait(slots).unwrap_or_else(PoisonError::into_inner);
        }

        let at = slots.output;
        let item = slots.buf[at].take();
        slots.output = (at + 1) % self.capacity;
        slots.occupied -= 1;
        drop(slots);

        self.not_full.notify_one();
        item
    }

    /// Cierra la cola y despierta a todos los que esperan
    ///
    /// Los elementos ya encolados se siguen entregando con `pop`.
    pub fn close(&self) {
        let mut slots = self.lock();
        slots.closed = true;
        drop(slots);

        self.not_full.notify_all();
        self.not_empty.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Número de elementos encolados en este momento
    pub fn len(&self) -> usize {
        self.lock().occupied
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
