//! # Registro de Locks por Recurso
//! src/sync/registry.rs
//!
//! Mapea nombre de recurso → `ReaderWriterLock`, creando el lock la primera
//! vez que se referencia un nombre.
//!
//! Todo el lookup-or-create ocurre dentro de una sola sección crítica del
//! mutex del registro, así que dos threads nunca crean dos locks distintos
//! para el mismo nombre. El mutex protege solo la estructura del mapa: el
//! contenido del recurso lo protege su propio `ReaderWriterLock`, que se
//! adquiere después de soltar el registro.
//!
//! Los locks nunca se eliminan; viven tanto como el registro (que vive
//! tanto como el servidor).

use super::rwlock::{Priority, ReaderWriterLock};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Tabla nombre → lock, propiedad del contexto del servidor
pub struct ResourceLockRegistry {
    locks: Mutex<HashMap<String, Arc<ReaderWriterLock>>>,

    /// Política con la que se crean los locks nuevos
    priority: Priority,
}

impl ResourceLockRegistry {
    pub fn new(priority: Priority) -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
            priority,
        }
    }

    /// Retorna el lock del recurso, creándolo si no existe
    ///
    /// # Ejemplo
    /// ```
    /// use std::sync::Arc;
    /// use httpserver::sync::ResourceLockRegistry;
    ///
    /// let registry = ResourceLockRegistry::default();
    /// let a = registry.lookup_or_create("foo.txt");
    /// let b = registry.lookup_or_create("foo.txt");
    /// assert!(Arc::ptr_eq(&a, &b));
    /// ```
    pub fn lookup_or_create(&self, name: &str) -> Arc<ReaderWriterLock> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(lock) = locks.get(name) {
            return Arc::clone(lock);
        }

        log::debug!("🔐 Nuevo lock para recurso '{}' ({})", name, self.priority.as_str());
        let lock = Arc::new(ReaderWriterLock::new(self.priority));
        locks.insert(name.to_string(), Arc::clone(&lock));
        lock
    }

    pub fn contains(&self, name: &str) -> bool {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Cantidad de recursos distintos vistos hasta ahora
    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }
}

impl Default for ResourceLockRegistry {
    fn default() -> Self {
        Self::new(Priority::NWay(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_same_name_same_lock() {
        let registry = ResourceLockRegistry::default();
        let a = registry.lookup_or_create("a");
        let again = registry.lookup_or_create("a");

        assert!(Arc::ptr_eq(&a, &again));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_distinct_names_distinct_locks() {
        let registry = ResourceLockRegistry::default();
        let a = registry.lookup_or_create("a");
        let b = registry.lookup_or_create("b");

        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let registry = ResourceLockRegistry::default();
        let lower = registry.lookup_or_create("file");
        let upper = registry.lookup_or_create("FILE");

        assert!(!Arc::ptr_eq(&lower, &upper));
        assert!(registry.contains("file"));
        assert!(!registry.contains("File"));
    }

    #[test]
    fn test_locks_use_registry_priority() {
        let registry = ResourceLockRegistry::new(Priority::Readers);
        assert_eq!(registry.lookup_or_create("x").priority(), Priority::Readers);
        assert_eq!(ResourceLockRegistry::default().priority(), Priority::NWay(1));
    }

    #[test]
    fn test_concurrent_first_access() {
        let registry = Arc::new(ResourceLockRegistry::default());

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || registry.lookup_or_create("foo"))
            })
            .collect();

        let locks: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert!(locks.iter().all(|l| Arc::ptr_eq(l, &locks[0])));
        assert_eq!(registry.len(), 1);
    }
}
