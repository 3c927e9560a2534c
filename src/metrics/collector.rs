//! # Collector de Métricas
//! src/metrics/collector.rs
//!
//! Recolecta métricas del servidor en tiempo real: requests por método y
//! por código de estado, latencias y workers ocupados.

use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Máximo de latencias a guardar (para calcular percentiles)
const MAX_LATENCIES: usize = 10_000;

/// Collector de métricas thread-safe
#[derive(Clone)]
pub struct MetricsCollector {
    inner: Arc<Mutex<MetricsData>>,
    start_time: Instant,
}

/// Datos internos de métricas
#[derive(Default)]
struct MetricsData {
    total_requests: u64,

    /// Requests por código de estado
    status_codes: BTreeMap<u16, u64>,

    /// Requests por método (incluye métodos no soportados)
    methods: BTreeMap<String, u64>,

    /// Últimas latencias registradas (en microsegundos)
    latencies: VecDeque<u64>,

    /// Workers atendiendo una conexión ahora mismo
    busy_workers: u64,
}

/// Snapshot de métricas, serializable a JSON
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub uptime_secs: u64,
    pub total_requests: u64,
    pub busy_workers: u64,
    pub status_codes: BTreeMap<u16, u64>,
    pub methods: BTreeMap<String, u64>,
    pub latency_p50_us: u64,
    pub latency_p99_us: u64,
    pub latency_avg_us: u64,
    pub latency_max_us: u64,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MetricsData::default())),
            start_time: Instant::now(),
        }
    }

    fn data(&self) -> MutexGuard<'_, MetricsData> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registra un request completado
    pub fn record_request(&self, method: &str, status_code: u16, latency: Duration) {
        let mut data = self.data();

        data.total_requests += 1;
        *data.status_codes.entry(status_code).or_insert(0) += 1;
        *data.methods.entry(method.to_string()).or_insert(0) += 1;

        // Si tenemos demasiadas latencias, eliminar las más antiguas
        if data.latencies.len() >= MAX_LATENCIES {
            data.latencies.pop_front();
        }
        data.latencies.push_back(latency.as_micros() as u64);
    }

    pub fn worker_busy(&self) {
        self.data().busy_workers += 1;
    }

    pub fn worker_idle(&self) {
        let mut data = self.data();
        data.busy_workers = data.busy_workers.saturating_sub(1);
    }

    pub fn busy_workers(&self) -> u64 {
        self.data().busy_workers
    }

    /// Obtiene un snapshot de las métricas
    pub fn snapshot(&self) -> MetricsSnapshot {
        let data = self.data();
        let (p50, p99, avg, max) = calculate_latency_summary(&data.latencies);

        MetricsSnapshot {
            uptime_secs: self.start_time.elapsed().as_secs(),
            total_requests: data.total_requests,
            busy_workers: data.busy_workers,
            status_codes: data.status_codes.clone(),
            methods: data.methods.clone(),
            latency_p50_us: p50,
            latency_p99_us: p99,
            latency_avg_us: avg,
            latency_max_us: max,
        }
    }

    /// Snapshot en formato JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.snapshot()).unwrap_or_else(|e| {
            log::warn!("⚠️  No se pudo serializar métricas: {}", e);
            String::from("{}")
        })
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// (p50, p99, promedio, máximo)
fn calculate_latency_summary(latencies: &VecDeque<u64>) -> (u64, u64, u64, u64) {
    if latencies.is_empty() {
        return (0, 0, 0, 0);
    }

    let mut sorted: Vec<u64> = latencies.iter().copied().collect();
    sorted.sort_unstable();

    let len = sorted.len();
    let p50 = sorted[len * 50 / 100];
    let p99 = sorted[len * 99 / 100];
    let avg = sorted.iter().sum::<u64>() / len as u64;
    let max = sorted[len - 1];

    (p50, p99, avg, max)
}
