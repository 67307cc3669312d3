use std::collections::HashMap;
use std::fmt::Write;
use std::sync::Arc;
use lazy_static::lazy_static;
use parking_lot::Mutex;

/// Metrics registry (simple, Prometheus-style)
#[derive(Clone, Default)]
pub struct MetricsRegistry {
    counters: Arc<Mutex<HashMap<String, u64>>>,
    gauges: Arc<Mutex<HashMap<String, f64>>>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_counter(&self, name: &str) {
        let mut counters = self.counters.lock();
        *counters.entry(name.to_string()).or_insert(0) += 1;
    }

    pub fn set_gauge(&self, name: &str, val: f64) {
        self.gauges.lock().insert(name.to_string(), val);
    }

    pub fn snapshot(&self) -> (HashMap<String, u64>, HashMap<String, f64>) {
        (self.counters.lock().clone(), self.gauges.lock().clone())
    }

    /// Render in Prometheus text exposition format, names sorted.
    pub fn render(&self) -> String {
        let (counters, gauges) = self.snapshot();
        let mut out = String::new();

        let mut names: Vec<_> = counters.keys().collect();
        names.sort();
        for name in names {
            let _ = writeln!(out, "# TYPE voteledger_{} counter", name);
            let _ = writeln!(out, "voteledger_{} {}", name, counters[name]);
        }

        let mut names: Vec<_> = gauges.keys().collect();
        names.sort();
        for name in names {
            let _ = writeln!(out, "# TYPE voteledger_{} gauge", name);
            let _ = writeln!(out, "voteledger_{} {}", name, gauges[name]);
        }
        out
    }
}

lazy_static! {
    pub static ref METRICS: MetricsRegistry = MetricsRegistry::new();
}
