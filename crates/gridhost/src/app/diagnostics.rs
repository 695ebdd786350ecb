use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

static DIAGNOSTICS_LOCK_POISON_WARNED: AtomicBool = AtomicBool::new(false);

fn warn_diagnostics_lock_poison_once(operation: &'static str) {
    if DIAGNOSTICS_LOCK_POISON_WARNED
        .compare_exchange(false, true, Ordering::Relaxed, Ordering::Relaxed)
        .is_ok()
    {
        warn!(operation, "diagnostics lock poisoned; recovered inner value");
    }
}

/// Timing record for one sampled frame, e.g. `{"time": "3ms"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrameDiagnostics {
    pub time: String,
}

impl FrameDiagnostics {
    pub fn from_elapsed(elapsed: Duration) -> Self {
        let millis = (elapsed.as_micros() + 500) / 1000;
        Self {
            time: format!("{millis}ms"),
        }
    }

    pub fn to_text(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Write-only destination for sampled frame timings.
pub trait DiagnosticsSink {
    fn publish(&mut self, record: &FrameDiagnostics);
}

/// Latest published record. `revision` counts publishes, so readers can tell
/// a fresh record from one they already showed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagnosticsSnapshot {
    pub revision: u64,
    pub record: Option<FrameDiagnostics>,
    pub text: String,
}

/// Shared surface holding the most recently published record.
#[derive(Clone, Debug, Default)]
pub struct DiagnosticsHandle {
    latest: Arc<RwLock<DiagnosticsSnapshot>>,
}

impl DiagnosticsHandle {
    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        match self.latest.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => {
                warn_diagnostics_lock_poison_once("read");
                poisoned.into_inner().clone()
            }
        }
    }

    fn store(&self, record: &FrameDiagnostics, text: String) {
        let replace = |latest: &mut DiagnosticsSnapshot| {
            latest.revision += 1;
            latest.record = Some(record.clone());
            latest.text = text;
        };
        match self.latest.write() {
            Ok(mut guard) => replace(&mut guard),
            Err(poisoned) => {
                warn_diagnostics_lock_poison_once("write");
                let mut guard = poisoned.into_inner();
                replace(&mut guard);
            }
        }
    }
}

impl DiagnosticsSink for DiagnosticsHandle {
    fn publish(&mut self, record: &FrameDiagnostics) {
        match record.to_text() {
            Ok(text) => {
                debug!(time = record.time.as_str(), "frame_diagnostics");
                self.store(record, text);
            }
            Err(error) => warn!(error = %error, "frame_diagnostics_encode_failed"),
        }
    }
}
