use std::sync::Mutex;

/// Values below this count as negative when `warn_negative` is set.
pub(crate) const NEGATIVE_TOLERANCE: f32 = -1e-5;

/// Receiver for invalid-sample warnings.
///
/// Implementations must not panic; a failing sink never affects accumulation.
pub trait DiagnosticSink: std::fmt::Debug + Send + Sync {
    /// Record one formatted warning.
    fn warn(&self, message: &str);
}

/// Default sink: forwards to `tracing::warn!`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn warn(&self, message: &str) {
        tracing::warn!(target: "splatfilm::block", "{message}");
    }
}

/// Sink that keeps every message in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    messages: Mutex<Vec<String>>,
}

impl CollectingSink {
    /// Empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the messages received so far.
    pub fn messages(&self) -> Vec<String> {
        match self.messages.lock() {
            Ok(m) => m.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl DiagnosticSink for CollectingSink {
    fn warn(&self, message: &str) {
        let mut guard = match self.messages.lock() {
            Ok(m) => m,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.push(message.to_string());
    }
}

pub(crate) fn is_invalid(values: &[f32], warn_negative: bool, warn_invalid: bool) -> bool {
    values.iter().any(|&v| {
        (warn_negative && v < NEGATIVE_TOLERANCE) || (warn_invalid && !v.is_finite())
    })
}

pub(crate) fn invalid_sample_message(values: &[f32]) -> String {
    let listed = values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    format!("invalid sample value: [{listed}]")
}

#[cfg(test)]
#[path = "../../tests/unit/block/diag.rs"]
mod tests;
