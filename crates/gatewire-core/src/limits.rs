//! Resource limits for circuits and evaluation.

/// Resource limits for a circuit.
///
/// Evaluation recurses once per link it follows, so `max_depth` bounds
/// the native stack used by a single evaluation.
///
/// The two limits are independent. With the defaults a circuit can hold
/// a chain longer than evaluation will follow: 513 `Not` gates stacked on
/// one source fit in `max_gates` but fail with
/// [`EvalError::DepthExceeded`](crate::EvalError::DepthExceeded). Raise
/// `max_depth` for long chains, keeping the evaluating thread's stack in
/// mind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Maximum number of gates the circuit may hold at once.
    pub max_gates: usize,
    /// Maximum length of an input chain followed during evaluation.
    pub max_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_gates: 4096,
            max_depth: 512,
        }
    }
}

impl Limits {
    /// Create limits with custom values.
    pub fn new(max_gates: usize, max_depth: usize) -> Self {
        Self {
            max_gates,
            max_depth,
        }
    }

    /// Permissive limits for benchmarks and generated circuits.
    pub fn permissive() -> Self {
        Self {
            max_gates: 1 << 20,
            max_depth: 8192,
        }
    }

    /// Strict limits for small hand-built circuits.
    pub fn strict() -> Self {
        Self {
            max_gates: 256,
            max_depth: 64,
        }
    }
}
