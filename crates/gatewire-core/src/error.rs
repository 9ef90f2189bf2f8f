//! Error types for circuit editing and evaluation.
//!
//! Wiring mistakes and evaluation failures are kept apart: a bad link
//! edit is a caller bug, while an unconnected input is an ordinary
//! state of a circuit that is still being wired.

use thiserror::Error;

use crate::gate::GateId;
use crate::pin::PinType;

/// Errors from changing a link target.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LinkError {
    /// Input index is not below the gate's input count.
    #[error("gate {gate} has {count} inputs, no input {index}")]
    InputOutOfRange {
        gate: GateId,
        index: usize,
        count: usize,
    },

    /// Output slot is not below the producer's output count.
    #[error("gate {gate} has {count} outputs, no output {slot}")]
    OutputOutOfRange {
        gate: GateId,
        slot: usize,
        count: usize,
    },

    /// The two ends of the link carry different types.
    #[error("cannot link {output} output to {input} input")]
    TypeMismatch { input: PinType, output: PinType },

    /// The link would make a gate depend on itself.
    #[error("linking gate {producer} into gate {consumer} would form a cycle")]
    WouldCycle { consumer: GateId, producer: GateId },
}

/// Errors from operations on the gate collection.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CircuitError {
    /// No gate with this ID is in the circuit.
    #[error("unknown gate {0}")]
    UnknownGate(GateId),

    /// The gate carries no integer literal.
    #[error("gate {0} is not an integer constant")]
    NotAConstant(GateId),

    /// Maximum gate count reached.
    #[error("maximum gates exceeded ({0})")]
    TooManyGates(usize),

    /// A link edit was rejected.
    #[error(transparent)]
    Link(#[from] LinkError),
}

/// Reasons an evaluation did not complete.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EvalError {
    /// An input in the dependency set has no link target.
    #[error("input {input} of gate {gate} is not connected")]
    Unconnected { gate: GateId, input: usize },

    /// An input's producer finished without a value on the linked slot.
    #[error("input {input} of gate {gate} did not resolve")]
    Unresolved { gate: GateId, input: usize },

    /// The evaluation root is not in the circuit.
    #[error("unknown gate {0}")]
    UnknownGate(GateId),

    /// An input resolved to a value of the wrong type.
    #[error("input {input} of gate {gate} expected {expected}, got {found}")]
    TypeMismatch {
        gate: GateId,
        input: usize,
        expected: PinType,
        found: PinType,
    },

    /// Input chain is longer than the configured limit.
    #[error("maximum evaluation depth exceeded ({0})")]
    DepthExceeded(usize),
}

impl EvalError {
    /// The gate at which evaluation stopped.
    pub fn gate(&self) -> Option<GateId> {
        match self {
            EvalError::Unconnected { gate, .. }
            | EvalError::Unresolved { gate, .. }
            | EvalError::TypeMismatch { gate, .. } => Some(*gate),
            EvalError::UnknownGate(gate) => Some(*gate),
            EvalError::DepthExceeded(_) => None,
        }
    }
}
