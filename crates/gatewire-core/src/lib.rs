//! gatewire: typed gate circuits with on-demand evaluation.
//!
//! # Overview
//!
//! A [`Circuit`] holds gates of a closed set of kinds ([`GateKind`]),
//! each with a fixed number of typed input and output pins. Inputs link
//! to output slots of other gates. Evaluating a gate pulls values
//! through its links and caches every intermediate result:
//!
//! - **Typed pins**: links are only made between compatible [`PinType`]s
//! - **Always acyclic**: link edits that would close a cycle are refused
//! - **Memoized**: a shared dependency is computed once per cache lifetime
//! - **Explicit reset**: caches stay valid until [`Circuit::clear_caches`]
//!
//! # Example
//!
//! ```
//! use gatewire_core::{evaluate, Circuit, GateKind, Position, Value};
//!
//! let mut circuit = Circuit::new();
//! let a = circuit.add_gate(GateKind::ConstInt { value: 3 }, Position::default()).unwrap();
//! let b = circuit.add_gate(GateKind::ConstInt { value: 4 }, Position::default()).unwrap();
//! let sum = circuit.add_gate(GateKind::Add, Position::default()).unwrap();
//!
//! circuit.connect(sum, 0, a, 0).unwrap();
//! circuit.connect(sum, 1, b, 0).unwrap();
//!
//! assert_eq!(evaluate(&mut circuit, sum).unwrap(), vec![Value::Int(7)]);
//!
//! // Cached results survive literal edits until the caches are reset.
//! circuit.set_const_value(a, 10).unwrap();
//! assert_eq!(evaluate(&mut circuit, sum).unwrap(), vec![Value::Int(7)]);
//! circuit.clear_caches(sum).unwrap();
//! assert_eq!(evaluate(&mut circuit, sum).unwrap(), vec![Value::Int(14)]);
//! ```
//!
//! # Editor loop
//!
//! [`Circuit::run`] bundles the evaluate, read and reset steps an
//! interactive editor performs on every "evaluate" click:
//!
//! ```
//! use gatewire_core::{Circuit, EvalError, GateKind, Position};
//!
//! let mut circuit = Circuit::new();
//! let t = circuit.add_gate(GateKind::ConstTrue, Position::default()).unwrap();
//! let and = circuit.add_gate(GateKind::And, Position::default()).unwrap();
//! circuit.connect(and, 0, t, 0).unwrap();
//!
//! let outcome = circuit.run(and);
//! assert!(!outcome.is_ok());
//! assert_eq!(outcome.result, Err(EvalError::Unconnected { gate: and, input: 1 }));
//! ```

pub mod circuit;
pub mod error;
pub mod eval;
pub mod gate;
pub mod limits;
pub mod pin;

pub use circuit::Circuit;
pub use error::{CircuitError, EvalError, LinkError};
pub use eval::{evaluate, EvalStats, Evaluator, Outcome};
pub use gate::{Gate, GateId, GateKind, IdGen, InputPin, Link, OutputPin, Position};
pub use limits::Limits;
pub use pin::{types_compatible, PinType, Value};
