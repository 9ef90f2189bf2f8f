//! On-demand, memoizing circuit evaluator.
//!
//! Evaluation starts at one gate and pulls values through its input
//! links, depth-first and left to right. Results are cached on the
//! output pins and stay valid until [`Circuit::clear_caches`] runs, so
//! a dependency shared by several consumers is computed once per cache
//! lifetime.

use std::collections::{HashMap, HashSet};

use tracing::{debug, instrument, trace, warn};

use crate::circuit::Circuit;
use crate::error::EvalError;
use crate::gate::{GateId, GateKind, Link, OutputPin};
use crate::pin::{PinType, Value};

/// Counters collected during a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvalStats {
    applications: HashMap<GateId, usize>,
    cache_hits: usize,
}

impl EvalStats {
    /// How many times the gate's evaluation rule ran.
    pub fn applications(&self, id: GateId) -> usize {
        self.applications.get(&id).copied().unwrap_or(0)
    }

    /// Rule applications across all gates.
    pub fn total_applications(&self) -> usize {
        self.applications.values().sum()
    }

    /// Gates whose output was already cached when their inputs checked out.
    pub fn cache_hits(&self) -> usize {
        self.cache_hits
    }
}

/// Walks a circuit and fills in output caches.
///
/// Every gate in the dependency set has its inputs checked on every
/// run, even when its output is already cached, so a link removed
/// after an earlier run is reported. Each gate is walked at most once
/// per run. Only output caches are written; links, literals and pin
/// shapes are left untouched. The first failure stops the walk. Values
/// computed before that point stay cached, nothing past it is written.
#[derive(Debug)]
pub struct Evaluator<'c> {
    circuit: &'c mut Circuit,
    max_depth: usize,
    /// Gates whose dependency set has been checked in the current run.
    walked: HashSet<GateId>,
    stats: EvalStats,
}

impl<'c> Evaluator<'c> {
    /// Create an evaluator bounded by the circuit's depth limit.
    pub fn new(circuit: &'c mut Circuit) -> Self {
        let max_depth = circuit.limits().max_depth;
        Self {
            circuit,
            max_depth,
            walked: HashSet::new(),
            stats: EvalStats::default(),
        }
    }

    pub fn stats(&self) -> &EvalStats {
        &self.stats
    }

    pub fn into_stats(self) -> EvalStats {
        self.stats
    }

    /// Evaluate `root` and return its output values.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `root` is not in the circuit
    /// - an input anywhere in the dependency set is unconnected
    /// - a linked value has the wrong type for its input
    /// - the input chain is deeper than the configured limit
    #[instrument(level = "debug", skip(self), err)]
    pub fn run(&mut self, root: GateId) -> Result<Vec<Value>, EvalError> {
        if !self.circuit.contains(root) {
            return Err(EvalError::UnknownGate(root));
        }
        self.walked.clear();
        self.visit(root, 0)?;

        let gate = self.circuit.gate(root).ok_or(EvalError::UnknownGate(root))?;
        let values = gate
            .outputs()
            .iter()
            .map(OutputPin::value)
            .collect::<Option<Vec<_>>>()
            .ok_or(EvalError::Unresolved {
                gate: root,
                input: 0,
            })?;
        debug!(gate = %root, ?values, "evaluated");
        Ok(values)
    }

    fn visit(&mut self, id: GateId, depth: usize) -> Result<(), EvalError> {
        if depth > self.max_depth {
            return Err(EvalError::DepthExceeded(self.max_depth));
        }
        // Walked to completion earlier in this run.
        if self.walked.contains(&id) {
            return Ok(());
        }
        let gate = self.circuit.gate(id).ok_or(EvalError::UnknownGate(id))?;
        let kind = gate.kind();

        let links = gate
            .inputs()
            .iter()
            .enumerate()
            .map(|(input, pin)| pin.link.ok_or(EvalError::Unconnected { gate: id, input }))
            .collect::<Result<Vec<Link>, _>>()?;

        let mut args = Vec::with_capacity(links.len());
        for (input, link) in links.into_iter().enumerate() {
            self.visit(link.gate, depth + 1)?;

            let value = self
                .circuit
                .output_for_input(id, input)
                .and_then(OutputPin::value)
                .ok_or(EvalError::Unresolved { gate: id, input })?;
            args.push(value);
        }

        // Sources re-emit on every run so literal edits show up once
        // their consumers are reset.
        let gate = self.circuit.gate_mut(id).map_err(|_| EvalError::UnknownGate(id))?;
        if !kind.is_source() && gate.is_evaluated() {
            self.stats.cache_hits += 1;
            trace!(gate = %id, "cache hit");
        } else {
            let value = apply(id, kind, &args)?;
            gate.store(0, value);
            *self.stats.applications.entry(id).or_default() += 1;
            trace!(gate = %id, kind = kind.name(), %value, "applied");
        }
        self.walked.insert(id);
        Ok(())
    }
}

/// Resolved input values of one gate.
struct Args<'a> {
    gate: GateId,
    values: &'a [Value],
}

impl Args<'_> {
    fn get(&self, input: usize) -> Result<Value, EvalError> {
        self.values.get(input).copied().ok_or(EvalError::Unresolved {
            gate: self.gate,
            input,
        })
    }

    fn int(&self, input: usize) -> Result<i64, EvalError> {
        let value = self.get(input)?;
        value.as_int().ok_or(self.mismatch(input, PinType::Int, value))
    }

    fn bool(&self, input: usize) -> Result<bool, EvalError> {
        let value = self.get(input)?;
        value.as_bool().ok_or(self.mismatch(input, PinType::Bool, value))
    }

    fn mismatch(&self, input: usize, expected: PinType, found: Value) -> EvalError {
        EvalError::TypeMismatch {
            gate: self.gate,
            input,
            expected,
            found: found.pin_type(),
        }
    }
}

/// The evaluation rule of each variant. Integer arithmetic wraps.
fn apply(gate: GateId, kind: GateKind, values: &[Value]) -> Result<Value, EvalError> {
    let args = Args { gate, values };
    let value = match kind {
        GateKind::ConstTrue => Value::Bool(true),
        GateKind::Not => Value::Bool(!args.bool(0)?),
        GateKind::And => Value::Bool(args.bool(0)? && args.bool(1)?),
        GateKind::ConstInt { value } => Value::Int(value),
        GateKind::Add => Value::Int(args.int(0)?.wrapping_add(args.int(1)?)),
        GateKind::Mul => Value::Int(args.int(0)?.wrapping_mul(args.int(1)?)),
        GateKind::CmpLe => Value::Bool(args.int(0)? <= args.int(1)?),
    };
    Ok(value)
}

/// Evaluate `root` without collecting statistics.
pub fn evaluate(circuit: &mut Circuit, root: GateId) -> Result<Vec<Value>, EvalError> {
    Evaluator::new(circuit).run(root)
}

/// Result of one evaluate, read, reset cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub root: GateId,
    /// Root outputs, or where evaluation stopped.
    pub result: Result<Vec<Value>, EvalError>,
    /// [`Circuit::dump`] of the root, taken before the reset.
    pub dump: String,
    pub stats: EvalStats,
}

impl Outcome {
    /// Whether every dependency was wired and evaluated.
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

impl Circuit {
    /// Evaluate `root`, record the result, then reset the caches it
    /// touched so the next run sees fresh literals.
    #[instrument(level = "debug", skip(self))]
    pub fn run(&mut self, root: GateId) -> Outcome {
        let mut evaluator = Evaluator::new(self);
        let result = evaluator.run(root);
        let stats = evaluator.into_stats();

        if let Err(err) = &result {
            warn!(gate = %root, %err, "evaluation incomplete");
        }
        let dump = self.dump(root).unwrap_or_default();
        // Unknown roots have nothing to reset.
        let _ = self.clear_caches(root);

        Outcome {
            root,
            result,
            dump,
            stats,
        }
    }
}
