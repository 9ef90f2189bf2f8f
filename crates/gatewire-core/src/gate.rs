//! Gates: identity, variant, typed pins and cached outputs.

use std::fmt;

use crate::error::LinkError;
use crate::pin::{PinType, Value};

/// Stable identifier of a gate within its circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GateId(pub u64);

impl fmt::Display for GateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic gate ID source. IDs are never reused.
#[derive(Debug, Clone, Default)]
pub struct IdGen {
    next: u64,
}

impl IdGen {
    /// Create a generator whose first ID is 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out the next ID.
    pub fn next_id(&mut self) -> GateId {
        let id = GateId(self.next);
        self.next += 1;
        id
    }
}

/// The closed set of gate variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GateKind {
    /// Emits constant `true`.
    ConstTrue,
    /// Logical negation.
    Not,
    /// Logical AND of two inputs.
    And,
    /// Emits its integer literal, editable at any time.
    ConstInt { value: i64 },
    /// Integer sum.
    Add,
    /// Integer product.
    Mul,
    /// `a <= b` on integers.
    CmpLe,
}

impl GateKind {
    /// One instance of every variant, in menu order.
    pub fn palette() -> [GateKind; 7] {
        [
            GateKind::ConstTrue,
            GateKind::Not,
            GateKind::And,
            GateKind::ConstInt { value: 0 },
            GateKind::Add,
            GateKind::Mul,
            GateKind::CmpLe,
        ]
    }

    /// Declared input pin types, in slot order.
    pub fn input_types(&self) -> &'static [PinType] {
        match self {
            GateKind::ConstTrue | GateKind::ConstInt { .. } => &[],
            GateKind::Not => &[PinType::Bool],
            GateKind::And => &[PinType::Bool, PinType::Bool],
            GateKind::Add | GateKind::Mul | GateKind::CmpLe => &[PinType::Int, PinType::Int],
        }
    }

    /// Declared output pin types, in slot order.
    pub fn output_types(&self) -> &'static [PinType] {
        match self {
            GateKind::ConstTrue | GateKind::Not | GateKind::And | GateKind::CmpLe => {
                &[PinType::Bool]
            }
            GateKind::ConstInt { .. } | GateKind::Add | GateKind::Mul => &[PinType::Int],
        }
    }

    /// Human-readable name shown on the gate box.
    pub fn name(&self) -> &'static str {
        match self {
            GateKind::ConstTrue => "ConstantTrue",
            GateKind::Not => "Not",
            GateKind::And => "And",
            GateKind::ConstInt { .. } => "Constant",
            GateKind::Add => "Add",
            GateKind::Mul => "Multiply",
            GateKind::CmpLe => "Compare (<=)",
        }
    }

    /// Whether this variant has no inputs.
    pub fn is_source(&self) -> bool {
        self.input_types().is_empty()
    }
}

/// Where an input pin reads from: an output slot of another gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Link {
    /// Producing gate.
    pub gate: GateId,
    /// Output slot index on the producing gate.
    pub slot: usize,
}

impl Link {
    pub fn new(gate: GateId, slot: usize) -> Self {
        Self { gate, slot }
    }
}

/// An input slot: fixed type plus an optional link target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputPin {
    pub ty: PinType,
    pub link: Option<Link>,
}

/// An output slot: fixed type plus the evaluation cache.
///
/// `cached` is `Some` exactly while the slot holds a valid result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPin {
    pub ty: PinType,
    cached: Option<Value>,
}

impl OutputPin {
    fn new(ty: PinType) -> Self {
        Self { ty, cached: None }
    }

    /// The cached value, if evaluated since the last reset.
    pub fn value(&self) -> Option<Value> {
        self.cached
    }

    /// Whether the cache is valid.
    pub fn is_evaluated(&self) -> bool {
        self.cached.is_some()
    }
}

/// Canvas position, carried for the editor and otherwise ignored.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A node of the circuit.
///
/// Pin counts and types come from the variant and are fixed for the
/// gate's lifetime. Links belong to the editor; output caches belong
/// to the evaluator.
///
/// Caches are only reset through [`Circuit::clear_caches`](crate::Circuit::clear_caches):
///
/// ```compile_fail
/// use gatewire_core::{Gate, GateId, GateKind, Position};
///
/// let mut gate = Gate::new(GateId(0), GateKind::ConstTrue, Position::default());
/// gate.invalidate();
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Gate {
    id: GateId,
    kind: GateKind,
    position: Position,
    inputs: Vec<InputPin>,
    outputs: Vec<OutputPin>,
}

impl Gate {
    /// Create an unlinked, unevaluated gate.
    pub fn new(id: GateId, kind: GateKind, position: Position) -> Self {
        let inputs = kind
            .input_types()
            .iter()
            .map(|&ty| InputPin { ty, link: None })
            .collect();
        let outputs = kind.output_types().iter().copied().map(OutputPin::new).collect();
        Self {
            id,
            kind,
            position,
            inputs,
            outputs,
        }
    }

    pub fn id(&self) -> GateId {
        self.id
    }

    pub fn kind(&self) -> GateKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    pub fn inputs(&self) -> &[InputPin] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[OutputPin] {
        &self.outputs
    }

    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }

    /// Link target of an input, `None` when unconnected or out of range.
    pub fn link(&self, input: usize) -> Option<Link> {
        self.inputs.get(input).and_then(|pin| pin.link)
    }

    /// Output slot, `None` when out of range.
    pub fn output(&self, slot: usize) -> Option<&OutputPin> {
        self.outputs.get(slot)
    }

    /// True iff every input has a link target.
    ///
    /// Looks only at this gate; upstream gates may still be incomplete.
    pub fn can_eval(&self) -> bool {
        self.inputs.iter().all(|pin| pin.link.is_some())
    }

    /// True iff every output holds a valid cached value.
    pub fn is_evaluated(&self) -> bool {
        self.outputs.iter().all(OutputPin::is_evaluated)
    }

    /// Replace the link target of an input, returning the old one.
    ///
    /// Only the index is checked here; type and cycle checks happen in
    /// [`Circuit`](crate::Circuit), which owns every gate.
    pub(crate) fn update_input(
        &mut self,
        input: usize,
        link: Option<Link>,
    ) -> Result<Option<Link>, LinkError> {
        let count = self.inputs.len();
        let pin = self.inputs.get_mut(input).ok_or(LinkError::InputOutOfRange {
            gate: self.id,
            index: input,
            count,
        })?;
        Ok(std::mem::replace(&mut pin.link, link))
    }

    /// Drop every link that reads from `producer`. Returns how many.
    pub(crate) fn unlink_from(&mut self, producer: GateId) -> usize {
        let mut dropped = 0;
        for pin in &mut self.inputs {
            if pin.link.is_some_and(|link| link.gate == producer) {
                pin.link = None;
                dropped += 1;
            }
        }
        dropped
    }

    /// Variant payload, for literal edits.
    pub(crate) fn kind_mut(&mut self) -> &mut GateKind {
        &mut self.kind
    }

    /// Write a computed output.
    pub(crate) fn store(&mut self, slot: usize, value: Value) {
        if let Some(pin) = self.outputs.get_mut(slot) {
            pin.cached = Some(value);
        }
    }

    /// Mark this gate's own outputs stale.
    pub(crate) fn invalidate(&mut self) {
        for pin in &mut self.outputs {
            pin.cached = None;
        }
    }
}
