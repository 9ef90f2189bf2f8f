//! The gate collection and all edits to its wiring.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt::Write;

use tracing::{debug, warn};

use crate::error::{CircuitError, LinkError};
use crate::gate::{Gate, GateId, GateKind, IdGen, Link, OutputPin, Position};
use crate::limits::Limits;
use crate::pin::types_compatible;

/// A set of gates and the links between them.
///
/// Gates are addressed by [`GateId`]; links store IDs, never references,
/// so removing a gate cannot leave a dangling pointer behind. Every link
/// edit goes through the circuit, which refuses edits that would form a
/// cycle. The graph is therefore always a DAG.
#[derive(Debug, Clone, Default)]
pub struct Circuit {
    gates: BTreeMap<GateId, Gate>,
    ids: IdGen,
    limits: Limits,
}

impl Circuit {
    /// Create an empty circuit with default limits.
    ///
    /// The defaults follow at most 512 links below the root during one
    /// evaluation, fewer than the gate limit allows. Use
    /// [`Circuit::with_limits`] for deeper chains.
    pub fn new() -> Self {
        Self::with_limits(Limits::default())
    }

    /// Create an empty circuit with custom limits.
    pub fn with_limits(limits: Limits) -> Self {
        Self {
            gates: BTreeMap::new(),
            ids: IdGen::new(),
            limits,
        }
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    /// Number of gates.
    pub fn len(&self) -> usize {
        self.gates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    /// All gates, in creation order.
    pub fn gates(&self) -> impl Iterator<Item = &Gate> {
        self.gates.values()
    }

    /// Look up a gate by ID.
    pub fn gate(&self, id: GateId) -> Option<&Gate> {
        self.gates.get(&id)
    }

    pub fn contains(&self, id: GateId) -> bool {
        self.gates.contains_key(&id)
    }

    pub(crate) fn gate_mut(&mut self, id: GateId) -> Result<&mut Gate, CircuitError> {
        self.gates.get_mut(&id).ok_or(CircuitError::UnknownGate(id))
    }

    fn get(&self, id: GateId) -> Result<&Gate, CircuitError> {
        self.gates.get(&id).ok_or(CircuitError::UnknownGate(id))
    }

    /// Add an unlinked gate and return its fresh ID.
    pub fn add_gate(&mut self, kind: GateKind, position: Position) -> Result<GateId, CircuitError> {
        if self.gates.len() >= self.limits.max_gates {
            return Err(CircuitError::TooManyGates(self.limits.max_gates));
        }
        let id = self.ids.next_id();
        self.gates.insert(id, Gate::new(id, kind, position));
        debug!(gate = %id, kind = kind.name(), "added gate");
        Ok(id)
    }

    /// Remove a gate, detaching every input that read from it.
    pub fn remove_gate(&mut self, id: GateId) -> Result<Gate, CircuitError> {
        let gate = self.gates.remove(&id).ok_or(CircuitError::UnknownGate(id))?;
        let detached: usize = self.gates.values_mut().map(|g| g.unlink_from(id)).sum();
        debug!(gate = %id, detached, "removed gate");
        Ok(gate)
    }

    /// Replace the link target of `consumer`'s input `input`.
    ///
    /// Checks that both gates exist, that the indices are in range and
    /// that the link would not close a cycle. Pin types are not checked;
    /// use [`Circuit::connect`] for a type-checked edit.
    pub fn update_input(
        &mut self,
        consumer: GateId,
        input: usize,
        link: Option<Link>,
    ) -> Result<Option<Link>, CircuitError> {
        let count = self.get(consumer)?.input_count();
        if input >= count {
            return Err(LinkError::InputOutOfRange {
                gate: consumer,
                index: input,
                count,
            }
            .into());
        }

        if let Some(link) = link {
            let producer = self.get(link.gate)?;
            if link.slot >= producer.output_count() {
                return Err(LinkError::OutputOutOfRange {
                    gate: link.gate,
                    slot: link.slot,
                    count: producer.output_count(),
                }
                .into());
            }
            if self.depends_on(link.gate, consumer) {
                return Err(LinkError::WouldCycle {
                    consumer,
                    producer: link.gate,
                }
                .into());
            }
        }

        let previous = self.gate_mut(consumer)?.update_input(input, link)?;
        debug!(gate = %consumer, input, ?link, "updated input");
        Ok(previous)
    }

    /// Link output `slot` of `producer` into input `input` of `consumer`.
    ///
    /// Rejects the edit unless the two pin types are compatible.
    pub fn connect(
        &mut self,
        consumer: GateId,
        input: usize,
        producer: GateId,
        slot: usize,
    ) -> Result<(), CircuitError> {
        let result = self.check_types(consumer, input, producer, slot).and_then(|()| {
            self.update_input(consumer, input, Some(Link::new(producer, slot)))
                .map(|_| ())
        });
        if let Err(err) = &result {
            warn!(%consumer, input, %producer, slot, %err, "rejected link");
        }
        result
    }

    fn check_types(
        &self,
        consumer: GateId,
        input: usize,
        producer: GateId,
        slot: usize,
    ) -> Result<(), CircuitError> {
        let consumer_gate = self.get(consumer)?;
        let input_pin = consumer_gate
            .inputs()
            .get(input)
            .ok_or(LinkError::InputOutOfRange {
                gate: consumer,
                index: input,
                count: consumer_gate.input_count(),
            })?;
        let producer_gate = self.get(producer)?;
        let output_pin = producer_gate
            .output(slot)
            .ok_or(LinkError::OutputOutOfRange {
                gate: producer,
                slot,
                count: producer_gate.output_count(),
            })?;
        if !types_compatible(input_pin.ty, output_pin.ty) {
            return Err(LinkError::TypeMismatch {
                input: input_pin.ty,
                output: output_pin.ty,
            }
            .into());
        }
        Ok(())
    }

    /// Clear the link target of an input, returning the old one.
    pub fn disconnect(&mut self, consumer: GateId, input: usize) -> Result<Option<Link>, CircuitError> {
        self.update_input(consumer, input, None)
    }

    /// Change the literal of an integer constant.
    ///
    /// Cached results downstream are left alone until the next reset.
    pub fn set_const_value(&mut self, id: GateId, value: i64) -> Result<(), CircuitError> {
        match self.gate_mut(id)?.kind_mut() {
            GateKind::ConstInt { value: literal } => {
                *literal = value;
                debug!(gate = %id, value, "set constant");
                Ok(())
            }
            _ => Err(CircuitError::NotAConstant(id)),
        }
    }

    pub fn set_position(&mut self, id: GateId, position: Position) -> Result<(), CircuitError> {
        self.gate_mut(id)?.set_position(position);
        Ok(())
    }

    /// True iff every input of the gate is linked.
    pub fn can_eval(&self, id: GateId) -> Result<bool, CircuitError> {
        Ok(self.get(id)?.can_eval())
    }

    /// The output pin an input currently reads from.
    ///
    /// `None` when the input is unconnected or either gate is unknown.
    pub fn output_for_input(&self, id: GateId, input: usize) -> Option<&OutputPin> {
        let link = self.gates.get(&id)?.link(input)?;
        self.gates.get(&link.gate)?.output(link.slot)
    }

    /// Every `(consumer, input)` pair reading from `producer`.
    pub fn consumers(&self, producer: GateId) -> Vec<(GateId, usize)> {
        self.gates
            .values()
            .flat_map(|gate| {
                gate.inputs()
                    .iter()
                    .enumerate()
                    .filter(|(_, pin)| pin.link.is_some_and(|link| link.gate == producer))
                    .map(|(input, _)| (gate.id(), input))
            })
            .collect()
    }

    /// Whether `target` is `from` or reachable from it through input links.
    fn depends_on(&self, from: GateId, target: GateId) -> bool {
        let mut seen = HashSet::new();
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            if id == target {
                return true;
            }
            if !seen.insert(id) {
                continue;
            }
            if let Some(gate) = self.gates.get(&id) {
                stack.extend(gate.inputs().iter().filter_map(|pin| pin.link).map(|l| l.gate));
            }
        }
        false
    }

    /// Invalidate the outputs of `root` and of everything it depends on.
    ///
    /// Returns the number of gates reset. Gates outside the dependency
    /// set keep their caches.
    pub fn clear_caches(&mut self, root: GateId) -> Result<usize, CircuitError> {
        self.get(root)?;
        let mut seen = HashSet::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            if let Some(gate) = self.gates.get_mut(&id) {
                gate.invalidate();
                stack.extend(gate.inputs().iter().filter_map(|pin| pin.link).map(|l| l.gate));
            }
        }
        debug!(gate = %root, reset = seen.len(), "cleared caches");
        Ok(seen.len())
    }

    /// Render `root` and its dependencies, one gate per line.
    ///
    /// Each line holds the gate ID and its output values, `?` for an
    /// output that is not evaluated. Inputs follow depth-first, indented
    /// one level deeper. A gate already printed shows up again as just
    /// its ID and `^`, so shared dependencies cost one line per link.
    pub fn dump(&self, root: GateId) -> Result<String, CircuitError> {
        self.get(root)?;
        let mut out = String::new();
        let mut printed = HashSet::new();
        let mut stack = vec![(root, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            let Some(gate) = self.gates.get(&id) else {
                continue;
            };
            let _ = write!(out, "{:indent$}{}", "", id, indent = depth * 2);
            if !printed.insert(id) {
                out.push_str(" ^\n");
                continue;
            }
            for pin in gate.outputs() {
                match pin.value() {
                    Some(value) => {
                        let _ = write!(out, " {value}");
                    }
                    None => out.push_str(" ?"),
                }
            }
            out.push('\n');
            for link in gate.inputs().iter().rev().filter_map(|pin| pin.link) {
                stack.push((link.gate, depth + 1));
            }
        }
        Ok(out)
    }

    /// Longest chain of links below `root`. A source gate has depth 0.
    pub fn depth(&self, root: GateId) -> Result<usize, CircuitError> {
        self.get(root)?;
        let mut depths = HashMap::new();
        Ok(self.depth_of(root, &mut depths))
    }

    fn depth_of(&self, id: GateId, depths: &mut HashMap<GateId, usize>) -> usize {
        if let Some(&d) = depths.get(&id) {
            return d;
        }
        let Some(gate) = self.gates.get(&id) else {
            return 0;
        };
        let links: Vec<Link> = gate.inputs().iter().filter_map(|pin| pin.link).collect();
        let d = links
            .iter()
            .map(|link| 1 + self.depth_of(link.gate, depths))
            .max()
            .unwrap_or(0);
        depths.insert(id, d);
        d
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pin::{PinType, Value};

    fn add(circuit: &mut Circuit, kind: GateKind) -> GateId {
        circuit.add_gate(kind, Position::default()).unwrap()
    }

    #[test]
    fn test_ids_are_never_reused() {
        let mut circuit = Circuit::new();
        let a = add(&mut circuit, GateKind::ConstTrue);
        let b = add(&mut circuit, GateKind::Not);
        circuit.remove_gate(a).unwrap();
        let c = add(&mut circuit, GateKind::Not);
        assert!(a < b && b < c);
        assert_eq!(circuit.len(), 2);
    }

    #[test]
    fn test_gate_limit() {
        let mut circuit = Circuit::with_limits(Limits::new(2, 8));
        add(&mut circuit, GateKind::ConstTrue);
        add(&mut circuit, GateKind::ConstTrue);
        let result = circuit.add_gate(GateKind::ConstTrue, Position::default());
        assert_eq!(result, Err(CircuitError::TooManyGates(2)));
    }

    #[test]
    fn test_connect_type_mismatch() {
        let mut circuit = Circuit::new();
        let t = add(&mut circuit, GateKind::ConstTrue);
        let sum = add(&mut circuit, GateKind::Add);
        let result = circuit.connect(sum, 0, t, 0);
        assert_eq!(
            result,
            Err(CircuitError::Link(LinkError::TypeMismatch {
                input: PinType::Int,
                output: PinType::Bool,
            }))
        );
        assert_eq!(circuit.gate(sum).unwrap().link(0), None);
    }

    #[test]
    fn test_connect_out_of_range() {
        let mut circuit = Circuit::new();
        let t = add(&mut circuit, GateKind::ConstTrue);
        let not = add(&mut circuit, GateKind::Not);
        assert!(matches!(
            circuit.connect(not, 1, t, 0),
            Err(CircuitError::Link(LinkError::InputOutOfRange { index: 1, .. }))
        ));
        assert!(matches!(
            circuit.connect(not, 0, t, 1),
            Err(CircuitError::Link(LinkError::OutputOutOfRange { slot: 1, .. }))
        ));
        assert_eq!(
            circuit.connect(not, 0, GateId(99), 0),
            Err(CircuitError::UnknownGate(GateId(99)))
        );
    }

    #[test]
    fn test_update_input_skips_type_check() {
        let mut circuit = Circuit::new();
        let t = add(&mut circuit, GateKind::ConstTrue);
        let sum = add(&mut circuit, GateKind::Add);
        circuit.update_input(sum, 0, Some(Link::new(t, 0))).unwrap();
        assert_eq!(circuit.gate(sum).unwrap().link(0), Some(Link::new(t, 0)));
    }

    #[test]
    fn test_rejects_self_link() {
        let mut circuit = Circuit::new();
        let not = add(&mut circuit, GateKind::Not);
        assert_eq!(
            circuit.connect(not, 0, not, 0),
            Err(CircuitError::Link(LinkError::WouldCycle {
                consumer: not,
                producer: not,
            }))
        );
    }

    #[test]
    fn test_rejects_longer_cycle() {
        let mut circuit = Circuit::new();
        let a = add(&mut circuit, GateKind::Not);
        let b = add(&mut circuit, GateKind::Not);
        let c = add(&mut circuit, GateKind::Not);
        circuit.connect(b, 0, a, 0).unwrap();
        circuit.connect(c, 0, b, 0).unwrap();

        let result = circuit.connect(a, 0, c, 0);
        assert!(matches!(
            result,
            Err(CircuitError::Link(LinkError::WouldCycle { .. }))
        ));
        assert_eq!(circuit.gate(a).unwrap().link(0), None);
    }

    #[test]
    fn test_fan_out_and_relink() {
        let mut circuit = Circuit::new();
        let t = add(&mut circuit, GateKind::ConstTrue);
        let and = add(&mut circuit, GateKind::And);
        circuit.connect(and, 0, t, 0).unwrap();
        circuit.connect(and, 1, t, 0).unwrap();
        assert_eq!(circuit.consumers(t), vec![(and, 0), (and, 1)]);

        let previous = circuit.disconnect(and, 1).unwrap();
        assert_eq!(previous, Some(Link::new(t, 0)));
        assert_eq!(circuit.consumers(t), vec![(and, 0)]);
    }

    #[test]
    fn test_remove_detaches_links() {
        let mut circuit = Circuit::new();
        let t = add(&mut circuit, GateKind::ConstTrue);
        let not = add(&mut circuit, GateKind::Not);
        circuit.connect(not, 0, t, 0).unwrap();
        assert!(circuit.can_eval(not).unwrap());

        let removed = circuit.remove_gate(t).unwrap();
        assert_eq!(removed.id(), t);
        assert!(!circuit.can_eval(not).unwrap());
        assert!(circuit.consumers(t).is_empty());
        assert_eq!(circuit.remove_gate(t), Err(CircuitError::UnknownGate(t)));
    }

    #[test]
    fn test_set_const_value() {
        let mut circuit = Circuit::new();
        let c = add(&mut circuit, GateKind::ConstInt { value: 1 });
        let t = add(&mut circuit, GateKind::ConstTrue);
        circuit.set_const_value(c, 42).unwrap();
        assert_eq!(
            circuit.gate(c).unwrap().kind(),
            GateKind::ConstInt { value: 42 }
        );
        assert_eq!(
            circuit.set_const_value(t, 1),
            Err(CircuitError::NotAConstant(t))
        );
    }

    #[test]
    fn test_clear_caches_only_dependency_set() {
        let mut circuit = Circuit::new();
        let a = add(&mut circuit, GateKind::ConstTrue);
        let not = add(&mut circuit, GateKind::Not);
        let other = add(&mut circuit, GateKind::ConstTrue);
        circuit.connect(not, 0, a, 0).unwrap();

        for id in [a, not, other] {
            circuit.gate_mut(id).unwrap().store(0, Value::Bool(true));
        }

        let reset = circuit.clear_caches(not).unwrap();
        assert_eq!(reset, 2);
        assert!(!circuit.gate(a).unwrap().is_evaluated());
        assert!(!circuit.gate(not).unwrap().is_evaluated());
        assert!(circuit.gate(other).unwrap().is_evaluated());
    }

    #[test]
    fn test_dump_marks_unevaluated() {
        let mut circuit = Circuit::new();
        let x = add(&mut circuit, GateKind::ConstInt { value: 3 });
        let y = add(&mut circuit, GateKind::ConstInt { value: 4 });
        let sum = add(&mut circuit, GateKind::Add);
        circuit.connect(sum, 0, x, 0).unwrap();
        circuit.connect(sum, 1, y, 0).unwrap();
        circuit.gate_mut(x).unwrap().store(0, Value::Int(3));

        let dump = circuit.dump(sum).unwrap();
        assert_eq!(dump, format!("{sum} ?\n  {x} 3\n  {y} ?\n"));
    }

    #[test]
    fn test_dump_prints_shared_gate_once() {
        let mut circuit = Circuit::new();
        let t = add(&mut circuit, GateKind::ConstTrue);
        let not = add(&mut circuit, GateKind::Not);
        let and = add(&mut circuit, GateKind::And);
        circuit.connect(not, 0, t, 0).unwrap();
        circuit.connect(and, 0, t, 0).unwrap();
        circuit.connect(and, 1, not, 0).unwrap();

        let dump = circuit.dump(and).unwrap();
        assert_eq!(dump, format!("{and} ?\n  {t} ?\n  {not} ?\n    {t} ^\n"));
    }

    #[test]
    fn test_depth() {
        let mut circuit = Circuit::new();
        let t = add(&mut circuit, GateKind::ConstTrue);
        let n1 = add(&mut circuit, GateKind::Not);
        let n2 = add(&mut circuit, GateKind::Not);
        let and = add(&mut circuit, GateKind::And);
        circuit.connect(n1, 0, t, 0).unwrap();
        circuit.connect(n2, 0, n1, 0).unwrap();
        circuit.connect(and, 0, t, 0).unwrap();
        circuit.connect(and, 1, n2, 0).unwrap();

        assert_eq!(circuit.depth(t).unwrap(), 0);
        assert_eq!(circuit.depth(n1).unwrap(), 1);
        assert_eq!(circuit.depth(and).unwrap(), 3);
    }
}
