//! The simulation substrate: wires, the clock and the unit abstraction.
//!
//! A circuit is a set of units connected by [`Signal`]s. Every tick the clock
//! advances; on an edge the stateful units latch, then every unit recomputes
//! its outputs from its inputs in dependency order. See [`Circuit::tick`].
mod circuit;
mod clock;
mod propagate;
mod signal;

pub use circuit::{Circuit, TickReport};
pub use clock::{Clock, Edge};
pub use propagate::{topo, Schedule};
pub use signal::Signal;

use crate::bits::Bits;
use crate::error::{SimError, Warning};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitKind {
    Alu,
    AluControl,
    MainControl,
    Comparator,
    Extender,
    Forwarding,
    Hazard,
    Mux,
    Operation,
    Concatenator,
    Splitter,
    Register,
    RegisterFile,
    InstructionMemory,
    DataMemory,
}

impl UnitKind {
    /// Units holding state across ticks. Only these take part in the edge
    /// phase of a tick.
    pub fn is_stateful(self) -> bool {
        matches!(
            self,
            UnitKind::Register
                | UnitKind::RegisterFile
                | UnitKind::InstructionMemory
                | UnitKind::DataMemory
        )
    }
}

/// Per-tick scratch passed to units. Collects bounds warnings.
#[derive(Debug, Default)]
pub struct Context {
    tick: u64,
    edge: Option<Edge>,
    warnings: Vec<Warning>,
}

impl Context {
    pub fn new(tick: u64, edge: Option<Edge>) -> Self {
        Self {
            tick,
            edge,
            warnings: Vec::new(),
        }
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// The edge this tick produced, if any.
    pub fn edge(&self) -> Option<Edge> {
        self.edge
    }

    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!(tick = self.tick, "{warning}");
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub(crate) fn take_warnings(&mut self) -> Vec<Warning> {
        std::mem::take(&mut self.warnings)
    }
}

/// Named input and output ports of a unit.
///
/// Outputs are owned: their signals are created with the unit and named
/// `unit.port`. Inputs are handles to signals owned by other units, bound
/// when the circuit is assembled.
#[derive(Debug, Clone)]
pub struct Ports {
    unit: String,
    inputs: Vec<(String, Option<Signal>)>,
    outputs: Vec<(String, Signal)>,
}

impl Ports {
    pub fn new(unit: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn with_input(mut self, port: impl Into<String>) -> Self {
        self.inputs.push((port.into(), None));
        self
    }

    pub fn with_output(mut self, port: impl Into<String>) -> Self {
        let port = port.into();
        let signal = Signal::new(format!("{}.{}", self.unit, port));
        self.outputs.push((port, signal));
        self
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn inputs(&self) -> impl Iterator<Item = (&str, Option<&Signal>)> {
        self.inputs.iter().map(|(p, s)| (p.as_str(), s.as_ref()))
    }

    pub fn outputs(&self) -> impl Iterator<Item = (&str, &Signal)> {
        self.outputs.iter().map(|(p, s)| (p.as_str(), s))
    }

    fn unknown(&self, port: &str) -> SimError {
        SimError::UnknownPort {
            unit: self.unit.clone(),
            port: port.to_string(),
        }
    }

    pub fn bind(&mut self, port: &str, signal: &Signal) -> Result<(), SimError> {
        let unknown = self.unknown(port);
        let slot = self
            .inputs
            .iter_mut()
            .find(|(p, _)| p == port)
            .ok_or(unknown)?;
        slot.1 = Some(signal.clone());
        Ok(())
    }

    /// `Ok(None)` for a known but unconnected port.
    pub fn input(&self, port: &str) -> Result<Option<&Signal>, SimError> {
        self.inputs
            .iter()
            .find(|(p, _)| p == port)
            .map(|(_, s)| s.as_ref())
            .ok_or_else(|| self.unknown(port))
    }

    pub fn is_bound(&self, port: &str) -> bool {
        matches!(self.input(port), Ok(Some(_)))
    }

    pub fn read(&self, port: &str) -> Result<Bits, SimError> {
        match self.input(port)? {
            Some(signal) => Ok(signal.get()),
            None => Err(SimError::Unbound {
                unit: self.unit.clone(),
                port: port.to_string(),
            }),
        }
    }

    pub fn read_bool(&self, port: &str) -> Result<bool, SimError> {
        Ok(self.read(port)?.as_bool())
    }

    /// Read an optional port, falling back to `default` when it is not connected.
    pub fn read_or(&self, port: &str, default: Bits) -> Result<Bits, SimError> {
        Ok(self.input(port)?.map_or(default, Signal::get))
    }

    pub fn output(&self, port: &str) -> Result<Signal, SimError> {
        self.outputs
            .iter()
            .find(|(p, _)| p == port)
            .map(|(_, s)| s.clone())
            .ok_or_else(|| self.unknown(port))
    }

    pub fn drive(&self, port: &str, value: Bits) -> Result<(), SimError> {
        self.output(port)?.drive(value)
    }

    pub fn reset_output(&self, port: &str, width: u8) -> Result<(), SimError> {
        self.output(port)?.reset(width);
        Ok(())
    }
}

/// A hardware unit.
///
/// Combinational units only implement [`Unit::evaluate`]. Stateful units
/// latch on clock edges in two phases: every stateful unit first
/// [samples](Unit::sample) its inputs, then every one [commits](Unit::commit)
/// the sampled state, so no unit observes another's post-edge value while
/// sampling. `evaluate` then publishes the held state.
pub trait Unit: Send + Sync {
    fn kind(&self) -> UnitKind;

    fn ports(&self) -> &Ports;

    fn ports_mut(&mut self) -> &mut Ports;

    fn name(&self) -> &str {
        self.ports().unit()
    }

    /// Whether `port` feeds the outputs within the same tick. Inputs only
    /// read at an edge do not, and create no scheduling dependency.
    fn combinational(&self, _port: &str) -> bool {
        true
    }

    /// Bind output widths, zero the outputs and clear latched state.
    fn reset(&mut self) -> Result<(), SimError>;

    fn evaluate(&mut self, ctx: &mut Context) -> Result<(), SimError>;

    fn sample(&mut self, _edge: Edge, _ctx: &mut Context) -> Result<(), SimError> {
        Ok(())
    }

    fn commit(&mut self, _ctx: &mut Context) -> Result<(), SimError> {
        Ok(())
    }

    fn bind(&mut self, port: &str, signal: &Signal) -> Result<(), SimError> {
        self.ports_mut().bind(port, signal)
    }

    fn output(&self, port: &str) -> Result<Signal, SimError> {
        self.ports().output(port)
    }
}
