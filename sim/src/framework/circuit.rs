use std::collections::{BTreeMap, HashMap};

use super::{propagate::topo, Clock, Context, Edge, Schedule, Signal, Unit};
use crate::bits::Bits;
use crate::error::{Fault, SimError, Warning};

/// Producer name used by [`Circuit::connect`] to refer to constant wires.
pub const CONST: &str = "const";

/// Outcome of one tick.
#[derive(Debug, Default, Clone)]
pub struct TickReport {
    pub tick: u64,
    pub edge: Option<Edge>,
    pub faults: Vec<Fault>,
    pub warnings: Vec<Warning>,
}

impl TickReport {
    pub fn is_clean(&self) -> bool {
        self.faults.is_empty() && self.warnings.is_empty()
    }
}

/// Registry and scheduler of a set of connected units.
///
/// Units are evaluated in the topological order of the combinational
/// dependency graph, computed by [`Circuit::build`]. Any change to the
/// wiring drops the order; the next tick rebuilds it.
pub struct Circuit {
    units: Vec<Box<dyn Unit>>,
    index: HashMap<String, usize>,
    constants: BTreeMap<String, Signal>,
    clock: Clock,
    schedule: Option<Schedule>,
    ticks: u64,
}

impl Circuit {
    pub fn new(clock: Clock) -> Self {
        Self {
            units: Vec::new(),
            index: HashMap::new(),
            constants: BTreeMap::new(),
            clock,
            schedule: None,
            ticks: 0,
        }
    }

    pub fn add(&mut self, unit: impl Unit + 'static) -> Result<(), SimError> {
        let name = unit.name().to_string();
        if self.index.contains_key(&name) || name == CONST {
            return Err(SimError::DuplicateUnit(name));
        }
        self.index.insert(name, self.units.len());
        self.units.push(Box::new(unit));
        self.schedule = None;
        Ok(())
    }

    /// Register a constant wire, reachable as producer [`CONST`].
    pub fn constant(&mut self, name: &str, value: Bits) -> Signal {
        self.constants
            .entry(name.to_string())
            .or_insert_with(|| Signal::with_value(format!("{CONST}.{name}"), value))
            .clone()
    }

    /// Connect `consumer.port` to the output `producer.out_port`.
    pub fn connect(
        &mut self,
        consumer: &str,
        port: &str,
        producer: &str,
        out_port: &str,
    ) -> Result<(), SimError> {
        let signal = if producer == CONST {
            self.constants
                .get(out_port)
                .cloned()
                .ok_or_else(|| SimError::UnknownPort {
                    unit: CONST.to_string(),
                    port: out_port.to_string(),
                })?
        } else {
            self.unit(producer)?.output(out_port)?
        };
        self.bind(consumer, port, &signal)
    }

    /// Connect `consumer.port` to an arbitrary signal.
    pub fn bind(&mut self, consumer: &str, port: &str, signal: &Signal) -> Result<(), SimError> {
        let i = self.position(consumer)?;
        self.units[i].bind(port, signal)?;
        self.schedule = None;
        Ok(())
    }

    fn position(&self, name: &str) -> Result<usize, SimError> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| SimError::UnknownUnit(name.to_string()))
    }

    pub fn unit(&self, name: &str) -> Result<&dyn Unit, SimError> {
        Ok(self.units[self.position(name)?].as_ref())
    }

    pub fn units(&self) -> impl Iterator<Item = &dyn Unit> {
        self.units.iter().map(|u| u.as_ref())
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Compute the evaluation order. Fails if combinational wiring loops.
    pub fn build(&mut self) -> Result<&Schedule, SimError> {
        let mut producer: HashMap<usize, usize> = HashMap::new();
        for (i, unit) in self.units.iter().enumerate() {
            for (_, signal) in unit.ports().outputs() {
                producer.insert(signal.id(), i);
            }
        }
        let mut edges = Vec::new();
        for (i, unit) in self.units.iter().enumerate() {
            for (port, signal) in unit.ports().inputs() {
                let Some(signal) = signal else { continue };
                if !unit.combinational(port) {
                    continue;
                }
                if let Some(&from) = producer.get(&signal.id()) {
                    edges.push((from, i));
                }
            }
        }
        let levels = topo(0..self.units.len(), edges.iter().copied()).map_err(|stuck| {
            SimError::CombinationalCycle(
                stuck
                    .into_iter()
                    .map(|i| self.units[i].name().to_string())
                    .collect(),
            )
        })?;
        tracing::debug!(
            units = self.units.len(),
            edges = edges.len(),
            "evaluation order computed"
        );
        Ok(self.schedule.insert(Schedule::from_levels(levels)))
    }

    pub fn schedule(&mut self) -> Result<&Schedule, SimError> {
        if self.schedule.is_none() {
            self.build()?;
        }
        self.schedule
            .as_ref()
            .ok_or_else(|| SimError::CombinationalCycle(Vec::new()))
    }

    fn order(&mut self) -> Result<Vec<usize>, SimError> {
        Ok(self.schedule()?.order().to_vec())
    }

    /// Reset every unit in evaluation order, then settle the combinational
    /// logic once so outputs are consistent before the first tick.
    pub fn reset(&mut self) -> Result<TickReport, SimError> {
        let order = self.order()?;
        self.clock.reset();
        self.ticks = 0;
        let mut report = TickReport::default();
        for &i in &order {
            if let Err(error) = self.units[i].reset() {
                report.faults.push(fault(self.units[i].as_ref(), error));
            }
        }
        let mut ctx = Context::new(0, None);
        self.evaluate_all(&order, &mut ctx, &mut report);
        report.warnings = ctx.take_warnings();
        tracing::debug!(faults = report.faults.len(), "circuit reset");
        Ok(report)
    }

    /// Advance the clock by one tick.
    ///
    /// On an edge every stateful unit samples its inputs, then every one
    /// commits. Afterwards all units are evaluated in topological order.
    /// Unit errors do not abort the tick: they are collected in the report
    /// and the faulty unit keeps its previous outputs.
    pub fn tick(&mut self) -> Result<TickReport, SimError> {
        if !self.clock.is_running() {
            return Err(SimError::ClockStopped);
        }
        let order = self.order()?;
        self.ticks += 1;
        let edge = self.clock.advance();
        tracing::debug!(tick = self.ticks, ?edge, "tick");

        let mut report = TickReport {
            tick: self.ticks,
            edge,
            ..Default::default()
        };
        let mut ctx = Context::new(self.ticks, edge);
        if let Some(edge) = edge {
            let mut failed = vec![false; self.units.len()];
            for (i, unit) in self.units.iter_mut().enumerate() {
                if !unit.kind().is_stateful() {
                    continue;
                }
                if let Err(error) = unit.sample(edge, &mut ctx) {
                    failed[i] = true;
                    report.faults.push(fault(unit.as_ref(), error));
                }
            }
            for (i, unit) in self.units.iter_mut().enumerate() {
                if !unit.kind().is_stateful() || failed[i] {
                    continue;
                }
                if let Err(error) = unit.commit(&mut ctx) {
                    report.faults.push(fault(unit.as_ref(), error));
                }
            }
        }
        self.evaluate_all(&order, &mut ctx, &mut report);
        report.warnings = ctx.take_warnings();
        Ok(report)
    }

    /// Tick until the end of the current clock cycle (the next falling edge).
    pub fn step_cycle(&mut self) -> Result<Vec<TickReport>, SimError> {
        let mut reports = Vec::new();
        loop {
            let report = self.tick()?;
            let done = report.edge == Some(Edge::Falling);
            reports.push(report);
            if done {
                return Ok(reports);
            }
        }
    }

    fn evaluate_all(&mut self, order: &[usize], ctx: &mut Context, report: &mut TickReport) {
        for &i in order {
            let unit = &mut self.units[i];
            tracing::trace!(unit = unit.name(), "evaluate");
            if let Err(error) = unit.evaluate(ctx) {
                report.faults.push(fault(unit.as_ref(), error));
            }
        }
    }

    /// Look up a published signal by its full name (`unit.port`,
    /// `const.name` or `clock`).
    pub fn signal(&self, name: &str) -> Option<Signal> {
        if name == self.clock.signal().name() {
            return Some(self.clock.signal().clone());
        }
        if let Some(constant) = name
            .strip_prefix(CONST)
            .and_then(|rest| rest.strip_prefix('.'))
            .and_then(|c| self.constants.get(c))
        {
            return Some(constant.clone());
        }
        let (unit, port) = name.rsplit_once('.')?;
        self.unit(unit).ok()?.output(port).ok()
    }

    /// Every published value by signal name.
    pub fn snapshot(&self) -> BTreeMap<String, Bits> {
        let mut values = BTreeMap::new();
        values.insert(
            self.clock.signal().name().to_string(),
            self.clock.signal().get(),
        );
        for signal in self.constants.values() {
            values.insert(signal.name().to_string(), signal.get());
        }
        for unit in &self.units {
            for (_, signal) in unit.ports().outputs() {
                values.insert(signal.name().to_string(), signal.get());
            }
        }
        values
    }
}

fn fault(unit: &dyn Unit, error: SimError) -> Fault {
    tracing::error!(unit = unit.name(), "{error}");
    Fault {
        unit: unit.name().to_string(),
        error,
    }
}
