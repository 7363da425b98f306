//! Conditions reported by units and by the scheduler.
//!
//! A [`SimError`] is a configuration problem: the offending unit stops
//! evaluating for the current tick and its outputs keep their last value. A
//! [`Warning`] is a bounds condition with a degraded but well-defined result.
//! Neither of them aborts the simulation.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimError {
    /// An input port has no signal bound to it.
    Unbound { unit: String, port: String },
    /// The port name does not exist on the unit.
    UnknownPort { unit: String, port: String },
    UnknownUnit(String),
    DuplicateUnit(String),
    /// The ALU was asked for an operation outside its table.
    UnsupportedOperation { unit: String, op: u32 },
    /// The main decoder received an opcode it has no control word for.
    UnsupportedOpcode { unit: String, opcode: u32 },
    /// The ALU control decoder received an R-type function it cannot map.
    UnsupportedFunction { unit: String, func: u32 },
    SelectorOutOfRange { unit: String, sel: u32, count: usize },
    /// The selected operation lacks an input it needs.
    MissingOperand { unit: String, reason: String },
    /// A write did not match the width the signal was bound to.
    WidthMismatch {
        signal: String,
        expected: u8,
        found: u8,
    },
    /// A unit's outputs would be wider than a wire can carry.
    TooWide { unit: String, width: u32 },
    /// A splitter interval is empty or reaches past bit 31.
    BadInterval { unit: String, lo: u8, hi: u8 },
    /// Combinational wiring that feeds back into itself.
    CombinationalCycle(Vec<String>),
    ClockStopped,
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::Unbound { unit, port } => write!(
                f,
                "input `{port}` of `{unit}` is not connected to any signal"
            ),
            SimError::UnknownPort { unit, port } => {
                write!(f, "`{unit}` has no port named `{port}`")
            }
            SimError::UnknownUnit(name) => write!(f, "no unit named `{name}`"),
            SimError::DuplicateUnit(name) => write!(f, "unit `{name}` is defined twice"),
            SimError::UnsupportedOperation { unit, op } => {
                write!(f, "`{unit}` does not support operation {op:#b}")
            }
            SimError::UnsupportedOpcode { unit, opcode } => {
                write!(f, "`{unit}`: opcode {opcode:#08b} is not supported")
            }
            SimError::UnsupportedFunction { unit, func } => {
                write!(f, "`{unit}`: func {func:#08b} is not supported")
            }
            SimError::SelectorOutOfRange { unit, sel, count } => write!(
                f,
                "`{unit}`: selection {sel} is outside the {count} inputs of this mux"
            ),
            SimError::MissingOperand { unit, reason } => write!(f, "`{unit}`: {reason}"),
            SimError::WidthMismatch {
                signal,
                expected,
                found,
            } => write!(
                f,
                "signal `{signal}` is {expected} bits wide but was driven with {found} bits"
            ),
            SimError::TooWide { unit, width } => {
                write!(f, "`{unit}` would produce a {width}-bit output")
            }
            SimError::BadInterval { unit, lo, hi } => {
                write!(f, "`{unit}`: invalid bit interval [{lo}, {hi}]")
            }
            SimError::CombinationalCycle(units) => {
                write!(f, "combinational loop through: {}", units.join(", "))
            }
            SimError::ClockStopped => f.write_str("the clock is stopped"),
        }
    }
}

impl std::error::Error for SimError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// Memory or register access outside the store. Reads degrade to zero
    /// (or a wrapped slot for the register file), writes are dropped.
    AddressOutOfRange {
        unit: String,
        address: u32,
        size: usize,
        write: bool,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::AddressOutOfRange {
                unit,
                address,
                size,
                write,
            } => {
                let access = if *write { "write" } else { "read" };
                write!(
                    f,
                    "`{unit}`: {access} at address {address} is outside [0, {size})"
                )
            }
        }
    }
}

/// A configuration error raised by a named unit during one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    pub unit: String,
    pub error: SimError,
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.unit, self.error)
    }
}
