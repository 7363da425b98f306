//! Library of hardware units.
//!
//! Combinational units recompute their outputs from their inputs on every
//! evaluation. Stateful units ([`Register`], [`RegisterFile`], the memories)
//! change internal state only on a clock edge.

/// Fill in the port accessors of [`Unit`](crate::framework::Unit) for a
/// struct with a `ports` field.
macro_rules! unit_ports {
    ($kind:ident) => {
        fn kind(&self) -> $crate::framework::UnitKind {
            $crate::framework::UnitKind::$kind
        }
        fn ports(&self) -> &$crate::framework::Ports {
            &self.ports
        }
        fn ports_mut(&mut self) -> &mut $crate::framework::Ports {
            &mut self.ports
        }
    };
}

mod alu;
mod comparator;
mod control;
mod extend;
mod forwarding;
mod hazard;
mod memory;
mod mux;
mod operation;
mod register;
mod register_file;
mod wiring;

pub use alu::Alu;
pub use comparator::Comparator;
pub use control::{AluControl, MainControl};
pub use extend::Extender;
pub use forwarding::ForwardingUnit;
pub use hazard::HazardUnit;
pub use memory::{DataMemory, InstructionMemory};
pub use mux::Mux;
pub use operation::{Operation, OperationUnit};
pub use register::Register;
pub use register_file::RegisterFile;
pub use wiring::{Concatenator, Splitter};

/// Helpers for driving a single unit by hand.
#[cfg(test)]
pub(crate) mod testing {
    use crate::bits::Bits;
    use crate::framework::{Context, Signal, Unit};

    /// Bind each `(port, value)` to a fresh constant signal and return the
    /// signals so tests can change them later.
    pub fn feed(unit: &mut dyn Unit, inputs: &[(&str, Bits)]) -> Vec<Signal> {
        inputs
            .iter()
            .map(|(port, value)| {
                let s = Signal::with_value(format!("test.{port}"), *value);
                unit.bind(port, &s).unwrap();
                s
            })
            .collect()
    }

    pub fn eval(unit: &mut dyn Unit) -> Context {
        let mut ctx = Context::default();
        unit.evaluate(&mut ctx).unwrap();
        ctx
    }

    pub fn out(unit: &dyn Unit, port: &str) -> Bits {
        unit.output(port).unwrap().get()
    }
}
