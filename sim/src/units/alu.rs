use crate::error::SimError;
use crate::framework::{Context, Ports, Unit};
use crate::isa::alu_ctrl;

/// 32-bit arithmetic logic unit.
///
/// Inputs `a`, `b`, `alu_ctrl` (3 bits), `sa` (5 bits); output `result`.
/// Shifts operate on `b` by `sa`.
pub struct Alu {
    ports: Ports,
}

impl Alu {
    pub fn new(name: &str) -> Self {
        Self {
            ports: Ports::new(name)
                .with_input("a")
                .with_input("b")
                .with_input("alu_ctrl")
                .with_input("sa")
                .with_output("result"),
        }
    }
}

impl Unit for Alu {
    unit_ports!(Alu);

    fn reset(&mut self) -> Result<(), SimError> {
        self.ports.reset_output("result", 32)
    }

    fn evaluate(&mut self, _ctx: &mut Context) -> Result<(), SimError> {
        let a = self.ports.read("a")?.resize(32);
        let b = self.ports.read("b")?.resize(32);
        let op = self.ports.read("alu_ctrl")?.as_u32();
        let sa = self.ports.read("sa")?.as_u32();
        let result = match op {
            alu_ctrl::ADD => a + b,
            alu_ctrl::SUB => a - b,
            alu_ctrl::SLL => b.shl(sa),
            alu_ctrl::SRL => b.shr(sa),
            alu_ctrl::SRA => b.sra(sa),
            alu_ctrl::AND => a & b,
            alu_ctrl::OR => a | b,
            alu_ctrl::XOR => a ^ b,
            _ => {
                return Err(SimError::UnsupportedOperation {
                    unit: self.ports.unit().to_string(),
                    op,
                })
            }
        };
        tracing::trace!(
            unit = self.ports.unit(),
            op = alu_ctrl::name_of(op),
            "{a:x} . {b:x} = {result:x}"
        );
        self.ports.drive("result", result)
    }
}
