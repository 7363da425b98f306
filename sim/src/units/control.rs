use crate::bits::Bits;
use crate::error::SimError;
use crate::framework::{Context, Ports, Unit};
use crate::isa::{alu_ctrl, alu_op, alu_ctrl_of, op_code, ControlWord};

/// ALU control decoder: `func` (6 bits) and `alu_op` (2 bits) to the 3-bit
/// `alu_ctrl`.
pub struct AluControl {
    ports: Ports,
}

impl AluControl {
    pub fn new(name: &str) -> Self {
        Self {
            ports: Ports::new(name)
                .with_input("func")
                .with_input("alu_op")
                .with_output("alu_ctrl"),
        }
    }
}

impl Unit for AluControl {
    unit_ports!(AluControl);

    fn reset(&mut self) -> Result<(), SimError> {
        self.ports.reset_output("alu_ctrl", 3)
    }

    fn evaluate(&mut self, _ctx: &mut Context) -> Result<(), SimError> {
        let func = self.ports.read("func")?.as_u32();
        let class = self.ports.read("alu_op")?.as_u32();
        let ctrl = match class {
            alu_op::RTYPE => match alu_ctrl_of(func) {
                Some(ctrl) => ctrl,
                None => {
                    self.ports.drive("alu_ctrl", Bits::zero(3))?;
                    return Err(SimError::UnsupportedFunction {
                        unit: self.ports.unit().to_string(),
                        func,
                    });
                }
            },
            alu_op::ADD => alu_ctrl::ADD,
            alu_op::SUB => alu_ctrl::SUB,
            // don't care
            _ => 0,
        };
        self.ports.drive("alu_ctrl", Bits::from_u32(ctrl, 3))
    }
}

/// Main instruction decoder: 6-bit `opcode` to the 16-bit `control` word.
/// See [`ControlWord`] for the layout.
pub struct MainControl {
    ports: Ports,
}

impl MainControl {
    pub fn new(name: &str) -> Self {
        Self {
            ports: Ports::new(name).with_input("opcode").with_output("control"),
        }
    }
}

impl Unit for MainControl {
    unit_ports!(MainControl);

    fn reset(&mut self) -> Result<(), SimError> {
        self.ports.reset_output("control", 16)
    }

    fn evaluate(&mut self, _ctx: &mut Context) -> Result<(), SimError> {
        let opcode = self.ports.read("opcode")?.as_u32();
        let word = ControlWord::for_opcode(opcode).ok_or_else(|| SimError::UnsupportedOpcode {
            unit: self.ports.unit().to_string(),
            opcode,
        })?;
        tracing::trace!(
            unit = self.ports.unit(),
            op = op_code::name_of(opcode),
            "control {:#06x}",
            word.0
        );
        self.ports.drive("control", Bits::from_u16(word.0, 16))
    }
}
