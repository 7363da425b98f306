use crate::bits::Bits;
use crate::error::SimError;
use crate::framework::{Context, Ports, Unit};

/// No forwarding: use the register file.
pub const FROM_REGS: u32 = 0;
/// Forward the result of the instruction in execute.
pub const FROM_EX: u32 = 1;
/// Forward the result of the instruction in memory.
pub const FROM_MEM: u32 = 2;

/// Selects the source of the two decode-stage operands.
///
/// Inputs `rs`, `rt`, `rd_ex`, `rd_mem`, `reg_write_ex`, `reg_write_mem`;
/// outputs `forward_a`, `forward_b` (2 bits each). The younger result in
/// execute takes priority over memory. Register 0 is never forwarded.
pub struct ForwardingUnit {
    ports: Ports,
}

impl ForwardingUnit {
    pub fn new(name: &str) -> Self {
        Self {
            ports: Ports::new(name)
                .with_input("rs")
                .with_input("rt")
                .with_input("rd_ex")
                .with_input("rd_mem")
                .with_input("reg_write_ex")
                .with_input("reg_write_mem")
                .with_output("forward_a")
                .with_output("forward_b"),
        }
    }
}

impl Unit for ForwardingUnit {
    unit_ports!(Forwarding);

    fn reset(&mut self) -> Result<(), SimError> {
        self.ports.reset_output("forward_a", 2)?;
        self.ports.reset_output("forward_b", 2)
    }

    fn evaluate(&mut self, _ctx: &mut Context) -> Result<(), SimError> {
        let rd_ex = self.ports.read("rd_ex")?.as_u32();
        let rd_mem = self.ports.read("rd_mem")?.as_u32();
        let write_ex = self.ports.read_bool("reg_write_ex")?;
        let write_mem = self.ports.read_bool("reg_write_mem")?;
        let select = |src: u32| {
            let mut sel = FROM_REGS;
            if write_mem && rd_mem != 0 && rd_mem == src {
                sel = FROM_MEM;
            }
            if write_ex && rd_ex != 0 && rd_ex == src {
                sel = FROM_EX;
            }
            sel
        };
        let a = select(self.ports.read("rs")?.as_u32());
        let b = select(self.ports.read("rt")?.as_u32());
        self.ports.drive("forward_a", Bits::from_u32(a, 2))?;
        self.ports.drive("forward_b", Bits::from_u32(b, 2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::testing::{eval, feed, out};

    fn forward(rd_ex: u32, rd_mem: u32) -> (u32, u32) {
        let mut fw = ForwardingUnit::new("forward");
        fw.reset().unwrap();
        feed(
            &mut fw,
            &[
                ("rs", Bits::from_u32(5, 5)),
                ("rt", Bits::from_u32(6, 5)),
                ("rd_ex", Bits::from_u32(rd_ex, 5)),
                ("rd_mem", Bits::from_u32(rd_mem, 5)),
                ("reg_write_ex", Bits::from_bool(true)),
                ("reg_write_mem", Bits::from_bool(true)),
            ],
        );
        eval(&mut fw);
        (
            out(&fw, "forward_a").as_u32(),
            out(&fw, "forward_b").as_u32(),
        )
    }

    #[test]
    fn test_priority() {
        assert_eq!(forward(5, 0), (FROM_EX, FROM_REGS));
        assert_eq!(forward(0, 5), (FROM_MEM, FROM_REGS));
        assert_eq!(forward(5, 5), (FROM_EX, FROM_REGS));
        assert_eq!(forward(6, 5), (FROM_MEM, FROM_EX));
        assert_eq!(forward(0, 0), (FROM_REGS, FROM_REGS));
    }

    #[test]
    fn test_zero_register_and_write_enable() {
        let mut fw = ForwardingUnit::new("forward");
        fw.reset().unwrap();
        let sigs = feed(
            &mut fw,
            &[
                ("rs", Bits::zero(5)),
                ("rt", Bits::from_u32(6, 5)),
                ("rd_ex", Bits::zero(5)),
                ("rd_mem", Bits::from_u32(6, 5)),
                ("reg_write_ex", Bits::from_bool(true)),
                ("reg_write_mem", Bits::from_bool(false)),
            ],
        );
        eval(&mut fw);
        // $zero as destination never forwards, nor does a non-writing stage
        assert_eq!(out(&fw, "forward_a").as_u32(), FROM_REGS);
        assert_eq!(out(&fw, "forward_b").as_u32(), FROM_REGS);
        sigs[5].drive(Bits::from_bool(true)).unwrap();
        eval(&mut fw);
        assert_eq!(out(&fw, "forward_b").as_u32(), FROM_MEM);
    }
}
