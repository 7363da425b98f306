use crate::bits::Bits;
use crate::error::SimError;
use crate::framework::{Context, Ports, Unit};

/// Load-use hazard detection.
///
/// Stalls fetch and decode and inserts a bubble into execute while a load in
/// execute or memory targets `rs` or `rt` of the instruction in decode.
/// Outputs `pc_write`, `if_id_write` and `bubble`, one bit each.
pub struct HazardUnit {
    ports: Ports,
}

impl HazardUnit {
    pub fn new(name: &str) -> Self {
        Self {
            ports: Ports::new(name)
                .with_input("rs")
                .with_input("rt")
                .with_input("rd_ex")
                .with_input("mem_read_ex")
                .with_input("rd_mem")
                .with_input("mem_read_mem")
                .with_output("pc_write")
                .with_output("if_id_write")
                .with_output("bubble"),
        }
    }
}

impl Unit for HazardUnit {
    unit_ports!(Hazard);

    fn reset(&mut self) -> Result<(), SimError> {
        self.ports.reset_output("pc_write", 1)?;
        self.ports.reset_output("if_id_write", 1)?;
        self.ports.reset_output("bubble", 1)
    }

    fn evaluate(&mut self, _ctx: &mut Context) -> Result<(), SimError> {
        let rs = self.ports.read("rs")?.as_u32();
        let rt = self.ports.read("rt")?.as_u32();
        let hits = |rd: u32| rd == rs || rd == rt;
        let stall = (self.ports.read_bool("mem_read_ex")?
            && hits(self.ports.read("rd_ex")?.as_u32()))
            || (self.ports.read_bool("mem_read_mem")?
                && hits(self.ports.read("rd_mem")?.as_u32()));
        if stall {
            tracing::debug!(unit = self.ports.unit(), "load-use stall");
        }
        self.ports.drive("pc_write", Bits::from_bool(!stall))?;
        self.ports.drive("if_id_write", Bits::from_bool(!stall))?;
        self.ports.drive("bubble", Bits::from_bool(stall))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::testing::{eval, feed, out};

    fn outputs(hz: &HazardUnit) -> (bool, bool, bool) {
        (
            out(hz, "pc_write").as_bool(),
            out(hz, "if_id_write").as_bool(),
            out(hz, "bubble").as_bool(),
        )
    }

    #[test]
    fn test_stall_tuple() {
        let mut hz = HazardUnit::new("hazard");
        hz.reset().unwrap();
        let sigs = feed(
            &mut hz,
            &[
                ("rs", Bits::from_u32(8, 5)),
                ("rt", Bits::from_u32(9, 5)),
                ("rd_ex", Bits::from_u32(9, 5)),
                ("mem_read_ex", Bits::from_bool(false)),
                ("rd_mem", Bits::from_u32(8, 5)),
                ("mem_read_mem", Bits::from_bool(false)),
            ],
        );
        eval(&mut hz);
        assert_eq!(outputs(&hz), (true, true, false));

        // load in execute writing rt
        sigs[3].drive(Bits::from_bool(true)).unwrap();
        eval(&mut hz);
        assert_eq!(outputs(&hz), (false, false, true));

        // load in memory writing rs
        sigs[3].drive(Bits::from_bool(false)).unwrap();
        sigs[5].drive(Bits::from_bool(true)).unwrap();
        eval(&mut hz);
        assert_eq!(outputs(&hz), (false, false, true));

        sigs[4].drive(Bits::from_u32(10, 5)).unwrap();
        eval(&mut hz);
        assert_eq!(outputs(&hz), (true, true, false));
    }

    #[test]
    fn test_load_in_execute_writing_rs() {
        let mut hz = HazardUnit::new("hazard");
        hz.reset().unwrap();
        let sigs = feed(
            &mut hz,
            &[
                ("rs", Bits::from_u32(9, 5)),
                ("rt", Bits::from_u32(4, 5)),
                ("rd_ex", Bits::from_u32(9, 5)),
                ("mem_read_ex", Bits::from_bool(true)),
                ("rd_mem", Bits::from_u32(0, 5)),
                ("mem_read_mem", Bits::from_bool(false)),
            ],
        );
        eval(&mut hz);
        assert_eq!(outputs(&hz), (false, false, true));

        // same destination without a load
        sigs[3].drive(Bits::from_bool(false)).unwrap();
        eval(&mut hz);
        assert_eq!(outputs(&hz), (true, true, false));
    }
}
