use crate::error::SimError;
use crate::framework::{Context, Ports, Unit};

/// N-way multiplexer with inputs `in0..in{n-1}`, selector `sel` and output
/// `out`. The output is as wide as the widest input; narrower inputs are
/// zero-padded.
pub struct Mux {
    ports: Ports,
    inputs: usize,
    width: u8,
}

impl Mux {
    /// A mux with `inputs` data inputs, at least one.
    pub fn new(name: &str, inputs: usize) -> Self {
        let inputs = inputs.max(1);
        let mut ports = Ports::new(name).with_input("sel");
        for i in 0..inputs {
            ports = ports.with_input(format!("in{i}"));
        }
        Self {
            ports: ports.with_output("out"),
            inputs,
            width: 0,
        }
    }

    fn input_width(&self) -> u8 {
        self.ports
            .inputs()
            .filter(|(port, _)| *port != "sel")
            .filter_map(|(_, signal)| signal.map(|s| s.width()))
            .max()
            .unwrap_or(0)
    }
}

impl Unit for Mux {
    unit_ports!(Mux);

    fn reset(&mut self) -> Result<(), SimError> {
        self.width = self.input_width();
        self.ports.reset_output("out", self.width)
    }

    fn evaluate(&mut self, _ctx: &mut Context) -> Result<(), SimError> {
        let sel = self.ports.read("sel")?.as_u32();
        if sel as usize >= self.inputs {
            return Err(SimError::SelectorOutOfRange {
                unit: self.ports.unit().to_string(),
                sel,
                count: self.inputs,
            });
        }
        let value = self.ports.read(&format!("in{sel}"))?;
        let width = if self.width == 0 {
            value.width()
        } else {
            self.width
        };
        self.ports.drive("out", value.resize(width))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::Bits;
    use crate::units::testing::{eval, feed, out};

    #[test]
    fn test_select_and_pad() {
        let mut mux = Mux::new("mux", 3);
        let sigs = feed(
            &mut mux,
            &[
                ("sel", Bits::zero(2)),
                ("in0", Bits::from_u32(0xaa, 8)),
                ("in1", Bits::from_u32(0x1234_5678, 32)),
                ("in2", Bits::from_u32(31, 5)),
            ],
        );
        mux.reset().unwrap();
        eval(&mut mux);
        assert_eq!(out(&mux, "out"), Bits::from_u32(0xaa, 32));
        sigs[0].drive(Bits::from_u32(1, 2)).unwrap();
        eval(&mut mux);
        assert_eq!(out(&mux, "out").as_u32(), 0x1234_5678);
        sigs[0].drive(Bits::from_u32(2, 2)).unwrap();
        eval(&mut mux);
        assert_eq!(out(&mux, "out"), Bits::from_u32(31, 32));
    }

    #[test]
    fn test_selector_out_of_range() {
        let mut mux = Mux::new("mux", 3);
        feed(
            &mut mux,
            &[
                ("sel", Bits::from_u32(3, 2)),
                ("in0", Bits::from_u32(1, 8)),
                ("in1", Bits::from_u32(2, 8)),
                ("in2", Bits::from_u32(3, 8)),
            ],
        );
        mux.reset().unwrap();
        let err = mux.evaluate(&mut Context::default()).unwrap_err();
        assert_eq!(
            err,
            SimError::SelectorOutOfRange {
                unit: "mux".into(),
                sel: 3,
                count: 3
            }
        );
        assert_eq!(out(&mux, "out"), Bits::zero(8));
    }
}
