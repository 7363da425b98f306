use crate::error::SimError;
use crate::framework::{Context, Ports, Unit};

/// Widens the 16-bit `input` to 32 bits, sign-extending when `signed` is
/// set and zero-extending otherwise.
pub struct Extender {
    ports: Ports,
}

impl Extender {
    pub fn new(name: &str) -> Self {
        Self {
            ports: Ports::new(name)
                .with_input("input")
                .with_input("signed")
                .with_output("output"),
        }
    }
}

impl Unit for Extender {
    unit_ports!(Extender);

    fn reset(&mut self) -> Result<(), SimError> {
        self.ports.reset_output("output", 32)
    }

    fn evaluate(&mut self, _ctx: &mut Context) -> Result<(), SimError> {
        let input = self.ports.read("input")?.resize(16);
        let output = if self.ports.read_bool("signed")? {
            input.sign_extend(32)
        } else {
            input.resize(32)
        };
        self.ports.drive("output", output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::Bits;
    use crate::units::testing::{eval, feed, out};

    #[test]
    fn test_extend() {
        let mut ext = Extender::new("ext");
        ext.reset().unwrap();
        let sigs = feed(
            &mut ext,
            &[
                ("input", Bits::from_u16(0x8000, 16)),
                ("signed", Bits::from_bool(true)),
            ],
        );
        eval(&mut ext);
        assert_eq!(out(&ext, "output").as_u32(), 0xffff_8000);
        sigs[1].drive(Bits::from_bool(false)).unwrap();
        eval(&mut ext);
        assert_eq!(out(&ext, "output").as_u32(), 0x0000_8000);

        sigs[0].drive(Bits::from_u16(0x7fff, 16)).unwrap();
        sigs[1].drive(Bits::from_bool(true)).unwrap();
        eval(&mut ext);
        assert_eq!(out(&ext, "output").as_u32(), 0x7fff);
    }

    #[test]
    fn test_full_domain() {
        let mut ext = Extender::new("ext");
        ext.reset().unwrap();
        let sigs = feed(
            &mut ext,
            &[("input", Bits::zero(16)), ("signed", Bits::from_bool(true))],
        );
        for v in (0..=u16::MAX).step_by(257) {
            sigs[0].drive(Bits::from_u16(v, 16)).unwrap();
            eval(&mut ext);
            assert_eq!(out(&ext, "output").as_i32(), v as i16 as i32);
        }
    }
}
