//! Bundling and unbundling of wires.

use crate::bits::{Bits, MAX_WIDTH};
use crate::error::SimError;
use crate::framework::{Context, Ports, Unit};

/// Joins `in0..` into `out`, `in0` in the low bits.
pub struct Concatenator {
    ports: Ports,
    inputs: usize,
}

impl Concatenator {
    pub fn new(name: &str, inputs: usize) -> Self {
        let mut ports = Ports::new(name);
        for i in 0..inputs {
            ports = ports.with_input(format!("in{i}"));
        }
        Self {
            ports: ports.with_output("out"),
            inputs,
        }
    }

    fn too_wide(&self, width: u32) -> SimError {
        SimError::TooWide {
            unit: self.ports.unit().to_string(),
            width,
        }
    }
}

impl Unit for Concatenator {
    unit_ports!(Concatenator);

    fn reset(&mut self) -> Result<(), SimError> {
        let width: u32 = self
            .ports
            .inputs()
            .filter_map(|(_, s)| s.map(|s| s.width() as u32))
            .sum();
        if width > MAX_WIDTH as u32 {
            return Err(self.too_wide(width));
        }
        self.ports.reset_output("out", width as u8)
    }

    fn evaluate(&mut self, _ctx: &mut Context) -> Result<(), SimError> {
        let parts = (0..self.inputs)
            .map(|i| self.ports.read(&format!("in{i}")))
            .collect::<Result<Vec<_>, _>>()?;
        let width = parts.iter().map(|p| p.width() as u32).sum();
        let joined = Bits::concat(parts).ok_or_else(|| self.too_wide(width))?;
        self.ports.drive("out", joined)
    }
}

/// Extracts inclusive bit intervals of `in` onto separate outputs.
/// Intervals may overlap or leave gaps.
pub struct Splitter {
    ports: Ports,
    fields: Vec<(String, u8, u8)>,
}

impl Splitter {
    /// Outputs are named `out0..` in interval order.
    pub fn new(name: &str, intervals: &[(u8, u8)]) -> Result<Self, SimError> {
        let fields: Vec<_> = intervals
            .iter()
            .enumerate()
            .map(|(i, &(lo, hi))| (format!("out{i}"), lo, hi))
            .collect();
        Self::build(name, fields)
    }

    /// Outputs carry the given names.
    pub fn named(name: &str, fields: &[(&str, u8, u8)]) -> Result<Self, SimError> {
        let fields = fields
            .iter()
            .map(|&(port, lo, hi)| (port.to_string(), lo, hi))
            .collect();
        Self::build(name, fields)
    }

    fn build(name: &str, fields: Vec<(String, u8, u8)>) -> Result<Self, SimError> {
        let mut ports = Ports::new(name).with_input("in");
        for (port, lo, hi) in &fields {
            if lo > hi || *hi >= MAX_WIDTH {
                return Err(SimError::BadInterval {
                    unit: name.to_string(),
                    lo: *lo,
                    hi: *hi,
                });
            }
            ports = ports.with_output(port.as_str());
        }
        Ok(Self { ports, fields })
    }
}

impl Unit for Splitter {
    unit_ports!(Splitter);

    fn reset(&mut self) -> Result<(), SimError> {
        for (port, lo, hi) in &self.fields {
            self.ports.reset_output(port, hi - lo + 1)?;
        }
        Ok(())
    }

    fn evaluate(&mut self, _ctx: &mut Context) -> Result<(), SimError> {
        let input = self.ports.read("in")?;
        for (port, lo, hi) in &self.fields {
            self.ports.drive(port, input.slice(*lo, *hi))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::testing::{eval, feed, out};

    #[test]
    fn test_split_then_join() {
        let word = Bits::from_u32(0x8d0a_0004, 32);
        let mut split = Splitter::new("split", &[(0, 15), (16, 20), (21, 25), (26, 31)]).unwrap();
        let input = feed(&mut split, &[("in", word)]);
        split.reset().unwrap();
        eval(&mut split);
        assert_eq!(out(&split, "out0"), Bits::from_u32(4, 16));
        assert_eq!(out(&split, "out1"), Bits::from_u32(10, 5));
        assert_eq!(out(&split, "out2"), Bits::from_u32(8, 5));
        assert_eq!(out(&split, "out3"), Bits::from_u32(0x23, 6));

        let mut join = Concatenator::new("join", 4);
        for i in 0..4 {
            let port = format!("out{i}");
            join.bind(&format!("in{i}"), &split.output(&port).unwrap())
                .unwrap();
        }
        join.reset().unwrap();

        let mut seed: u32 = 0x1234_5678;
        let mut values = vec![0, u32::MAX, 0x8000_0000, 1, 0x8d0a_0004];
        for _ in 0..64 {
            seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            values.push(seed);
        }
        for v in values {
            input[0].drive(Bits::from_u32(v, 32)).unwrap();
            eval(&mut split);
            eval(&mut join);
            assert_eq!(out(&join, "out"), Bits::from_u32(v, 32), "{v:#x}");
        }
    }

    #[test]
    fn test_overlap_and_gaps() {
        let mut split = Splitter::named("f", &[("all", 0, 31), ("top", 28, 31), ("b1", 1, 1)])
            .unwrap();
        feed(&mut split, &[("in", Bits::from_u32(0xf000_0002, 32))]);
        split.reset().unwrap();
        eval(&mut split);
        assert_eq!(out(&split, "all").as_u32(), 0xf000_0002);
        assert_eq!(out(&split, "top"), Bits::from_u32(0xf, 4));
        assert_eq!(out(&split, "b1"), Bits::from_bool(true));
    }

    #[test]
    fn test_bad_configuration() {
        assert!(matches!(
            Splitter::new("s", &[(4, 3)]),
            Err(SimError::BadInterval { lo: 4, hi: 3, .. })
        ));
        assert!(matches!(
            Splitter::new("s", &[(0, 32)]),
            Err(SimError::BadInterval { .. })
        ));

        let mut join = Concatenator::new("join", 2);
        feed(
            &mut join,
            &[("in0", Bits::zero(20)), ("in1", Bits::zero(20))],
        );
        assert_eq!(
            join.reset(),
            Err(SimError::TooWide {
                unit: "join".into(),
                width: 40
            })
        );
    }
}
