use crate::bits::Bits;
use crate::error::SimError;
use crate::framework::{Context, Ports, Unit};

/// Branch comparator. Computes `a - b` once and derives `equal`,
/// `not_equal`, `greater` and `greater_equal` (signed) from it.
pub struct Comparator {
    ports: Ports,
}

const OUTPUTS: [&str; 4] = ["equal", "not_equal", "greater", "greater_equal"];

impl Comparator {
    pub fn new(name: &str) -> Self {
        let mut ports = Ports::new(name).with_input("a").with_input("b");
        for port in OUTPUTS {
            ports = ports.with_output(port);
        }
        Self { ports }
    }
}

impl Unit for Comparator {
    unit_ports!(Comparator);

    fn reset(&mut self) -> Result<(), SimError> {
        for port in OUTPUTS {
            self.ports.reset_output(port, 1)?;
        }
        Ok(())
    }

    fn evaluate(&mut self, _ctx: &mut Context) -> Result<(), SimError> {
        let a = self.ports.read("a")?.resize(32);
        let b = self.ports.read("b")?.resize(32);
        let d = a - b;
        let equal = d.is_zero();
        let greater = d.is_positive();
        let values = [equal, !equal, greater, greater || equal];
        for (port, v) in OUTPUTS.into_iter().zip(values) {
            self.ports.drive(port, Bits::from_bool(v))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::testing::{eval, feed, out};

    fn compare(a: i32, b: i32) -> [bool; 4] {
        let mut cmp = Comparator::new("cmp");
        cmp.reset().unwrap();
        feed(
            &mut cmp,
            &[("a", Bits::from_i32(a, 32)), ("b", Bits::from_i32(b, 32))],
        );
        eval(&mut cmp);
        OUTPUTS.map(|p| out(&cmp, p).as_bool())
    }

    #[test]
    fn test_consistent_outputs() {
        for (a, b) in [(0, 0), (5, 3), (3, 5), (-1, 0), (0, -1), (-7, -7), (i32::MIN, 1)] {
            let [eq, ne, gt, ge] = compare(a, b);
            assert_eq!(eq, !ne, "{a} {b}");
            assert_eq!(ge, gt || eq, "{a} {b}");
            assert!(!(gt && eq), "{a} {b}");
        }
    }

    #[test]
    fn test_signed_difference() {
        assert_eq!(compare(5, 3), [false, true, true, true]);
        assert_eq!(compare(3, 3), [true, false, false, true]);
        assert_eq!(compare(-1, 0), [false, true, false, false]);
        // bgez/bgtz compare against $zero
        assert_eq!(compare(7, 0), [false, true, true, true]);
    }
}
