use crate::bits::Bits;
use crate::error::SimError;
use crate::framework::{Context, Edge, Ports, Unit};

/// Rising-edge register with output `q`.
///
/// Input `d` is latched when `write_enable` (default 1) is set; `flush`
/// (default 0) latches zero and wins over `write_enable`. Pipeline registers
/// use `write_enable` to stall and `flush` to insert a bubble.
///
/// The width comes from [`Register::with_width`] or else from `d` at reset.
/// When `d` is not driven yet it is taken on the first edge. A `d` of any
/// other width is a [`SimError::WidthMismatch`].
pub struct Register {
    ports: Ports,
    fixed: Option<u8>,
    width: u8,
    state: Bits,
    pending: Option<Bits>,
}

impl Register {
    pub fn new(name: &str) -> Self {
        Self {
            ports: Ports::new(name)
                .with_input("d")
                .with_input("flush")
                .with_input("write_enable")
                .with_output("q"),
            fixed: None,
            width: 0,
            state: Bits::zero(0),
            pending: None,
        }
    }

    pub fn with_width(mut self, width: u8) -> Self {
        self.fixed = Some(width);
        self.width = width;
        self.state = Bits::zero(width);
        self
    }

    fn data_width(&self) -> Result<u8, SimError> {
        Ok(self.ports.input("d")?.map_or(0, |d| d.width()))
    }

    pub fn value(&self) -> Bits {
        self.state
    }
}

impl Unit for Register {
    unit_ports!(Register);

    fn combinational(&self, _port: &str) -> bool {
        false
    }

    fn reset(&mut self) -> Result<(), SimError> {
        self.width = match self.fixed {
            Some(width) => width,
            None => self.data_width()?,
        };
        self.state = Bits::zero(self.width);
        self.pending = None;
        self.ports.reset_output("q", self.width)
    }

    fn sample(&mut self, edge: Edge, _ctx: &mut Context) -> Result<(), SimError> {
        self.pending = None;
        if edge != Edge::Rising {
            return Ok(());
        }
        if self.width == 0 {
            self.width = self.data_width()?;
        }
        let flush = self.ports.read_or("flush", Bits::from_bool(false))?.as_bool();
        let enable = self
            .ports
            .read_or("write_enable", Bits::from_bool(true))?
            .as_bool();
        self.pending = if flush {
            Some(Bits::zero(self.width))
        } else if enable {
            let d = self.ports.read("d")?;
            if d.width() != self.width {
                return Err(SimError::WidthMismatch {
                    signal: format!("{}.d", self.ports.unit()),
                    expected: self.width,
                    found: d.width(),
                });
            }
            Some(d)
        } else {
            None
        };
        Ok(())
    }

    fn commit(&mut self, _ctx: &mut Context) -> Result<(), SimError> {
        if let Some(value) = self.pending.take() {
            self.state = value;
        }
        Ok(())
    }

    fn evaluate(&mut self, _ctx: &mut Context) -> Result<(), SimError> {
        self.ports.drive("q", self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::testing::{eval, feed, out};

    fn clock(reg: &mut Register, edge: Edge) {
        let mut ctx = Context::default();
        reg.sample(edge, &mut ctx).unwrap();
        reg.commit(&mut ctx).unwrap();
        reg.evaluate(&mut ctx).unwrap();
    }

    #[test]
    fn test_latch_on_rising_edge_only() {
        let mut reg = Register::new("r");
        let sigs = feed(&mut reg, &[("d", Bits::from_u32(7, 32))]);
        reg.reset().unwrap();
        eval(&mut reg);
        assert_eq!(out(&reg, "q").as_u32(), 0);
        clock(&mut reg, Edge::Falling);
        assert_eq!(out(&reg, "q").as_u32(), 0);
        clock(&mut reg, Edge::Rising);
        assert_eq!(out(&reg, "q").as_u32(), 7);
        // d changes between edges do not show
        sigs[0].drive(Bits::from_u32(9, 32)).unwrap();
        eval(&mut reg);
        assert_eq!(out(&reg, "q").as_u32(), 7);
    }

    #[test]
    fn test_flush_wins_over_write_enable() {
        let mut reg = Register::new("r");
        let sigs = feed(
            &mut reg,
            &[
                ("d", Bits::from_u32(0x5a, 8)),
                ("flush", Bits::from_bool(false)),
                ("write_enable", Bits::from_bool(false)),
            ],
        );
        reg.reset().unwrap();
        clock(&mut reg, Edge::Rising);
        assert_eq!(out(&reg, "q").as_u32(), 0, "stalled");
        sigs[2].drive(Bits::from_bool(true)).unwrap();
        clock(&mut reg, Edge::Rising);
        assert_eq!(out(&reg, "q").as_u32(), 0x5a);
        sigs[1].drive(Bits::from_bool(true)).unwrap();
        clock(&mut reg, Edge::Rising);
        assert_eq!(out(&reg, "q"), Bits::zero(8));
    }

    #[test]
    fn test_two_phase_swap() {
        // a.d <- b.q and b.d <- a.q swap on every edge
        let mut a = Register::new("a").with_width(8);
        let mut b = Register::new("b").with_width(8);
        a.bind("d", &b.output("q").unwrap()).unwrap();
        b.bind("d", &a.output("q").unwrap()).unwrap();
        a.reset().unwrap();
        b.reset().unwrap();
        a.state = Bits::from_u32(1, 8);
        b.state = Bits::from_u32(2, 8);
        eval(&mut a);
        eval(&mut b);

        let mut ctx = Context::default();
        a.sample(Edge::Rising, &mut ctx).unwrap();
        b.sample(Edge::Rising, &mut ctx).unwrap();
        a.commit(&mut ctx).unwrap();
        b.commit(&mut ctx).unwrap();
        eval(&mut a);
        eval(&mut b);
        assert_eq!(out(&a, "q").as_u32(), 2);
        assert_eq!(out(&b, "q").as_u32(), 1);
    }

    #[test]
    fn test_width_from_d() {
        let mut reg = Register::new("r");
        feed(&mut reg, &[("d", Bits::from_u32(0x3c, 6))]);
        reg.reset().unwrap();
        assert_eq!(out(&reg, "q"), Bits::zero(6));
        clock(&mut reg, Edge::Rising);
        assert_eq!(out(&reg, "q"), Bits::from_u32(0x3c, 6));
    }

    #[test]
    fn test_mismatched_d_is_rejected() {
        let mut reg = Register::new("r").with_width(8);
        feed(&mut reg, &[("d", Bits::from_u32(0x1234_5678, 32))]);
        reg.reset().unwrap();
        let mut ctx = Context::default();
        let err = reg.sample(Edge::Rising, &mut ctx).unwrap_err();
        assert_eq!(
            err,
            SimError::WidthMismatch {
                signal: "r.d".to_string(),
                expected: 8,
                found: 32,
            }
        );
        reg.commit(&mut ctx).unwrap();
        reg.evaluate(&mut ctx).unwrap();
        assert_eq!(out(&reg, "q"), Bits::zero(8));
    }
}
