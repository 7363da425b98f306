use std::fmt;

use crate::bits::Bits;
use crate::error::SimError;
use crate::framework::{Context, Ports, Unit};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Add,
    Or,
    And,
    Not,
    /// Shift `in0` left by the `const` input.
    Shift,
    /// One bit, set when `in0` is zero.
    IsZero,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Generic gate or adder over inputs `in0..` plus an optional `const` port.
pub struct OperationUnit {
    ports: Ports,
    op: Operation,
    inputs: usize,
    width: Option<u8>,
    resolved: u8,
}

impl OperationUnit {
    pub fn new(name: &str, op: Operation, inputs: usize) -> Self {
        let mut ports = Ports::new(name);
        for i in 0..inputs {
            ports = ports.with_input(format!("in{i}"));
        }
        Self {
            ports: ports.with_input("const").with_output("out"),
            op,
            inputs,
            width: None,
            resolved: 0,
        }
    }

    /// Fix the output width instead of following the widest input.
    pub fn with_width(mut self, width: u8) -> Self {
        self.width = Some(width);
        self
    }

    pub fn operation(&self) -> Operation {
        self.op
    }

    fn missing(&self, reason: &str) -> SimError {
        SimError::MissingOperand {
            unit: self.ports.unit().to_string(),
            reason: format!("{} {reason}", self.op),
        }
    }

    fn output_width(&self) -> u8 {
        if self.op == Operation::IsZero {
            return 1;
        }
        self.width.unwrap_or_else(|| {
            self.ports
                .inputs()
                .filter_map(|(_, signal)| signal.map(|s| s.width()))
                .max()
                .unwrap_or(0)
        })
    }
}

impl Unit for OperationUnit {
    unit_ports!(Operation);

    fn reset(&mut self) -> Result<(), SimError> {
        self.resolved = self.output_width();
        self.ports.reset_output("out", self.resolved)
    }

    fn evaluate(&mut self, _ctx: &mut Context) -> Result<(), SimError> {
        let mut operands = Vec::with_capacity(self.inputs + 1);
        for i in 0..self.inputs {
            operands.push(self.ports.read(&format!("in{i}"))?);
        }
        let constant = self.ports.input("const")?.map(|s| s.get());

        let result = match self.op {
            Operation::Add | Operation::Or | Operation::And => {
                operands.extend(constant);
                if operands.len() < 2 {
                    return Err(self.missing("needs at least two operands"));
                }
                let fold: fn(Bits, Bits) -> Bits = match self.op {
                    Operation::Add => |x: Bits, y: Bits| x + y,
                    Operation::Or => |x: Bits, y: Bits| x | y,
                    _ => |x: Bits, y: Bits| x & y,
                };
                operands.into_iter().reduce(fold).unwrap_or_default()
            }
            Operation::Not | Operation::IsZero => {
                let &[x] = operands.as_slice() else {
                    return Err(self.missing("takes exactly one input"));
                };
                if self.op == Operation::Not {
                    !x
                } else {
                    Bits::from_bool(x.is_zero())
                }
            }
            Operation::Shift => {
                let ([x], Some(amount)) = (&operands[..], constant) else {
                    return Err(self.missing("takes one input and a constant shift amount"));
                };
                x.shl(amount.as_u32())
            }
        };
        let width = if self.resolved == 0 {
            result.width()
        } else {
            self.resolved
        };
        self.ports.drive("out", result.resize(width))
    }
}
