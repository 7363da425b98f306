//! Instruction set of the simulated MIPS subset: encodings, the main decoder
//! table and disassembly.

use std::fmt;

macro_rules! define_code {
    {
        @mod $modname:ident;
        @type $typ:ty;
        $( $(#[$attr:meta])* $cname:ident = $cval:expr; )*
    } => {
        pub mod $modname {
            $( $(#[$attr])* pub const $cname : $typ = $cval; )*
            #[allow(unused)]
            pub fn name_of(code: $typ) -> &'static str {
                match code {
                    $($cname => stringify!($cname), )*
                    _ => "no name"
                }
            }
        }
    };
}

define_code! {
    @mod op_code;
    @type u32;
    /// all R-type arithmetic and shifts
    RTYPE = 0x00;
    BGEZ = 0x01;
    J = 0x02;
    JAL = 0x03;
    BEQ = 0x04;
    BNE = 0x05;
    BGTZ = 0x07;
    ADDI = 0x08;
    JR = 0x1a;
    LW = 0x23;
    SW = 0x2b;
}

define_code! {
    @mod func_code;
    @type u32;
    SLL = 0x00;
    SRL = 0x02;
    SRA = 0x03;
    ADD = 0x20;
    SUB = 0x22;
    AND = 0x24;
    OR = 0x25;
    XOR = 0x26;
}

define_code! {
    @mod alu_ctrl;
    @type u32;
    ADD = 0;
    SUB = 1;
    SLL = 2;
    SRL = 3;
    SRA = 4;
    AND = 5;
    OR = 6;
    XOR = 7;
}

define_code! {
    @mod alu_op;
    @type u32;
    /// dispatch on the function field
    RTYPE = 0;
    ADD = 1;
    SUB = 2;
    NONE = 3;
}

/// Map an R-type function field to the ALU operation.
pub fn alu_ctrl_of(func: u32) -> Option<u32> {
    Some(match func {
        func_code::ADD => alu_ctrl::ADD,
        func_code::SUB => alu_ctrl::SUB,
        func_code::SLL => alu_ctrl::SLL,
        func_code::SRL => alu_ctrl::SRL,
        func_code::SRA => alu_ctrl::SRA,
        func_code::AND => alu_ctrl::AND,
        func_code::OR => alu_ctrl::OR,
        func_code::XOR => alu_ctrl::XOR,
        _ => return None,
    })
}

pub const REG_NAMES: [&str; 32] = [
    "$zero", "$at", "$v0", "$v1", "$a0", "$a1", "$a2", "$a3", "$t0", "$t1", "$t2", "$t3", "$t4",
    "$t5", "$t6", "$t7", "$s0", "$s1", "$s2", "$s3", "$s4", "$s5", "$s6", "$s7", "$t8", "$t9",
    "$k0", "$k1", "$gp", "$sp", "$fp", "$ra",
];

/// Link register written by `jal`.
pub const RA: u8 = 31;

pub fn reg_name(reg: u8) -> &'static str {
    REG_NAMES.get(reg as usize).copied().unwrap_or("$?")
}

/// Accepts symbolic (`$t0`) and numeric (`$8`) register names.
pub fn reg_number(name: &str) -> Option<u8> {
    let name = name.to_ascii_lowercase();
    if let Some(i) = REG_NAMES.iter().position(|r| *r == name) {
        return Some(i as u8);
    }
    let n: u8 = name.strip_prefix('$')?.parse().ok()?;
    (n < 32).then_some(n)
}

/// Output of the main decoder.
///
/// Bit layout, high to low: ext_op, jump, jump_reg, reg_dst (2), alu_src,
/// alu_op (2), beq, bne, bgez, bgtz, mem_write, reg_write, mem_to_reg (2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControlWord(pub u16);

impl ControlWord {
    pub fn for_opcode(opcode: u32) -> Option<Self> {
        let word = match opcode {
            op_code::RTYPE => 0x0804,
            op_code::JR => 0x2000,
            op_code::ADDI => 0x8504,
            op_code::LW => 0x8505,
            op_code::SW => 0x8508,
            op_code::BEQ => 0x8280,
            op_code::BNE => 0x8240,
            op_code::BGEZ => 0x8220,
            op_code::BGTZ => 0x8210,
            op_code::J => 0x4300,
            op_code::JAL => 0x5306,
            _ => return None,
        };
        Some(Self(word))
    }

    fn flag(self, bit: u32) -> bool {
        self.0 >> bit & 1 == 1
    }

    /// Sign-extend the immediate.
    pub fn ext_op(self) -> bool {
        self.flag(15)
    }
    pub fn jump(self) -> bool {
        self.flag(14)
    }
    pub fn jump_reg(self) -> bool {
        self.flag(13)
    }
    /// 0 = rt, 1 = rd, 2 = $ra
    pub fn reg_dst(self) -> u32 {
        (self.0 as u32 >> 11) & 0b11
    }
    /// Second ALU operand is the immediate.
    pub fn alu_src(self) -> bool {
        self.flag(10)
    }
    pub fn alu_op(self) -> u32 {
        (self.0 as u32 >> 8) & 0b11
    }
    pub fn branch_eq(self) -> bool {
        self.flag(7)
    }
    pub fn branch_ne(self) -> bool {
        self.flag(6)
    }
    pub fn branch_gez(self) -> bool {
        self.flag(5)
    }
    pub fn branch_gtz(self) -> bool {
        self.flag(4)
    }
    pub fn mem_write(self) -> bool {
        self.flag(3)
    }
    pub fn reg_write(self) -> bool {
        self.flag(2)
    }
    /// 0 = ALU result, 1 = memory, 2 = PC + 4
    pub fn mem_to_reg(self) -> u32 {
        self.0 as u32 & 0b11
    }
    pub fn mem_read(self) -> bool {
        self.flag(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    UnsupportedOpcode(u32),
    UnsupportedFunction(u32),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::UnsupportedOpcode(op) => write!(f, "opcode {op:#08b} is not supported"),
            DecodeError::UnsupportedFunction(func) => {
                write!(f, "func {func:#08b} is not supported")
            }
        }
    }
}

impl std::error::Error for DecodeError {}

/// A decoded instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instr {
    Nop,
    /// add, sub, and, or, xor
    Arith { func: u32, rd: u8, rs: u8, rt: u8 },
    /// sll, srl, sra
    Shift { func: u32, rd: u8, rt: u8, sa: u8 },
    Jr { rs: u8 },
    Addi { rt: u8, rs: u8, imm: i16 },
    /// lw or sw
    Mem { op: u32, rt: u8, base: u8, offset: i16 },
    /// Offset in words relative to the following instruction. `rt` is zero
    /// for bgez and bgtz.
    Branch { op: u32, rs: u8, rt: u8, offset: i16 },
    /// j or jal; `target` is a word address.
    Jump { op: u32, target: u32 },
}

fn field(word: u32, lo: u32, len: u32) -> u32 {
    (word >> lo) & ((1 << len) - 1)
}

impl Instr {
    pub fn decode(word: u32) -> Result<Self, DecodeError> {
        if word == 0 {
            return Ok(Instr::Nop);
        }
        let op = field(word, 26, 6);
        let rs = field(word, 21, 5) as u8;
        let rt = field(word, 16, 5) as u8;
        let rd = field(word, 11, 5) as u8;
        let sa = field(word, 6, 5) as u8;
        let func = field(word, 0, 6);
        let imm = word as u16 as i16;
        use op_code::*;
        Ok(match op {
            RTYPE => match func {
                func_code::SLL | func_code::SRL | func_code::SRA => {
                    Instr::Shift { func, rd, rt, sa }
                }
                _ if alu_ctrl_of(func).is_some() => Instr::Arith { func, rd, rs, rt },
                _ => return Err(DecodeError::UnsupportedFunction(func)),
            },
            JR => Instr::Jr { rs },
            ADDI => Instr::Addi { rt, rs, imm },
            LW | SW => Instr::Mem {
                op,
                rt,
                base: rs,
                offset: imm,
            },
            BEQ | BNE | BGEZ | BGTZ => Instr::Branch {
                op,
                rs,
                rt,
                offset: imm,
            },
            J | JAL => Instr::Jump {
                op,
                target: field(word, 0, 26),
            },
            _ => return Err(DecodeError::UnsupportedOpcode(op)),
        })
    }

    pub fn encode(self) -> u32 {
        let r = |rs: u8, rt: u8, rd: u8, sa: u8, func: u32| {
            (rs as u32) << 21 | (rt as u32) << 16 | (rd as u32) << 11 | (sa as u32) << 6 | func
        };
        let i = |op: u32, rs: u8, rt: u8, imm: i16| {
            op << 26 | (rs as u32) << 21 | (rt as u32) << 16 | imm as u16 as u32
        };
        match self {
            Instr::Nop => 0,
            Instr::Arith { func, rd, rs, rt } => r(rs, rt, rd, 0, func),
            Instr::Shift { func, rd, rt, sa } => r(0, rt, rd, sa, func),
            Instr::Jr { rs } => i(op_code::JR, rs, 0, 0),
            Instr::Addi { rt, rs, imm } => i(op_code::ADDI, rs, rt, imm),
            Instr::Mem {
                op,
                rt,
                base,
                offset,
            } => i(op, base, rt, offset),
            Instr::Branch { op, rs, rt, offset } => i(op, rs, rt, offset),
            Instr::Jump { op, target } => op << 26 | (target & 0x03ff_ffff),
        }
    }

    pub fn mnemonic(self) -> String {
        let name = match self {
            Instr::Nop => "NOP",
            Instr::Arith { func, .. } | Instr::Shift { func, .. } => func_code::name_of(func),
            Instr::Jr { .. } => op_code::name_of(op_code::JR),
            Instr::Addi { .. } => op_code::name_of(op_code::ADDI),
            Instr::Mem { op, .. } | Instr::Branch { op, .. } | Instr::Jump { op, .. } => {
                op_code::name_of(op)
            }
        };
        name.to_lowercase()
    }
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.mnemonic();
        let n = reg_name;
        match *self {
            Instr::Nop => f.write_str(&m),
            Instr::Arith { rd, rs, rt, .. } => write!(f, "{m} {}, {}, {}", n(rd), n(rs), n(rt)),
            Instr::Shift { rd, rt, sa, .. } => write!(f, "{m} {}, {}, {sa}", n(rd), n(rt)),
            Instr::Jr { rs } => write!(f, "{m} {}", n(rs)),
            Instr::Addi { rt, rs, imm } => write!(f, "{m} {}, {}, {imm}", n(rt), n(rs)),
            Instr::Mem {
                rt, base, offset, ..
            } => write!(f, "{m} {}, {offset}({})", n(rt), n(base)),
            Instr::Branch {
                op: op_code::BEQ | op_code::BNE,
                rs,
                rt,
                offset,
            } => write!(f, "{m} {}, {}, {offset}", n(rs), n(rt)),
            Instr::Branch { rs, offset, .. } => write!(f, "{m} {}, {offset}", n(rs)),
            Instr::Jump { target, .. } => write!(f, "{m} {target}"),
        }
    }
}

/// Render a word as assembly text.
pub fn disassemble(word: u32) -> Result<String, DecodeError> {
    Ok(Instr::decode(word)?.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_fields() {
        let lw = ControlWord::for_opcode(op_code::LW).unwrap();
        assert_eq!(lw.0, 0x8505);
        assert!(lw.ext_op() && lw.alu_src() && lw.reg_write() && lw.mem_read());
        assert!(!lw.mem_write() && !lw.jump() && !lw.branch_eq());
        assert_eq!(lw.reg_dst(), 0);
        assert_eq!(lw.alu_op(), alu_op::ADD);
        assert_eq!(lw.mem_to_reg(), 1);

        let jal = ControlWord::for_opcode(op_code::JAL).unwrap();
        assert!(jal.jump() && jal.reg_write());
        assert_eq!(jal.reg_dst(), 2);
        assert_eq!(jal.mem_to_reg(), 2);
        assert!(!jal.mem_read());

        assert_eq!(ControlWord::for_opcode(0x3f), None);
    }

    #[test]
    fn test_registers() {
        assert_eq!(reg_number("$zero"), Some(0));
        assert_eq!(reg_number("$T0"), Some(8));
        assert_eq!(reg_number("$31"), Some(31));
        assert_eq!(reg_number("$32"), None);
        assert_eq!(reg_number("t0"), None);
        assert_eq!(reg_name(RA), "$ra");
    }

    #[test]
    fn test_disassemble() {
        assert_eq!(disassemble(0).unwrap(), "nop");
        // lw $t2, 4($t0)
        assert_eq!(disassemble(0x8d0a_0004).unwrap(), "lw $t2, 4($t0)");
        // add $t3, $t1, $t2
        assert_eq!(disassemble(0x012a_5820).unwrap(), "add $t3, $t1, $t2");
        // sra $t0, $t1, 3
        assert_eq!(disassemble(0x0009_40c3).unwrap(), "sra $t0, $t1, 3");
        // bne $t0, $zero, -2
        assert_eq!(disassemble(0x1500_fffe).unwrap(), "bne $t0, $zero, -2");
        assert_eq!(disassemble(0x0500_0003).unwrap(), "bgez $t0, 3");
        assert_eq!(disassemble(0x0c00_0010).unwrap(), "jal 16");
        assert_eq!(disassemble(0x6900_0000).unwrap(), "jr $t0");
        assert_eq!(
            disassemble(0x0000_0001),
            Err(DecodeError::UnsupportedFunction(1))
        );
        assert_eq!(
            disassemble(0xfc00_0000),
            Err(DecodeError::UnsupportedOpcode(0x3f))
        );
    }

    #[test]
    fn test_encode_fields() {
        let w = Instr::Mem {
            op: op_code::SW,
            rt: 9,
            base: 29,
            offset: -4,
        }
        .encode();
        assert_eq!(w >> 26, op_code::SW);
        assert_eq!((w >> 21) & 0x1f, 29);
        assert_eq!((w >> 16) & 0x1f, 9);
        assert_eq!(w & 0xffff, 0xfffc);
        assert_eq!(Instr::decode(w).unwrap().to_string(), "sw $t1, -4($sp)");
    }
}
