//! The five-stage datapath.
//!
//! Branches and jumps resolve in decode. The comparator reads operands
//! through the forwarding muxes, which take results from execute (same
//! cycle), memory (EX/MEM register) or the register file, whose falling-edge
//! write covers write-back. Loads are not forwarded: the hazard unit stalls
//! decode until the load reaches write-back.

use crate::bits::Bits;
use crate::error::SimError;
use crate::framework::Circuit;
use crate::isa::RA;
use crate::store::WordStore;
use crate::units::*;

/// `(consumer, port, producer, output)`. Producer `const` names a constant.
type Wire = (&'static str, &'static str, &'static str, &'static str);

const CONSTANTS: [(&str, Bits); 4] = [
    ("four", Bits::new(4, 32)),
    ("two", Bits::new(2, 5)),
    ("zero2", Bits::new(0, 2)),
    ("ra", Bits::new(RA as u32, 5)),
];

/// Fields of the instruction in decode.
const INSTR_FIELDS: [(&str, u8, u8); 8] = [
    ("op", 26, 31),
    ("rs", 21, 25),
    ("rt", 16, 20),
    ("rd", 11, 15),
    ("sa", 6, 10),
    ("funct", 0, 5),
    ("imm", 0, 15),
    ("target", 0, 25),
];

/// Fields of the control word, see [`ControlWord`](crate::isa::ControlWord).
const CONTROL_FIELDS: [(&str, u8, u8); 14] = [
    ("ext_op", 15, 15),
    ("jump", 14, 14),
    ("jump_reg", 13, 13),
    ("reg_dst", 11, 12),
    ("alu_src", 10, 10),
    ("alu_op", 8, 9),
    ("beq", 7, 7),
    ("bne", 6, 6),
    ("bgez", 5, 5),
    ("bgtz", 4, 4),
    ("mem_write", 3, 3),
    ("reg_write", 2, 2),
    ("link", 1, 1),
    ("mem_read", 0, 0),
];

/// Pipeline registers: `(name, width, source, source port)`.
const IF_ID: [(&str, u8, &str, &str); 2] = [
    ("if_id_pc4", 32, "pc_plus4", "out"),
    ("if_id_instr", 32, "imem", "instruction"),
];

const ID_EX: [(&str, u8, &str, &str); 14] = [
    ("id_ex_a", 32, "fwd_a", "out"),
    ("id_ex_b", 32, "fwd_b", "out"),
    ("id_ex_imm", 32, "ext", "output"),
    ("id_ex_sa", 5, "id_split", "sa"),
    ("id_ex_funct", 6, "id_split", "funct"),
    ("id_ex_pc4", 32, "if_id_pc4", "q"),
    ("id_ex_dst", 5, "dst_mux", "out"),
    ("id_ex_alu_src", 1, "ctrl_split", "alu_src"),
    ("id_ex_alu_op", 2, "ctrl_split", "alu_op"),
    ("id_ex_mem_write", 1, "ctrl_split", "mem_write"),
    ("id_ex_mem_read", 1, "ctrl_split", "mem_read"),
    ("id_ex_reg_write", 1, "ctrl_split", "reg_write"),
    ("id_ex_link", 1, "ctrl_split", "link"),
    ("id_ex_instr", 32, "if_id_instr", "q"),
];

const EX_MEM: [(&str, u8, &str, &str); 7] = [
    ("ex_mem_result", 32, "ex_value", "out"),
    ("ex_mem_store", 32, "id_ex_b", "q"),
    ("ex_mem_dst", 5, "id_ex_dst", "q"),
    ("ex_mem_mem_write", 1, "id_ex_mem_write", "q"),
    ("ex_mem_mem_read", 1, "id_ex_mem_read", "q"),
    ("ex_mem_reg_write", 1, "id_ex_reg_write", "q"),
    ("ex_mem_instr", 32, "id_ex_instr", "q"),
];

const MEM_WB: [(&str, u8, &str, &str); 4] = [
    ("mem_wb_value", 32, "mem_value", "out"),
    ("mem_wb_dst", 5, "ex_mem_dst", "q"),
    ("mem_wb_reg_write", 1, "ex_mem_reg_write", "q"),
    ("mem_wb_instr", 32, "ex_mem_instr", "q"),
];

const WIRES: &[Wire] = &[
    // fetch
    ("pc", "d", "m3", "out"),
    ("pc", "write_enable", "hazard", "pc_write"),
    ("imem", "addr", "pc", "q"),
    ("pc_plus4", "in0", "pc", "q"),
    ("pc_plus4", "const", "const", "four"),
    // decode
    ("id_split", "in", "if_id_instr", "q"),
    ("control", "opcode", "id_split", "op"),
    ("ctrl_split", "in", "control", "control"),
    ("regs", "read_addr1", "id_split", "rs"),
    ("regs", "read_addr2", "id_split", "rt"),
    ("regs", "write_addr", "mem_wb_dst", "q"),
    ("regs", "write_data", "mem_wb_value", "q"),
    ("regs", "reg_write", "mem_wb_reg_write", "q"),
    ("ext", "input", "id_split", "imm"),
    ("ext", "signed", "ctrl_split", "ext_op"),
    ("hazard", "rs", "id_split", "rs"),
    ("hazard", "rt", "id_split", "rt"),
    ("hazard", "rd_ex", "id_ex_dst", "q"),
    ("hazard", "mem_read_ex", "id_ex_mem_read", "q"),
    ("hazard", "rd_mem", "ex_mem_dst", "q"),
    ("hazard", "mem_read_mem", "ex_mem_mem_read", "q"),
    ("forward", "rs", "id_split", "rs"),
    ("forward", "rt", "id_split", "rt"),
    ("forward", "rd_ex", "id_ex_dst", "q"),
    ("forward", "reg_write_ex", "id_ex_reg_write", "q"),
    ("forward", "rd_mem", "ex_mem_dst", "q"),
    ("forward", "reg_write_mem", "ex_mem_reg_write", "q"),
    ("fwd_a", "sel", "forward", "forward_a"),
    ("fwd_a", "in0", "regs", "read_data1"),
    ("fwd_a", "in1", "ex_value", "out"),
    ("fwd_a", "in2", "ex_mem_result", "q"),
    ("fwd_b", "sel", "forward", "forward_b"),
    ("fwd_b", "in0", "regs", "read_data2"),
    ("fwd_b", "in1", "ex_value", "out"),
    ("fwd_b", "in2", "ex_mem_result", "q"),
    ("cmp", "a", "fwd_a", "out"),
    ("cmp", "b", "fwd_b", "out"),
    ("br_eq", "in0", "ctrl_split", "beq"),
    ("br_eq", "in1", "cmp", "equal"),
    ("br_ne", "in0", "ctrl_split", "bne"),
    ("br_ne", "in1", "cmp", "not_equal"),
    ("br_gez", "in0", "ctrl_split", "bgez"),
    ("br_gez", "in1", "cmp", "greater_equal"),
    ("br_gtz", "in0", "ctrl_split", "bgtz"),
    ("br_gtz", "in1", "cmp", "greater"),
    ("branch_taken", "in0", "br_eq", "out"),
    ("branch_taken", "in1", "br_ne", "out"),
    ("branch_taken", "in2", "br_gez", "out"),
    ("branch_taken", "in3", "br_gtz", "out"),
    ("br_offset", "in0", "ext", "output"),
    ("br_offset", "const", "const", "two"),
    ("br_target", "in0", "if_id_pc4", "q"),
    ("br_target", "in1", "br_offset", "out"),
    ("pc4_split", "in", "if_id_pc4", "q"),
    ("jump_target", "in0", "const", "zero2"),
    ("jump_target", "in1", "id_split", "target"),
    ("jump_target", "in2", "pc4_split", "hi"),
    ("m1", "sel", "branch_taken", "out"),
    ("m1", "in0", "pc_plus4", "out"),
    ("m1", "in1", "br_target", "out"),
    ("m2", "sel", "ctrl_split", "jump"),
    ("m2", "in0", "m1", "out"),
    ("m2", "in1", "jump_target", "out"),
    ("m3", "sel", "ctrl_split", "jump_reg"),
    ("m3", "in0", "m2", "out"),
    ("m3", "in1", "fwd_a", "out"),
    ("redirect", "in0", "branch_taken", "out"),
    ("redirect", "in1", "ctrl_split", "jump"),
    ("redirect", "in2", "ctrl_split", "jump_reg"),
    ("if_flush", "in0", "redirect", "out"),
    ("if_flush", "in1", "hazard", "pc_write"),
    ("dst_mux", "sel", "ctrl_split", "reg_dst"),
    ("dst_mux", "in0", "id_split", "rt"),
    ("dst_mux", "in1", "id_split", "rd"),
    ("dst_mux", "in2", "const", "ra"),
    // execute
    ("alu_b_mux", "sel", "id_ex_alu_src", "q"),
    ("alu_b_mux", "in0", "id_ex_b", "q"),
    ("alu_b_mux", "in1", "id_ex_imm", "q"),
    ("alu_control", "func", "id_ex_funct", "q"),
    ("alu_control", "alu_op", "id_ex_alu_op", "q"),
    ("alu", "a", "id_ex_a", "q"),
    ("alu", "b", "alu_b_mux", "out"),
    ("alu", "alu_ctrl", "alu_control", "alu_ctrl"),
    ("alu", "sa", "id_ex_sa", "q"),
    ("ex_value", "sel", "id_ex_link", "q"),
    ("ex_value", "in0", "alu", "result"),
    ("ex_value", "in1", "id_ex_pc4", "q"),
    // memory
    ("dmem", "addr", "ex_mem_result", "q"),
    ("dmem", "write_data", "ex_mem_store", "q"),
    ("dmem", "mem_write", "ex_mem_mem_write", "q"),
    ("dmem", "mem_read", "ex_mem_mem_read", "q"),
    ("mem_value", "sel", "ex_mem_mem_read", "q"),
    ("mem_value", "in0", "ex_mem_result", "q"),
    ("mem_value", "in1", "dmem", "read_data"),
];

/// Instantiate every unit of the datapath into `circuit` and wire them up.
/// Returns the register file contents handle.
pub(crate) fn build(
    circuit: &mut Circuit,
    program: WordStore,
    data: WordStore,
) -> Result<WordStore, SimError> {
    for (name, value) in CONSTANTS {
        circuit.constant(name, value);
    }

    // fetch
    circuit.add(Register::new("pc").with_width(32))?;
    circuit.add(InstructionMemory::new("imem", program))?;
    circuit.add(OperationUnit::new("pc_plus4", Operation::Add, 1))?;

    // decode
    circuit.add(Splitter::named("id_split", &INSTR_FIELDS)?)?;
    circuit.add(MainControl::new("control"))?;
    circuit.add(Splitter::named("ctrl_split", &CONTROL_FIELDS)?)?;
    let regs = RegisterFile::new("regs");
    let reg_store = regs.store();
    circuit.add(regs)?;
    circuit.add(Extender::new("ext"))?;
    circuit.add(HazardUnit::new("hazard"))?;
    circuit.add(ForwardingUnit::new("forward"))?;
    circuit.add(Mux::new("fwd_a", 3))?;
    circuit.add(Mux::new("fwd_b", 3))?;
    circuit.add(Comparator::new("cmp"))?;
    for name in ["br_eq", "br_ne", "br_gez", "br_gtz"] {
        circuit.add(OperationUnit::new(name, Operation::And, 2))?;
    }
    circuit.add(OperationUnit::new("branch_taken", Operation::Or, 4))?;
    circuit.add(OperationUnit::new("br_offset", Operation::Shift, 1).with_width(32))?;
    circuit.add(OperationUnit::new("br_target", Operation::Add, 2))?;
    circuit.add(Splitter::named("pc4_split", &[("hi", 28, 31)])?)?;
    circuit.add(Concatenator::new("jump_target", 3))?;
    circuit.add(Mux::new("m1", 2))?;
    circuit.add(Mux::new("m2", 2))?;
    circuit.add(Mux::new("m3", 2))?;
    circuit.add(OperationUnit::new("redirect", Operation::Or, 3))?;
    circuit.add(OperationUnit::new("if_flush", Operation::And, 2))?;
    circuit.add(Mux::new("dst_mux", 3))?;

    // execute
    circuit.add(Mux::new("alu_b_mux", 2))?;
    circuit.add(AluControl::new("alu_control"))?;
    circuit.add(Alu::new("alu"))?;
    circuit.add(Mux::new("ex_value", 2))?;

    // memory
    circuit.add(DataMemory::new("dmem", data))?;
    circuit.add(Mux::new("mem_value", 2))?;

    for (name, width, src, port) in IF_ID {
        circuit.add(Register::new(name).with_width(width))?;
        circuit.connect(name, "d", src, port)?;
        circuit.connect(name, "write_enable", "hazard", "if_id_write")?;
        circuit.connect(name, "flush", "if_flush", "out")?;
    }
    for (name, width, src, port) in ID_EX {
        circuit.add(Register::new(name).with_width(width))?;
        circuit.connect(name, "d", src, port)?;
        circuit.connect(name, "flush", "hazard", "bubble")?;
    }
    for (name, width, src, port) in EX_MEM.into_iter().chain(MEM_WB) {
        circuit.add(Register::new(name).with_width(width))?;
        circuit.connect(name, "d", src, port)?;
    }

    for &(consumer, port, producer, out) in WIRES {
        circuit.connect(consumer, port, producer, out)?;
    }
    circuit.build()?;
    Ok(reg_store)
}
