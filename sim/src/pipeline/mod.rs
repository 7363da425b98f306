//! The MIPS five-stage pipeline assembled from the unit library.
mod datapath;

use std::fmt;

use crate::config::SimConfig;
use crate::error::{Fault, SimError, Warning};
use crate::framework::{Circuit, Clock, TickReport};
use crate::isa::disassemble;
use crate::store::WordStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetch,
    Decode,
    Execute,
    Memory,
    WriteBack,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Fetch,
        Stage::Decode,
        Stage::Execute,
        Stage::Memory,
        Stage::WriteBack,
    ];

    pub fn abbr(self) -> &'static str {
        match self {
            Stage::Fetch => "IF",
            Stage::Decode => "ID",
            Stage::Execute => "EX",
            Stage::Memory => "MEM",
            Stage::WriteBack => "WB",
        }
    }

    /// Signal carrying the instruction word held by this stage.
    fn signal(self) -> &'static str {
        match self {
            Stage::Fetch => "imem.instruction",
            Stage::Decode => "if_id_instr.q",
            Stage::Execute => "id_ex_instr.q",
            Stage::Memory => "ex_mem_instr.q",
            Stage::WriteBack => "mem_wb_instr.q",
        }
    }
}

/// The instruction occupying a stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageView {
    pub stage: Stage,
    pub word: u32,
    pub text: String,
}

impl fmt::Display for StageView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<3} {:#010x}  {}", self.stage.abbr(), self.word, self.text)
    }
}

/// Outcome of [`Pipeline::run`].
#[derive(Debug, Default, Clone)]
pub struct RunSummary {
    pub cycles: u64,
    /// Whether the pipeline emptied before the cycle limit.
    pub drained: bool,
    pub faults: Vec<Fault>,
    pub warnings: Vec<Warning>,
}

/// A MIPS pipeline with its program, data and register stores.
pub struct Pipeline {
    circuit: Circuit,
    program: WordStore,
    data: WordStore,
    regs: WordStore,
    data_words: usize,
    cycles: u64,
}

impl Pipeline {
    pub fn new(config: &SimConfig) -> Result<Self, SimError> {
        let program = WordStore::default();
        let data = WordStore::new(config.memory.data_words);
        let mut circuit = Circuit::new(Clock::new(config.clock.half_period));
        let regs = datapath::build(&mut circuit, program.clone(), data.clone())?;
        let mut pipeline = Self {
            circuit,
            program,
            data,
            regs,
            data_words: config.memory.data_words,
            cycles: 0,
        };
        pipeline.reset()?;
        Ok(pipeline)
    }

    /// Clear the registers and every pipeline stage. Memory contents stay.
    pub fn reset(&mut self) -> Result<TickReport, SimError> {
        self.cycles = 0;
        self.circuit.reset()
    }

    /// Replace the program and restart from address 0.
    pub fn load_program(&mut self, words: Vec<u32>) -> Result<TickReport, SimError> {
        tracing::info!(words = words.len(), "program loaded");
        self.program.replace(words);
        self.reset()
    }

    /// Replace the data memory contents and restart. The memory keeps its
    /// configured size; extra words are dropped and missing ones are zero.
    pub fn load_data(&mut self, mut words: Vec<u32>) -> Result<TickReport, SimError> {
        if words.len() > self.data_words {
            tracing::warn!(
                words = words.len(),
                size = self.data_words,
                "data image truncated"
            );
        }
        words.resize(self.data_words, 0);
        self.data.replace(words);
        self.reset()
    }

    pub fn tick(&mut self) -> Result<TickReport, SimError> {
        self.circuit.tick()
    }

    /// Run one full clock cycle: a rising and a falling edge.
    pub fn step_cycle(&mut self) -> Result<Vec<TickReport>, SimError> {
        let reports = self.circuit.step_cycle()?;
        self.cycles += 1;
        tracing::debug!(cycle = self.cycles, pc = self.pc(), "cycle done");
        Ok(reports)
    }

    /// Step cycles until the pipeline drains or `max_cycles` have run.
    pub fn run(&mut self, max_cycles: u64) -> Result<RunSummary, SimError> {
        self.run_with(max_cycles, |_| {})
    }

    /// Like [`Pipeline::run`], calling `observe` after every cycle.
    pub fn run_with(
        &mut self,
        max_cycles: u64,
        mut observe: impl FnMut(&Pipeline),
    ) -> Result<RunSummary, SimError> {
        let mut summary = RunSummary::default();
        while summary.cycles < max_cycles && !self.is_drained() {
            for report in self.step_cycle()? {
                summary.faults.extend(report.faults);
                summary.warnings.extend(report.warnings);
            }
            summary.cycles += 1;
            observe(self);
        }
        summary.drained = self.is_drained();
        Ok(summary)
    }

    fn word(&self, signal: &str) -> u32 {
        self.circuit
            .signal(signal)
            .map_or(0, |s| s.get().as_u32())
    }

    pub fn pc(&self) -> u32 {
        self.word("pc.q")
    }

    /// Cycles run since the last reset.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// The program counter has left the program and no stage holds an
    /// instruction.
    pub fn is_drained(&self) -> bool {
        let end = self.program.len() as u64 * 4;
        self.pc() as u64 >= end
            && Stage::ALL[1..]
                .iter()
                .all(|stage| self.word(stage.signal()) == 0)
    }

    pub fn stages(&self) -> Vec<StageView> {
        Stage::ALL
            .iter()
            .map(|&stage| {
                let word = self.word(stage.signal());
                let text = disassemble(word).unwrap_or_else(|_| "???".to_string());
                StageView { stage, word, text }
            })
            .collect()
    }

    pub fn registers(&self) -> Vec<u32> {
        self.regs.words()
    }

    pub fn data_memory(&self) -> Vec<u32> {
        self.data.words()
    }

    /// Handle for editing the program in place.
    pub fn program_store(&self) -> WordStore {
        self.program.clone()
    }

    pub fn data_store(&self) -> WordStore {
        self.data.clone()
    }

    pub fn register_store(&self) -> WordStore {
        self.regs.clone()
    }

    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    pub fn circuit_mut(&mut self) -> &mut Circuit {
        &mut self.circuit
    }
}
