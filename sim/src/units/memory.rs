//! Word-addressed memories. A byte address selects word `address >> 2`.
//! Reset leaves the contents alone; they belong to whoever loaded them.

use crate::bits::Bits;
use crate::error::{SimError, Warning};
use crate::framework::{Context, Edge, Ports, Unit};
use crate::store::WordStore;

fn out_of_range(unit: &str, address: u32, size: usize, write: bool) -> Warning {
    Warning::AddressOutOfRange {
        unit: unit.to_string(),
        address,
        size,
        write,
    }
}

/// Read-only program memory: `addr` to `instruction`.
pub struct InstructionMemory {
    ports: Ports,
    store: WordStore,
}

impl InstructionMemory {
    pub fn new(name: &str, store: WordStore) -> Self {
        Self {
            ports: Ports::new(name).with_input("addr").with_output("instruction"),
            store,
        }
    }

    pub fn store(&self) -> WordStore {
        self.store.clone()
    }
}

impl Unit for InstructionMemory {
    unit_ports!(InstructionMemory);

    fn reset(&mut self) -> Result<(), SimError> {
        self.ports.reset_output("instruction", 32)
    }

    fn evaluate(&mut self, ctx: &mut Context) -> Result<(), SimError> {
        let address = self.ports.read("addr")?.as_u32();
        let word = match self.store.read((address >> 2) as usize) {
            Some(word) => word,
            None => {
                ctx.warn(out_of_range(
                    self.ports.unit(),
                    address,
                    self.store.len(),
                    false,
                ));
                0
            }
        };
        self.ports.drive("instruction", Bits::from_u32(word, 32))
    }
}

/// Data memory with a combinational read port (`addr` to `read_data`) and a
/// write port (`write_data`, `mem_write`) committed on the rising edge.
/// The read port publishes every tick. The optional `mem_read` input marks
/// real loads: while it is low an address outside the memory reads zero
/// without a warning.
pub struct DataMemory {
    ports: Ports,
    store: WordStore,
    pending: Option<(u32, u32)>,
}

impl DataMemory {
    pub fn new(name: &str, store: WordStore) -> Self {
        Self {
            ports: Ports::new(name)
                .with_input("addr")
                .with_input("write_data")
                .with_input("mem_write")
                .with_input("mem_read")
                .with_output("read_data"),
            store,
            pending: None,
        }
    }

    pub fn store(&self) -> WordStore {
        self.store.clone()
    }
}

impl Unit for DataMemory {
    unit_ports!(DataMemory);

    fn combinational(&self, port: &str) -> bool {
        port == "addr" || port == "mem_read"
    }

    fn reset(&mut self) -> Result<(), SimError> {
        self.pending = None;
        self.ports.reset_output("read_data", 32)
    }

    fn sample(&mut self, edge: Edge, _ctx: &mut Context) -> Result<(), SimError> {
        self.pending = None;
        if edge == Edge::Rising && self.ports.read_bool("mem_write")? {
            let address = self.ports.read("addr")?.as_u32();
            let data = self.ports.read("write_data")?.as_u32();
            self.pending = Some((address, data));
        }
        Ok(())
    }

    fn commit(&mut self, ctx: &mut Context) -> Result<(), SimError> {
        if let Some((address, data)) = self.pending.take() {
            if self.store.write((address >> 2) as usize, data) {
                tracing::info!("write memory: addr = {:#x}, data = {:#x}", address, data);
            } else {
                ctx.warn(out_of_range(
                    self.ports.unit(),
                    address,
                    self.store.len(),
                    true,
                ));
            }
        }
        Ok(())
    }

    fn evaluate(&mut self, ctx: &mut Context) -> Result<(), SimError> {
        let load = self
            .ports
            .read_or("mem_read", Bits::from_bool(true))?
            .as_bool();
        let address = self.ports.read("addr")?.as_u32();
        let word = match self.store.read((address >> 2) as usize) {
            Some(word) => word,
            None if !load => 0,
            None => {
                ctx.warn(out_of_range(
                    self.ports.unit(),
                    address,
                    self.store.len(),
                    false,
                ));
                0
            }
        };
        self.ports.drive("read_data", Bits::from_u32(word, 32))
    }
}
