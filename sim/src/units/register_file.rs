use crate::bits::Bits;
use crate::error::{SimError, Warning};
use crate::framework::{Context, Edge, Ports, Unit};
use crate::isa::reg_name;
use crate::store::WordStore;

pub const REG_COUNT: usize = 32;

/// 32 x 32-bit register file.
///
/// Two combinational read ports (`read_addr1/2` to `read_data1/2`) and one
/// write port (`write_addr`, `write_data`, `reg_write`) committed on the
/// falling edge, so a value written back in the second half of a cycle is
/// read by decode in the same cycle. Register 0 is an ordinary register.
pub struct RegisterFile {
    ports: Ports,
    regs: WordStore,
    pending: Option<(usize, u32)>,
}

impl RegisterFile {
    pub fn new(name: &str) -> Self {
        Self {
            ports: Ports::new(name)
                .with_input("read_addr1")
                .with_input("read_addr2")
                .with_input("write_addr")
                .with_input("write_data")
                .with_input("reg_write")
                .with_output("read_data1")
                .with_output("read_data2"),
            regs: WordStore::new(REG_COUNT),
            pending: None,
        }
    }

    /// Shared handle on the register contents.
    pub fn store(&self) -> WordStore {
        self.regs.clone()
    }

    /// Replace the contents, padded or cut to [`REG_COUNT`] registers.
    pub fn replace(&self, mut words: Vec<u32>) {
        words.resize(REG_COUNT, 0);
        self.regs.replace(words);
    }

    fn out_of_range(&self, address: u32, write: bool) -> Warning {
        Warning::AddressOutOfRange {
            unit: self.ports.unit().to_string(),
            address,
            size: self.regs.len(),
            write,
        }
    }

    fn read_port(&self, addr_port: &str, ctx: &mut Context) -> Result<Bits, SimError> {
        let address = self.ports.read(addr_port)?.as_u32();
        let index = address as usize;
        if index >= REG_COUNT {
            ctx.warn(self.out_of_range(address, false));
        }
        // the shared store may have been resized from outside
        let word = match self.regs.read(index % REG_COUNT) {
            Some(word) => word,
            None => {
                if index < REG_COUNT {
                    ctx.warn(self.out_of_range(address, false));
                }
                0
            }
        };
        Ok(Bits::from_u32(word, 32))
    }
}

impl Unit for RegisterFile {
    unit_ports!(RegisterFile);

    fn combinational(&self, port: &str) -> bool {
        port.starts_with("read_addr")
    }

    fn reset(&mut self) -> Result<(), SimError> {
        self.replace(Vec::new());
        self.pending = None;
        self.ports.reset_output("read_data1", 32)?;
        self.ports.reset_output("read_data2", 32)
    }

    fn sample(&mut self, edge: Edge, ctx: &mut Context) -> Result<(), SimError> {
        self.pending = None;
        if edge != Edge::Falling || !self.ports.read_bool("reg_write")? {
            return Ok(());
        }
        let address = self.ports.read("write_addr")?.as_u32();
        let data = self.ports.read("write_data")?.as_u32();
        if address as usize >= REG_COUNT {
            ctx.warn(self.out_of_range(address, true));
            return Ok(());
        }
        self.pending = Some((address as usize, data));
        Ok(())
    }

    fn commit(&mut self, ctx: &mut Context) -> Result<(), SimError> {
        if let Some((index, data)) = self.pending.take() {
            if self.regs.write(index, data) {
                tracing::info!(
                    "write back: {} = {:#x}",
                    reg_name(index as u8),
                    data
                );
            } else {
                ctx.warn(self.out_of_range(index as u32, true));
            }
        }
        Ok(())
    }

    fn evaluate(&mut self, ctx: &mut Context) -> Result<(), SimError> {
        let a = self.read_port("read_addr1", ctx)?;
        let b = self.read_port("read_addr2", ctx)?;
        self.ports.drive("read_data1", a)?;
        self.ports.drive("read_data2", b)
    }
}
