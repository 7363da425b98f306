pub mod asm;
pub mod bits;
pub mod config;
pub mod error;
pub mod framework;
pub mod isa;
pub mod pipeline;
pub mod store;
pub mod units;
mod utils;

pub use asm::assemble;
pub use bits::Bits;
pub use config::SimConfig;
pub use error::{Fault, SimError, Warning};
pub use pipeline::Pipeline;
pub use store::{format_words, parse_words, WordStore};
pub use utils::{mem_diff, mem_print, reg_print, stage_print};
