use std::fmt::Write;

use ansi_term::Colour;

use crate::isa::reg_name;
use crate::pipeline::StageView;

fn paint(value: u32, text: String) -> String {
    if value != 0 {
        Colour::Green.bold().paint(text).to_string()
    } else {
        text
    }
}

/// Register file dump, four registers per row. Non-zero values are
/// highlighted.
pub fn reg_print(regs: &[u32]) -> String {
    let mut out = String::new();
    for (row, chunk) in regs.chunks(4).enumerate() {
        for (col, value) in chunk.iter().enumerate() {
            let reg = (row * 4 + col) as u8;
            let cell = format!("{:>5} {:#010x}", reg_name(reg), value);
            let _ = write!(out, "{}  ", paint(*value, cell));
        }
        out.push('\n');
    }
    out
}

/// Data memory dump up to the last non-zero word, addressed in bytes.
pub fn mem_print(words: &[u32]) -> String {
    let Some(last) = words.iter().rposition(|w| *w != 0) else {
        return String::from("(all zero)\n");
    };
    let mut out = String::new();
    for (i, value) in words.iter().enumerate().take(last + 1) {
        let _ = writeln!(out, "{:#06x}: {}", i << 2, paint(*value, format!("{value:#010x}")));
    }
    out
}

/// Words that differ between two memory images: `(byte address, before, after)`.
pub fn mem_diff(before: &[u32], after: &[u32]) -> Vec<(u32, u32, u32)> {
    let len = before.len().max(after.len());
    (0..len)
        .filter_map(|i| {
            let l = before.get(i).copied().unwrap_or_default();
            let r = after.get(i).copied().unwrap_or_default();
            (l != r).then_some(((i << 2) as u32, l, r))
        })
        .collect()
}

pub fn stage_print(stages: &[StageView]) -> String {
    stages.iter().fold(String::new(), |mut out, view| {
        let _ = writeln!(out, "{view}");
        out
    })
}
