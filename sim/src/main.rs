use anyhow::{Context, Result};
use binutils::{clap, verbose};
use clap::Parser;
use mips_sim::{assemble, mem_print, parse_words, reg_print, stage_print, Pipeline, SimConfig};

fn read_file(path: &str) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("could not read file `{}`", path))
}

/// MIPS five-stage pipeline simulator.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about,
    long_about = None,
    styles = binutils::get_styles(),
    arg_required_else_help = true,
)]
struct Args {
    /// Path to the program, one binary word per line
    program: String,

    /// Treat the program as assembly source
    #[arg(long)]
    asm: bool,

    /// Initial data memory, one binary word per line
    #[arg(long)]
    data: Option<String>,

    /// Simulator settings in TOML
    #[arg(short, long)]
    config: Option<String>,

    /// Maximum number of clock cycles to run
    #[arg(long)]
    cycles: Option<u64>,

    /// Print stage occupancy after every cycle
    #[arg(long)]
    trace: bool,

    #[command(flatten)]
    verbose: verbose::Verbosity,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = binutils::verbose_level_to_trace(args.verbose.log_level());
    binutils::logging_setup(log_level, None::<&std::fs::File>);

    let mut config = match &args.config {
        Some(path) => SimConfig::from_toml(&read_file(path)?)
            .with_context(|| format!("invalid config `{}`", path))?,
        None => SimConfig::default(),
    };
    if let Some(cycles) = args.cycles {
        config.run.max_cycles = cycles;
    }
    config.run.trace |= args.trace;

    let source = read_file(&args.program)?;
    let program = if args.asm {
        assemble(&source).with_context(|| format!("could not assemble `{}`", args.program))?
    } else {
        parse_words(&source).with_context(|| format!("could not load `{}`", args.program))?
    };

    let mut pipe = Pipeline::new(&config)?;
    if let Some(path) = &args.data {
        let words = parse_words(&read_file(path)?)
            .with_context(|| format!("could not load `{}`", path))?;
        pipe.load_data(words)?;
    }
    pipe.load_program(program)?;

    let trace = config.run.trace;
    let summary = pipe.run_with(config.run.max_cycles, |p| {
        if trace {
            println!("cycle {}", p.cycles());
            print!("{}", stage_print(&p.stages()));
        }
    })?;

    for fault in &summary.faults {
        eprintln!("fault: {}", fault);
    }
    if !summary.drained {
        eprintln!(
            "stopped after {} cycles without draining the pipeline",
            summary.cycles
        );
    }
    println!("{} cycles, {} warnings", summary.cycles, summary.warnings.len());
    print!("{}", reg_print(&pipe.registers()));
    print!("{}", mem_print(&pipe.data_memory()));
    Ok(())
}
