use anyhow::{Context, Result};
use binutils::{clap, verbose};
use clap::Parser;
use mips_sim::{assemble, format_words};

/// MIPS assembler producing the binary-text program format.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    long_about = None,
    styles = binutils::get_styles(),
    arg_required_else_help = true,
)]
struct Args {
    /// Path to the input assembly file
    input: String,

    /// Output filename (default is input%.bin)
    #[arg(short = 'o', long)]
    output: Option<String>,

    #[command(flatten)]
    verbose: verbose::Verbosity,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = binutils::verbose_level_to_trace(args.verbose.log_level());
    binutils::logging_setup(log_level, None::<&std::fs::File>);

    let content = std::fs::read_to_string(&args.input)
        .with_context(|| format!("could not read file `{}`", &args.input))?;
    let words = assemble(&content).with_context(|| format!("could not assemble `{}`", &args.input))?;

    let output_path = match args.output {
        Some(path) => path,
        None => {
            let mut path = std::path::PathBuf::from(&args.input);
            path.set_extension("bin");
            path.to_string_lossy().to_string()
        }
    };
    std::fs::write(&output_path, format_words(&words))
        .with_context(|| format!("could not write file `{}`", &output_path))?;
    println!("writing to file `{}`", &output_path);
    Ok(())
}
