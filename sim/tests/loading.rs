// Program, data and configuration files

use std::io::Write;

use mips_sim::{assemble, format_words, parse_words, Pipeline, SimConfig};

#[test]
fn test_program_file() -> anyhow::Result<()> {
    let words = assemble("addi $t0, $zero, 42\nsw $t0, 0($zero)")?;
    let mut file = tempfile::NamedTempFile::new()?;
    file.write_all(format_words(&words).as_bytes())?;

    let text = std::fs::read_to_string(file.path())?;
    let mut pipe = Pipeline::new(&SimConfig::default())?;
    pipe.load_program(parse_words(&text)?)?;
    anyhow::ensure!(pipe.run(50)?.drained);
    assert_eq!(pipe.registers()[8], 42);
    assert_eq!(pipe.data_memory()[0], 42);
    Ok(())
}

#[test]
fn test_bad_program_text() -> anyhow::Result<()> {
    let pipe = Pipeline::new(&SimConfig::default())?;
    let store = pipe.program_store();
    let err = store
        .load_text("00100000000010000000000000000001\n0010xyz\n")
        .unwrap_err();
    assert_eq!(err.line, 2);
    // nothing of the program survives
    assert_eq!(store.words(), vec![0, 0]);
    Ok(())
}

#[test]
fn test_data_and_config_files() -> anyhow::Result<()> {
    let mut config_file = tempfile::NamedTempFile::new()?;
    writeln!(config_file, "[memory]\ndata_words = 4\n\n[run]\nmax_cycles = 30")?;
    let config = SimConfig::from_toml(&std::fs::read_to_string(config_file.path())?)?;
    assert_eq!(config.memory.data_words, 4);
    assert_eq!(config.run.max_cycles, 30);
    assert_eq!(config.clock.half_period, 1);

    let mut pipe = Pipeline::new(&config)?;
    pipe.load_data(parse_words("111\n\n101\n")?)?;
    assert_eq!(pipe.data_memory(), vec![7, 5, 0, 0]);

    pipe.load_program(assemble("lw $t0, 4($zero)\nlw $t1, 16($zero)")?)?;
    let summary = pipe.run(config.run.max_cycles)?;
    assert!(summary.drained);
    assert_eq!(pipe.registers()[8], 5);
    // past the end of a four word memory
    assert_eq!(pipe.registers()[9], 0);
    assert!(!summary.warnings.is_empty());
    Ok(())
}
