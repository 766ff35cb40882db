/*
 *  Copyright (C) 2025  Markus Elias Gerber
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  You should have received a copy of the GNU General Public License
 *  along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

mod cli;
mod error;
mod report;

use std::{
    io::{self, BufWriter, Write},
    process::ExitCode,
};

use clap::Parser;
use env_logger::{Builder, Env};
use log::info;
use nfu_paging::{
    modules::trace_source::{BinaryTraceSourceModule, TraceSourceModule},
    PageTable, Translator,
};

use cli::{Cli, LogMode};
use error::CliError;
use report::Reporter;

fn main() -> ExitCode {
    Builder::from_env(Env::default().default_filter_or("warn"))
        .format_module_path(false)
        .init();

    let cli = Cli::parse();
    let stdout = io::stdout().lock();

    match run(&cli, BufWriter::new(stdout)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", err);
            err.exit_code()
        }
    }
}

fn run<W: Write>(cli: &Cli, out: W) -> Result<(), CliError> {
    let config = cli.paging_config();
    config.validate()?;

    // the trace has to be readable even if the mode never looks at it
    let mut source =
        BinaryTraceSourceModule::open(&cli.trace).map_err(|source| CliError::OpenTrace {
            path: cli.trace.clone(),
            source,
        })?;

    info!("Reading trace {} in {:?} mode", cli.trace.display(), cli.log_mode);

    match cli.log_mode {
        LogMode::Bitmasks => {
            let table = PageTable::new(&config.level_bits);
            let mut reporter = Reporter::new(out, cli.log_mode, table.levels());
            reporter.bitmasks()?;
            reporter.flush()?;
        }
        LogMode::Offset => {
            let table = PageTable::new(&config.level_bits);
            let mut reporter = Reporter::new(out, cli.log_mode, table.levels());

            let mut processed = 0u64;
            while config.max_accesses.map_or(true, |max| processed < max) {
                let Some(vaddr) = source.next_address()? else {
                    break;
                };
                reporter.offset(table.offset_of(vaddr))?;
                processed += 1;
            }
            reporter.flush()?;
        }
        _ => {
            let mut translator = Translator::new(&config)?;
            let mut reporter = Reporter::new(out, cli.log_mode, translator.page_table().levels());

            translator.run(&mut source, |record| {
                reporter.record(record).map_err(CliError::from)
            })?;

            reporter.summary(&translator.summary())?;
            reporter.flush()?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use std::{
        fs,
        io::{self, Write},
        path::PathBuf,
        process::ExitCode,
    };

    use clap::Parser;
    use nfu_paging::modules::trace_source::TraceRecord;

    use super::run;
    use crate::{cli::Cli, error::CliError};

    fn write_trace(name: &str, addresses: &[u32]) -> PathBuf {
        let path = std::env::temp_dir().join(format!("nfu_trace_{}_{}.tr", name, std::process::id()));

        let mut bytes = Vec::new();
        for (time, addr) in addresses.iter().enumerate() {
            let record = TraceRecord {
                addr: *addr,
                reqtype: 0,
                size: 4,
                attr: 0,
                proc: 0,
                time: time as u32,
            };
            bytes.extend_from_slice(&record.to_bytes());
        }

        fs::write(&path, bytes).unwrap();
        path
    }

    /// Fails every write, like stdout after the reading end of a pipe was closed
    #[derive(Default)]
    struct ClosedPipe {
        writes: usize,
    }

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            self.writes += 1;
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn run_with(args: &[&str]) -> Result<String, CliError> {
        let cli = Cli::try_parse_from(args).unwrap();
        let mut out = Vec::new();
        run(&cli, &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_va2pa_from_file() {
        let path = write_trace("va2pa", &[0x0000_0000, 0x4000_0000, 0x8000_0000]);
        let trace = path.to_str().unwrap();

        let output = run_with(&["nfu_trace", "-f", "2", "-b", "2", "-l", "va2pa", trace, "2", "2"]);
        fs::remove_file(&path).unwrap();

        assert_eq!(
            output.unwrap(),
            "00000000 -> 00000000\n40000000 -> 10000000\n80000000 -> 10000000\n"
        );
    }

    #[test]
    fn test_access_limit() {
        let path = write_trace("limit", &[0x1000, 0x2001, 0x3002, 0x4003]);
        let trace = path.to_str().unwrap();

        let offsets = run_with(&["nfu_trace", "-n", "2", "-l", "offset", trace, "20"]);
        let summary = run_with(&["nfu_trace", "-n", "3", trace, "20"]);
        fs::remove_file(&path).unwrap();

        assert_eq!(offsets.unwrap(), "00000000\n00000001\n");
        assert!(summary.unwrap().contains("Addresses processed: 3\n"));
    }

    #[test]
    fn test_bitmasks_ignores_trace_content() {
        let path = write_trace("bitmasks", &[0xDEAD_BEEF]);
        let trace = path.to_str().unwrap();

        let output = run_with(&["nfu_trace", "-l", "bitmasks", trace, "8", "8"]);
        fs::remove_file(&path).unwrap();

        assert_eq!(
            output.unwrap(),
            "Bitmasks\nlevel 0 mask FF000000\nlevel 1 mask 00FF0000\n"
        );
    }

    #[test]
    fn test_truncated_trace() {
        let path = write_trace("truncated", &[0x1000, 0x2000]);
        let mut bytes = fs::read(&path).unwrap();
        bytes.truncate(bytes.len() - 5);
        fs::write(&path, bytes).unwrap();

        let result = run_with(&["nfu_trace", path.to_str().unwrap(), "20"]);
        fs::remove_file(&path).unwrap();

        let err = result.unwrap_err();
        assert!(matches!(err, CliError::Trace(_)));
        assert_eq!(err.exit_code(), ExitCode::from(4));
    }

    #[test]
    fn test_config_checked_before_trace() {
        let missing = std::env::temp_dir().join("nfu_trace_does_not_exist.tr");
        let missing = missing.to_str().unwrap();

        let err = run_with(&["nfu_trace", missing, "20", "9"]).unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
        assert_eq!(err.exit_code(), ExitCode::from(2));

        let err = run_with(&["nfu_trace", missing, "20"]).unwrap_err();
        assert!(matches!(err, CliError::OpenTrace { .. }));
        assert_eq!(err.exit_code(), ExitCode::from(3));
    }

    #[test]
    fn test_write_error_stops_processing() {
        let addresses: Vec<u32> = (0..10_000u32).map(|i| i << 12).collect();
        let path = write_trace("closed_pipe", &addresses);

        let cli = Cli::try_parse_from(["nfu_trace", "-l", "va2pa", path.to_str().unwrap(), "20"])
            .unwrap();
        let mut out = ClosedPipe::default();
        let result = run(&cli, &mut out);
        fs::remove_file(&path).unwrap();

        let err = result.unwrap_err();
        assert!(matches!(err, CliError::Output(_)));
        assert_eq!(err.exit_code(), ExitCode::from(5));
        assert_eq!(out.writes, 1);
    }
}
