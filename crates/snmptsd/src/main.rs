//! snmptsd - device metrics collector daemon.
//!
//! Polls every configured metric on every configured device once per
//! interval and writes the resulting `put` lines to stdout or a file.

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::Parser;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use snmpts_core::collector::{Collector, MockReader, Reader, Sink, WriterSink};
use snmpts_core::config::Config;

/// Device metrics collector daemon.
#[derive(Parser)]
#[command(name = "snmptsd", about = "Device metrics collector daemon", version)]
struct Args {
    /// Path to the JSON device/metric configuration.
    #[arg(short, long)]
    config: PathBuf,

    /// JSON fixture with recorded device data, keyed by hostname.
    /// Devices are read from this fixture instead of a live session.
    #[arg(long, value_name = "PATH")]
    fixture: PathBuf,

    /// Collection interval in seconds.
    #[arg(short, long, default_value = "10")]
    interval: u64,

    /// Run a single collection cycle and exit.
    #[arg(long)]
    once: bool,

    /// Append lines to this file instead of stdout.
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is info level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

/// Initializes the tracing subscriber with the appropriate log level.
/// Logs go to stderr so stdout stays clean for line output.
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(format!("snmptsd={}", level).parse().unwrap())
        .add_directive(format!("snmpts_core={}", level).parse().unwrap());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn open_sink(output: Option<&PathBuf>) -> io::Result<Box<dyn Sink>> {
    Ok(match output {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Box::new(WriterSink::new(io::BufWriter::new(file)))
        }
        None => Box::new(WriterSink::new(io::stdout().lock())),
    })
}

fn load_fixture(path: &Path) -> Result<HashMap<String, MockReader>, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
    MockReader::fixtures_from_json(&content)
        .map_err(|e| format!("invalid fixture {}: {}", path.display(), e))
}

/// Runs one cycle over all devices and sends the lines to `sink`.
/// Returns the number of lines written.
fn run_cycle(
    collectors: &mut [Collector],
    readers: &HashMap<String, MockReader>,
    sink: &mut dyn Sink,
) -> io::Result<usize> {
    let mut lines = Vec::new();
    for collector in collectors.iter_mut() {
        let host = collector.device().hostname().to_string();
        let Some(reader) = readers.get(&host) else {
            warn!("{}: no data source, skipping", host);
            continue;
        };
        let report = collector.collect_cycle(reader as &dyn Reader);
        for failure in &report.failures {
            error!("{}: {}", host, failure);
        }
        lines.extend(report.lines);
    }
    sink.send(&lines)?;
    Ok(lines.len())
}

fn main() -> ExitCode {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    info!("snmptsd {} starting", env!("CARGO_PKG_VERSION"));
    info!(
        "Config: config={}, fixture={}, interval={}s",
        args.config.display(),
        args.fixture.display(),
        args.interval
    );

    let config = match Config::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    let interval = Duration::from_secs(args.interval);
    let mut collectors = match config.build_collectors(interval) {
        Ok(c) => c,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    let metric_count: usize = collectors.iter().map(|c| c.metrics().len()).sum();
    info!(
        "Loaded {} devices, {} metrics",
        collectors.len(),
        metric_count
    );

    let readers = match load_fixture(&args.fixture) {
        Ok(r) => r,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut sink = match open_sink(args.output.as_ref()) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to open output: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if args.once {
        return match run_cycle(&mut collectors, &readers, sink.as_mut()) {
            Ok(n) => {
                info!("Wrote {} lines", n);
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!("Failed to write lines: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    // Setup graceful shutdown
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    }) {
        warn!("Failed to set Ctrl-C handler: {}", e);
    }

    info!("Starting collection loop");
    let mut cycle_count: u64 = 0;

    while running.load(Ordering::SeqCst) {
        cycle_count += 1;
        match run_cycle(&mut collectors, &readers, sink.as_mut()) {
            Ok(n) => debug!("Cycle #{}: {} lines", cycle_count, n),
            Err(e) => error!("Cycle #{}: failed to write lines: {}", cycle_count, e),
        }

        if cycle_count.is_multiple_of(60) {
            for c in &collectors {
                if let Some(t) = c.last_timing() {
                    info!(
                        "{}: {} ok, {} failed, {} lines in {:?}",
                        c.device().hostname(),
                        t.metrics_ok,
                        t.metrics_failed,
                        t.lines,
                        t.total
                    );
                }
            }
        }

        // Sleep with periodic checks for shutdown signal
        let sleep_interval = Duration::from_millis(100);
        let mut remaining = interval;
        while remaining > Duration::ZERO && running.load(Ordering::SeqCst) {
            let sleep_time = remaining.min(sleep_interval);
            std::thread::sleep(sleep_time);
            remaining = remaining.saturating_sub(sleep_time);
        }
    }

    info!("Shutdown complete");
    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;
    use snmpts_core::collector::MemorySink;

    const CONFIG: &str = r#"{"devices": [
        {"hostname": "sw1", "metrics": [
            {"metric": "sys.uptime", "oid": "up"},
            {"metric": "if.in", "oid": "t", "type": "walk"}
        ]},
        {"hostname": "sw2", "metrics": [{"metric": "sys.uptime", "oid": "up"}]}
    ]}"#;

    #[test]
    fn run_cycle_collects_known_devices() {
        let config: Config = CONFIG.parse().unwrap();
        let mut collectors = config.build_collectors(Duration::from_secs(10)).unwrap();
        let readers = MockReader::fixtures_from_json(
            r#"{"sw1": {"scalars": {"up": 5}, "tables": {"t": [["1", 1], ["2", null]]}}}"#,
        )
        .unwrap();
        let mut sink = MemorySink::new();

        let n = run_cycle(&mut collectors, &readers, &mut sink).unwrap();
        assert_eq!(n, 2);
        let lines = sink.take();
        assert!(lines[0].starts_with("put sys.uptime "));
        assert!(lines[0].ends_with(" 5 host=sw1"));
        assert!(lines[1].ends_with(" 1 host=sw1 index=1"));
    }

    #[test]
    fn demo_config_runs_against_demo_fixture() {
        let config: Config = include_str!("../../../demos/switch.json").parse().unwrap();
        let mut collectors = config.build_collectors(Duration::from_secs(10)).unwrap();
        let readers =
            MockReader::fixtures_from_json(include_str!("../../../demos/switch-fixture.json"))
                .unwrap();
        let mut sink = MemorySink::new();

        // Rate metrics only baseline on the first cycle; -40 is out of bounds
        // with no replacement and index 2001 is outside the walk range.
        let n = run_cycle(&mut collectors, &readers, &mut sink).unwrap();
        assert_eq!(n, 3);
        let lines = sink.take();
        assert!(lines[0].ends_with(" 86400.0 host=sw1.ams1"));
        assert!(lines[1].ends_with(" 41 host=sw1.ams1 index=1001"));
        assert!(lines[2].ends_with(" 38 host=sw1.ams1 index=1002"));
    }
}
