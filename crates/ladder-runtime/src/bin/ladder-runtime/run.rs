//! Periodic scan launcher with a line-based console.

use std::io::BufRead;
use std::path::Path;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::thread;

use anyhow::{bail, Context};
use ladder_runtime::config::RuntimeConfig;
use ladder_runtime::document::ProgramDocument;
use ladder_runtime::image::ProcessImage;
use ladder_runtime::scheduler::{Controller, StdClock};
use ladder_runtime::value::Duration;
use ladder_runtime::CycleReport;

use crate::style;

const POLL_INTERVAL: std::time::Duration = std::time::Duration::from_millis(50);

pub fn run_scan(
    config: &RuntimeConfig,
    program: &Path,
    period_ms: Option<u64>,
    cycles: Option<u64>,
    overrides: &[(String, bool)],
) -> anyhow::Result<()> {
    let document = ProgramDocument::load(program)?;
    let mut simulation = config.simulation();
    simulation.load_document(&document)?;
    for (tag, value) in overrides {
        simulation.inject(tag, *value);
    }

    let period = match period_ms {
        Some(0) => bail!("--period-ms must be greater than 0"),
        Some(ms) => Duration::from_millis(i64::try_from(ms).context("--period-ms out of range")?),
        None => config.cycle_interval,
    };

    let mut controller = Controller::new(simulation, StdClock::new());
    let reports = controller.subscribe();
    controller.start(period)?;
    println!(
        "{} {} every {}ms (type 'quit' to exit)",
        style::accent(config.resource_name.as_str()),
        style::success("running"),
        period.as_millis()
    );

    let console = spawn_console(std::io::BufReader::new(std::io::stdin()))?;
    let result = drive(&mut controller, &reports, &console, period, cycles);
    controller.stop();
    print_image(&controller.snapshot());
    let stats = controller.shared().with_lock(|sim| *sim.stats());
    println!(
        "{} cycles, worst {}ms, {} overrun(s)",
        stats.cycles,
        stats.worst.as_millis(),
        stats.overruns
    );
    result
}

fn drive(
    controller: &mut Controller<StdClock>,
    reports: &Receiver<CycleReport>,
    console: &Receiver<String>,
    period: Duration,
    cycles: Option<u64>,
) -> anyhow::Result<()> {
    let mut seen = 0u64;
    loop {
        match reports.recv_timeout(POLL_INTERVAL) {
            Ok(report) => {
                print_report(&report);
                seen += 1;
                if cycles.is_some_and(|limit| seen >= limit) {
                    return Ok(());
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => return Ok(()),
        }
        loop {
            let line = match console.try_recv() {
                Ok(line) => line,
                Err(TryRecvError::Empty) => break,
                // stdin closed; a bounded run keeps going until its cycle limit.
                Err(TryRecvError::Disconnected) if cycles.is_none() => return Ok(()),
                Err(TryRecvError::Disconnected) => break,
            };
            match handle_command(controller, &line, period) {
                Ok(ConsoleFlow::Continue) => {}
                Ok(ConsoleFlow::Quit) => return Ok(()),
                Err(err) => eprintln!("{}", style::error(format!("Error: {err}"))),
            }
        }
    }
}

enum ConsoleFlow {
    Continue,
    Quit,
}

fn handle_command(
    controller: &mut Controller<StdClock>,
    line: &str,
    period: Duration,
) -> anyhow::Result<ConsoleFlow> {
    let mut parts = line.split_whitespace();
    match parts.next() {
        None => {}
        Some("quit" | "exit") => return Ok(ConsoleFlow::Quit),
        Some("set") => {
            let (Some(tag), Some(value)) = (parts.next(), parts.next()) else {
                bail!("usage: set <TAG> <0|1>");
            };
            let value = parse_signal(value)?;
            if controller.force(tag, value).is_none() {
                bail!("tag must not be empty");
            }
            if !controller.is_running() {
                println!("{} = {}", tag.to_uppercase(), style::signal(value));
            }
        }
        Some("step") => print_report(&controller.step()),
        Some("show") => print_image(&controller.snapshot()),
        Some("start") => controller.start(period)?,
        Some("stop") => controller.stop(),
        Some("reset") => {
            controller.reset();
            println!("{}", style::warning("reset: scanning stopped, all tags 0"));
        }
        Some(other) => bail!("unknown command '{other}'"),
    }
    Ok(ConsoleFlow::Continue)
}

fn spawn_console<R>(input: R) -> anyhow::Result<Receiver<String>>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    // Detached: blocks on input until EOF or process exit.
    thread::Builder::new()
        .name("ladder-console".into())
        .spawn(move || {
            for line in input.lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        })
        .context("failed to start console thread")?;
    Ok(rx)
}

pub fn parse_signal(text: &str) -> anyhow::Result<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" => Ok(true),
        "0" | "false" | "off" => Ok(false),
        other => bail!("invalid signal value '{other}' (expected 0/1)"),
    }
}

/// Parse `TAG=VALUE` override arguments.
pub fn parse_overrides(items: &[String]) -> anyhow::Result<Vec<(String, bool)>> {
    items
        .iter()
        .map(|item| {
            let Some((tag, value)) = item.split_once('=') else {
                bail!("invalid override '{item}' (expected TAG=0|1)");
            };
            if tag.trim().is_empty() {
                bail!("invalid override '{item}' (empty tag)");
            }
            Ok((tag.trim().to_string(), parse_signal(value)?))
        })
        .collect()
}

fn print_report(report: &CycleReport) {
    if report.changes.is_empty() {
        return;
    }
    let changes: Vec<String> = report
        .changes
        .iter()
        .map(|change| format!("{}={}", change.tag, style::signal(change.after)))
        .collect();
    println!("[{:>6}] {}", report.cycle, changes.join(" "));
}

fn print_image(image: &ProcessImage) {
    let width = image.iter().map(|(tag, _)| tag.len()).max().unwrap_or(0);
    for (tag, value) in image.iter() {
        println!("  {tag:<width$}  {}", style::signal(value));
    }
}
