//! Deterministic trace, validation and export commands.

use std::path::Path;

use anyhow::Context;
use ladder_runtime::config::RuntimeConfig;
use ladder_runtime::document::ProgramDocument;
use ladder_runtime::program::{ElementId, LadderProgram};
use ladder_runtime::validate::{validate_with, Severity};
use ladder_runtime::value::Duration;
use ladder_runtime::Simulation;
use serde_json::{json, Map, Value};

use crate::style;

pub fn run_trace(
    config: &RuntimeConfig,
    program: &Path,
    cycles: u64,
    elapsed_ms: u64,
    overrides: &[(String, bool)],
) -> anyhow::Result<()> {
    let document = ProgramDocument::load(program)?;
    let mut simulation = config.simulation();
    simulation.load_document(&document)?;
    for (tag, value) in overrides {
        simulation.inject(tag, *value);
    }
    let elapsed =
        Duration::from_millis(i64::try_from(elapsed_ms).context("--elapsed-ms out of range")?);
    for _ in 0..cycles {
        simulation.step_with(elapsed);
    }
    let dump = trace_json(&simulation);
    println!("{}", serde_json::to_string_pretty(&dump)?);
    Ok(())
}

/// Final image and per-element trace of the last cycle.
pub fn trace_json(simulation: &Simulation) -> Value {
    let mut image = Map::new();
    for (tag, value) in simulation.image().iter() {
        image.insert(tag.to_string(), Value::Bool(value));
    }
    let program = simulation.program();
    let rungs: Vec<Value> = program
        .rungs
        .iter()
        .enumerate()
        .map(|(rung_index, rung)| {
            let elements: Vec<Value> = rung
                .elements
                .iter()
                .enumerate()
                .map(|(index, element)| {
                    let entry = simulation
                        .trace()
                        .get(ElementId::new(rung_index, index))
                        .unwrap_or_default();
                    let tag = element
                        .tag
                        .and_then(|id| simulation.image().name(id))
                        .map(ToString::to_string);
                    let mut record = json!({
                        "type": element.kind.as_str(),
                        "symbol": element.kind.symbol(),
                        "tag": tag,
                        "energized": entry.energized,
                    });
                    if let Some(elapsed) = entry.timer_elapsed {
                        record["elapsed"] = json!(elapsed.as_secs_f64());
                    }
                    record
                })
                .collect();
            Value::Array(elements)
        })
        .collect();
    json!({
        "cycles": simulation.cycle_count(),
        "image": image,
        "trace": rungs,
    })
}

pub fn run_validate(config: &RuntimeConfig, program: &Path) -> anyhow::Result<()> {
    let document = ProgramDocument::load(program)?;
    let mut image = config.initial_image();
    let resolved = LadderProgram::from_document(&document, &mut image)?;
    let report = validate_with(&resolved, config.validation);
    for issue in &report.issues {
        let line = format!("{issue}");
        match issue.severity {
            Severity::Error => println!("{}", style::error(format!("error: {line}"))),
            Severity::Warning => println!("{}", style::warning(format!("warning: {line}"))),
        }
    }
    if report.is_blocking() {
        anyhow::bail!(
            "{} blocking issue(s) in {}",
            report.errors().count(),
            program.display()
        );
    }
    println!(
        "{} {} rung(s), {} element(s)",
        style::success("ok:"),
        document.rungs.len(),
        document.element_count()
    );
    Ok(())
}

pub fn run_export(program: &Path, output: Option<&Path>) -> anyhow::Result<()> {
    let document = ProgramDocument::load(program)?;
    let mut image = ladder_runtime::image::ProcessImage::new();
    let resolved = LadderProgram::from_document(&document, &mut image)?;
    let canonical = resolved.to_document(&image);
    match output {
        Some(path) => {
            canonical.save(path)?;
            println!("{} {}", style::success("wrote"), path.display());
        }
        None => println!("{}", canonical.to_json_pretty()?),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use expect_test::expect;

    use super::*;

    #[test]
    fn trace_dump_shows_timer_progress() {
        let mut simulation = Simulation::default();
        simulation
            .load_json(
                r#"[[{"type":"NO","tag":"START"},{"type":"TON","tag":"T1","time":1},{"type":"COIL","tag":"MOTOR"}]]"#,
            )
            .unwrap();
        simulation.inject("START", true);
        simulation.step_with(Duration::from_millis(500));
        simulation.step_with(Duration::from_millis(500));

        let dump = trace_json(&simulation);
        expect![[r#"{"cycles":2,"image":{"MOTOR":false,"START":true,"T1":false},"trace":[[{"energized":true,"symbol":"┤ ├","tag":"START","type":"NO"},{"elapsed":0.5,"energized":true,"symbol":"[TON]","tag":"T1","type":"TON"},{"energized":false,"symbol":"( )","tag":"MOTOR","type":"COIL"}]]}"#]]
        .assert_eq(&dump.to_string());
    }
}
