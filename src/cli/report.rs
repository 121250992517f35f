//! Rendering of run reports and the task catalog for the terminal.

use console::style;

use crate::runner::{CellOutcome, RunReport};
use crate::task::{EnvRequirement, TaskRegistry};

/// Print one line per executed cell, then a totals line.
pub fn print_run_report(report: &RunReport) {
    println!();
    for cell in &report.cells {
        match &cell.outcome {
            CellOutcome::Pass => {
                println!("  {} {}", style("✓").green(), cell.label());
            }
            CellOutcome::Fail { reason } => {
                println!("  {} {}", style("✗").red(), style(cell.label()).bold());
                println!("      {}", style(reason).dim());
            }
            CellOutcome::Skip { reason } => {
                println!(
                    "  {} {} {}",
                    style("⊘").yellow(),
                    cell.label(),
                    style(format!("({reason})")).dim()
                );
            }
        }
    }

    println!();
    let total = report.cells.len();
    let failed = report.failed();
    let skipped = report.skipped();
    let passed = total - failed - skipped;
    let summary = format!("{passed} passed, {failed} failed, {skipped} skipped");
    if failed == 0 {
        println!("  {}", style(summary).green().bold());
    } else {
        println!("  {}", style(summary).red().bold());
    }
}

/// Print the task catalog: name, version matrix, and tags per task.
pub fn print_task_list(registry: &TaskRegistry) {
    println!();
    println!("  {}", style("Available tasks").bold());
    println!();
    for task in registry.iter() {
        let versions = match &task.env {
            EnvRequirement::None => String::new(),
            EnvRequirement::Single(v) => format!(" [py {v}]"),
            EnvRequirement::Matrix(vs) => format!(" [py {}]", vs.join(", ")),
        };
        let tags: Vec<&str> = task.tags.iter().map(String::as_str).collect();
        println!(
            "  {}{}  {}",
            style(&task.name).cyan(),
            style(versions).dim(),
            style(format!("({})", tags.join(", "))).dim()
        );
    }
    println!();
    println!(
        "  {} run a task or a whole tag group with `taskdeck run <target>`",
        style("→").cyan().bold()
    );
    println!();
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::CellReport;
    use crate::task::Task;

    // The printers only write to stdout; these exercise them for panics and
    // check the report arithmetic they rely on.

    #[test]
    fn print_run_report_handles_all_outcomes() {
        let report = RunReport {
            cells: vec![
                CellReport {
                    task: "lint".to_string(),
                    version: None,
                    outcome: CellOutcome::Pass,
                },
                CellReport {
                    task: "tests".to_string(),
                    version: Some("3.9".to_string()),
                    outcome: CellOutcome::Fail {
                        reason: "exit 1".to_string(),
                    },
                },
                CellReport {
                    task: "container".to_string(),
                    version: None,
                    outcome: CellOutcome::Skip {
                        reason: "no runtime".to_string(),
                    },
                },
            ],
        };
        print_run_report(&report);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.skipped(), 1);
    }

    #[test]
    fn print_task_list_handles_every_env_shape() {
        let mut registry = TaskRegistry::new();
        registry
            .register(Task::new("a", EnvRequirement::None, ["x"]))
            .unwrap();
        registry
            .register(Task::new("b", EnvRequirement::Single("3.13".into()), ["x"]))
            .unwrap();
        registry
            .register(Task::new(
                "c",
                EnvRequirement::Matrix(vec!["3.9".into(), "3.10".into()]),
                ["x"],
            ))
            .unwrap();
        print_task_list(&registry);
    }
}
