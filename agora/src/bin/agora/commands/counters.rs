use anyhow::Result;
use clap::Subcommand;
use comfy_table::{Cell, Color as TableColor, Table};
use serde::Serialize;

use agora::{
    CounterReport, Principal, TableDescriptor,
    registry::find_counter_sources,
    repository::{check_table_counters, reconcile_table_counters},
    schema::TABLES,
};

use crate::commands::schema::lookup;
use crate::context::{ConfiguredStore, ProjectContext};
use crate::examples::ExampleGroup;
use crate::output::{OutputManager, TableDisplay};

pub const EXAMPLES: &[ExampleGroup] = &[
    ExampleGroup {
        title: "Detect Drift",
        commands: &[
            "agora counters check                    # Every counter-bearing table",
            "agora counters check post --all         # Include counters that match",
            "agora counters check --fail-on-drift    # Exit 1 when any counter drifted",
        ],
    },
    ExampleGroup {
        title: "Repair",
        commands: &[
            "agora counters reconcile                # Recompute every counter",
            "agora counters reconcile blog           # Followers and following counts only",
        ],
    },
];

#[derive(Subcommand)]
pub enum CounterCommands {
    /// Compare stored counters with their live child rows
    #[command(name = "check")]
    Check {
        /// Table to check (optional, checks every table with counters if omitted)
        table: Option<String>,

        /// Also list counters that match
        #[arg(long)]
        all: bool,

        /// Exit with an error when drift is found
        #[arg(long)]
        fail_on_drift: bool,
    },

    /// Recompute counters from their live child rows
    #[command(name = "reconcile")]
    Reconcile {
        /// Table to reconcile (optional, reconciles every table with counters if omitted)
        table: Option<String>,

        /// Also list counters that did not change
        #[arg(long)]
        all: bool,
    },
}

pub async fn handle_counter_commands(command: CounterCommands, output: &OutputManager) -> Result<()> {
    let ctx = ProjectContext::find()?;

    if !ctx.is_initialized() {
        output.error("agora is not initialized in this directory.");
        output.info("Run 'agora init' first to create agora.toml.");
        anyhow::bail!("Project not initialized");
    }
    output.verbose(&format!("Project root: {}", ctx.root.display()));
    output.verbose(&format!("Using {}", ctx.config_path.display()));

    match command {
        CounterCommands::Check {
            table,
            all,
            fail_on_drift,
        } => {
            let tables = counter_tables(table.as_deref())?;
            let mut store = ctx.open_store(output).await?;
            let summary = run(&mut store, &tables, Mode::Check).await?;
            output.display(&summary.filtered(all))?;
            if summary.drifted > 0 {
                output.warning(&format!(
                    "{} of {} counter(s) drifted. Run 'agora counters reconcile' to repair.",
                    summary.drifted, summary.checked
                ));
                if fail_on_drift {
                    anyhow::bail!("{} counter(s) drifted", summary.drifted);
                }
            } else {
                output.success(&format!("All {} counter(s) match their live rows", summary.checked));
            }
        }
        CounterCommands::Reconcile { table, all } => {
            let tables = counter_tables(table.as_deref())?;
            let mut store = ctx.open_store(output).await?;
            let summary = run(&mut store, &tables, Mode::Reconcile).await?;
            output.display(&summary.filtered(all))?;
            output.success(&format!(
                "Reconciled {} counter(s), {} repaired",
                summary.checked, summary.drifted
            ));
        }
    }

    Ok(())
}

/// Tables carrying at least one counter column.
fn counter_tables(table: Option<&str>) -> Result<Vec<&'static TableDescriptor>> {
    match table {
        Some(name) => {
            let descriptor = lookup(name)?;
            if find_counter_sources(descriptor.name).is_empty() {
                anyhow::bail!("Table '{name}' has no counter columns");
            }
            Ok(vec![descriptor])
        }
        None => Ok(TABLES
            .iter()
            .copied()
            .filter(|descriptor| !find_counter_sources(descriptor.name).is_empty())
            .collect()),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
enum Mode {
    Check,
    Reconcile,
}

async fn run(store: &mut ConfiguredStore, tables: &[&'static TableDescriptor], mode: Mode) -> Result<CounterSummary> {
    let principal = Principal::system();
    let mut reports = Vec::new();
    for &table in tables {
        let table_reports = match mode {
            Mode::Check => check_table_counters(store, &principal, table).await?,
            Mode::Reconcile => reconcile_table_counters(store, &principal, table).await?,
        };
        reports.extend(table_reports);
    }
    Ok(CounterSummary::new(mode, reports))
}

#[derive(Debug, Serialize)]
struct CounterSummary {
    mode: Mode,
    checked: usize,
    drifted: usize,
    reports: Vec<CounterReport>,
}

impl CounterSummary {
    fn new(mode: Mode, reports: Vec<CounterReport>) -> Self {
        Self {
            mode,
            checked: reports.len(),
            drifted: reports.iter().filter(|report| report.drifted()).count(),
            reports,
        }
    }

    /// Drops matching counters unless `all` is set. Totals are kept.
    fn filtered(&self, all: bool) -> Self {
        Self {
            mode: self.mode,
            checked: self.checked,
            drifted: self.drifted,
            reports: self
                .reports
                .iter()
                .filter(|report| all || report.drifted())
                .cloned()
                .collect(),
        }
    }
}

fn stored_label(previous: Option<i64>) -> String {
    previous.map_or_else(|| "NULL".to_string(), |value| value.to_string())
}

impl TableDisplay for CounterSummary {
    fn to_table(&self, output: &OutputManager) -> Table {
        let mut table = output.create_table();
        let live = match self.mode {
            Mode::Check => "Live",
            Mode::Reconcile => "Now",
        };
        output.add_table_header(&mut table, &["Table", "ID", "Column", "Stored", live, "Status"]);
        if self.reports.is_empty() {
            table.add_row(vec![Cell::new("No drifted counters")]);
            return table;
        }
        for report in &self.reports {
            let status = if report.drifted() {
                let cell = Cell::new(match self.mode {
                    Mode::Check => "drift",
                    Mode::Reconcile => "repaired",
                });
                if output.options.no_color { cell } else { cell.fg(TableColor::Yellow) }
            } else {
                Cell::new("ok")
            };
            table.add_row(vec![
                Cell::new(report.table),
                Cell::new(report.id),
                Cell::new(report.column),
                Cell::new(stored_label(report.previous)),
                Cell::new(report.current),
                status,
            ]);
        }
        table
    }

    fn to_compact(&self) -> String {
        format!("checked={} drifted={}", self.checked, self.drifted)
    }
}
