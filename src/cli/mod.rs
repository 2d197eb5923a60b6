use std::fmt;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::core::{CraftingConfig, DerivedMetrics};
use crate::session::{Command, Session};
use crate::store::{STORAGE_KEY, SnapshotStore};

#[derive(Parser, Debug)]
#[command(
    name = "craftcalc",
    about = "Crafting profitability calculator with persistent input state"
)]
pub struct Cli {
    /// Snapshot file holding the calculator state
    #[arg(long, value_name = "PATH")]
    state: Option<PathBuf>,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Show the current inputs and derived values
    Show {
        /// Emit machine-readable JSON instead of the text summary
        #[arg(long)]
        json: bool,
    },

    /// Update one input field
    #[command(subcommand)]
    Set(SetField),

    /// Manage return-percent presets
    #[command(subcommand)]
    Preset(PresetAction),

    /// Restore the built-in default state
    Reset,
}

#[derive(Subcommand, Debug)]
enum SetField {
    /// Unit price of the resource at INDEX (zero-based)
    ResourcePrice { index: usize, value: f64 },
    /// Quantity of the resource at INDEX consumed per crafted item
    ResourceAmount { index: usize, value: f64 },
    /// Unit price of the artifact consumed per finished item
    ArtifactPrice { value: f64 },
    /// Quantity of the artifact consumed per finished item
    ArtifactAmount { value: f64 },
    /// Fixed production cost per finished item
    FactoryPrice { value: f64 },
    /// Sale price per item, before the realization fee
    RealizationPrice { value: f64 },
    /// Batch size fed into the process
    InitialAmount { value: f64 },
}

#[derive(Subcommand, Debug)]
enum PresetAction {
    /// Add a return-percent preset (0-100, exclusive) and select it
    Add { percent: f64 },
    /// Remove a preset, clearing the selection if it was selected
    Remove { percent: f64 },
    /// Select one of the existing presets
    Select { percent: f64 },
}

impl From<SetField> for Command {
    fn from(field: SetField) -> Self {
        match field {
            SetField::ResourcePrice { index, value } => Command::SetResourcePrice { index, value },
            SetField::ResourceAmount { index, value } => {
                Command::SetResourceAmount { index, value }
            }
            SetField::ArtifactPrice { value } => Command::SetArtifactPrice { value },
            SetField::ArtifactAmount { value } => Command::SetArtifactAmount { value },
            SetField::FactoryPrice { value } => Command::SetFactoryPrice { value },
            SetField::RealizationPrice { value } => Command::SetRealizationPrice { value },
            SetField::InitialAmount { value } => Command::SetInitialAmountItems { value },
        }
    }
}

impl From<PresetAction> for Command {
    fn from(action: PresetAction) -> Self {
        match action {
            PresetAction::Add { percent } => Command::AddReturnPercent { percent },
            PresetAction::Remove { percent } => Command::RemoveReturnPercent { percent },
            PresetAction::Select { percent } => Command::SelectReturnPercent { percent },
        }
    }
}

#[derive(Debug, PartialEq)]
enum Invocation {
    Show { json: bool },
    Mutate(Command),
}

fn plan(command: CliCommand) -> Invocation {
    match command {
        CliCommand::Show { json } => Invocation::Show { json },
        CliCommand::Set(field) => Invocation::Mutate(field.into()),
        CliCommand::Preset(action) => Invocation::Mutate(action.into()),
        CliCommand::Reset => Invocation::Mutate(Command::Reset),
    }
}

pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let store = match cli.state {
        Some(path) => SnapshotStore::at(path),
        None => SnapshotStore::open(".", STORAGE_KEY),
    };
    let mut session = Session::open(store);

    match plan(cli.command) {
        Invocation::Show { json: true } => {
            println!("{}", serde_json::to_string_pretty(&StateJson::of(&session))?);
        }
        Invocation::Show { json: false } => print!("{}", StateReport::of(&session)),
        Invocation::Mutate(command) => {
            if let Err(message) = session.apply(command) {
                anyhow::bail!("rejected: {message}");
            }
            print!("{}", StateReport::of(&session));
        }
    }
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StateJson<'a> {
    config: &'a CraftingConfig,
    derived: &'a DerivedMetrics,
}

impl<'a> StateJson<'a> {
    fn of(session: &'a Session) -> Self {
        Self {
            config: session.config(),
            derived: session.metrics(),
        }
    }
}

struct StateReport<'a> {
    config: &'a CraftingConfig,
    derived: &'a DerivedMetrics,
}

impl<'a> StateReport<'a> {
    fn of(session: &'a Session) -> Self {
        Self {
            config: session.config(),
            derived: session.metrics(),
        }
    }
}

impl fmt::Display for StateReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Inputs ===")?;
        for (i, res) in self.config.resources.iter().enumerate() {
            writeln!(
                f,
                "Resource {}: price {:.2}, amount {:.2} (batch total {:.0})",
                i + 1,
                res.price,
                res.amount,
                self.derived.resource_totals.get(i).copied().unwrap_or(0.0),
            )?;
        }
        writeln!(
            f,
            "Artifact: price {:.2}, amount {:.2}",
            self.config.artifact.price, self.config.artifact.amount
        )?;
        writeln!(f, "Factory price: {:.2}", self.config.factory_price)?;
        writeln!(f, "Realization price: {:.2}", self.config.realization_price)?;

        write!(f, "Return percent presets:")?;
        if self.config.return_percent_list.is_empty() {
            write!(f, " (none)")?;
        }
        for preset in &self.config.return_percent_list {
            let marker = if self.config.return_percent == Some(*preset) {
                "*"
            } else {
                ""
            };
            write!(f, " {preset}%{marker}")?;
        }
        writeln!(f)?;
        writeln!(f, "Initial amount of items: {:.0}", self.config.initial_amount_items)?;

        writeln!(f)?;
        writeln!(f, "=== Derived ===")?;
        writeln!(
            f,
            "Finite amount of items: {:.3}",
            self.derived.finite_amount_items
        )?;
        writeln!(f, "Whole items crafted: {:.0}", self.derived.whole_items)?;
        writeln!(
            f,
            "Resource expense per item: {:.2}",
            self.derived.resources_expense_per_unit
        )?;
        writeln!(f, "General expenses: {:.2}", self.derived.general_expenses)?;
        writeln!(f, "Profit from production: {:.2}", self.derived.profit)?;
        writeln!(
            f,
            "Resources residual: {:.2}",
            self.derived.resources_residual_profit
        )?;
        writeln!(f, "Total profit: {:.2}", self.derived.total_profit)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::derive_metrics;

    fn parse(args: &[&str]) -> CliCommand {
        Cli::try_parse_from(std::iter::once("craftcalc").chain(args.iter().copied()))
            .expect("arguments should parse")
            .command
    }

    #[test]
    fn set_subcommands_map_onto_session_commands() {
        let cases: Vec<(&[&str], Command)> = vec![
            (
                &["set", "resource-price", "0", "12.5"],
                Command::SetResourcePrice {
                    index: 0,
                    value: 12.5,
                },
            ),
            (
                &["set", "resource-amount", "1", "3"],
                Command::SetResourceAmount {
                    index: 1,
                    value: 3.0,
                },
            ),
            (
                &["set", "artifact-price", "20"],
                Command::SetArtifactPrice { value: 20.0 },
            ),
            (
                &["set", "factory-price", "3"],
                Command::SetFactoryPrice { value: 3.0 },
            ),
            (
                &["set", "realization-price", "50"],
                Command::SetRealizationPrice { value: 50.0 },
            ),
            (
                &["set", "initial-amount", "10"],
                Command::SetInitialAmountItems { value: 10.0 },
            ),
        ];

        for (args, expected) in cases {
            assert_eq!(plan(parse(args)), Invocation::Mutate(expected));
        }
    }

    #[test]
    fn preset_subcommands_map_onto_session_commands() {
        assert_eq!(
            plan(parse(&["preset", "add", "50"])),
            Invocation::Mutate(Command::AddReturnPercent { percent: 50.0 })
        );
        assert_eq!(
            plan(parse(&["preset", "remove", "24.8"])),
            Invocation::Mutate(Command::RemoveReturnPercent { percent: 24.8 })
        );
        assert_eq!(
            plan(parse(&["preset", "select", "24.8"])),
            Invocation::Mutate(Command::SelectReturnPercent { percent: 24.8 })
        );
    }

    #[test]
    fn show_requests_no_mutation() {
        assert_eq!(plan(parse(&["show"])), Invocation::Show { json: false });
        assert_eq!(
            plan(parse(&["show", "--json"])),
            Invocation::Show { json: true }
        );
    }

    #[test]
    fn reset_maps_onto_the_reset_command() {
        assert_eq!(plan(parse(&["reset"])), Invocation::Mutate(Command::Reset));
    }

    #[test]
    fn report_lists_every_derived_value() {
        let config = CraftingConfig::default();
        let derived = derive_metrics(&config);
        let report = format!(
            "{}",
            StateReport {
                config: &config,
                derived: &derived
            }
        );

        assert!(report.contains("Finite amount of items"));
        assert!(report.contains("General expenses"));
        assert!(report.contains("Profit from production"));
        assert!(report.contains("Resources residual"));
        assert!(report.contains("Total profit"));
        assert!(report.contains("24.8%*"), "default preset should be selected");
    }
}
