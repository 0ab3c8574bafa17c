// src/cli.rs
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;
use workout_sheets_lib::{HeaderField, RowField, SheetId};

#[derive(Parser, Debug)]
#[command(author, version, about = "Fill, sync and print two linked gym workout sheets", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SheetArg {
    A,
    B,
}

impl From<SheetArg> for SheetId {
    fn from(value: SheetArg) -> Self {
        match value {
            SheetArg::A => Self::A,
            SheetArg::B => Self::B,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShowArg {
    A,
    B,
    Both,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeaderFieldArg {
    TrainingDayName,
    StudentName,
    BirthDate,
    StartDate,
    EndDate,
    Warmup,
}

impl From<HeaderFieldArg> for HeaderField {
    fn from(value: HeaderFieldArg) -> Self {
        match value {
            HeaderFieldArg::TrainingDayName => Self::TrainingDayName,
            HeaderFieldArg::StudentName => Self::StudentName,
            HeaderFieldArg::BirthDate => Self::BirthDate,
            HeaderFieldArg::StartDate => Self::StartDate,
            HeaderFieldArg::EndDate => Self::EndDate,
            HeaderFieldArg::Warmup => Self::Warmup,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowFieldArg {
    Exercise,
    Kg,
    Sets,
    Reps,
    Obs,
}

impl From<RowFieldArg> for RowField {
    fn from(value: RowFieldArg) -> Self {
        match value {
            RowFieldArg::Exercise => Self::Exercise,
            RowFieldArg::Kg => Self::Kg,
            RowFieldArg::Sets => Self::Sets,
            RowFieldArg::Reps => Self::Reps,
            RowFieldArg::Obs => Self::Obs,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show one or both sheets
    Show {
        #[arg(value_enum, default_value_t = ShowArg::Both)]
        sheet: ShowArg,
    },
    /// Set a header field (student name, week days and end date are shared by both sheets)
    Set {
        #[arg(value_enum)]
        sheet: SheetArg,
        #[arg(value_enum)]
        field: HeaderFieldArg,
        value: String,
    },
    /// Toggle a training day (SEG, TER, QUA, QUI, SEX, SÁB)
    Day {
        #[arg(value_enum)]
        sheet: SheetArg,
        day: String,
    },
    /// Edit one cell of an exercise row
    Row {
        #[arg(value_enum)]
        sheet: SheetArg,
        /// Row number as printed in the N° column (1-24)
        number: usize,
        #[arg(value_enum)]
        field: RowFieldArg,
        value: String,
    },
    /// Set the vertical side label of a muscle group block
    SideLabel {
        #[arg(value_enum)]
        sheet: SheetArg,
        /// Block number, counted from the top of the sheet (1-based)
        block: usize,
        value: String,
    },
    /// List exercise suggestions for a block
    Suggest {
        #[arg(value_enum)]
        sheet: SheetArg,
        /// Block number (1-based)
        block: usize,
    },
    /// Use an image file as the logo on both sheets
    Logo { path: PathBuf },
    /// Remove the logo
    ClearLogo,
    /// Clear all data from both sheets (the logo is kept)
    Reset {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Ask the AI service to fill the exercise rows from a goal description
    Generate {
        /// e.g. "Treino Hipertrofia A/B (Peito/Costas)"
        goal: String,
    },
    /// Export the rows of both sheets as CSV
    ExportCsv {
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show the path to the database file
    DbPath,
    /// Show the path to the config file
    ConfigPath,
    /// Generate shell completion scripts
    GenerateCompletion {
        #[arg(value_enum)]
        shell: Shell,
    },
}

// Function to parse CLI arguments
pub fn parse_args() -> Cli {
    Cli::parse()
}

pub fn build_cli_command() -> clap::Command {
    Cli::command()
}
