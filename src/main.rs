//src/main.rs
mod cli; // Keep cli module for parsing args

use anyhow::{bail, Context, Result};
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use std::fs::File;
use std::io::{stdin, stdout, Write};
use strum::IntoEnumIterator;
use tracing_subscriber::EnvFilter;

use workout_sheets_lib::{
    parse_color, AppService, Config, FillOutcome, SheetId, SheetModel, WeekDay,
};

fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr) // Keep stdout for tables and CSV
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = cli::parse_args(); // Parse arguments once

    if let cli::Commands::GenerateCompletion { shell } = cli_args.command {
        let mut cmd = cli::build_cli_command();
        let bin_name = cmd.get_name().to_string();

        eprintln!("Generating completion script for {shell}...");
        clap_complete::generate(shell, &mut cmd, bin_name, &mut stdout());
        return Ok(());
    }

    let (config, config_path) = AppService::load_config()?;
    init_logging(&config);

    let mut service = AppService::initialize(config, config_path)
        .context("Failed to initialize application service")?;

    match cli_args.command {
        cli::Commands::GenerateCompletion { .. } => {
            unreachable!("Completion generation should have exited already");
        }
        cli::Commands::Show { sheet } => {
            let header_color = header_color(&service.config);
            let sheets: &[SheetId] = match sheet {
                cli::ShowArg::A => &[SheetId::A],
                cli::ShowArg::B => &[SheetId::B],
                cli::ShowArg::Both => &[SheetId::A, SheetId::B],
            };
            for which in sheets {
                print_sheet(service.sheet(*which), header_color);
                println!();
            }
            match &service.state().logo_ref {
                Some(logo) => println!("Logo: set ({} bytes)", logo.len()),
                None => println!("Logo: not set"),
            }
            if let Some(saved_at) = service.last_saved_at()? {
                println!("Last saved: {}", saved_at.format("%d/%m/%Y %H:%M"));
            }
        }
        cli::Commands::Set { sheet, field, value } => {
            service.set_header_field(sheet.into(), field.into(), &value)?;
            println!("Updated {field:?} on sheet {}.", SheetId::from(sheet));
        }
        cli::Commands::Day { sheet, day } => {
            let day = WeekDay::try_from(day.as_str())?;
            let which = SheetId::from(sheet);
            service.toggle_week_day(which, day)?;
            let selected = service.sheet(which).week_days.contains(&day);
            println!("{day} {} on both sheets.", if selected { "selected" } else { "cleared" });
        }
        cli::Commands::Row { sheet, number, field, value } => {
            if number == 0 || number > workout_sheets_lib::ROWS_PER_SHEET {
                bail!("Row number must be between 1 and {}", workout_sheets_lib::ROWS_PER_SHEET);
            }
            service.set_row_field(sheet.into(), number - 1, field.into(), &value)?;
            println!("Updated row {number} on sheet {}.", SheetId::from(sheet));
        }
        cli::Commands::SideLabel { sheet, block, value } => {
            let which = SheetId::from(sheet);
            let block_count = service.sheet(which).block_count();
            if block == 0 || block > block_count {
                bail!("Block number must be between 1 and {block_count}");
            }
            service.set_side_label(which, block - 1, &value.to_uppercase())?;
            println!("Updated side label of block {block} on sheet {which}.");
        }
        cli::Commands::Suggest { sheet, block } => {
            let suggestions = service.sheet(sheet.into()).suggestions(block.saturating_sub(1));
            if block == 0 || suggestions.is_empty() {
                println!("No suggestions for block {block}.");
            } else {
                for s in suggestions {
                    println!("{s}");
                }
            }
        }
        cli::Commands::Logo { path } => {
            service
                .set_logo_from_file(&path)
                .with_context(|| format!("Failed to set logo from {path:?}"))?;
            println!("Logo updated for both sheets.");
        }
        cli::Commands::ClearLogo => {
            service.clear_logo()?;
            println!("Logo removed.");
        }
        cli::Commands::Reset { yes } => {
            if !yes && !confirm("Deseja limpar todos os dados das fichas? [y/N] ")? {
                println!("Nothing changed.");
                return Ok(());
            }
            service.reset()?;
            println!("Both sheets cleared.");
        }
        cli::Commands::Generate { goal } => {
            let client = service.gemini_client()?;
            println!("Generating...");
            match service.fill_from_goal(&goal, &client).await? {
                FillOutcome::EmptyGoal => {
                    println!("Descreva o treino para a IA gerar...");
                }
                FillOutcome::NoResult => {
                    println!("Generation finished without changes. Run with RUST_LOG=info for details.");
                }
                FillOutcome::Merged(summary) => {
                    println!(
                        "Filled {} rows on sheet A and {} rows on sheet B{}.",
                        summary.sheet_a_rows,
                        summary.sheet_b_rows,
                        if summary.warmup_updated { " (warm-up updated)" } else { "" }
                    );
                }
            }
        }
        cli::Commands::ExportCsv { output } => match output {
            Some(path) => {
                let file = File::create(&path)
                    .with_context(|| format!("Failed to create {path:?}"))?;
                service.export_csv(file)?;
                println!("Exported both sheets to {path:?}");
            }
            None => service.export_csv(stdout().lock())?,
        },
        cli::Commands::DbPath => {
            println!("Database file is located at: {:?}", service.get_db_path());
        }
        cli::Commands::ConfigPath => {
            println!("Config file is located at: {:?}", service.get_config_path());
        }
    }

    Ok(())
}

fn header_color(config: &Config) -> Color {
    parse_color(&config.theme.header_color).map_or_else(
        |e| {
            eprintln!("Warning: {e}. Falling back to Yellow.");
            Color::Yellow
        },
        Color::from,
    )
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt}");
    stdout().flush()?;
    let mut input = String::new();
    stdin().read_line(&mut input)?;
    Ok(matches!(input.trim().to_lowercase().as_str(), "y" | "yes" | "s" | "sim"))
}

fn print_sheet(sheet: &SheetModel, header_color: Color) {
    println!("FICHA DE TREINO - PARTE {}", sheet.training_split);
    println!(
        "Aluno(a): {}   Treino/Dia: {}   Nascimento: {}   Início: {}   Término: {}",
        sheet.student_name,
        sheet.training_day_name,
        sheet.birth_date,
        sheet.start_date,
        sheet.end_date
    );
    let days: Vec<String> = WeekDay::iter()
        .map(|day| {
            let mark = if sheet.week_days.contains(&day) { "x" } else { " " };
            format!("[{mark}] {day}")
        })
        .collect();
    println!("Dias: {}", days.join("  "));
    println!("Aquecimento: {}", sheet.warmup);

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            ["Treino", "Grupo Muscular", "N°", "Exercícios", "Kg", "Série", "Reps", "Observações"]
                .into_iter()
                .map(|h| Cell::new(h).fg(header_color).add_attribute(Attribute::Bold)),
        );

    for (block_idx, _, rows) in sheet.blocks() {
        let side_label = sheet.side_labels.get(block_idx).map_or("", String::as_str);
        for (i, row) in rows.iter().enumerate() {
            table.add_row(vec![
                Cell::new(if i == 0 { side_label } else { "" }),
                Cell::new(&row.group).add_attribute(Attribute::Bold),
                Cell::new(&row.order),
                Cell::new(&row.exercise),
                Cell::new(&row.kg),
                Cell::new(&row.sets),
                Cell::new(&row.reps),
                Cell::new(&row.obs).add_attribute(Attribute::Italic),
            ]);
        }
    }

    println!("{table}");
}
