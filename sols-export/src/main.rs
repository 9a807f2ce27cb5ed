use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use log::{debug, info};
use sols_timetable::{generate_ics, parse_timetable, AcademicCalendar, Timetable};
use tokio::runtime;

mod cli;
mod server;

use cli::{Mode, Output};
use server::AppState;

fn main() -> Result<()> {
    let args = cli::parse(env::args().skip(1).collect());

    setup_logging();

    let calendar = match &args.calendar {
        Some(path) => AcademicCalendar::from_path(path)
            .with_context(|| format!("Failed to load academic calendar {}", path.display()))?,
        None => AcademicCalendar::embedded().context("Built-in academic calendar is invalid")?,
    };

    match args.mode {
        Mode::Convert {
            input,
            output,
            json,
        } => convert(&input, &output, json, &calendar, args.year),

        Mode::Serve { address } => {
            let state = Arc::new(AppState {
                calendar,
                year: args.year,
            });

            runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?
                .block_on(server::serve(address, state))
                .context("Server failed")
        }
    }
}

fn convert(
    input: &Path,
    output: &Output,
    json: bool,
    calendar: &AcademicCalendar,
    year: i32,
) -> Result<()> {
    if calendar.year(year).is_none() {
        let known = calendar
            .years()
            .map(|year| year.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        bail!("No academic calendar for {year} (configured: {known})");
    }

    let raw = fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;

    let timetable: Timetable = if json {
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse classes from {}", input.display()))?
    } else {
        parse_timetable(&raw)
    };

    if timetable.events.is_empty() {
        bail!(
            "No timetable entries found in {}. Make sure it is the My Timetable page.",
            input.display()
        );
    }

    debug!("Parsed {} classes from {}", timetable.events.len(), input.display());
    info!("Generating ICS for {} classes", timetable.events.len());

    let ics = generate_ics(&timetable.events, calendar, year);

    match output {
        Output::Stdout => io::stdout()
            .write_all(ics.as_bytes())
            .context("Failed to write calendar to stdout")?,
        Output::File(path) => {
            fs::write(path, ics).with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Exported {} classes to {}", timetable.events.len(), path.display());
        }
    }

    Ok(())
}

fn setup_logging() {
    if env::var("LOG").is_err() {
        env::set_var("LOG", "sols_export=info,sols_timetable=info");
    }

    pretty_env_logger::init_custom_env("LOG");
}
