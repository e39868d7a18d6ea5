use std::fs;
use std::io;
use std::process::ExitCode;

use anyhow::{Context, anyhow};
use clap::Parser;
use log::{error, info};

use ul_timetable::cli::Cli;
use ul_timetable::core::calendar::export_calendar;
use ul_timetable::core::display::{display_timetable, to_pretty_json};
use ul_timetable::core::html_parser::extract_timetable;
use ul_timetable::core::portal::Portal;
use ul_timetable::core::render::render_timetable_image;
use ul_timetable::core::storage::save_timetable;
use ul_timetable::error::ScrapeError;
use ul_timetable::utils::credentials::{CredentialPrompt, CredentialSources, resolve_credentials};
use ul_timetable::utils::input::{input, input_password};
use ul_timetable::utils::logging::{LoggingConfig, init_logging};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let _logging = match init_logging(&LoggingConfig {
        verbose: cli.verbose,
        log_file: Some(cli.log_file.clone()),
    }) {
        Ok(handle) => Some(handle),
        Err(err) => {
            eprintln!("warning: logging disabled: {:#}", err);
            None
        }
    };

    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            error!("{:#}", err);
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    // Flag problems are fatal before any network work.
    let calendar = cli.calendar_request()?;

    let html = match &cli.html_file {
        Some(path) => {
            info!("Reading timetable page from {}", path.display());
            fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?
        }
        None => {
            let credentials = resolve_credentials(
                CredentialSources {
                    username: cli.username.clone(),
                    password: cli.password.clone(),
                    creds_file: cli.creds_file.as_deref(),
                },
                |key| std::env::var(key).ok(),
                |field| match field {
                    CredentialPrompt::Username => input("Enter your UL student email: "),
                    CredentialPrompt::Password => input_password("Enter your UL password: "),
                },
            )?;

            info!("Starting timetable scraping");
            let portal = Portal::new(cli.portal_config()?).map_err(|err| anyhow!("{}", err))?;
            match portal.fetch_timetable(&credentials).await {
                Ok(html) => html,
                Err(err) => return Ok(report_failure(&err, &cli.format)),
            }
        }
    };

    let timetable = match extract_timetable(&html) {
        Ok(timetable) => timetable,
        Err(err) => return Ok(report_failure(&err, &cli.format)),
    };

    if let Some(output) = &cli.output {
        save_timetable(&timetable, output);
    }

    if let Some(image) = &cli.image {
        info!("Generating timetable visualization(s) with theme: {:?}", cli.theme);
        let (theme, generate_all) = cli.theme.selection();
        render_timetable_image(&timetable, image, theme, generate_all);
    }

    if let Some(request) = &calendar {
        if let Some(path) = export_calendar(&timetable, &request.path, request.semester_start) {
            println!("Calendar exported to: {}", path.display());
            println!("You can import this file into Google Calendar, Outlook, or any other calendar app.");
        }
    }

    if display_timetable(&timetable, &cli.format, &mut io::stdout().lock()).is_err() {
        return Ok(ExitCode::FAILURE);
    }

    info!("Timetable processing completed successfully");
    Ok(ExitCode::SUCCESS)
}

/// Prints a failed scrape in the chosen output format and picks the exit code.
fn report_failure(err: &ScrapeError, format: &str) -> ExitCode {
    error!("{}", err);
    match (format, to_pretty_json(err)) {
        ("json", Ok(json)) => println!("{}", json),
        _ => {
            println!("Error: {}", err);
            println!("Check the snapshots directory and logs for more details.");
        }
    }
    ExitCode::FAILURE
}
