use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use plm_cli::cli::{
    Cli, Command, ExportFormat, FieldInfoCommand, TaskCommand, collect_config_overrides,
};
use plm_cli::output;
use plm_cli::session::Session;
use plm_core::config::{Config, load_config_with_fallback, merge_overrides};
use plm_core::datetime::local_offset;
use plm_core::error::AppError;
use plm_core::export::{
    DEFAULT_DOCUMENT_NAME, DEFAULT_SPREADSHEET_NAME, export_document, export_spreadsheet,
    export_year_summary,
};
use plm_core::field_info_api::{
    DeleteStep, FieldInfoDraft, FieldInfoEdit, available_years, default_year, records_for_year,
    summary_lines, year_summary,
};
use plm_core::task_api::{TaskDraft, TaskEdit};
use std::io::{self, BufRead};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const LOG_ENV_VAR: &str = "PLM_LOG";

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = if verbose {
        EnvFilter::new(default_level)
    } else {
        EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(default_level))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn load_config(raw_overrides: &[String]) -> Result<Config, AppError> {
    let loaded = load_config_with_fallback();
    if let Some(err) = loaded.error {
        tracing::warn!(%err, "falling back to default configuration");
    }
    let overrides = collect_config_overrides(raw_overrides)?;
    Ok(merge_overrides(&loaded.config, &overrides))
}

fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid command").trim();
    let message = first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string();
    AppError::invalid_input(message)
}

fn split_command_line(line: &str) -> Result<Vec<String>, AppError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escape = false;

    for ch in line.chars() {
        if escape {
            if ch != '"' && ch != '\\' {
                current.push('\\');
            }
            current.push(ch);
            escape = false;
            continue;
        }

        if in_quotes && ch == '\\' {
            escape = true;
            continue;
        }

        if ch == '"' {
            in_quotes = !in_quotes;
            continue;
        }

        if ch.is_whitespace() && !in_quotes {
            if !current.is_empty() {
                args.push(current.clone());
                current.clear();
            }
            continue;
        }

        current.push(ch);
    }

    if in_quotes {
        return Err(AppError::invalid_input("unterminated quote in command"));
    }

    if !current.is_empty() {
        args.push(current);
    }

    Ok(args)
}

fn print_help() {
    let mut cmd = Cli::command();
    let help = cmd.render_help();
    println!("{help}");
}

fn print_json(value: serde_json::Value) {
    println!("{value}");
}

fn run_command(session: &mut Session, cli: Cli) -> Result<(), AppError> {
    let is_delete = matches!(
        cli.command,
        Command::FieldInfo {
            field_info: FieldInfoCommand::Delete { .. }
        }
    );
    if !is_delete {
        session.clear_pending_delete();
    }

    match cli.command {
        Command::Tasks { filter } => {
            let query = filter.to_query(session.local_offset())?;
            let view = session.view(&query)?;
            if cli.json {
                print_json(output::tasks_json(&view.tasks, &view.totals));
            } else {
                output::print_tasks_plain(&view.tasks, &view.totals, session.palette());
            }
        }
        Command::Export {
            format,
            output: path,
            summary,
            filter,
        } => {
            let query = filter.to_query(session.local_offset())?;
            let view = session.view(&query)?;
            let path = match (path, format) {
                (Some(path), _) => path,
                (None, ExportFormat::Xlsx) => PathBuf::from(DEFAULT_SPREADSHEET_NAME),
                (None, ExportFormat::Pdf) => PathBuf::from(DEFAULT_DOCUMENT_NAME),
            };
            match format {
                ExportFormat::Xlsx => {
                    if summary {
                        return Err(AppError::invalid_input(
                            "--summary is only available for pdf exports",
                        ));
                    }
                    export_spreadsheet(&view.tasks, &path)?;
                }
                ExportFormat::Pdf => export_document(&view.tasks, &path, summary)?,
            }
            if cli.json {
                print_json(serde_json::json!({
                    "path": path.display().to_string(),
                    "tasks": view.tasks.len(),
                }));
            } else {
                println!("Exported {} tasks to {}", view.tasks.len(), path.display());
            }
        }
        Command::Options { kind, farms } => {
            let options = session.options(kind, &farms)?;
            if cli.json {
                print_json(output::options_json(&options));
            } else {
                println!("{}", output::option_table(&options));
            }
        }
        Command::Task { task } => run_task_command(session, task, cli.json)?,
        Command::FieldInfo { field_info } => {
            run_field_info_command(session, field_info, cli.json)?
        }
        Command::Reload => {
            session.reload();
            let tasks = session.dashboard()?.tasks.len();
            if cli.json {
                print_json(serde_json::json!({ "tasks": tasks }));
            } else {
                println!("Reloaded {tasks} tasks");
            }
        }
    }

    Ok(())
}

fn run_task_command(
    session: &mut Session,
    command: TaskCommand,
    json: bool,
) -> Result<(), AppError> {
    match command {
        TaskCommand::Show { id } => {
            let task = session.task(id)?;
            if json {
                print_json(output::task_json(&task));
            } else {
                output::print_task_plain(&task, session.palette());
            }
        }
        TaskCommand::Add {
            field,
            vehicle,
            attachment,
            duration,
            begin,
            end,
            description,
        } => {
            let draft = TaskDraft {
                field_id: field,
                vehicle_id: vehicle,
                attachment_id: attachment,
                description,
                duration,
                begin: begin.unwrap_or_else(|| session.now_local()),
                end,
            };
            let receipt = session.create_task(&draft)?;
            if json {
                print_json(serde_json::json!({
                    "message": receipt.message,
                    "task": receipt.payload,
                }));
            } else {
                println!("{}", receipt.message);
            }
        }
        TaskCommand::Edit {
            id,
            field,
            vehicle,
            attachment,
            duration,
            begin,
            end,
            description,
        } => {
            let edit = TaskEdit {
                field_id: field,
                vehicle_id: vehicle,
                attachment_id: attachment,
                description,
                duration,
                begin,
                end,
            };
            let receipt = session.update_task(id, &edit)?;
            if json {
                print_json(serde_json::json!({
                    "message": receipt.message,
                    "task": receipt.payload,
                }));
            } else {
                println!("{}", receipt.message);
            }
        }
    }

    Ok(())
}

fn resolve_year(session: &mut Session, year: Option<i32>) -> Result<i32, AppError> {
    match year {
        Some(year) => Ok(year),
        None => {
            let fallback = session.current_year();
            Ok(default_year(session.field_infos()?, fallback))
        }
    }
}

fn run_field_info_command(
    session: &mut Session,
    command: FieldInfoCommand,
    json: bool,
) -> Result<(), AppError> {
    match command {
        FieldInfoCommand::List { year } => {
            let year = resolve_year(session, year)?;
            let records = records_for_year(session.field_infos()?, year);
            if json {
                print_json(output::field_infos_json(&records));
            } else {
                println!("{}", session.palette().accentize(&format!("Erntejahr {year}")));
                println!("{}", output::field_info_table(&records));
            }
        }
        FieldInfoCommand::Years => {
            let years = available_years(session.field_infos()?);
            if json {
                print_json(serde_json::json!(years));
            } else {
                for year in years {
                    println!("{year}");
                }
            }
        }
        FieldInfoCommand::Summary { year } => {
            let year = resolve_year(session, year)?;
            let summary = year_summary(session.field_infos()?, year);
            if json {
                print_json(output::area_summary_json(&summary));
            } else {
                let palette = session.palette();
                for (farm, lines) in summary_lines(&summary) {
                    println!("{}", palette.accentize(&farm));
                    for line in lines {
                        println!("  {line}");
                    }
                }
                println!(
                    "{}",
                    palette.mutedize(&format!(
                        "Gesamt: {} Felder, {:.2} ha",
                        summary.total_fields, summary.total_area
                    ))
                );
            }
        }
        FieldInfoCommand::Add {
            fields,
            crop,
            year,
            begin,
        } => {
            let draft = FieldInfoDraft {
                fields,
                begin: begin.unwrap_or_else(|| session.now_local()),
                year: year.unwrap_or_else(|| session.current_year()),
                crop_id: crop,
            };
            let payload = session.create_field_info(&draft)?;
            if json {
                print_json(serde_json::json!(payload));
            } else {
                println!(
                    "Added crop {} to {} field(s) for {}",
                    payload.crop_id,
                    payload.fields.len(),
                    payload.year
                );
            }
        }
        FieldInfoCommand::Edit { id, crop, begin } => {
            let payload = session.update_field_info(id, &FieldInfoEdit { begin, crop_id: crop })?;
            if json {
                print_json(serde_json::json!(payload));
            } else {
                println!("Updated field info {id}");
            }
        }
        FieldInfoCommand::Delete { id, yes } => match session.delete_field_info(id, yes)? {
            DeleteStep::ConfirmationRequired(id) => {
                if json {
                    print_json(serde_json::json!({ "id": id, "deleted": false }));
                } else {
                    println!(
                        "Delete field info {id}? Repeat the command or pass --yes to confirm."
                    );
                }
            }
            DeleteStep::Deleted(id) => {
                if json {
                    print_json(serde_json::json!({ "id": id, "deleted": true }));
                } else {
                    println!("Deleted field info {id}");
                }
            }
        },
        FieldInfoCommand::Export { year, output: path } => {
            let year = resolve_year(session, year)?;
            let path = path.unwrap_or_else(|| PathBuf::from(format!("anbau-{year}.pdf")));
            export_year_summary(session.field_infos()?, year, &path)?;
            if json {
                print_json(serde_json::json!({
                    "path": path.display().to_string(),
                    "year": year,
                }));
            } else {
                println!("Exported {year} summary to {}", path.display());
            }
        }
    }

    Ok(())
}

fn run_interactive() -> Result<(), AppError> {
    init_tracing(false);
    let config = load_config(&[])?;
    let mut session = Session::from_config(config, local_offset())?;

    let mut input = String::new();
    let stdin = io::stdin();
    let mut stdin_lock = stdin.lock();

    loop {
        input.clear();
        let bytes = stdin_lock
            .read_line(&mut input)
            .map_err(|err| AppError::io(err.to_string()))?;

        if bytes == 0 {
            break;
        }

        let line = input.trim();
        if line.is_empty() {
            continue;
        }

        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        if line == "help" || line == "?" {
            print_help();
            continue;
        }

        let args = match split_command_line(line) {
            Ok(args) => args,
            Err(err) => {
                eprintln!("ERROR: {}", err);
                continue;
            }
        };

        if args.is_empty() {
            continue;
        }

        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push("plm".to_string());
        argv.extend(args);

        let cli = match Cli::try_parse_from(argv) {
            Ok(cli) => cli,
            Err(err) => {
                eprintln!("ERROR: {}", normalize_parse_error(err));
                continue;
            }
        };

        if !cli.config_override.is_empty() {
            eprintln!(
                "ERROR: {}",
                AppError::invalid_input("config overrides are only accepted on the command line")
            );
            continue;
        }

        if let Err(err) = run_command(&mut session, cli) {
            eprintln!("ERROR: {}", err);
        }
    }

    Ok(())
}

fn run_once(cli: Cli) -> Result<(), AppError> {
    init_tracing(cli.verbose);
    let config = load_config(&cli.config_override)?;
    let mut session = Session::from_config(config, local_offset())?;
    run_command(&mut session, cli)
}

fn main() {
    let mut args = std::env::args_os();
    args.next();
    if args.next().is_none() {
        if let Err(err) = run_interactive() {
            eprintln!("ERROR: {}", err);
            std::process::exit(1);
        }
        return;
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = err.print();
            return;
        }
        Err(err) => {
            eprintln!("ERROR: {}", normalize_parse_error(err));
            std::process::exit(1);
        }
    };

    if let Err(err) = run_once(cli) {
        eprintln!("ERROR: {}", err);
        std::process::exit(1);
    }
}
