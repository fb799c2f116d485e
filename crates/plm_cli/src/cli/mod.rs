use clap::{Args, Parser, Subcommand, ValueEnum};
use plm_core::config::{ConfigOverrides, canonical_theme_name};
use plm_core::datetime::parse_local_datetime;
use plm_core::error::AppError;
use plm_core::filter::TaskFilter;
use plm_core::sort::{SortKey, SortOrder};
use plm_core::view::Query;
use std::path::PathBuf;
use time::UtcOffset;

#[derive(Parser, Debug)]
#[command(name = "plm", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Override configuration values (format KEY=VALUE)
    #[arg(long = "config-override", value_name = "KEY=VALUE", global = true)]
    pub config_override: Vec<String>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Filter selections and sort shared by listing and export.
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Farm ids (repeat or separate with commas)
    #[arg(long = "farm", value_name = "ID", value_delimiter = ',')]
    pub farms: Vec<i64>,
    /// Field ids
    #[arg(long = "field", value_name = "ID", value_delimiter = ',')]
    pub fields: Vec<i64>,
    /// Vehicle ids
    #[arg(long = "vehicle", value_name = "ID", value_delimiter = ',')]
    pub vehicles: Vec<i64>,
    /// Attachment ids
    #[arg(long = "attachment", value_name = "ID", value_delimiter = ',')]
    pub attachments: Vec<i64>,
    /// Harvest years
    #[arg(long = "year", value_name = "YEAR", value_delimiter = ',')]
    pub years: Vec<i32>,
    /// Crop ids
    #[arg(long = "crop", value_name = "ID", value_delimiter = ',')]
    pub crops: Vec<i64>,
    /// Earliest begin (YYYY-MM-DD[ HH:MM[:SS]])
    #[arg(long, value_name = "DATETIME")]
    pub from: Option<String>,
    /// Latest begin (YYYY-MM-DD[ HH:MM[:SS]])
    #[arg(long, value_name = "DATETIME")]
    pub to: Option<String>,
    /// Case-insensitive text in the description
    #[arg(long, value_name = "TEXT")]
    pub search: Option<String>,
    /// date, duration, field, crop, year, vehicle, attachment, size or performance
    #[arg(long, value_name = "KEY", default_value = "date")]
    pub sort: String,
    /// asc or desc
    #[arg(long, value_name = "ORDER", default_value = "desc")]
    pub order: String,
}

impl FilterArgs {
    /// Builds the pipeline query. Dates are read as local wall-clock time.
    pub fn to_query(&self, local_offset: UtcOffset) -> Result<Query, AppError> {
        let bound = |raw: Option<&str>| -> Result<_, AppError> {
            raw.map(|value| {
                parse_local_datetime(value).map(|local| local.assume_offset(local_offset))
            })
            .transpose()
        };

        let filter = TaskFilter {
            farms: self.farms.iter().copied().collect(),
            vehicles: self.vehicles.iter().copied().collect(),
            attachments: self.attachments.iter().copied().collect(),
            fields: self.fields.iter().copied().collect(),
            harvest_years: self.years.iter().copied().collect(),
            crops: self.crops.iter().copied().collect(),
            start: bound(self.from.as_deref())?,
            end: bound(self.to.as_deref())?,
            search: self.search.clone().unwrap_or_default(),
        };

        Ok(Query {
            filter,
            sort_key: self.sort.parse::<SortKey>()?,
            sort_order: self.order.parse::<SortOrder>()?,
        })
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List tasks with header statistics
    ///
    /// Example: plm tasks --farm 1 --year 2024 --sort performance --order asc
    Tasks {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Export the filtered task list
    ///
    /// Example: plm export xlsx --output auftragsliste.xlsx
    /// Example: plm export pdf --summary --year 2024
    Export {
        format: ExportFormat,
        /// Target file (defaults to auftragsliste.xlsx / auftragsliste.pdf)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
        /// Append the farm/crop area summary (pdf only)
        #[arg(long)]
        summary: bool,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// List the choices for a filter
    ///
    /// Example: plm options fields --farm 2
    Options {
        kind: OptionKind,
        /// Narrow fields to these farms
        #[arg(long = "farm", value_name = "ID", value_delimiter = ',')]
        farms: Vec<i64>,
    },
    /// Show, add or edit a task
    ///
    /// Example: plm task show 12
    Task {
        #[command(subcommand)]
        task: TaskCommand,
    },
    /// Manage harvest-year field assignments
    ///
    /// Example: plm fieldinfo list --year 2024
    #[command(name = "fieldinfo")]
    FieldInfo {
        #[command(subcommand)]
        field_info: FieldInfoCommand,
    },
    /// Drop cached data and fetch everything again
    ///
    /// Example: plm reload
    Reload,
}

#[derive(Subcommand, Debug)]
pub enum TaskCommand {
    /// Show details of a task
    ///
    /// Example: plm task show 12
    Show { id: i64 },
    /// Record a new task
    ///
    /// Example: plm task add --field 3 --vehicle 1 --attachment 2 --duration 01:30 --begin "2024-05-01 08:00" --description "Pflügen"
    Add {
        #[arg(long, value_name = "ID")]
        field: i64,
        #[arg(long, value_name = "ID")]
        vehicle: i64,
        #[arg(long, value_name = "ID")]
        attachment: i64,
        /// HH:MM or HH:MM:SS
        #[arg(long, value_name = "DURATION")]
        duration: String,
        /// Local begin (defaults to now)
        #[arg(long, value_name = "DATETIME")]
        begin: Option<String>,
        /// Local end (defaults to begin + duration)
        #[arg(long, value_name = "DATETIME")]
        end: Option<String>,
        #[arg(long, value_name = "TEXT", default_value = "")]
        description: String,
    },
    /// Change an existing task
    ///
    /// Example: plm task edit 12 --duration 02:00 --description "Grubbern"
    Edit {
        id: i64,
        #[arg(long, value_name = "ID")]
        field: Option<i64>,
        #[arg(long, value_name = "ID")]
        vehicle: Option<i64>,
        #[arg(long, value_name = "ID")]
        attachment: Option<i64>,
        #[arg(long, value_name = "DURATION")]
        duration: Option<String>,
        #[arg(long, value_name = "DATETIME")]
        begin: Option<String>,
        #[arg(long, value_name = "DATETIME")]
        end: Option<String>,
        #[arg(long, value_name = "TEXT")]
        description: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum FieldInfoCommand {
    /// List assignments of a year (defaults to the newest year)
    ///
    /// Example: plm fieldinfo list --year 2024
    List {
        #[arg(long)]
        year: Option<i32>,
    },
    /// Years that have assignments
    ///
    /// Example: plm fieldinfo years
    Years,
    /// Crop counts and areas per farm
    ///
    /// Example: plm fieldinfo summary --year 2024
    Summary {
        #[arg(long)]
        year: Option<i32>,
    },
    /// Assign a crop to one or more fields
    ///
    /// Example: plm fieldinfo add --field 3,4 --crop 7 --year 2024 --begin 2024-04-01
    Add {
        #[arg(long = "field", value_name = "ID", value_delimiter = ',', required = true)]
        fields: Vec<i64>,
        #[arg(long, value_name = "ID")]
        crop: i64,
        /// Harvest year (defaults to the current year)
        #[arg(long)]
        year: Option<i32>,
        /// Local begin (defaults to now)
        #[arg(long, value_name = "DATETIME")]
        begin: Option<String>,
    },
    /// Change crop or begin of an assignment
    ///
    /// Example: plm fieldinfo edit 5 --crop 8
    Edit {
        id: i64,
        #[arg(long, value_name = "ID")]
        crop: Option<i64>,
        #[arg(long, value_name = "DATETIME")]
        begin: Option<String>,
    },
    /// Delete an assignment
    ///
    /// Example: plm fieldinfo delete 5 --yes
    Delete {
        id: i64,
        /// Skip the confirmation step
        #[arg(long)]
        yes: bool,
    },
    /// Write the year's crop summary as a document
    ///
    /// Example: plm fieldinfo export --year 2024 --output anbau-2024.pdf
    Export {
        #[arg(long)]
        year: Option<i32>,
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Xlsx,
    Pdf,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    Farms,
    Fields,
    Vehicles,
    Attachments,
    Crops,
    Years,
}

/// Flag name used to identify config override arguments by the runtime.
pub const CONFIG_OVERRIDE_FLAG: &str = "--config-override";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOverrideTarget {
    Theme,
    BaseUrl,
    TimeoutSecs,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedConfigOverride {
    pub target: ConfigOverrideTarget,
    pub value: String,
}

/// Parse a raw `KEY=VALUE` override string into a structured target.
pub fn parse_config_override(raw: &str) -> Result<ParsedConfigOverride, String> {
    let trimmed = raw.trim();
    let (key_raw, value_raw) = trimmed
        .split_once('=')
        .ok_or_else(|| "override must be in KEY=VALUE format".to_string())?;

    let value = value_raw.trim().to_string();
    let canonical_field =
        canonicalize_flag_name(key_raw).ok_or_else(|| "override key cannot be empty".to_string())?;

    let target = match canonical_field.as_str() {
        "theme" => ConfigOverrideTarget::Theme,
        "base_url" | "url" => ConfigOverrideTarget::BaseUrl,
        "timeout_secs" | "timeout" => ConfigOverrideTarget::TimeoutSecs,
        other => return Err(format!("unknown config field '{other}'")),
    };

    if value.is_empty() {
        return Err(format!("{canonical_field} override needs a value"));
    }

    Ok(ParsedConfigOverride { target, value })
}

/// Folds every `--config-override` into one set of overrides. Later values win.
pub fn collect_config_overrides(raw: &[String]) -> Result<ConfigOverrides, AppError> {
    let mut overrides = ConfigOverrides::default();

    for entry in raw {
        let parsed = parse_config_override(entry).map_err(|message| {
            AppError::invalid_input(format!("{CONFIG_OVERRIDE_FLAG}: {message}"))
        })?;
        match parsed.target {
            ConfigOverrideTarget::Theme => {
                overrides.theme = canonical_theme_name(&parsed.value);
            }
            ConfigOverrideTarget::BaseUrl => overrides.base_url = Some(parsed.value),
            ConfigOverrideTarget::TimeoutSecs => {
                let secs = parsed.value.parse::<u64>().map_err(|_| {
                    AppError::invalid_input(format!(
                        "{CONFIG_OVERRIDE_FLAG}: timeout_secs must be a whole number, got '{}'",
                        parsed.value
                    ))
                })?;
                overrides.timeout_secs = Some(secs);
            }
        }
    }

    Ok(overrides)
}

fn canonicalize_flag_name(name: &str) -> Option<String> {
    let mut cleaned = String::new();
    let mut previous_underscore = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch.to_ascii_lowercase());
            previous_underscore = false;
        } else if !previous_underscore && !cleaned.is_empty() {
            cleaned.push('_');
            previous_underscore = true;
        }
    }

    let trimmed = cleaned.trim_matches('_');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
