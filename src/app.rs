use std::time::Duration;

use clap::{error::ErrorKind, Parser};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::cli::args::CliArgs;
use crate::cli::commands::{self, Command};
use crate::cli::validation;
use crate::columns;
use crate::config::{self, ConfigError, ConfigFile};
use crate::controller::{ControllerError, TableController, TableEvent};
use crate::fetch::{Backend, BackendSetupError, HttpBackend, HttpOptions};
use crate::logging;
use crate::output::{self, OutputFormat};
use crate::query::{
    validate_page_size, QueryState, SortDirection, SortSpec, ValidationError, DEFAULT_PAGE_SIZE,
    DEFAULT_SORT_COLUMN,
};
use crate::view::{DisplayMode, ViewError};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Usage(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Backend(#[from] BackendSetupError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Controller(#[from] ControllerError),

    #[error("failed to build runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("failed to read commands: {0}")]
    Input(#[source] std::io::Error),

    #[error("{0}")]
    Fetch(String),

    #[error("failed to render view: {0}")]
    Render(#[from] serde_json::Error),
}

/// Settings after merging command line, config file and defaults.
#[derive(Clone, Debug)]
pub struct RunConfig {
    pub http: HttpOptions,
    pub initial: QueryState,
    pub output_format: OutputFormat,
    pub interactive: bool,
    pub no_color: bool,
}

fn resolve_sort(column: &str, direction: Option<SortDirection>) -> Result<SortSpec, AppError> {
    let all = columns::landlord_columns();
    let found = columns::find(&all, column).ok_or_else(|| ValidationError::UnknownColumn {
        key: column.to_string(),
    })?;
    if !found.sortable {
        return Err(ValidationError::NotSortable {
            key: found.key.to_string(),
        }
        .into());
    }
    Ok(SortSpec::new(
        found.key,
        direction.unwrap_or_else(|| found.first_direction()),
    ))
}

fn sort_from_config(cfg: &ConfigFile) -> Result<Option<SortSpec>, AppError> {
    let direction = match cfg.sort_direction.as_deref() {
        Some(raw) => Some(SortDirection::parse(raw).ok_or_else(|| {
            AppError::Usage(format!("invalid sort_direction '{raw}' in config"))
        })?),
        None => None,
    };
    match cfg.sort_by.as_deref().map(str::trim) {
        Some("") | Some("none") => Ok(None),
        Some(column) => resolve_sort(column, direction).map(Some),
        None => resolve_sort(DEFAULT_SORT_COLUMN, direction.or(Some(SortDirection::Desc))).map(Some),
    }
}

pub fn build_run_config(args: CliArgs, cfg: ConfigFile) -> Result<RunConfig, AppError> {
    validation::validate(&args).map_err(AppError::Usage)?;

    let no_color = args.no_color || cfg.no_color.unwrap_or(false);
    let defaults = HttpOptions::default();
    let http = HttpOptions {
        base_url: args.base_url.or(cfg.base_url.clone()).unwrap_or(defaults.base_url),
        timeout_seconds: args.timeout.or(cfg.timeout).unwrap_or(defaults.timeout_seconds),
        proxy: args.proxy.or(cfg.proxy.clone()),
        header: args.header.or(cfg.header.clone()),
    };

    let page_size = validate_page_size(args.page_size.or(cfg.page_size).unwrap_or(DEFAULT_PAGE_SIZE))?;

    let sort = if args.unsorted {
        None
    } else if let Some(raw) = args.sort.as_deref() {
        let (column, direction) =
            crate::utils::parse_sort_arg(raw).map_err(|e| AppError::Usage(format!("invalid --sort '{raw}': {e}")))?;
        Some(resolve_sort(&column, direction)?)
    } else {
        sort_from_config(&cfg)?
    };

    let mut initial = QueryState::new(page_size, sort)?;
    let keyword = args
        .keyword
        .or(cfg.keyword.clone())
        .filter(|k| !k.trim().is_empty());
    if let Some(keyword) = keyword {
        initial = initial.with_filter(&keyword)?;
    }
    if let Some(page) = args.page {
        initial = initial.with_page(page.saturating_sub(1));
    }

    let output_format = match args.output_format.or(cfg.output_format.clone()) {
        Some(raw) => OutputFormat::parse(&raw)
            .ok_or_else(|| AppError::Usage(format!("invalid output format '{raw}', expected text or json")))?,
        None => OutputFormat::Text,
    };

    Ok(RunConfig {
        http,
        initial,
        output_format,
        interactive: args.interactive,
        no_color,
    })
}

fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    if let Ok(style) = ProgressStyle::with_template(":: {spinner} {msg} [{elapsed}]") {
        pb.set_style(style);
    }
    pb.set_message("loading landlords");
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

fn print_view<B: Backend + 'static>(
    controller: &TableController<B>,
    run: &RunConfig,
) -> Result<(), AppError> {
    print!(
        "{}",
        output::render(&controller.view(), run.output_format, !run.no_color)?
    );
    if run.output_format == OutputFormat::Json {
        println!();
    }
    Ok(())
}

fn print_notice(message: &str, no_color: bool) {
    if no_color {
        eprintln!(":: {message}");
    } else {
        eprintln!(":: {}", message.yellow());
    }
}

async fn run_once<B: Backend + 'static>(
    mut controller: TableController<B>,
    run: &RunConfig,
) -> Result<(), AppError> {
    let pb = spinner();
    let mode = controller.settle().await.clone();
    pb.finish_and_clear();

    let pagination = controller.pagination();
    if mode == DisplayMode::Success
        && pagination.page_count > 0
        && pagination.page_index >= pagination.page_count
    {
        warn!(
            page = pagination.page_index.saturating_add(1),
            page_count = pagination.page_count,
            "requested page is past the last page"
        );
    }

    print_view(&controller, run)?;
    controller.unmount();
    match mode {
        DisplayMode::Error(message) => Err(AppError::Fetch(message)),
        _ => Ok(()),
    }
}

enum Flow {
    Continue,
    Redraw,
    Quit,
}

fn apply_command<B: Backend + 'static>(
    controller: &mut TableController<B>,
    command: Command,
) -> Result<Flow, ControllerError> {
    match command {
        Command::Next => controller.next_page()?,
        Command::Previous => controller.previous_page()?,
        Command::Page(page) => {
            let index = page.checked_sub(1).ok_or(ViewError::PageOutOfRange {
                page,
                page_count: controller.pagination().page_count,
            })?;
            controller.set_page(index)?
        }
        Command::Size(size) => controller.set_page_size(size)?,
        Command::Sort {
            column,
            direction: Some(direction),
        } => controller.set_sort(&column, direction)?,
        Command::Sort {
            column,
            direction: None,
        } => controller.toggle_sort(&column)?,
        Command::Unsort => controller.clear_sort(),
        Command::Filter(text) => controller.set_filter(&text)?,
        Command::ClearFilter => controller.clear_filter()?,
        Command::Retry => controller.retry(),
        Command::Show => return Ok(Flow::Redraw),
        Command::Help => {
            println!("{}", commands::HELP);
            return Ok(Flow::Continue);
        }
        Command::Quit => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}

async fn run_interactive<B: Backend + 'static>(
    mut controller: TableController<B>,
    run: &RunConfig,
) -> Result<(), AppError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut pb = Some(spinner());
    print_notice("type 'help' for commands", run.no_color);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.map_err(AppError::Input)? else {
                    break;
                };
                let command = match commands::parse(&line) {
                    Ok(command) => command,
                    Err(e) => {
                        print_notice(&e.to_string(), run.no_color);
                        continue;
                    }
                };
                let issued_before = controller.requests_issued();
                match apply_command(&mut controller, command) {
                    Ok(Flow::Quit) => break,
                    Ok(Flow::Redraw) => print_view(&controller, run)?,
                    Ok(Flow::Continue) => {}
                    Err(e) => print_notice(&e.to_string(), run.no_color),
                }
                if controller.requests_issued() > issued_before && pb.is_none() {
                    pb = Some(spinner());
                }
            }
            Some(event) = controller.next_event(), if controller.in_flight() > 0 => {
                if matches!(event, TableEvent::Superseded { .. }) {
                    continue;
                }
                if let Some(pb) = pb.take() {
                    pb.finish_and_clear();
                }
                print_view(&controller, run)?;
            }
        }
    }

    if let Some(pb) = pb.take() {
        pb.finish_and_clear();
    }
    controller.unmount();
    Ok(())
}

async fn run_async(run: RunConfig) -> Result<(), AppError> {
    if run.no_color {
        colored::control::set_override(false);
    }

    let backend = HttpBackend::new(&run.http)?;
    info!(endpoint = %backend.endpoint(), "using landlord API");

    let mut controller =
        TableController::new(backend, run.initial.clone(), columns::landlord_columns());
    controller.mount();

    if run.interactive {
        run_interactive(controller, &run).await
    } else {
        run_once(controller, &run).await
    }
}

fn init_config(path: Option<std::path::PathBuf>, no_color: bool) -> Result<(), AppError> {
    let path = match path {
        Some(path) => path,
        None => config::default_config_path().ok_or(ConfigError::NoHome)?,
    };
    if config::ensure_default_config_file(&path)? {
        print_notice(&format!("wrote default config to {}", path.display()), no_color);
    } else {
        print_notice(&format!("config already exists at {}", path.display()), no_color);
    }
    Ok(())
}

pub fn run_cli() -> Result<(), AppError> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                print!("{e}");
                return Ok(());
            }
            _ => return Err(AppError::Usage(e.to_string())),
        },
    };

    logging::init(args.verbose, args.no_color);

    let user_config_path = args.config.clone().map(|p| config::expand_tilde(&p));
    if args.init_config {
        return init_config(user_config_path, args.no_color);
    }

    let cfg = match user_config_path.as_ref() {
        Some(path) => config::load_config(path, false)?,
        None => match config::default_config_path() {
            Some(path) => config::load_config(&path, true)?,
            None => ConfigFile::default(),
        },
    };

    let run = build_run_config(args, cfg)?;

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(AppError::Runtime)?;

    rt.block_on(run_async(run))
}
