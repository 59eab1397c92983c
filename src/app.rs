use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::{error::ErrorKind, CommandFactory, Parser};
use dialoguer::theme::ColorfulTheme;
use dialoguer::Confirm;
use serde_json::Value;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::args::{
    CliArgs, Command, ExportArgs, HardwareCommand, ListArgs, MutateArgs, PrefsArgs,
};
use crate::cli::validation;
use crate::client::hardware::{Device, HardwareBridge, DEFAULT_HARDWARE_URL};
use crate::client::{ApiClient, ClientOptions, DEFAULT_BASE_URL};
use crate::config::prefs::{self, Prefs};
use crate::config::{self, ConfigFile};
use crate::output::{self, OutputFormat};
use crate::resources::{self, ListRequest, Needs, ReferenceData, ResourceKind};
use crate::{dashboard, nav, production};

fn format_kv_line(label: &str, value: &str) {
    println!(":: {:<10}: {}", label, value);
}

#[derive(Clone, Debug)]
struct RunConfig {
    command: Command,
    client: ClientOptions,
    hardware_url: String,
    workers: usize,
    verbose: u8,
    no_color: bool,
    per_page: usize,
    output_format: Option<OutputFormat>,
    prefs_path: Option<PathBuf>,
}

fn build_run_config(args: CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let no_color = args.no_color || cfg.no_color.unwrap_or(false);
    let timeout = args.timeout.or(cfg.timeout).unwrap_or(30);
    if timeout == 0 {
        return Err("invalid timeout in config, expected positive integer".to_string());
    }
    let workers = args.workers.or(cfg.workers).unwrap_or(4);
    if workers == 0 {
        return Err("invalid workers in config, expected positive integer".to_string());
    }
    let per_page = cfg.per_page.filter(|n| *n > 0).unwrap_or(10);

    let base_url = args
        .base_url
        .or(cfg.base_url)
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let hardware_url = args
        .hardware_url
        .or(cfg.hardware_url)
        .unwrap_or_else(|| DEFAULT_HARDWARE_URL.to_string());

    let output_format = match cfg.output_format.as_deref() {
        Some(raw) => Some(
            OutputFormat::parse(raw)
                .ok_or_else(|| format!("invalid output_format '{raw}' in config"))?,
        ),
        None => None,
    };

    Ok(RunConfig {
        command: args.command,
        client: ClientOptions {
            base_url,
            timeout_seconds: timeout,
            proxy: args.proxy.or(cfg.proxy),
            header: args.header.or(cfg.header),
        },
        hardware_url,
        workers,
        verbose: args.verbose,
        no_color,
        per_page,
        output_format,
        prefs_path: prefs::default_prefs_path(),
    })
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("floortrack={level}")));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn parse_filters(raw: &[String]) -> Result<BTreeMap<String, String>, String> {
    raw.iter()
        .map(|item| crate::utils::parse_key_value(item))
        .collect()
}

fn read_document(raw: &str) -> Result<Value, String> {
    let text = match raw.strip_prefix('@') {
        Some(path) => {
            let path = config::expand_tilde(path);
            std::fs::read_to_string(&path)
                .map_err(|e| format!("failed to read '{}': {e}", path.display()))?
        }
        None => raw.to_string(),
    };
    serde_json::from_str(&text).map_err(|e| format!("invalid JSON document: {e}"))
}

fn load_prefs(run: &RunConfig) -> Prefs {
    run.prefs_path
        .as_deref()
        .map(Prefs::load)
        .unwrap_or_default()
}

fn show_details(kind: ResourceKind, prefs: &Prefs) -> bool {
    match kind {
        ResourceKind::OutputRolls => prefs.rolls_show_details,
        ResourceKind::InputRolls => prefs.input_rolls_show_details,
        _ => false,
    }
}

async fn run_list(run: &RunConfig, client: &ApiClient, args: &ListArgs) -> Result<(), String> {
    let kind = ResourceKind::parse(&args.resource).map_err(|e| e.to_string())?;
    let request = ListRequest {
        page: args.page.unwrap_or(1),
        per_page: args.per_page.unwrap_or(run.per_page),
        filters: parse_filters(&args.filter.filters)?,
        detailed: show_details(kind, &load_prefs(run)),
    };
    let format = args
        .output_format
        .as_deref()
        .and_then(OutputFormat::parse)
        .or(run.output_format)
        .unwrap_or(OutputFormat::Text);

    let pb = output::spinner(&format!("Loading {kind}..."));
    let listing = resources::list(client, kind, &request).await;
    pb.finish_and_clear();
    let listing = listing.map_err(|e| e.to_string())?;

    match format {
        OutputFormat::Json => print!("{}", String::from_utf8_lossy(&output::render_json(&listing.records))),
        OutputFormat::Csv => print!("{}", String::from_utf8_lossy(&output::render_csv(&listing.table))),
        OutputFormat::Text => {
            output::stats_banner(&listing.stats);
            if listing.table.is_empty() {
                output::warning(&format!("No {kind} found"));
                return Ok(());
            }
            print!("{}", String::from_utf8_lossy(&output::render_text(&listing.table)));
            if let Some(footer) = listing.pagination.footer() {
                println!("{footer}");
            }
            let options = listing
                .per_page_options
                .iter()
                .map(|o| {
                    if o.selected {
                        format!("[{}]", o.label)
                    } else {
                        o.label.clone()
                    }
                })
                .collect::<Vec<_>>()
                .join(" ");
            format_kv_line("Per page", &options);
        }
    }
    Ok(())
}

async fn run_export(run: &RunConfig, client: &ApiClient, args: &ExportArgs) -> Result<(), String> {
    let kind = ResourceKind::parse(&args.resource).map_err(|e| e.to_string())?;
    let filters = parse_filters(&args.filter.filters)?;
    let output_path = args.output.as_deref().map(config::expand_tilde_string);
    let format = args
        .output_format
        .as_deref()
        .and_then(OutputFormat::parse)
        .or_else(|| output_path.as_deref().and_then(output::infer_format_from_path))
        .or(run.output_format)
        .unwrap_or(OutputFormat::Csv);

    let pb = output::spinner(&format!("Exporting {kind}..."));
    let exported = resources::export(client, kind, &filters).await;
    pb.finish_and_clear();
    let (table, records) = exported.map_err(|e| e.to_string())?;
    if table.is_empty() {
        output::warning("No data to export");
        return Ok(());
    }

    let bytes = match format {
        OutputFormat::Text => output::render_text(&table),
        OutputFormat::Json => output::render_json(&records),
        OutputFormat::Csv => output::render_csv(&table),
    };
    match output_path {
        Some(path) => {
            tokio::fs::write(&path, &bytes)
                .await
                .map_err(|e| format!("failed to write output file: {e}"))?;
            output::success(&format!("Exported {} rows to {}", table.rows.len(), path));
        }
        None => print!("{}", String::from_utf8_lossy(&bytes)),
    }
    Ok(())
}

async fn run_mutation(client: &ApiClient, args: &MutateArgs, update: bool) -> Result<(), String> {
    let kind = ResourceKind::parse(&args.resource).map_err(|e| e.to_string())?;
    let doc = read_document(&args.data)?;
    let pb = output::spinner(if update { "Updating..." } else { "Saving..." });
    let result = if update {
        resources::update(client, kind, doc).await
    } else {
        resources::create(client, kind, doc).await
    };
    pb.finish_and_clear();
    let body = result.map_err(|e| e.to_string())?;
    output::success(&format!(
        "{} {}",
        kind,
        if update { "updated" } else { "created" }
    ));
    if !body.is_null() {
        print!("{}", String::from_utf8_lossy(&output::render_json(&body)));
    }
    Ok(())
}

async fn run_delete(client: &ApiClient, resource: &str, id: i64, yes: bool) -> Result<(), String> {
    let kind = ResourceKind::parse(resource).map_err(|e| e.to_string())?;
    if !yes {
        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("Delete {kind} #{id}?"))
            .default(false)
            .interact()
            .map_err(|e| format!("prompt failed: {e}"))?;
        if !confirmed {
            output::info("Cancelled");
            return Ok(());
        }
    }
    resources::delete(client, kind, id)
        .await
        .map_err(|e| e.to_string())?;
    output::success(&format!("{kind} #{id} deleted"));
    Ok(())
}

async fn run_dashboard(client: &ApiClient) -> Result<(), String> {
    let needs = Needs {
        users: true,
        machines: true,
        downtime_reasons: true,
        scrap_types: true,
        ..Needs::default()
    };
    let pb = output::spinner("Loading dashboard...");
    let loaded = futures::try_join!(
        dashboard::current_overview(client),
        dashboard::recent(client),
        ReferenceData::load(client, needs),
    );
    pb.finish_and_clear();
    let (overview, recent, refs) = loaded.map_err(|e| e.to_string())?;
    dashboard::print_overview(&overview);
    dashboard::print_recent(&recent, &refs);
    Ok(())
}

async fn run_roll(client: &ApiClient, number: &str) -> Result<(), String> {
    let needs = Needs {
        users: true,
        ..Needs::default()
    };
    let (roll, refs) = futures::try_join!(
        dashboard::find_roll(client, number),
        ReferenceData::load(client, needs),
    )
    .map_err(|e| e.to_string())?;
    match roll {
        Some(roll) => dashboard::print_roll(&roll, &refs),
        None => output::warning(&format!("Roll {} not found", number.trim())),
    }
    Ok(())
}

async fn run_whoami(run: &RunConfig, client: &ApiClient) -> Result<(), String> {
    let (user, role_name) = nav::whoami(client).await.map_err(|e| e.to_string())?;
    remember_user(run, &user);
    format_kv_line("User", &user.full_name);
    format_kv_line("Staff ID", &user.staffid);
    format_kv_line("Role", role_name.as_deref().unwrap_or("-"));
    format_kv_line("Status", &user.status);
    let mut menu = output::Table::new(["Menu", "Command"]);
    for item in nav::menu_for_role(role_name.as_deref()) {
        menu.push(vec![item.label.to_string(), item.command.to_string()]);
    }
    println!();
    print!("{}", menu.render());
    Ok(())
}

fn remember_user(run: &RunConfig, user: &crate::models::User) {
    let Some(path) = run.prefs_path.as_deref() else {
        return;
    };
    let mut prefs = Prefs::load(path);
    prefs.session_user = Some(user.clone());
    if let Err(e) = prefs.save(path) {
        output::warning(&e);
    }
}

async fn run_production(run: &RunConfig, client: &ApiClient) -> Result<(), String> {
    let (user, _) = nav::whoami(client).await.map_err(|e| e.to_string())?;
    remember_user(run, &user);
    info!("production session for user {}", user.id);
    production::interactive::run(client, &user).await
}

async fn run_hardware(run: &RunConfig, command: &HardwareCommand) -> Result<(), String> {
    let bridge = HardwareBridge::new(&run.hardware_url, run.client.timeout_seconds)
        .map_err(|e| e.to_string())?;
    match command {
        HardwareCommand::Weight => {
            let weight = bridge.weight().await.map_err(|e| e.to_string())?;
            format_kv_line("Weight", &format!("{weight} kg"));
        }
        HardwareCommand::Print { file } => {
            let path = config::expand_tilde(file);
            let pdf = tokio::fs::read(&path)
                .await
                .map_err(|e| format!("failed to read '{}': {e}", path.display()))?;
            bridge.print_pdf(&pdf).await.map_err(|e| e.to_string())?;
            output::success("Sent to printer");
        }
        HardwareCommand::Settings => {
            let settings = bridge.settings().await.map_err(|e| e.to_string())?;
            format_kv_line(
                "Scanner",
                &format!("{} @ {}", settings.scanner.port_name, settings.scanner.baud_rate),
            );
            format_kv_line(
                "Scale",
                &format!("{} @ {}", settings.scale.port_name, settings.scale.baud_rate),
            );
            if !settings.is_configured() {
                output::warning("Serial ports are not fully configured");
            }
        }
        HardwareCommand::SaveSettings(args) => {
            let mut settings = bridge.settings().await.map_err(|e| e.to_string())?;
            if let Some(port) = &args.scanner_port {
                settings.scanner.port_name = port.clone();
            }
            if let Some(baud) = args.scanner_baud {
                settings.scanner.baud_rate = baud;
            }
            if let Some(port) = &args.scale_port {
                settings.scale.port_name = port.clone();
            }
            if let Some(baud) = args.scale_baud {
                settings.scale.baud_rate = baud;
            }
            bridge
                .save_settings(&settings)
                .await
                .map_err(|e| e.to_string())?;
            output::success("Settings saved");
        }
        HardwareCommand::Test { device } => {
            let device = Device::parse(device)
                .ok_or_else(|| format!("invalid device '{device}'"))?;
            let result = bridge.test_device(device).await.map_err(|e| e.to_string())?;
            if result.success {
                output::success(&format!("{}: {}", device.as_str(), result.message));
            } else {
                output::error(&format!("{}: {}", device.as_str(), result.message));
            }
        }
        HardwareCommand::LastUpdate => {
            let when = bridge.last_update().await.map_err(|e| e.to_string())?;
            format_kv_line("Updated", &when);
        }
        HardwareCommand::Update { base_url } => {
            let pb = output::spinner("Updating hardware app...");
            let result = bridge.run_update(base_url.as_deref()).await;
            pb.finish_and_clear();
            let message = result.map_err(|e| e.to_string())?;
            output::success(if message.trim().is_empty() {
                "Update started"
            } else {
                message.trim()
            });
        }
    }
    Ok(())
}

fn run_prefs(run: &RunConfig, args: &PrefsArgs) -> Result<(), String> {
    let path = run
        .prefs_path
        .as_deref()
        .ok_or_else(|| "could not locate the home directory".to_string())?;
    let mut prefs = Prefs::load(path);
    let mut changed = args.forget_user;
    if let Some(raw) = &args.rolls_details {
        prefs.rolls_show_details = crate::utils::parse_on_off(raw)?;
        changed = true;
    }
    if let Some(raw) = &args.input_rolls_details {
        prefs.input_rolls_show_details = crate::utils::parse_on_off(raw)?;
        changed = true;
    }
    if args.forget_user {
        prefs.session_user = None;
    }
    if changed {
        prefs.save(path)?;
        output::success("Preferences saved");
    }
    let on_off = |b: bool| if b { "on" } else { "off" };
    format_kv_line("Rolls details", on_off(prefs.rolls_show_details));
    format_kv_line("Input rolls", on_off(prefs.input_rolls_show_details));
    format_kv_line(
        "User",
        prefs
            .session_user
            .as_ref()
            .map(|u| u.full_name.as_str())
            .unwrap_or("-"),
    );
    Ok(())
}

async fn run_async(run: RunConfig) -> Result<(), String> {
    if run.no_color {
        colored::control::set_override(false);
    }
    init_tracing(run.verbose);

    match &run.command {
        Command::Hardware(command) => return run_hardware(&run, command).await,
        Command::Prefs(args) => return run_prefs(&run, args),
        _ => {}
    }

    let client = ApiClient::new(&run.client).map_err(|e| e.to_string())?;
    info!("using backend {}", client.base_url());
    match &run.command {
        Command::List(args) => run_list(&run, &client, args).await,
        Command::Export(args) => run_export(&run, &client, args).await,
        Command::Create(args) => run_mutation(&client, args, false).await,
        Command::Update(args) => run_mutation(&client, args, true).await,
        Command::Delete(args) => run_delete(&client, &args.resource, args.id, args.yes).await,
        Command::Dashboard => run_dashboard(&client).await,
        Command::Roll { number } => run_roll(&client, number).await,
        Command::Whoami => run_whoami(&run, &client).await,
        Command::Production => run_production(&run, &client).await,
        Command::Hardware(_) | Command::Prefs(_) => Ok(()),
    }
}

pub fn run_cli() -> Result<(), String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                print!("{e}");
                return Ok(());
            }
            ErrorKind::DisplayVersion => {
                let cmd = CliArgs::command();
                print!("{}", cmd.render_version());
                return Ok(());
            }
            _ => return Err(e.to_string()),
        },
    };

    let cfg = match args.config.as_deref() {
        Some(path) => config::load_config(&config::expand_tilde(path), false)?,
        None => match config::default_config_path() {
            Some(path) => {
                if let Err(e) = config::ensure_default_config_file(&path) {
                    output::warning(&e);
                }
                config::load_config(&path, true)?
            }
            None => ConfigFile::default(),
        },
    };

    let run = build_run_config(args, cfg)?;

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(run.workers)
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    rt.block_on(run_async(run))?;
    Ok(())
}
