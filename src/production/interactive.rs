use chrono::{Local, NaiveDate};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, MultiSelect, Select};

use super::{FlagSelection, InputForm, LoadOutcome, OutputForm, Phase, Workflow, WorkflowError};
use crate::client::{ApiClient, Query};
use crate::models::{Lookup, Machine, User};
use crate::output::{self, Table};
use crate::utils;

const MACHINES_PAGE: usize = 100;

struct Reference {
    machines: Vec<Machine>,
    shifts: Vec<Lookup>,
    flag_reasons: Vec<Lookup>,
}

async fn load_reference(client: &ApiClient, user: &User) -> Result<Reference, String> {
    let machine_query = Query::new()
        .push("user_id", user.id)
        .push("per_page", MACHINES_PAGE);
    let none = Query::new();
    let (machines, shifts, flag_reasons) = futures::try_join!(
        client.get_page::<Machine>("/api/machines/filter", &machine_query),
        client.get_page::<Lookup>("/api/lookups/shifts", &none),
        client.get_page::<Lookup>("/api/lookups/flag-reasons", &none),
    )
    .map_err(|e| e.to_string())?;
    Ok(Reference {
        machines: machines.data,
        shifts: shifts.data,
        flag_reasons: flag_reasons.data,
    })
}

fn prompt_err(e: dialoguer::Error) -> String {
    format!("prompt failed: {e}")
}

/// Workflow refusals are shown and the session goes on; only prompt
/// failures end it.
fn report(result: Result<(), WorkflowError>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            output::error(&e.to_string());
            false
        }
    }
}

fn choose(prompt: &str, items: &[String], default: usize) -> Result<usize, String> {
    Select::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .items(items)
        .default(default)
        .interact()
        .map_err(prompt_err)
}

fn ask_f64(prompt: &str) -> Result<f64, String> {
    Input::<f64>::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .interact_text()
        .map_err(prompt_err)
}

fn ask_text(prompt: &str) -> Result<String, String> {
    Input::<String>::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .interact_text()
        .map_err(prompt_err)
}

fn confirm(prompt: &str) -> Result<bool, String> {
    Confirm::new()
        .with_prompt(prompt)
        .default(true)
        .interact()
        .map_err(prompt_err)
}

fn print_job_summary(wf: &Workflow) {
    if let Some(job) = wf.current_job() {
        println!();
        output::kv_line("Job", &format!("#{}", job.id));
        output::kv_line("Production order", &job.production_order);
        output::kv_line("Batch", &job.batch);
        output::kv_line(
            "Material",
            job.material_number.as_deref().unwrap_or("-"),
        );
        output::kv_line(
            "Start weight",
            &job.start_weight_kg()
                .map(utils::format_weight)
                .unwrap_or_else(|| job.start_weight.clone()),
        );
        output::kv_line(
            "Start meter",
            &job.start_meter
                .map(utils::format_meter)
                .unwrap_or_else(|| "-".to_string()),
        );
        output::kv_line("Shift", utils::shift_label(job.shift_id));
    }
    let rolls = wf.output_rolls();
    if !rolls.is_empty() {
        let mut table = Table::new(["Batch", "Meter", "Weight", "Core", "Flags", "Created"]);
        for r in rolls {
            table.push(vec![
                r.output_batch.clone(),
                utils::format_meter(r.final_meter),
                utils::format_weight(r.final_weight),
                r.core_weight
                    .map(utils::format_weight)
                    .unwrap_or_else(|| "-".to_string()),
                utils::truncate_text(r.flag_reason.as_deref(), 30),
                utils::format_time(Some(&r.created_at)),
            ]);
        }
        println!();
        print!("{}", table.render());
    }
    println!();
}

async fn step_machine(client: &ApiClient, wf: &mut Workflow, reference: &Reference) -> Result<bool, String> {
    if reference.machines.is_empty() {
        output::error("No machines are assigned to your account");
        return Ok(false);
    }
    let mut items: Vec<String> = reference
        .machines
        .iter()
        .map(|m| format!("{} ({}) - {}", m.name, m.label, m.section_name))
        .collect();
    items.push("Quit".to_string());
    let idx = choose("Select machine", &items, 0)?;
    let Some(machine) = reference.machines.get(idx).cloned() else {
        return Ok(false);
    };
    if !report(wf.select_machine(machine)) {
        return Ok(true);
    }

    let pb = output::spinner("Loading active jobs...");
    let loaded = wf.refresh(client).await;
    pb.finish_and_clear();
    match loaded {
        Ok(()) if wf.current_job().is_some() => {
            output::info(&format!(
                "{} active job(s) on this machine, resuming the first",
                wf.active_jobs().len()
            ));
        }
        Ok(()) => {}
        Err(e) => output::error(&e.to_string()),
    }
    Ok(true)
}

async fn step_shift_date(client: &ApiClient, wf: &mut Workflow, reference: &Reference) -> Result<(), String> {
    let shifts: Vec<Lookup> = if reference.shifts.is_empty() {
        vec![
            Lookup {
                id: utils::DAY_SHIFT,
                name: "Day".to_string(),
            },
            Lookup {
                id: utils::NIGHT_SHIFT,
                name: "Night".to_string(),
            },
        ]
    } else {
        reference.shifts.clone()
    };
    let auto = utils::current_shift();
    let default = shifts.iter().position(|s| s.id == auto).unwrap_or(0);
    let names: Vec<String> = shifts.iter().map(|s| s.name.clone()).collect();
    let idx = choose("Shift", &names, default)?;
    if !report(wf.set_shift(shifts[idx].id)) {
        return Ok(());
    }

    let today = Local::now().date_naive().format("%Y-%m-%d").to_string();
    let raw: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Posting date (YYYY-MM-DD)")
        .default(today)
        .validate_with(|v: &String| utils::parse_date(v).map(|_| ()))
        .interact_text()
        .map_err(prompt_err)?;
    let date: NaiveDate = utils::parse_date(&raw)?;
    if !report(wf.set_date(date)) {
        return Ok(());
    }

    let pb = output::spinner("Loading process orders...");
    let outcome = wf.load_process_orders(client).await;
    pb.finish_and_clear();
    match outcome {
        Ok(LoadOutcome::Loaded(0)) => output::warning("No process orders found for this selection"),
        Ok(LoadOutcome::Loaded(n)) => output::info(&format!("{n} process order(s) available")),
        Ok(LoadOutcome::Stale) => {}
        Err(e) => output::error(&e.to_string()),
    }
    Ok(())
}

enum Navigation {
    Stay,
    Quit,
}

async fn step_process_order(client: &ApiClient, wf: &mut Workflow) -> Result<Navigation, String> {
    let orders = wf.process_orders().to_vec();
    let mut items = vec!["-- select process order --".to_string()];
    items.extend(orders.iter().map(|po| po.label()));
    items.push("Reload process orders".to_string());
    items.push("Change shift or date".to_string());
    items.push("Change machine".to_string());
    items.push("Quit".to_string());

    let idx = choose("Process order", &items, 0)?;
    let extra = idx.checked_sub(orders.len() + 1);
    match (idx, extra) {
        (0, _) => output::warning("Please select a process order"),
        (_, None) => {
            let po = &orders[idx - 1];
            report(wf.select_process_order(&po.process_order));
        }
        (_, Some(0)) => {
            let pb = output::spinner("Loading process orders...");
            let outcome = wf.load_process_orders(client).await;
            pb.finish_and_clear();
            if let Err(e) = outcome {
                output::error(&e.to_string());
            }
        }
        (_, Some(1)) => {
            report(wf.clear_date());
        }
        (_, Some(2)) => wf.clear_machine(),
        _ => return Ok(Navigation::Quit),
    }
    Ok(Navigation::Stay)
}

async fn step_input(client: &ApiClient, wf: &mut Workflow) -> Result<Navigation, String> {
    let Some(po) = wf.process_order().cloned() else {
        return Ok(Navigation::Stay);
    };
    output::kv_line("Process order", &po.label());

    let materials = po.materials();
    let material_number = if materials.is_empty() {
        ask_text("Material number")?
    } else {
        let items: Vec<String> = materials
            .iter()
            .map(|(n, d)| {
                if d.is_empty() {
                    n.clone()
                } else {
                    format!("{n} - {d}")
                }
            })
            .collect();
        let idx = choose("Material", &items, 0)?;
        materials[idx].0.clone()
    };
    let form = InputForm {
        material_number,
        batch: ask_text("Batch")?,
        start_weight: ask_f64("Start weight (kg)")?,
        start_meter: ask_f64("Start meter (m)")?,
    };

    let items = vec![
        "Start job".to_string(),
        "Change process order".to_string(),
        "Quit".to_string(),
    ];
    match choose("Submit?", &items, 0)? {
        0 => {
            let pb = output::spinner("Starting job...");
            let result = wf.handle_input_submit(client, &form).await.map(|j| j.id);
            pb.finish_and_clear();
            match result {
                Ok(id) => output::success(&format!("Job #{id} started successfully!")),
                Err(e) => output::error(&e.to_string()),
            }
        }
        1 => {
            report(wf.clear_process_order());
        }
        _ => return Ok(Navigation::Quit),
    }
    Ok(Navigation::Stay)
}

fn ask_flags(flag_reasons: &[Lookup]) -> Result<Vec<FlagSelection>, String> {
    if flag_reasons.is_empty() {
        return Ok(Vec::new());
    }
    let names: Vec<String> = flag_reasons.iter().map(|f| f.name.clone()).collect();
    let picked = MultiSelect::with_theme(&ColorfulTheme::default())
        .with_prompt("Flag reasons (space to toggle, enter to continue)")
        .items(&names)
        .interact()
        .map_err(prompt_err)?;
    let mut flags = Vec::new();
    for idx in picked {
        let count: i64 = Input::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("Count for '{}'", names[idx]))
            .default(1)
            .interact_text()
            .map_err(prompt_err)?;
        flags.push(FlagSelection {
            reason: names[idx].clone(),
            count,
        });
    }
    Ok(flags)
}

async fn step_job_active(client: &ApiClient, wf: &mut Workflow, reference: &Reference) -> Result<Navigation, String> {
    print_job_summary(wf);
    let items = vec![
        "Add output roll".to_string(),
        "Start new roll".to_string(),
        "Switch active job".to_string(),
        "Refresh".to_string(),
        "Change machine".to_string(),
        "Quit".to_string(),
    ];
    match choose("Action", &items, 0)? {
        0 => {
            let form = OutputForm {
                final_meter: ask_f64("Final meter (m)")?,
                core_weight: ask_f64("Core weight (kg)")?,
                flags: ask_flags(&reference.flag_reasons)?,
            };
            let pb = output::spinner("Creating output roll...");
            let result = wf.handle_output_submit(client, &form).await;
            pb.finish_and_clear();
            match result {
                Ok(()) => output::success("Output roll created successfully!"),
                Err(e) => output::error(&e.to_string()),
            }
        }
        1 => {
            report(wf.begin_start_new());
        }
        2 => {
            let jobs = wf.active_jobs().to_vec();
            let names: Vec<String> = jobs
                .iter()
                .map(|j| format!("Job #{} - {} ({})", j.id, j.batch, j.production_order))
                .collect();
            if names.is_empty() {
                output::warning("No other active jobs");
            } else {
                let idx = choose("Active job", &names, 0)?;
                if !report(wf.select_active_job(jobs[idx].id)) {
                    return Ok(Navigation::Stay);
                }
                let pb = output::spinner("Loading rolls...");
                let result = wf.load_job_rolls(client).await;
                pb.finish_and_clear();
                if let Err(e) = result {
                    output::error(&e.to_string());
                }
            }
        }
        3 => {
            let pb = output::spinner("Refreshing...");
            let result = wf.refresh(client).await;
            pb.finish_and_clear();
            if let Err(e) = result {
                output::error(&e.to_string());
            }
        }
        4 => wf.clear_machine(),
        _ => return Ok(Navigation::Quit),
    }
    Ok(Navigation::Stay)
}

async fn step_ending(client: &ApiClient, wf: &mut Workflow) -> Result<(), String> {
    let start = wf
        .current_job()
        .map(|j| j.start_weight.clone())
        .unwrap_or_default();
    let used = ask_f64(&format!("Used weight (kg, start weight {start})"))?;
    if !confirm(&format!("Close the roll with {used} kg used?"))? {
        wf.cancel_start_new();
        return Ok(());
    }
    let pb = output::spinner("Closing input roll...");
    let result = wf.confirm_start_new(client, used).await;
    pb.finish_and_clear();
    match result {
        Ok(()) => output::success("Input roll closed. Enter the next roll."),
        Err(e) => {
            output::error(&e.to_string());
            if !confirm("Try again?")? {
                wf.cancel_start_new();
            }
        }
    }
    Ok(())
}

/// Walks the operator through the production screen until they quit.
pub async fn run(client: &ApiClient, user: &User) -> Result<(), String> {
    let pb = output::spinner("Loading machines...");
    let reference = load_reference(client, user).await;
    pb.finish_and_clear();
    let reference = reference?;

    let mut wf = Workflow::new();
    loop {
        match wf.phase() {
            Phase::NoMachine => {
                if !step_machine(client, &mut wf, &reference).await? {
                    return Ok(());
                }
            }
            Phase::AwaitingShiftDate => step_shift_date(client, &mut wf, &reference).await?,
            Phase::AwaitingProcessOrder => {
                if let Navigation::Quit = step_process_order(client, &mut wf).await? {
                    return Ok(());
                }
            }
            Phase::ReadyToStart => {
                if let Navigation::Quit = step_input(client, &mut wf).await? {
                    return Ok(());
                }
            }
            Phase::JobActive => {
                if let Navigation::Quit = step_job_active(client, &mut wf, &reference).await? {
                    return Ok(());
                }
            }
            Phase::JobEnding => step_ending(client, &mut wf).await?,
        }
    }
}
