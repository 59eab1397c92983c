use crate::cli::args::{CliArgs, Command, HardwareCommand};
use crate::client::hardware::Device;

pub fn validate(args: &CliArgs) -> Result<(), String> {
    if let Some(timeout) = args.timeout {
        if timeout == 0 {
            return Err("invalid timeout, expected positive integer".to_string());
        }
    }
    if let Some(workers) = args.workers {
        if workers == 0 {
            return Err("invalid workers, expected positive integer".to_string());
        }
    }
    if let Some(raw) = args.header.as_deref() {
        crate::client::parse_header(raw).map_err(|e| format!("invalid --header '{raw}': {e}"))?;
    }

    match &args.command {
        Command::List(list) => {
            if list.page == Some(0) {
                return Err("invalid page, pages start at 1".to_string());
            }
            if list.per_page == Some(0) {
                return Err("invalid per-page, expected positive integer".to_string());
            }
            validate_filters(&list.filter.filters)?;
            validate_format(list.output_format.as_deref())?;
        }
        Command::Export(export) => {
            validate_filters(&export.filter.filters)?;
            validate_format(export.output_format.as_deref())?;
        }
        Command::Delete(delete) if delete.id <= 0 => {
            return Err("invalid id, expected positive integer".to_string());
        }
        Command::Hardware(HardwareCommand::Test { device }) => {
            Device::parse(device).ok_or_else(|| {
                format!("invalid device '{device}', expected scanner, scale or printer")
            })?;
        }
        Command::Prefs(prefs) => {
            for raw in [&prefs.rolls_details, &prefs.input_rolls_details]
                .into_iter()
                .flatten()
            {
                crate::utils::parse_on_off(raw)?;
            }
        }
        _ => {}
    }
    Ok(())
}

fn validate_filters(filters: &[String]) -> Result<(), String> {
    for raw in filters {
        crate::utils::parse_key_value(raw).map_err(|e| format!("invalid --where '{raw}': {e}"))?;
    }
    Ok(())
}

fn validate_format(format: Option<&str>) -> Result<(), String> {
    if let Some(raw) = format {
        crate::output::OutputFormat::parse(raw)
            .ok_or_else(|| format!("invalid output format '{raw}', expected text, json or csv"))?;
    }
    Ok(())
}
