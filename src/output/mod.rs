pub mod table;

use std::time::Duration;

use colored::Colorize;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use itertools::Itertools;
use serde::Serialize;

pub use table::Table;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "txt" => Some(Self::Text),
            "json" => Some(Self::Json),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }
}

pub fn infer_format_from_path(path: &str) -> Option<OutputFormat> {
    let lower = path.trim().to_lowercase();
    if lower.ends_with(".json") {
        return Some(OutputFormat::Json);
    }
    if lower.ends_with(".csv") {
        return Some(OutputFormat::Csv);
    }
    if lower.ends_with(".txt") {
        return Some(OutputFormat::Text);
    }
    None
}

pub fn render_text(table: &Table) -> Vec<u8> {
    table.render().into_bytes()
}

pub fn render_csv(table: &Table) -> Vec<u8> {
    table.to_csv().into_bytes()
}

pub fn render_json<T: Serialize + ?Sized>(records: &T) -> Vec<u8> {
    let mut out = serde_json::to_vec_pretty(records).unwrap_or_else(|_| b"[]".to_vec());
    out.push(b'\n');
    out
}

fn tag(label: &str, colour: fn(colored::ColoredString) -> colored::ColoredString) -> String {
    format!(
        "{}{}{}",
        "[".bold().white(),
        colour(label.bold()),
        "]".bold().white()
    )
}

pub fn success(message: &str) {
    println!("{} {}", tag("OK", |s| s.green()), message);
}

pub fn error(message: &str) {
    println!("{} {}", tag("ERR", |s| s.red()), message);
}

pub fn warning(message: &str) {
    println!("{} {}", tag("WRN", |s| s.yellow()), message);
}

pub fn info(message: &str) {
    println!("{} {}", tag("INF", |s| s.cyan()), message);
}

pub fn kv_line(label: &str, value: &str) {
    println!(":: {:<18}: {}", label, value.bold().cyan());
}

/// Stats banner shown above a listing.
pub fn stats_banner(stats: &[(String, String)]) {
    if stats.is_empty() {
        return;
    }
    let line = stats
        .iter()
        .map(|(label, value)| format!("{} {}", label.bold().white(), value.bold().cyan()))
        .join("  |  ");
    println!("{} {}", ">".bold().green(), line);
}

/// Spinner on stderr while a request is in flight.
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}
