use colored::Colorize;

fn main() {
    if let Err(e) = floortrack::app::run_cli() {
        eprintln!("{} {}", "[ERR]".bold().red(), e);
        std::process::exit(1);
    }
}
