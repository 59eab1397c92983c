use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "floortrack",
    version,
    about = "shop-floor production tracking client",
    long_about = "floortrack talks to the production tracking backend: it lists and edits jobs, rolls, downtime, scrap and setup data, and walks operators through the production workflow.\n\nExamples:\n  floortrack list jobs --per-page 20 -w shift_id=1\n  floortrack export output-rolls -w start_date=2025-01-01 -o rolls.csv\n  floortrack production\n  floortrack hardware weight\n\nTip: Use --cfg to keep the backend URL and session header out of every invocation.",
    arg_required_else_help = true
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,

    #[arg(
        short = 'v',
        long = "vb",
        visible_alias = "verbose",
        action = ArgAction::Count,
        global = true,
        help_heading = "Output",
        help = "Increase log verbosity (-v info, -vv debug)."
    )]
    pub verbose: u8,

    #[arg(
        short = 'n',
        long = "nc",
        visible_alias = "no-color",
        global = true,
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,

    #[arg(
        short = 'C',
        long = "cfg",
        visible_alias = "config",
        value_name = "FILE",
        global = true,
        help_heading = "Input",
        help = "Path to config file (defaults to ~/.floortrack/config.yml)."
    )]
    pub config: Option<String>,

    #[arg(
        short = 'u',
        long = "url",
        visible_alias = "base-url",
        value_name = "URL",
        global = true,
        help_heading = "HTTP",
        help = "Tracking backend base URL."
    )]
    pub base_url: Option<String>,

    #[arg(
        long = "hw",
        visible_alias = "hardware-url",
        value_name = "URL",
        global = true,
        help_heading = "HTTP",
        help = "Scale/printer bridge base URL."
    )]
    pub hardware_url: Option<String>,

    #[arg(
        short = 'H',
        long = "hdr",
        visible_alias = "header",
        value_name = "HEADER",
        global = true,
        help_heading = "HTTP",
        help = "Extra request header, e.g. \"Cookie: session=...\"."
    )]
    pub header: Option<String>,

    #[arg(
        short = 'p',
        long = "px",
        visible_alias = "proxy",
        value_name = "URL",
        global = true,
        help_heading = "HTTP",
        help = "HTTP proxy URL."
    )]
    pub proxy: Option<String>,

    #[arg(
        short = 'T',
        long = "to",
        visible_alias = "timeout",
        value_name = "SECONDS",
        global = true,
        help_heading = "Performance",
        help = "Request timeout in seconds."
    )]
    pub timeout: Option<usize>,

    #[arg(
        short = 'W',
        long = "wk",
        visible_alias = "workers",
        value_name = "N",
        global = true,
        help_heading = "Performance",
        help = "Runtime worker threads."
    )]
    pub workers: Option<usize>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List one page of a resource with its stats banner.
    List(ListArgs),
    /// Export the whole filtered set of a resource.
    Export(ExportArgs),
    /// Create a record from a JSON document.
    Create(MutateArgs),
    /// Update a record from a JSON document carrying its "id".
    Update(MutateArgs),
    /// Delete a record by id.
    Delete(DeleteArgs),
    /// Current shift overview and recent activity.
    Dashboard,
    /// Look an output roll up by its roll number.
    Roll {
        #[arg(value_name = "OUTPUT_ROLL_NO")]
        number: String,
    },
    /// Show the signed-in user and their menu.
    Whoami,
    /// Run the interactive production workflow.
    Production,
    /// Talk to the scale/printer bridge.
    #[command(subcommand)]
    Hardware(HardwareCommand),
    /// Show or change persisted display preferences.
    Prefs(PrefsArgs),
}

#[derive(Args, Debug, Clone)]
pub struct FilterArgs {
    #[arg(
        short = 'w',
        long = "where",
        value_name = "KEY=VALUE",
        action = ArgAction::Append,
        help_heading = "Filters",
        help = "Filter as key=value (repeatable)."
    )]
    pub filters: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    #[arg(value_name = "RESOURCE")]
    pub resource: String,

    #[arg(long = "page", value_name = "N", help_heading = "Paging", help = "Page number (1-based).")]
    pub page: Option<usize>,

    #[arg(
        long = "pp",
        visible_alias = "per-page",
        value_name = "N",
        help_heading = "Paging",
        help = "Rows per page."
    )]
    pub per_page: Option<usize>,

    #[command(flatten)]
    pub filter: FilterArgs,

    #[arg(
        short = 'A',
        long = "of",
        visible_alias = "output-format",
        value_name = "FORMAT",
        help_heading = "Output",
        help = "Output format (text, json or csv)."
    )]
    pub output_format: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    #[arg(value_name = "RESOURCE")]
    pub resource: String,

    #[command(flatten)]
    pub filter: FilterArgs,

    #[arg(
        short = 'o',
        long = "out",
        visible_alias = "output",
        value_name = "FILE",
        help_heading = "Output",
        help = "Write the export to a file instead of stdout."
    )]
    pub output: Option<String>,

    #[arg(
        short = 'A',
        long = "of",
        visible_alias = "output-format",
        value_name = "FORMAT",
        help_heading = "Output",
        help = "Output format (text, json or csv); inferred from --out when omitted."
    )]
    pub output_format: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct MutateArgs {
    #[arg(value_name = "RESOURCE")]
    pub resource: String,

    #[arg(
        short = 'd',
        long = "data",
        value_name = "JSON",
        help = "JSON document, or @FILE to read it from a file."
    )]
    pub data: String,
}

#[derive(Args, Debug, Clone)]
pub struct DeleteArgs {
    #[arg(value_name = "RESOURCE")]
    pub resource: String,

    #[arg(long = "id", value_name = "ID", help = "Record id.")]
    pub id: i64,

    #[arg(short = 'y', long = "yes", help = "Skip the confirmation prompt.")]
    pub yes: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum HardwareCommand {
    /// Read the current scale weight.
    Weight,
    /// Send a PDF to the label printer.
    Print {
        #[arg(value_name = "FILE")]
        file: String,
    },
    /// Show the bridge's serial port settings.
    Settings,
    /// Change the bridge's serial port settings.
    SaveSettings(SaveSettingsArgs),
    /// Check that a device answers.
    Test {
        #[arg(value_name = "DEVICE", help = "scanner, scale or printer")]
        device: String,
    },
    /// When the bridge last updated itself.
    LastUpdate,
    /// Ask the bridge to update itself.
    Update {
        #[arg(value_name = "BASE_URL", help = "Backend the bridge should pull from.")]
        base_url: Option<String>,
    },
}

#[derive(Args, Debug, Clone)]
pub struct SaveSettingsArgs {
    #[arg(long = "scanner-port", value_name = "PORT")]
    pub scanner_port: Option<String>,

    #[arg(long = "scanner-baud", value_name = "BAUD")]
    pub scanner_baud: Option<u32>,

    #[arg(long = "scale-port", value_name = "PORT")]
    pub scale_port: Option<String>,

    #[arg(long = "scale-baud", value_name = "BAUD")]
    pub scale_baud: Option<u32>,
}

#[derive(Args, Debug, Clone)]
pub struct PrefsArgs {
    #[arg(
        long = "rd",
        visible_alias = "rolls-details",
        value_name = "on|off",
        help = "Show detail columns in output-roll listings."
    )]
    pub rolls_details: Option<String>,

    #[arg(
        long = "ird",
        visible_alias = "input-rolls-details",
        value_name = "on|off",
        help = "Show detail columns in input-roll listings."
    )]
    pub input_rolls_details: Option<String>,

    #[arg(long = "forget-user", help = "Drop the cached session user.")]
    pub forget_user: bool,
}
