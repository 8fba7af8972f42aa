use clap::{ArgAction, Parser};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "landlordtop",
    version,
    about = "browse the ranked landlord listing from the terminal",
    long_about = "Landlordtop pages, sorts and filters the ranked landlord listing served by a landlord-accountability API.\n\nExamples:\n  landlordtop --base-url https://api.example.org/\n  landlordtop --sort property_count:desc --page-size 25 --page 3\n  landlordtop --keyword \"main st\" --output-format json\n  landlordtop --interactive\n\nTip: Use --config to persist the API location and default view."
)]
pub struct CliArgs {
    #[arg(
        short = 'v',
        long = "vb",
        visible_alias = "verbose",
        action = ArgAction::Count,
        help_heading = "Output",
        help = "Increase log verbosity (-v, -vv, -vvv)."
    )]
    pub verbose: u8,

    #[arg(
        long = "nc",
        visible_alias = "no-color",
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,

    #[arg(
        short = 'o',
        long = "of",
        visible_alias = "output-format",
        value_name = "FORMAT",
        help_heading = "Output",
        help = "Output format: text or json."
    )]
    pub output_format: Option<String>,

    #[arg(
        short = 'b',
        long = "bu",
        visible_alias = "base-url",
        value_name = "URL",
        help_heading = "Source",
        help = "Base URL of the landlord API (defaults to http://localhost:5000/)."
    )]
    pub base_url: Option<String>,

    #[arg(
        long = "to",
        visible_alias = "timeout",
        value_name = "SECONDS",
        help_heading = "Source",
        help = "Request timeout in seconds."
    )]
    pub timeout: Option<u64>,

    #[arg(
        short = 'x',
        long = "px",
        visible_alias = "proxy",
        value_name = "URL",
        help_heading = "Source",
        help = "Route requests through an HTTP proxy."
    )]
    pub proxy: Option<String>,

    #[arg(
        short = 'H',
        long = "hd",
        visible_alias = "header",
        value_name = "HEADER",
        help_heading = "Source",
        help = "Extra request header, 'Key: Value'."
    )]
    pub header: Option<String>,

    #[arg(
        short = 'p',
        long = "pg",
        visible_alias = "page",
        value_name = "N",
        help_heading = "Query",
        help = "Page to show, starting at 1."
    )]
    pub page: Option<usize>,

    #[arg(
        short = 'n',
        long = "ps",
        visible_alias = "page-size",
        value_name = "N",
        help_heading = "Query",
        help = "Rows per page: 10, 25, 50 or 100."
    )]
    pub page_size: Option<usize>,

    #[arg(
        short = 's',
        long = "st",
        visible_alias = "sort",
        value_name = "COLUMN[:asc|desc]",
        conflicts_with = "unsorted",
        help_heading = "Query",
        help = "Sort by a column (defaults to eviction_count:desc)."
    )]
    pub sort: Option<String>,

    #[arg(
        long = "us",
        visible_alias = "unsorted",
        help_heading = "Query",
        help = "Request the listing without a sort."
    )]
    pub unsorted: bool,

    #[arg(
        short = 'k',
        long = "kw",
        visible_alias = "keyword",
        value_name = "TEXT",
        help_heading = "Query",
        help = "Filter by landlord name or address."
    )]
    pub keyword: Option<String>,

    #[arg(
        short = 'i',
        long = "it",
        visible_alias = "interactive",
        help_heading = "Mode",
        help = "Read paging, sort and filter commands from stdin."
    )]
    pub interactive: bool,

    #[arg(
        short = 'C',
        long = "cfg",
        visible_alias = "config",
        value_name = "FILE",
        help_heading = "Config",
        help = "Path to config file (defaults to ~/.landlordtop/config.yml)."
    )]
    pub config: Option<String>,

    #[arg(
        long = "ic",
        visible_alias = "init-config",
        help_heading = "Config",
        help = "Write a commented default config file and exit."
    )]
    pub init_config: bool,
}
