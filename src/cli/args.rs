use clap::{ArgAction, Parser};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "sf444view",
    version,
    about = "paginated, auto-refreshing SF444 history viewer",
    long_about = "sf444view polls the SF444 history endpoint, renders the current page as a table and keeps it fresh.\n\nExamples:\n  sf444view -u http://127.0.0.1:8080\n  sf444view -u http://127.0.0.1:8080 -s 50 -f 中 -i 30\n  sf444view -u http://127.0.0.1:8080 --once --format html -o page.html\n\nWhile watching, type commands followed by Enter: n, p, g <page>, s <size>, f <filter>, t, r, q (h for help)."
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
        long = "lj",
        visible_alias = "log-json",
        help_heading = "Output",
        help = "Emit logs as JSON lines on stderr."
    )]
    pub log_json: bool,

    #[arg(
        short = 'o',
        long = "out",
        visible_alias = "output",
        value_name = "FILE",
        help_heading = "Output",
        help = "Write the rendered page to FILE (watch mode rewrites an HTML report after every update)."
    )]
    pub output: Option<String>,

    #[arg(
        long = "fmt",
        visible_alias = "format",
        value_name = "FORMAT",
        help_heading = "Output",
        help = "Output format for --once: text, json or html."
    )]
    pub format: Option<String>,

    #[arg(
        short = 'u',
        long = "u",
        visible_alias = "url",
        value_name = "URL",
        help_heading = "Input",
        help = "Base URL of the server (the viewer requests <URL>/sf444/data)."
    )]
    pub url: Option<String>,

    #[arg(
        short = 'C',
        long = "cfg",
        visible_alias = "config",
        value_name = "FILE",
        help_heading = "Input",
        help = "Path to config file (defaults to ~/.sf444view/config.yml)."
    )]
    pub config: Option<String>,

    #[arg(
        long = "ic",
        visible_alias = "init-config",
        help_heading = "Input",
        help = "Write a commented default config file (to --config or the default path) and exit."
    )]
    pub init_config: bool,

    #[arg(
        short = 'p',
        long = "pg",
        visible_alias = "page",
        value_name = "N",
        help_heading = "View",
        help = "Page to open first (1-based)."
    )]
    pub page: Option<usize>,

    #[arg(
        short = 's',
        long = "ps",
        visible_alias = "page-size",
        value_name = "N|all",
        help_heading = "View",
        help = "Records per page, or 'all'."
    )]
    pub page_size: Option<String>,

    #[arg(
        short = 'f',
        long = "ft",
        visible_alias = "filter",
        value_name = "FILTER",
        help_heading = "View",
        help = "Record filter: all, 1 (killed) or 中 (hit)."
    )]
    pub filter: Option<String>,

    #[arg(
        long = "once",
        help_heading = "View",
        help = "Fetch a single page, print it and exit."
    )]
    pub once: bool,

    #[arg(
        short = 'i',
        long = "iv",
        visible_alias = "interval",
        value_name = "SECONDS",
        help_heading = "Refresh",
        help = "Auto refresh period in seconds."
    )]
    pub interval: Option<u64>,

    #[arg(
        long = "nar",
        visible_alias = "no-auto-refresh",
        help_heading = "Refresh",
        help = "Start with auto refresh stopped (toggle with 't')."
    )]
    pub no_auto_refresh: bool,

    #[arg(
        long = "to",
        visible_alias = "timeout",
        value_name = "SECONDS",
        help_heading = "HTTP",
        help = "Request timeout in seconds."
    )]
    pub timeout: Option<u64>,

    #[arg(
        short = 'x',
        long = "px",
        visible_alias = "proxy",
        value_name = "URL",
        help_heading = "HTTP",
        help = "Proxy URL for all requests."
    )]
    pub proxy: Option<String>,
}
