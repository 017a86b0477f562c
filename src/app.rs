use std::time::Duration;

use clap::{error::ErrorKind, CommandFactory, Parser};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task;

use crate::cli::args::CliArgs;
use crate::cli::commands::{self, Input};
use crate::cli::validation;
use crate::client::ClientOptions;
use crate::config::{self, ConfigFile};
use crate::model::{FilterType, PageSize};
use crate::output::{self, OutputFormat};
use crate::runner::{self, Command, ViewUpdate};
use crate::view::{PageView, ViewState};

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";
const DEFAULT_INTERVAL_SECS: u64 = 60;
const DEFAULT_TIMEOUT_SECS: u64 = 10;

fn print_banner() {
    const BANNER: &str = r#"
        ___ _ _ _ _
  ___  / __| || | || |__ _(_)_____ __ __
 (_-< |  _|_  _|_  _\ V / / -_) V  V /
 /__/ |_|   |_|  |_| \_/|_\___|\_/\_/
       SF444 history viewer
    "#;
    eprint!("{}", BANNER);
    eprintln!();
}

fn format_kv_line(label: &str, value: &str) {
    eprintln!(":: {:<10}: {}", label, value);
}

fn render_custom_help() -> String {
    let cmd = CliArgs::command();
    let mut out = String::new();

    out.push_str(cmd.get_name());
    if let Some(version) = cmd.get_version() {
        out.push(' ');
        out.push_str(version);
    }
    out.push('\n');
    if let Some(about) = cmd.get_about() {
        out.push_str(&format!("{about}\n"));
    }
    if let Some(long_about) = cmd.get_long_about() {
        out.push_str(&format!("\n{long_about}\n"));
    }
    out.push_str(&format!("\nUsage: {} [OPTIONS]\n\n", cmd.get_name()));

    let mut sections: Vec<(String, Vec<&clap::Arg>)> = Vec::new();
    for arg in cmd.get_arguments().filter(|a| !a.is_hide_set()) {
        let heading = arg.get_help_heading().unwrap_or("Options");
        match sections.iter_mut().find(|(h, _)| h == heading) {
            Some((_, args)) => args.push(arg),
            None => sections.push((heading.to_string(), vec![arg])),
        }
    }

    for (heading, args) in sections {
        out.push_str(&format!("{heading}:\n"));
        for arg in args {
            let mut flags: Vec<String> = Vec::new();
            if let Some(short) = arg.get_short() {
                flags.push(format!("-{short}"));
            }
            if let Some(long) = arg.get_long() {
                flags.push(format!("--{long}"));
            }
            for alias in arg.get_visible_aliases().unwrap_or_default() {
                flags.push(format!("--{alias}"));
            }
            let mut line = flags.join(", ");
            if arg.get_action().takes_values() {
                let value_name = arg
                    .get_value_names()
                    .and_then(|names| names.first())
                    .map(|name| name.as_str())
                    .unwrap_or("VALUE");
                line.push_str(&format!(" <{value_name}>"));
            }
            out.push_str(&format!("  {line}\n"));
            if let Some(help) = arg.get_help() {
                let help = help.to_string();
                if !help.trim().is_empty() {
                    out.push_str(&format!("          {}\n", help.trim()));
                }
            }
        }
        out.push('\n');
    }

    out.push_str("Interactive ");
    out.push_str(commands::HELP);
    out.push('\n');
    out
}

#[derive(Debug)]
struct RunConfig {
    options: runner::Options,
    once: bool,
    output: Option<String>,
    format: OutputFormat,
    no_color: bool,
    verbose: u8,
    log_json: bool,
}

fn build_run_config(args: CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let base_url = args
        .url
        .or(cfg.url)
        .map(|u| u.trim().to_string())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    let page_size = match args.page_size.or(cfg.page_size) {
        Some(raw) => raw
            .parse::<PageSize>()
            .map_err(|e| format!("invalid page size '{raw}': {e}"))?,
        None => PageSize::default(),
    };
    let filter = match args.filter.or(cfg.filter) {
        Some(raw) => raw
            .parse::<FilterType>()
            .map_err(|e| format!("invalid filter '{raw}': {e}"))?,
        None => FilterType::default(),
    };
    let page_index = args.page.unwrap_or(1).saturating_sub(1);

    let interval = args
        .interval
        .or(cfg.interval)
        .unwrap_or(DEFAULT_INTERVAL_SECS);
    if interval == 0 {
        return Err("invalid interval, expected positive number of seconds".to_string());
    }
    let auto_refresh = !args.no_auto_refresh && cfg.auto_refresh.unwrap_or(true);

    let timeout = args.timeout.or(cfg.timeout).unwrap_or(DEFAULT_TIMEOUT_SECS);
    if timeout == 0 {
        return Err("invalid timeout, expected positive number of seconds".to_string());
    }
    let proxy = args
        .proxy
        .or(cfg.proxy)
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty());

    let output = args
        .output
        .or(cfg.output)
        .map(|p| config::expand_tilde_string(&p));
    let format = match args.format.or(cfg.output_format) {
        Some(raw) => OutputFormat::parse(&raw)
            .ok_or_else(|| format!("invalid output format '{raw}', expected text, json or html"))?,
        None => output
            .as_deref()
            .and_then(output::infer_format_from_path)
            .unwrap_or(OutputFormat::Text),
    };

    Ok(RunConfig {
        options: runner::Options {
            base_url,
            initial: ViewState {
                page_index,
                page_size,
                filter,
                auto_refresh,
            },
            refresh_interval: Duration::from_secs(interval),
            client: ClientOptions {
                timeout: Duration::from_secs(timeout),
                proxy,
            },
        },
        once: args.once,
        output,
        format,
        no_color: args.no_color || cfg.no_color.unwrap_or(false),
        verbose: args.verbose,
        log_json: args.log_json || cfg.log_json.unwrap_or(false),
    })
}

fn print_settings(run: &RunConfig) {
    let state = &run.options.initial;
    format_kv_line("URL", &run.options.base_url);
    format_kv_line(
        "View",
        &format!(
            "page={} size={} filter={}",
            state.page_index + 1,
            state.page_size,
            state.filter.label()
        ),
    );
    format_kv_line(
        "Refresh",
        &format!(
            "every {}s ({})",
            run.options.refresh_interval.as_secs(),
            if state.auto_refresh { "on" } else { "off" }
        ),
    );
    format_kv_line(
        "Timeout",
        &format!("{}s", run.options.client.timeout.as_secs()),
    );
    if let Some(proxy) = run.options.client.proxy.as_deref() {
        format_kv_line("Proxy", proxy);
    }
    if let Some(path) = run.output.as_deref() {
        format_kv_line("Output", path);
    }
    eprintln!("{}", "_".repeat(60));
}

async fn write_output(path: Option<&str>, bytes: &[u8]) -> Result<(), String> {
    match path {
        Some(path) => tokio::fs::write(path, bytes)
            .await
            .map_err(|e| format!("failed to write output '{path}': {e}")),
        None => {
            let mut stdout = tokio::io::stdout();
            stdout
                .write_all(bytes)
                .await
                .map_err(|e| format!("failed to write to stdout: {e}"))?;
            stdout
                .flush()
                .await
                .map_err(|e| format!("failed to write to stdout: {e}"))
        }
    }
}

async fn run_once(run: RunConfig) -> Result<(), String> {
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_style(
        ProgressStyle::with_template(":: {spinner} {msg} [{elapsed_precise}]")
            .map_err(|e| format!("failed to build progress style: {e}"))?,
    );
    pb.set_message(format!(
        "fetching page {} from {}",
        run.options.initial.page_index + 1,
        run.options.base_url
    ));

    let result = runner::load_once(&run.options).await;
    pb.finish_and_clear();
    let view = result.map_err(|e| e.to_string())?;

    let color = !run.no_color && run.output.is_none();
    let bytes = output::render(&view, run.format, color);
    write_output(run.output.as_deref(), &bytes).await?;
    if let Some(path) = run.output.as_deref() {
        format_kv_line("Saved", path);
    }
    Ok(())
}

async fn read_commands(tx: mpsc::Sender<Command>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(event = "input.read_failed", error = %e);
                break;
            }
        };
        match commands::parse_input(&line) {
            Ok(Input::Empty) => {}
            Ok(Input::Help) => eprintln!("{}", commands::HELP),
            Ok(Input::Command(command)) => {
                let quit = command == Command::Quit;
                if tx.send(command).await.is_err() || quit {
                    break;
                }
            }
            Err(e) => eprintln!(":: {} (h for help)", e),
        }
    }
}

fn present(view: &PageView, update: &ViewUpdate, run: &RunConfig) {
    match update {
        ViewUpdate::Ignored => {
            eprintln!(":: page out of range, nothing to load");
            return;
        }
        ViewUpdate::LoadFailed(message) => {
            let line = format!(":: load failed: {message}");
            if run.no_color {
                eprintln!("{line}");
            } else {
                eprintln!("{}", line.red());
            }
        }
        ViewUpdate::RefreshChanged(status) => {
            format_kv_line(
                "Refresh",
                &format!("{} (press t to {})", status.badge_label(), status.button_label()),
            );
        }
        ViewUpdate::Loaded => {}
    }

    println!("{}", output::render_text(view, !run.no_color));

    if let Some(path) = run.output.as_deref() {
        if let Err(e) = std::fs::write(path, output::render_html(view)) {
            tracing::warn!(event = "output.write_failed", path, error = %e);
        }
    }
}

async fn run_watch(run: RunConfig) -> Result<(), String> {
    let session = runner::connect(&run.options).map_err(|e| e.to_string())?;
    let (tx, rx) = mpsc::channel::<Command>(64);
    let input = task::spawn(read_commands(tx));

    let view = session
        .run(rx, |view, update| present(view, update, &run))
        .await;
    input.abort();

    tracing::info!(
        event = "session.finished",
        page = view.shown_page(),
        total_pages = view.total_pages()
    );
    Ok(())
}

async fn run_async(run: RunConfig) -> Result<(), String> {
    if run.once {
        run_once(run).await
    } else {
        print_banner();
        print_settings(&run);
        eprintln!("{}", commands::HELP);
        run_watch(run).await
    }
}

fn init_config(path: Option<&str>) -> Result<(), String> {
    let path = match path {
        Some(p) => config::expand_tilde(p),
        None => config::default_config_path()
            .ok_or_else(|| "cannot determine home directory for default config".to_string())?,
    };
    if config::ensure_default_config_file(&path)? {
        println!(":: Created config at {}", path.display());
    } else {
        println!(":: Config already exists at {}", path.display());
    }
    Ok(())
}

pub fn run_cli() -> Result<(), String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp => {
                print!("{}", render_custom_help());
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

    if args.init_config {
        return init_config(args.config.as_deref());
    }

    let cfg = match args.config.as_deref() {
        Some(path) => config::load_config(&config::expand_tilde(path), false)?,
        None => match config::default_config_path() {
            Some(path) => config::load_config(&path, true)?,
            None => ConfigFile::default(),
        },
    };

    let run = build_run_config(args, cfg)?;

    crate::logging::init_logging(run.verbose, run.log_json);
    if run.no_color {
        colored::control::set_override(false);
    }
    tracing::debug!(event = "cli.configured", once = run.once, url = %run.options.base_url);

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    let result = rt.block_on(run_async(run));
    // the stdin reader may still be parked in a blocking read
    rt.shutdown_background();
    result
}
