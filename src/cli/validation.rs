use crate::cli::args::CliArgs;
use crate::model::{FilterType, PageSize};

pub fn validate(args: &CliArgs) -> Result<(), String> {
    if let Some(raw) = args.page_size.as_deref() {
        raw.parse::<PageSize>()
            .map_err(|e| format!("invalid --page-size '{raw}': {e}"))?;
    }
    if let Some(raw) = args.filter.as_deref() {
        raw.parse::<FilterType>()
            .map_err(|e| format!("invalid --filter '{raw}': {e}"))?;
    }
    if let Some(page) = args.page {
        if page == 0 {
            return Err("invalid --page, pages are numbered from 1".to_string());
        }
    }
    if let Some(interval) = args.interval {
        if interval == 0 {
            return Err("invalid --interval, expected positive number of seconds".to_string());
        }
    }
    if let Some(timeout) = args.timeout {
        if timeout == 0 {
            return Err("invalid --timeout, expected positive number of seconds".to_string());
        }
    }
    if let Some(raw) = args.format.as_deref() {
        if crate::output::OutputFormat::parse(raw).is_none() {
            return Err(format!(
                "invalid --format '{raw}', expected text, json or html"
            ));
        }
    }
    Ok(())
}
