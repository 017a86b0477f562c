//! Line commands accepted on stdin while watching.

use crate::model::{FilterType, PageSize};
use crate::runner::Command;

pub const HELP: &str = "\
commands:
  n, next           next page
  p, prev           previous page
  g, goto <N>       jump to page N (1-based)
  s, size <N|all>   change page size (returns to page 1)
  f, filter <F>     change filter: all, 1 (killed), 中 (hit) (returns to page 1)
  t, toggle         start/stop auto refresh
  r, refresh        reload the current page now
  q, quit           exit
  h, help           show this help";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Input {
    Command(Command),
    Help,
    Empty,
}

pub fn parse_input(line: &str) -> Result<Input, String> {
    let mut parts = line.split_whitespace();
    let Some(verb) = parts.next() else {
        return Ok(Input::Empty);
    };
    let arg = parts.next();
    if parts.next().is_some() {
        return Err(format!("too many arguments for '{verb}'"));
    }

    let require = |what: &str| arg.ok_or_else(|| format!("'{verb}' needs {what}"));
    let no_arg = |command: Command| match arg {
        Some(extra) => Err(format!("'{verb}' takes no argument, got '{extra}'")),
        None => Ok(Input::Command(command)),
    };

    match verb.to_lowercase().as_str() {
        "n" | "next" => no_arg(Command::NextPage),
        "p" | "prev" | "previous" => no_arg(Command::PreviousPage),
        "t" | "toggle" => no_arg(Command::ToggleRefresh),
        "r" | "refresh" | "reload" => no_arg(Command::Reload),
        "q" | "quit" | "exit" => no_arg(Command::Quit),
        "h" | "help" | "?" => Ok(Input::Help),
        "g" | "goto" => {
            let raw = require("a page number")?;
            let page: usize = raw
                .parse()
                .map_err(|_| format!("invalid page number '{raw}'"))?;
            if page == 0 {
                return Err("pages are numbered from 1".to_string());
            }
            Ok(Input::Command(Command::GoToPage(page - 1)))
        }
        "s" | "size" => {
            let raw = require("a page size")?;
            let size = raw.parse::<PageSize>()?;
            Ok(Input::Command(Command::SetPageSize(size)))
        }
        "f" | "filter" => {
            let raw = require("a filter")?;
            let filter = raw.parse::<FilterType>()?;
            Ok(Input::Command(Command::SetFilter(filter)))
        }
        other => Err(format!("unknown command '{other}' (h for help)")),
    }
}
