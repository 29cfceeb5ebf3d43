//! `winctl` -- inspect and control native top-level windows from a shell.
//!
//! Results are printed to stdout as JSON.  Failures go to stderr and set a
//! per-kind exit code (see [`exit_code`]).

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use winctl_core::{
    EnumerationFilter, ErrorKind, NativeBackend, TitleMatch, WindowControlError, WindowController,
    WindowHandle, WindowStateKind,
};

#[derive(Parser)]
#[command(name = "winctl", version, about = "Control native top-level windows")]
struct Args {
    /// Enumeration filter as a JSON file (see `EnumerationFilter`)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Include windows without a title
    #[arg(long, global = true)]
    all: bool,

    /// Compact JSON output (no pretty-printing)
    #[arg(long, global = true)]
    compact: bool,

    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List visible top-level windows
    List,
    /// Search windows by title (case-sensitive substring by default)
    Find {
        title: String,
        /// Require the whole title to match
        #[arg(long, conflicts_with = "ignore_case")]
        exact: bool,
        /// Substring match ignoring case
        #[arg(long)]
        ignore_case: bool,
        /// Print only the first match (or null)
        #[arg(long)]
        first: bool,
    },
    /// Print the foreground window handle (or null)
    Active,
    /// Print the compiled backend and its click-through authority
    Platform,
    /// Print one window's details
    Info { handle: WindowHandle },
    /// Print the executable path of the window's process
    Path { handle: WindowHandle },
    /// Change or query pointer pass-through
    ClickThrough {
        action: ClickThroughAction,
        handle: WindowHandle,
    },
    /// Pin or unpin a window above normal windows
    Topmost { handle: WindowHandle, state: Switch },
    /// Set opacity in [0.0, 1.0]
    Opacity { handle: WindowHandle, level: f64 },
    /// Minimize, maximize or restore
    State {
        handle: WindowHandle,
        kind: WindowStateKind,
    },
    /// Bring a window to the foreground
    Focus { handle: WindowHandle },
    /// Ask a window to close (does not wait)
    Close { handle: WindowHandle },
    /// Forcibly terminate the process owning a window
    Kill { handle: WindowHandle },
}

#[derive(Clone, Copy, ValueEnum)]
enum ClickThroughAction {
    On,
    Off,
    Toggle,
    Status,
}

#[derive(Clone, Copy, ValueEnum)]
enum Switch {
    On,
    Off,
}

#[derive(Serialize)]
struct PlatformReport {
    backend: &'static str,
    click_through_authority: winctl_core::ClickThroughAuthority,
}

/// Process exit code for a failed operation.  1 is left for failures
/// outside the core (config file, output).
fn exit_code(kind: ErrorKind) -> u8 {
    match kind {
        ErrorKind::InvalidHandle => 3,
        ErrorKind::AccessDenied => 4,
        ErrorKind::InvalidArgument => 5,
        ErrorKind::UnsupportedOperation => 6,
        ErrorKind::PlatformError => 7,
    }
}

/// Outputs are plain data; serialization cannot fail for them.
fn to_json<T: Serialize>(value: &T) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or(serde_json::Value::Null)
}

fn load_filter(args: &Args) -> Result<EnumerationFilter, String> {
    let mut filter = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
            EnumerationFilter::from_json(&text).map_err(|e| e.to_string())?
        }
        None => EnumerationFilter::default(),
    };
    if args.all {
        filter.require_title = false;
    }
    Ok(filter)
}

fn run(
    controller: &WindowController<NativeBackend>,
    command: Command,
) -> Result<serde_json::Value, WindowControlError> {
    let value = match command {
        Command::List => to_json(&controller.enumerate()?),
        Command::Find {
            title,
            exact,
            ignore_case,
            first,
        } => {
            let mode = if ignore_case {
                TitleMatch::ContainsIgnoreCase
            } else {
                TitleMatch::from_exact(exact)
            };
            if first {
                to_json(&controller.find_matching(&title, mode)?)
            } else {
                to_json(&controller.find_all_matching(&title, mode)?)
            }
        }
        Command::Active => to_json(&controller.active_window()?),
        Command::Platform => to_json(&PlatformReport {
            backend: controller.backend_name(),
            click_through_authority: controller.click_through_authority(),
        }),
        Command::Info { handle } => to_json(&controller.info(handle)?),
        Command::Path { handle } => to_json(&controller.process_path(handle)?),
        Command::ClickThrough { action, handle } => match action {
            ClickThroughAction::On => {
                controller.set_click_through(handle)?;
                to_json(&true)
            }
            ClickThroughAction::Off => {
                controller.remove_click_through(handle)?;
                to_json(&false)
            }
            ClickThroughAction::Toggle => to_json(&controller.toggle_click_through(handle)?),
            ClickThroughAction::Status => to_json(&controller.is_click_through(handle)?),
        },
        Command::Topmost { handle, state } => {
            let enabled = matches!(state, Switch::On);
            controller.set_always_on_top(handle, enabled)?;
            to_json(&enabled)
        }
        Command::Opacity { handle, level } => {
            controller.set_opacity(handle, level)?;
            to_json(&level)
        }
        Command::State { handle, kind } => {
            controller.set_window_state(handle, kind)?;
            to_json(&kind.as_str())
        }
        Command::Focus { handle } => {
            controller.focus(handle)?;
            serde_json::Value::Null
        }
        Command::Close { handle } => {
            controller.close(handle)?;
            serde_json::Value::Null
        }
        Command::Kill { handle } => {
            controller.kill_owning_process(handle)?;
            serde_json::Value::Null
        }
    };
    Ok(value)
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();

    let filter = match load_filter(&args) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("winctl: {e}");
            return ExitCode::FAILURE;
        }
    };
    log::debug!("enumeration filter: {filter:?}");

    let controller = WindowController::with_filter(NativeBackend::default(), filter);
    match run(&controller, args.command) {
        Ok(value) => {
            let rendered = if args.compact {
                serde_json::to_string(&value)
            } else {
                serde_json::to_string_pretty(&value)
            };
            match rendered {
                Ok(text) => {
                    println!("{text}");
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("winctl: cannot render output: {e}");
                    ExitCode::FAILURE
                }
            }
        }
        Err(e) => {
            eprintln!("winctl: {e}");
            ExitCode::from(exit_code(e.kind()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parses_hex_handles_and_states() {
        let args = Args::try_parse_from(["winctl", "state", "0x1a2b", "max"]).unwrap();
        match args.command {
            Command::State { handle, kind } => {
                assert_eq!(handle.raw(), 0x1a2b);
                assert_eq!(kind, WindowStateKind::Maximize);
            }
            _ => panic!("expected state command"),
        }
    }

    #[test]
    fn test_click_through_subcommand() {
        let args = Args::try_parse_from(["winctl", "click-through", "toggle", "42"]).unwrap();
        assert!(matches!(
            args.command,
            Command::ClickThrough {
                action: ClickThroughAction::Toggle,
                ..
            }
        ));
    }

    #[test]
    fn test_exact_conflicts_with_ignore_case() {
        assert!(Args::try_parse_from(["winctl", "find", "x", "--exact", "--ignore-case"]).is_err());
    }

    #[test]
    fn test_all_flag_drops_title_requirement() {
        let args = Args::try_parse_from(["winctl", "--all", "list"]).unwrap();
        let filter = load_filter(&args).unwrap();
        assert!(!filter.require_title);
    }

    #[test]
    fn test_exit_codes_are_distinct_and_nonzero() {
        let mut codes = vec![
            exit_code(ErrorKind::InvalidHandle),
            exit_code(ErrorKind::AccessDenied),
            exit_code(ErrorKind::InvalidArgument),
            exit_code(ErrorKind::UnsupportedOperation),
            exit_code(ErrorKind::PlatformError),
        ];
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), 5);
        assert!(!codes.contains(&0) && !codes.contains(&1) && !codes.contains(&2));
    }
}
