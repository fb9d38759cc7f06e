#![forbid(unsafe_code)]

//! Command-line argument parsing for the demo.
//!
//! Parses args manually. Environment variables with the `OOF_DEMO_*` prefix
//! override defaults; explicit flags override both.

use std::env;
use std::fmt;
use std::str::FromStr;

use oof::runtime::ReconcileStrategy;

use crate::error::{DemoError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const HELP_TEXT: &str = "\
oof demo: components rendered to HTML on a virtual clock

USAGE:
    oof-demo [OPTIONS]

OPTIONS:
    --demo=NAME          Demo to run: 'counter', 'list' or 'items' (default: counter)
    --ticks=N            Virtual seconds to run; HTML is printed after each (default: 5)
    --reconciler=NAME    Reconcile strategy: 'auto', 'replace' or 'patch' (default: auto)
    --help, -h           Show this help message
    --version, -V        Show version

DEMOS:
    counter   A count that increases every second; clicking resets it
    list      A list component that appends one item per second
    items     A component that re-renders a whole list every two seconds

ENVIRONMENT VARIABLES:
    OOF_DEMO_DEMO         Override --demo
    OOF_DEMO_TICKS        Override --ticks
    OOF_DEMO_RECONCILER   Override --reconciler
    RUST_LOG              Log filter, for example 'oof_runtime=debug'";

/// Which demo to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DemoKind {
    #[default]
    Counter,
    List,
    Items,
}

impl DemoKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Counter => "counter",
            Self::List => "list",
            Self::Items => "items",
        }
    }
}

impl fmt::Display for DemoKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DemoKind {
    type Err = DemoError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "counter" => Ok(Self::Counter),
            "list" => Ok(Self::List),
            "items" => Ok(Self::Items),
            other => Err(DemoError::invalid(format!(
                "unknown demo `{other}` (expected counter, list or items)"
            ))),
        }
    }
}

/// Parsed command-line options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opts {
    pub demo: DemoKind,
    /// Number of one-second clock advances.
    pub ticks: u32,
    pub reconciler: ReconcileStrategy,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            demo: DemoKind::Counter,
            ticks: 5,
            reconciler: ReconcileStrategy::Auto,
        }
    }
}

/// What the command line asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Run(Opts),
    Help,
    Version,
}

impl Opts {
    /// Parse process arguments and environment variables.
    pub fn parse() -> Result<Command> {
        Self::parse_from(env::args().skip(1), |key| env::var(key).ok())
    }

    /// Parse `args` (without the program name), reading overrides through
    /// `lookup`. Unparseable environment values are ignored.
    pub fn parse_from<I, S>(args: I, lookup: impl Fn(&str) -> Option<String>) -> Result<Command>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut opts = Self::default();

        if let Some(val) = lookup("OOF_DEMO_DEMO")
            && let Ok(demo) = val.parse()
        {
            opts.demo = demo;
        }
        if let Some(val) = lookup("OOF_DEMO_TICKS")
            && let Ok(n) = val.parse()
        {
            opts.ticks = n;
        }
        if let Some(val) = lookup("OOF_DEMO_RECONCILER")
            && let Ok(strategy) = val.parse()
        {
            opts.reconciler = strategy;
        }

        for arg in args {
            match arg.as_ref() {
                "--help" | "-h" => return Ok(Command::Help),
                "--version" | "-V" => return Ok(Command::Version),
                other => {
                    if let Some(val) = other.strip_prefix("--demo=") {
                        opts.demo = val.parse()?;
                    } else if let Some(val) = other.strip_prefix("--ticks=") {
                        opts.ticks = val
                            .parse::<u32>()
                            .map_err(|_| DemoError::invalid(format!("invalid --ticks value: {val}")))?;
                    } else if let Some(val) = other.strip_prefix("--reconciler=") {
                        opts.reconciler = val
                            .parse::<ReconcileStrategy>()
                            .map_err(|error| DemoError::invalid(error.to_string()))?;
                    } else {
                        return Err(DemoError::invalid(format!(
                            "unknown argument: {other} (run with --help for usage)"
                        )));
                    }
                }
            }
        }

        Ok(Command::Run(opts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn parse(args: &[&str]) -> Result<Command> {
        Opts::parse_from(args, no_env)
    }

    #[test]
    fn default_opts() {
        let opts = Opts::default();
        assert_eq!(opts.demo, DemoKind::Counter);
        assert_eq!(opts.ticks, 5);
        assert_eq!(opts.reconciler, ReconcileStrategy::Auto);
        assert_eq!(parse(&[]).unwrap(), Command::Run(opts));
    }

    #[test]
    fn flags_are_parsed() {
        let Command::Run(opts) = parse(&["--demo=list", "--ticks=12", "--reconciler=replace"])
            .unwrap()
        else {
            panic!("expected run");
        };
        assert_eq!(opts.demo, DemoKind::List);
        assert_eq!(opts.ticks, 12);
        assert_eq!(opts.reconciler, ReconcileStrategy::Replace);
    }

    #[test]
    fn help_and_version_short_circuit() {
        assert_eq!(parse(&["--ticks=1", "-h"]).unwrap(), Command::Help);
        assert_eq!(parse(&["--version", "--bogus"]).unwrap(), Command::Version);
    }

    #[test]
    fn invalid_flags_are_usage_errors() {
        for args in [["--ticks=many"], ["--demo=tetris"], ["--reconciler=morph"], ["-x"]] {
            let err = parse(&args).unwrap_err();
            assert_eq!(err.exit_code(), 2, "{args:?}");
        }
    }

    #[test]
    fn env_overrides_defaults_and_flags_override_env() {
        let env = |key: &str| match key {
            "OOF_DEMO_DEMO" => Some("items".to_string()),
            "OOF_DEMO_TICKS" => Some("9".to_string()),
            "OOF_DEMO_RECONCILER" => Some("patch".to_string()),
            _ => None,
        };
        let Command::Run(from_env) = Opts::parse_from(Vec::<String>::new(), env).unwrap() else {
            panic!("expected run");
        };
        assert_eq!(from_env.demo, DemoKind::Items);
        assert_eq!(from_env.ticks, 9);
        assert_eq!(from_env.reconciler, ReconcileStrategy::Patch);

        let Command::Run(flagged) = Opts::parse_from(["--ticks=2"], env).unwrap() else {
            panic!("expected run");
        };
        assert_eq!(flagged.ticks, 2);
        assert_eq!(flagged.demo, DemoKind::Items);
    }

    #[test]
    fn bad_env_values_are_ignored() {
        let env = |_: &str| Some("???".to_string());
        assert_eq!(
            Opts::parse_from(Vec::<String>::new(), env).unwrap(),
            Command::Run(Opts::default())
        );
    }

    #[test]
    fn help_text_lists_every_demo() {
        for demo in [DemoKind::Counter, DemoKind::List, DemoKind::Items] {
            assert!(HELP_TEXT.contains(demo.as_str()), "{demo}");
        }
        assert!(!VERSION.is_empty());
    }
}
