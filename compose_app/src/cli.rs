//! Command line parsing

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use scene_compose::template::Substitutions;

/// Parsed command line
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CliArgs {
    /// `.toml` or `.ron` configuration file
    pub config: Option<PathBuf>,
    /// Overrides the configured log level
    pub log_level: Option<String>,
    /// Root for resource locators, overriding the config
    pub resource_root: Option<PathBuf>,
    /// `--set NAME=VALUE` substitutions, winning over configured defaults
    pub substitutions: Substitutions,
    /// Stop after parsing and validation
    pub validate_only: bool,
    /// Descriptor files to process
    pub files: Vec<PathBuf>,
}

pub fn command() -> Command {
    Command::new("compose")
        .about("Validates entity descriptors and instantiates them against a resource directory")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file (.toml or .ron)"),
        )
        .arg(
            Arg::new("set")
                .short('s')
                .long("set")
                .value_name("NAME=VALUE")
                .help("Placeholder substitution, may be repeated")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .help("Log level when RUST_LOG is not set"),
        )
        .arg(
            Arg::new("root")
                .short('r')
                .long("root")
                .value_name("DIR")
                .help("Directory resource locators resolve against"),
        )
        .arg(
            Arg::new("validate-only")
                .long("validate-only")
                .help("Parse and validate without instantiating")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("files")
                .value_name("DESCRIPTOR")
                .help("Descriptor files to load")
                .required(true)
                .num_args(1..),
        )
}

impl CliArgs {
    /// Parse the process arguments
    pub fn parse() -> Result<Self> {
        Self::from_matches(&command().get_matches())
    }

    pub fn from_matches(matches: &ArgMatches) -> Result<Self> {
        let mut substitutions = Substitutions::new();
        for assignment in matches.get_many::<String>("set").into_iter().flatten() {
            let (name, value) = parse_assignment(assignment)?;
            substitutions.insert(name, value);
        }

        Ok(Self {
            config: matches.get_one::<String>("config").map(PathBuf::from),
            log_level: matches.get_one::<String>("log-level").cloned(),
            resource_root: matches.get_one::<String>("root").map(PathBuf::from),
            substitutions,
            validate_only: matches.get_flag("validate-only"),
            files: matches
                .get_many::<String>("files")
                .into_iter()
                .flatten()
                .map(PathBuf::from)
                .collect(),
        })
    }
}

/// Split `NAME=VALUE`; the value may itself contain `=`
fn parse_assignment(assignment: &str) -> Result<(String, String)> {
    let (name, value) = assignment
        .split_once('=')
        .with_context(|| format!("substitution '{assignment}' is not NAME=VALUE"))?;
    if name.is_empty() {
        bail!("substitution '{assignment}' has an empty name");
    }
    Ok((name.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<CliArgs> {
        let matches = command().try_get_matches_from(args)?;
        CliArgs::from_matches(&matches)
    }

    #[test]
    fn test_files_and_substitutions() {
        let args = parse(&["compose", "--set", "NAME=PirateShip", "-s", "EXPR=a=b", "boat.go", "raft.go"]).unwrap();

        assert_eq!(args.files, vec![PathBuf::from("boat.go"), PathBuf::from("raft.go")]);
        assert_eq!(args.substitutions.get("NAME").map(String::as_str), Some("PirateShip"));
        assert_eq!(args.substitutions.get("EXPR").map(String::as_str), Some("a=b"));
        assert!(!args.validate_only);
        assert!(args.config.is_none());
    }

    #[test]
    fn test_options() {
        let args = parse(&[
            "compose",
            "--config",
            "compose.toml",
            "--log-level",
            "debug",
            "--root",
            "game",
            "--validate-only",
            "boat.go",
        ])
        .unwrap();

        assert_eq!(args.config, Some(PathBuf::from("compose.toml")));
        assert_eq!(args.log_level.as_deref(), Some("debug"));
        assert_eq!(args.resource_root, Some(PathBuf::from("game")));
        assert!(args.validate_only);
    }

    #[test]
    fn test_bad_arguments() {
        assert!(parse(&["compose"]).is_err());
        assert!(parse(&["compose", "--set", "NAME", "boat.go"]).is_err());
        assert!(parse(&["compose", "--set", "=x", "boat.go"]).is_err());
    }
}
