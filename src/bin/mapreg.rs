//! Command-line front end for the mapping registry.
//!
//! Wraps the two RPC calls so operators can resolve or allocate ids against a
//! local data directory and read back names. Replies are printed as compact
//! JSON on stdout; diagnostics and logs go to stderr.

use anyhow::{Context, Result, anyhow, bail};
use mapreg::rpc::{self, RpcMethod};
use mapreg::{JsonFileStore, Registry, RegistryConfig, logging};
use serde_json::Value;
use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = CliArgs::parse(env::args_os().skip(1))?;
    logging::init(cli.verbose);

    let config = RegistryConfig::from_env(cli.data_dir.clone())?;
    tracing::debug!(data_dir = %config.data_dir.display(), "opening mapping store");
    let store = JsonFileStore::open(&config.data_dir)
        .with_context(|| format!("opening mapping store at {}", config.data_dir.display()))?;
    let registry = Registry::new(store);

    let params = Value::Array(cli.params.into_iter().map(Value::String).collect());
    // Other processes may share the data dir; a lost race is retried from a
    // fresh read rather than reported.
    let reply = rpc::dispatch_retrying(
        &registry,
        cli.method.name(),
        &params,
        rpc::MAX_WRITE_ATTEMPTS,
    )?;
    println!("{}", serde_json::to_string(&reply)?);
    Ok(())
}

#[derive(Debug)]
struct CliArgs {
    data_dir: Option<PathBuf>,
    verbose: bool,
    method: RpcMethod,
    params: Vec<String>,
}

impl CliArgs {
    fn parse(args: impl IntoIterator<Item = OsString>) -> Result<Self> {
        let mut args = args.into_iter();
        let mut data_dir: Option<PathBuf> = None;
        let mut verbose = false;
        let mut positionals: Vec<String> = Vec::new();

        while let Some(arg_os) = args.next() {
            let arg = arg_os
                .into_string()
                .map_err(|_| anyhow!("argument is not valid UTF-8"))?;
            if !positionals.is_empty() {
                positionals.push(arg);
                continue;
            }
            match arg.as_str() {
                "--data-dir" => {
                    if data_dir.is_some() {
                        bail!("--data-dir may only be provided once");
                    }
                    data_dir = Some(PathBuf::from(next_value(&mut args, "--data-dir")?));
                }
                "--verbose" | "-v" => verbose = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                other if other.starts_with('-') => bail!("unknown flag: {other}"),
                _ => positionals.push(arg),
            }
        }

        let mut positionals = positionals.into_iter();
        let command = positionals
            .next()
            .ok_or_else(|| anyhow!("missing command\n{}", usage()))?;
        let method = RpcMethod::from_name(&command)
            .ok_or_else(|| anyhow!("unknown command '{command}'\n{}", usage()))?;
        let params: Vec<String> = positionals.collect();
        if params.len() != 2 {
            bail!(
                "{} expects exactly 2 arguments, got {}\n\n{}",
                method.name(),
                params.len(),
                method.help()
            );
        }

        Ok(CliArgs {
            data_dir,
            verbose,
            method,
            params,
        })
    }
}

fn next_value(args: &mut impl Iterator<Item = OsString>, flag: &str) -> Result<String> {
    args.next()
        .map(|os| {
            os.into_string()
                .map_err(|_| anyhow!("value for {flag} is not valid UTF-8"))
        })
        .transpose()?
        .ok_or_else(|| anyhow!("missing value for {flag}"))
}

fn usage() -> &'static str {
    "Usage: mapreg [--data-dir PATH] [--verbose] getmappingid <mapping-index> <name>\n\
       mapreg [--data-dir PATH] [--verbose] getmappingname <mapping-index> <id>\n\
Resolves names to compact ids per mapping index (sports, rounds, teams, tournaments, individualSports, contenders).\n\
Data directory: --data-dir, else $MAPREG_DATA_DIR, else ./mapping-data. Log filter: $MAPREG_LOG.\n"
}

fn print_usage() {
    print!("{}", usage());
}
