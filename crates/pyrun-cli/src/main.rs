use std::env;
use std::path::PathBuf;

use clap::{ArgAction, Parser};
use color_eyre::{eyre::eyre, Result};
use pyrun_core::{find_package_dir, spawn_python, Interop, PackageDirSpec, SpawnOptions};
use pyrun_domain::{find_source_arg, python_env, EnvMap};

/// Run a Python script with its user-site installs pinned under the
/// nearest package root.
#[derive(Parser, Debug)]
#[command(author, version, disable_help_subcommand = true)]
struct PyrunCli {
    #[arg(short, long, action = ArgAction::Count, help = "Increase logging (-vv reaches trace)")]
    verbose: u8,
    #[arg(long, help = "Force trace logging regardless of -v")]
    trace: bool,
    #[arg(
        long,
        value_name = "DIR",
        help = "Use DIR as the package root instead of searching upward"
    )]
    package_dir: Option<PathBuf>,
    #[arg(
        trailing_var_arg = true,
        allow_hyphen_values = true,
        required = true,
        value_name = "PYTHON_ARGS",
        help = "Arguments passed through to the python interpreter"
    )]
    args: Vec<String>,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = PyrunCli::parse();
    init_tracing(cli.trace, cli.verbose);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let code = runtime.block_on(run(&cli)).map_err(|err| eyre!("{err:?}"))?;

    if code == 0 {
        Ok(())
    } else {
        std::process::exit(code);
    }
}

fn init_tracing(trace: bool, verbose: u8) {
    let level = if trace {
        "trace"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = format!("pyrun_cli={level},pyrun_core={level},pyrun_domain={level}");
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

async fn run(cli: &PyrunCli) -> anyhow::Result<i32> {
    let spec = if let Some(dir) = &cli.package_dir {
        PackageDirSpec::Explicit(dir.clone())
    } else {
        let start = match find_source_arg(&cli.args) {
            Some(source) => PathBuf::from(source),
            None => env::current_dir()?,
        };
        PackageDirSpec::Search(start)
    };
    let package_dir = find_package_dir(&spec).await?;

    let base: EnvMap = env::vars().collect();
    let child_env = python_env(&package_dir, &base);

    let options = SpawnOptions {
        env: Some(child_env),
        interop: Interop::Stream,
        throw_non_zero_status: false,
    };
    let result = spawn_python(&cli.args, options).await?;
    Ok(result.code)
}
