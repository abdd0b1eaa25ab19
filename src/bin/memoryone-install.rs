use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use log::info;
use memoryone_installer::dispatch::{decode_compact_log, DEFAULT_LOCK_PATH};
use memoryone_installer::logging::init_logger;
use memoryone_installer::preflight::check_host_tools;
use memoryone_installer::script::{render_install_script, ScriptParams};
use memoryone_installer::{
    ChrootExecutor, CommandResponse, InstallOrchestrator, InstallResult, InstallerConfig,
    InvocationLock, NodeDescription, SystemMounter,
};

fn usage() -> &'static str {
    "Usage:\n  memoryone-install run <node.json> [--config <installer.toml>] [--lock <path>] [--print-log] [-v]\n  memoryone-install url <node.json> [--config <installer.toml>] [-v]\n  memoryone-install render-script <node.json> [--config <installer.toml>] [-v]\n  memoryone-install preflight [-v]"
}

#[derive(Debug, Default)]
struct Options {
    config: Option<PathBuf>,
    lock: Option<PathBuf>,
    print_log: bool,
    verbose: bool,
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (positional, options) = parse_options(&args)?;
    init_logger(options.verbose);

    match positional.as_slice() {
        [cmd, node] if cmd == "run" => run(Path::new(node), &options),
        [cmd, node] if cmd == "url" => print_plan(Path::new(node), &options),
        [cmd, node] if cmd == "render-script" => print_script(Path::new(node), &options),
        [cmd] if cmd == "preflight" => {
            check_host_tools()?;
            println!("[preflight] host tools present");
            Ok(())
        }
        _ => bail!(usage()),
    }
}

fn parse_options(args: &[String]) -> Result<(Vec<String>, Options)> {
    let mut positional = Vec::new();
    let mut options = Options::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let value = iter.next().context("--config requires a path")?;
                options.config = Some(PathBuf::from(value));
            }
            "--lock" => {
                let value = iter.next().context("--lock requires a path")?;
                options.lock = Some(PathBuf::from(value));
            }
            "--print-log" => options.print_log = true,
            "-v" | "--verbose" => options.verbose = true,
            other if other.starts_with('-') => {
                bail!("unknown option '{}'\n{}", other, usage())
            }
            _ => positional.push(arg.clone()),
        }
    }

    Ok((positional, options))
}

fn load_config(options: &Options) -> Result<InstallerConfig> {
    match &options.config {
        Some(path) => InstallerConfig::load(path),
        None => Ok(InstallerConfig::default()),
    }
}

fn orchestrator(
    options: &Options,
) -> Result<InstallOrchestrator<SystemMounter, ChrootExecutor>> {
    Ok(InstallOrchestrator::new(
        load_config(options)?,
        SystemMounter::default(),
        ChrootExecutor::default(),
    ))
}

fn run(node_path: &Path, options: &Options) -> Result<()> {
    let node = NodeDescription::load(node_path)?;
    let orchestrator = orchestrator(options)?;

    let lock_path = options
        .lock
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOCK_PATH));
    let lock = InvocationLock::acquire(&lock_path)?;
    info!("holding install lock '{}'", lock.path().display());

    let result = orchestrator.run(&node);
    drop(lock);

    let response = CommandResponse::from_result(&result)?;
    if options.print_log {
        if let Some(compact) = &response.log {
            eprint!("{}", decode_compact_log(compact)?);
        }
    }
    println!("{}", response.to_json()?);

    if let InstallResult::Failure {
        error_kind,
        message,
    } = &result
    {
        bail!("install failed ({}): {}", error_kind, message);
    }
    Ok(())
}

fn print_plan(node_path: &Path, options: &Options) -> Result<()> {
    let node = NodeDescription::load(node_path)?;
    let orchestrator = orchestrator(options)?;

    match orchestrator.plan(&node) {
        Ok(plan) => {
            println!("domain:    {}", plan.domain);
            println!("version:   {}", plan.version);
            println!("installer: {}", plan.installer_name);
            println!("url:       {}", plan.download_url);
            Ok(())
        }
        Err(result) => bail!("node does not qualify: {:?}", result),
    }
}

fn print_script(node_path: &Path, options: &Options) -> Result<()> {
    let node = NodeDescription::load(node_path)?;
    let orchestrator = orchestrator(options)?;

    let plan = match orchestrator.plan(&node) {
        Ok(plan) => plan,
        Err(result) => bail!("node does not qualify: {:?}", result),
    };
    let script = &orchestrator.config().script;
    print!(
        "{}",
        render_install_script(&ScriptParams {
            download_url: plan.download_url,
            installer_name: plan.installer_name,
            download_retries: script.download_retries,
            cleanup_resolver_symlink: script.cleanup_resolver_symlink,
        })
    );
    Ok(())
}
