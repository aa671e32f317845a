use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::de::DeserializeOwned;
use specguard_tensor::{RuntimeTensor, TensorSignature};
use specguard_utils::logger;
use tracing::debug;

use crate::runtime::fuser::FuserRuntime;
use crate::runtime::guard::{ViewConstraint, complies, evaluate_view_guard, infer_view_shape};
use crate::version::VERSION;

#[derive(Parser, Debug)]
#[command(
    name = "specguard",
    version = VERSION,
    about = "Inspect and exercise specialization guards"
)]
pub struct SpecguardCli {
    #[command(subcommand)]
    command: Command,
}

impl SpecguardCli {
    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Prints the fuser enablement, its capability inputs, guard mode and fusion flags.
    Status,
    /// Resolves a requested view shape against input sizes.
    InferView {
        #[arg(
            long,
            value_delimiter = ',',
            allow_hyphen_values = true,
            required = true
        )]
        sizes: Vec<i64>,
        #[arg(
            long,
            value_delimiter = ',',
            allow_hyphen_values = true,
            required = true
        )]
        view: Vec<i64>,
    },
    /// Resolves a view and checks it against recorded constraints (-1 marks a dynamic axis).
    CheckView {
        #[arg(
            long,
            value_delimiter = ',',
            allow_hyphen_values = true,
            required = true
        )]
        sizes: Vec<i64>,
        #[arg(
            long,
            value_delimiter = ',',
            allow_hyphen_values = true,
            required = true
        )]
        view: Vec<i64>,
        #[arg(
            long,
            value_delimiter = ',',
            allow_hyphen_values = true,
            required = true
        )]
        tensor_constraint: Vec<i64>,
        #[arg(
            long,
            value_delimiter = ',',
            allow_hyphen_values = true,
            required = true
        )]
        view_constraint: Vec<i64>,
    },
    /// Checks a JSON-encoded tensor against a JSON-encoded signature.
    CheckTensor {
        #[arg(long)]
        signature: PathBuf,
        #[arg(long)]
        tensor: PathBuf,
    },
}

pub fn run() -> Result<()> {
    logger::init_logging();
    let cli = SpecguardCli::parse();
    match cli.command() {
        Command::Status => handle_status(FuserRuntime::global()),
        Command::InferView { sizes, view } => handle_infer_view(sizes, view),
        Command::CheckView {
            sizes,
            view,
            tensor_constraint,
            view_constraint,
        } => handle_check_view(sizes, view, tensor_constraint, view_constraint),
        Command::CheckTensor { signature, tensor } => handle_check_tensor(signature, tensor),
    }
}

fn handle_status(runtime: &FuserRuntime) -> Result<()> {
    let enabled = runtime
        .is_enabled()
        .context("failed to resolve fuser enablement")?;
    let enabler = runtime.enabler();
    let capability = enabler.capability();

    println!("{}", "[Fuser]".bold());
    row("enabled", paint(enabled));
    row("override", format!("{:?}", enabler.explicit_override()));
    row("environment", format!("{:?}", enabler.env_default()));
    row("force disabled", enabler.force_disabled());
    println!("{}", "[Capability]".bold());
    row("accelerator", paint(capability.accelerator_available()));
    row("pass manager", paint(capability.pass_manager_registered()));
    row("profiling executor", paint(capability.executor_mode()));
    println!("{}", "[Guards]".bold());
    row("guard mode", paint(runtime.guard_mode()));
    row("singleton fusion", runtime.flags().singleton_fusion());
    row("horizontal fusion", runtime.flags().horizontal_fusion());
    Ok(())
}

fn handle_infer_view(sizes: &[i64], view: &[i64]) -> Result<()> {
    match infer_view_shape(sizes, view)? {
        Some(resolved) => println!("{} {}", "view".green().bold(), format_sizes(&resolved)),
        None => println!("{}", "infeasible".red().bold()),
    }
    Ok(())
}

fn handle_check_view(
    sizes: &[i64],
    view: &[i64],
    tensor_constraint: &[i64],
    view_constraint: &[i64],
) -> Result<()> {
    let constraint = ViewConstraint::from_raw(tensor_constraint, view_constraint);
    debug!(?constraint, "checking view against recorded constraint");
    print_verdict(evaluate_view_guard(sizes, view, &constraint)?);
    Ok(())
}

fn handle_check_tensor(signature: &Path, tensor: &Path) -> Result<()> {
    let signature: TensorSignature = read_json(signature)?;
    let tensor: RuntimeTensor = read_json(tensor)?;
    print_verdict(complies(&signature, &tensor)?);
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let source =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&source).with_context(|| format!("failed to parse {}", path.display()))
}

fn print_verdict(passed: bool) {
    if passed {
        println!("{}", "pass".green().bold());
    } else {
        println!("{}", "fail".red().bold());
    }
}

fn row(label: &str, value: impl fmt::Display) {
    println!("{label:>20}: {value}");
}

fn paint(value: bool) -> colored::ColoredString {
    if value {
        "yes".green()
    } else {
        "no".yellow()
    }
}

fn format_sizes(sizes: &[i64]) -> String {
    let parts: Vec<String> = sizes.iter().map(i64::to_string).collect();
    format!("[{}]", parts.join(", "))
}
