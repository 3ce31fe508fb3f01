//! Command-line front end for parameter expressions
//!
//! Compiles an expression once and evaluates it any number of times, or
//! prints the compiled component tree.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use paramexpr::parser::line_column;
use paramexpr::{
    CompiledExpression, Component, EvaluationContext, ExpressionEngine, RegistryConfig,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "paramexpr")]
#[command(about = "Compile and evaluate parameter expressions such as 'id=${__counter}'")]
#[command(version)]
#[command(author = "OctoFHIR Team <funyloony@gmail.com>")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate an expression and print each result on its own line
    Evaluate {
        /// Expression text
        text: String,
        /// Variable binding, may be repeated
        #[arg(long = "var", value_name = "NAME=VALUE", value_parser = parse_binding)]
        vars: Vec<(String, String)>,
        /// Number of evaluations
        #[arg(short, long, default_value_t = 1)]
        repeat: usize,
        /// Thread number reported to __threadNum
        #[arg(long)]
        thread_num: Option<usize>,
        /// JSON registry configuration with extra aliases
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Validate an expression and print its component tree
    Compile {
        /// Expression text
        text: String,
    },
    /// List the registered functions
    Functions,
}

fn main() -> Result<()> {
    human_panic::setup_panic!();

    let cli = Cli::parse();
    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new().filter_level(level).init();

    match cli.command {
        Commands::Evaluate {
            text,
            vars,
            repeat,
            thread_num,
            config,
        } => handle_evaluate(&text, vars, repeat, thread_num, config.as_deref()),
        Commands::Compile { text } => handle_compile(&text),
        Commands::Functions => {
            handle_functions();
            Ok(())
        }
    }
}

fn parse_binding(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("expected NAME=VALUE, got '{raw}'")),
    }
}

fn build_engine(config: Option<&Path>) -> Result<ExpressionEngine> {
    let Some(path) = config else {
        return Ok(ExpressionEngine::new());
    };
    let json = fs::read_to_string(path)
        .with_context(|| format!("Error reading config '{}'", path.display()))?;
    let registry_config = RegistryConfig::from_json(&json)?;
    Ok(ExpressionEngine::with_registry_config(&registry_config)?)
}

fn compile_or_report(engine: &ExpressionEngine, text: &str) -> Result<CompiledExpression> {
    match engine.compile(text) {
        Ok(expr) => Ok(expr),
        Err(e) => {
            let (line, column) = line_column(text, e.position());
            bail!("Error compiling expression at {line}:{column}: {e}")
        }
    }
}

fn handle_evaluate(
    text: &str,
    vars: Vec<(String, String)>,
    repeat: usize,
    thread_num: Option<usize>,
    config: Option<&Path>,
) -> Result<()> {
    let engine = build_engine(config)?;
    let mut expr = compile_or_report(&engine, text)?;

    let mut context = EvaluationContext::new();
    for (name, value) in vars {
        context.set_variable(name, value);
    }
    if let Some(n) = thread_num {
        context = context.with_thread_num(n);
    }

    for _ in 0..repeat {
        println!("{}", expr.evaluate(&context));
    }
    Ok(())
}

fn handle_compile(text: &str) -> Result<()> {
    let engine = ExpressionEngine::new();
    let expr = compile_or_report(&engine, text)?;

    println!(
        "Expression: {:?} ({} components, {} function calls{})",
        expr.raw_text(),
        expr.components().len(),
        expr.function_count(),
        if expr.is_pure_literal() { ", literal" } else { "" }
    );
    print_tree(&expr, 1);
    Ok(())
}

fn print_tree(expr: &CompiledExpression, depth: usize) {
    let indent = "  ".repeat(depth);
    for component in expr.components() {
        match component {
            Component::Literal(text) => println!("{indent}Literal {text:?}"),
            Component::VariableReference { name, position } => {
                println!("{indent}Variable {name} @{position}")
            }
            Component::FunctionCall(call) => {
                println!(
                    "{indent}Call {} -> {} @{}",
                    call.key,
                    call.instance.reference_key(),
                    call.position
                );
                for (index, argument) in call.arguments.iter().enumerate() {
                    println!("{indent}  arg {index}: {:?}", argument.raw_text());
                    print_tree(argument, depth + 2);
                }
            }
        }
    }
}

fn handle_functions() {
    let engine = ExpressionEngine::new();
    let registry = engine.registry();
    for (key, signature) in registry.signatures() {
        match registry.alias_target(key) {
            Some(target) => println!("{key}  (alias of {target})"),
            None => println!("{signature}"),
        }
    }
}
