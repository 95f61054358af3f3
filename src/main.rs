//! kcfg CLI
//!
//! Entry point for the `kcfg` command-line tool.

use clap::{Args, Parser, Subcommand};
use kcfg::emit;
use kcfg::kernel::{self, features, schema};
use kcfg::logger::StderrLogger;
use kcfg::{BoardConfig, BoardError, BoardLoader, ResolutionReport, ResolvedConfig};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "kcfg")]
#[command(about = "Resolve FreeRTOS kernel configuration from board files", version)]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Layers applied on top of a board file.
#[derive(Args, Debug)]
struct LayerArgs {
    /// Override a key, e.g. scheduler.tick_rate_hz=500 (repeatable)
    #[arg(long = "set", value_name = "CATEGORY.KEY=VALUE")]
    set: Vec<String>,

    /// Enable a kernel feature, e.g. delete-task (repeatable)
    #[arg(long = "feature", value_name = "NAME")]
    features: Vec<String>,

    /// Also read features from CARGO_FEATURE_* environment variables
    #[arg(long)]
    features_from_env: bool,

    /// Declare a hook function the target provides (repeatable)
    #[arg(long = "hook", value_name = "NAME")]
    hooks: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a board and print every key with its origin
    Resolve {
        /// Board file
        board: PathBuf,

        #[command(flatten)]
        layers: LayerArgs,

        /// Print the JSON resolution report instead
        #[arg(long)]
        json: bool,

        /// Also write the JSON report to this file
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Render the resolved configuration as a C header
    Header {
        /// Board file
        board: PathBuf,

        #[command(flatten)]
        layers: LayerArgs,

        /// Output file (default: stdout)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Print compiler -D flags instead of a header
        #[arg(long)]
        flags: bool,
    },

    /// Show how one key was resolved
    Explain {
        /// Board file
        board: PathBuf,

        /// Option key, e.g. kernel_interrupt_priority
        key: String,

        #[command(flatten)]
        layers: LayerArgs,
    },

    /// List every rule of the kernel table
    Schema {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Resolve board files and report pass/fail for each
    Check {
        /// Board files or directories to scan for *.toml
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = StderrLogger::new(StderrLogger::level_for(cli.verbose)).init() {
        eprintln!("Error installing logger: {}", e);
    }

    match cli.command {
        Commands::Resolve {
            board,
            layers,
            json,
            report,
        } => run_resolve(&board, &layers, json, report),
        Commands::Header {
            board,
            layers,
            output,
            flags,
        } => run_header(&board, &layers, output, flags),
        Commands::Explain { board, key, layers } => run_explain(&board, &key, &layers),
        Commands::Schema { json } => run_schema(json),
        Commands::Check { paths } => run_check(&paths),
    }
}

fn exit_code(e: &BoardError) -> i32 {
    if e.is_schema_defect() {
        2
    } else {
        1
    }
}

fn fail(context: &str, e: BoardError) -> ! {
    eprintln!("{}: {}", context, e);
    process::exit(exit_code(&e));
}

fn loader(layers: &LayerArgs) -> Result<BoardLoader, BoardError> {
    let mut loader = BoardLoader::new()
        .features(layers.features.iter().cloned())
        .features(if layers.features_from_env {
            features::from_env(std::env::vars())
        } else {
            Vec::new()
        });
    for assignment in &layers.set {
        loader = loader.set(assignment)?;
    }
    for hook in &layers.hooks {
        loader = loader.hook(hook.clone());
    }
    Ok(loader)
}

/// Load and resolve, exiting on failure.
fn load_and_resolve(board: &Path, layers: &LayerArgs) -> (BoardConfig, ResolvedConfig) {
    let loaded = loader(layers).and_then(|l| l.load(board));
    let config = match loaded {
        Ok(c) => c,
        Err(e) => fail(&format!("Error loading {}", board.display()), e),
    };
    match config.resolve() {
        Ok(resolved) => (config, resolved),
        Err(e) => fail(&format!("Error resolving {}", board.display()), e),
    }
}

fn run_resolve(board: &Path, layers: &LayerArgs, json: bool, report_path: Option<PathBuf>) {
    let (config, resolved) = load_and_resolve(board, layers);
    let report = ResolutionReport::new(&config, resolved);

    if let Some(path) = report_path {
        if let Err(e) = report.write_to_file(&path) {
            eprintln!("Error writing report {}: {}", path.display(), e);
            process::exit(1);
        }
    }

    if json {
        match report.to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing output: {}", e);
                process::exit(1);
            }
        }
        return;
    }

    let rules = match kernel::rules() {
        Ok(r) => r,
        Err(e) => fail("Error loading rules", e.into()),
    };
    let width = rules.iter().map(|r| r.key().as_str().len()).max().unwrap_or(0);

    println!("Board: {}", report.board);
    for source in &report.sources {
        println!("  {:<8} {}", source.origin.as_str(), source.label());
    }
    println!();
    for rule in rules.iter() {
        if let Some(entry) = report.config.entry(rule.key().as_str()) {
            println!(
                "{:<width$} = {:<18} {}",
                rule.key().as_str(),
                entry.value.to_string(),
                entry.origin.as_str(),
                width = width
            );
        }
    }
}

fn run_header(board: &Path, layers: &LayerArgs, output: Option<PathBuf>, flags: bool) {
    let (_, resolved) = load_and_resolve(board, layers);
    let rules = match kernel::rules() {
        Ok(r) => r,
        Err(e) => fail("Error loading rules", e.into()),
    };

    let text = if flags {
        let mut lines: Vec<String> = emit::defines(&resolved, rules)
            .iter()
            .map(|d| d.to_flag())
            .collect();
        lines.push(String::new());
        lines.join("\n")
    } else {
        emit::render(&resolved, rules)
    };

    match output {
        Some(path) => {
            if let Err(e) = fs::write(&path, text) {
                eprintln!("Error writing {}: {}", path.display(), e);
                process::exit(1);
            }
            log::info!("wrote {}", path.display());
        }
        None => print!("{}", text),
    }
}

fn run_explain(board: &Path, key: &str, layers: &LayerArgs) {
    let rules = match kernel::rules() {
        Ok(r) => r,
        Err(e) => fail("Error loading rules", e.into()),
    };
    let Some(rule) = rules.get(key) else {
        eprintln!("Unknown key '{}'. Run `kcfg schema` to list keys.", key);
        process::exit(1);
    };

    let (config, resolved) = load_and_resolve(board, layers);
    let Some(entry) = resolved.entry(key) else {
        eprintln!("'{}' has no resolved value", key);
        process::exit(2);
    };

    println!("{} = {} ({})", key, entry.value, entry.origin.as_str());
    if let Some(source) = config.source_of(key) {
        println!("  set in:     {}", source.label());
    }
    println!("  category:   {}", rule.category());
    if let Some(define) = rule.define_name() {
        println!("  macro:      {}", define);
    }
    println!("  kind:       {}", rule.kind().describe());
    if rule.get_constraint().is_numeric() {
        println!("  constraint: {}", rule.get_constraint().describe());
    }
    if let Some(default) = rule.default_value() {
        println!("  default:    {}", default);
    }
    if let Some(derivation) = rule.derivation() {
        println!("  derived:    {}", derivation.expr());
        for input in derivation.inputs() {
            if let Some(value) = resolved.get(input.as_str()) {
                println!("    {} = {}", input, value);
            }
        }
    }
    if !rule.description().is_empty() {
        println!("  {}", rule.description());
    }
}

fn run_schema(json: bool) {
    let rules = match kernel::rules() {
        Ok(r) => r,
        Err(e) => fail("Error loading rules", e.into()),
    };
    let entries = schema::entries(rules);

    if json {
        match serde_json::to_string_pretty(&entries) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing output: {}", e);
                process::exit(1);
            }
        }
        return;
    }

    println!("{} ({} keys)\n", kernel::SCHEMA_ID, entries.len());
    let mut category = None;
    for entry in &entries {
        if category != Some(entry.category) {
            println!("[{}]", entry.category);
            category = Some(entry.category);
        }
        let value = match (&entry.default, &entry.derivation) {
            (Some(default), _) => default.to_string(),
            (None, Some(derivation)) => format!("= {}", derivation.expr),
            (None, None) => String::new(),
        };
        println!("  {:<42} {:<16} {}", entry.key, entry.source, value);
    }
}

/// Board files named directly, plus every *.toml under named directories.
fn collect_boards(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut boards = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(path)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .map(|e| e.into_path())
                .filter(|p| p.extension().map_or(false, |ext| ext == "toml"))
                .collect();
            found.sort();
            boards.extend(found);
        } else {
            boards.push(path.clone());
        }
    }
    boards
}

fn run_check(paths: &[PathBuf]) {
    let boards = collect_boards(paths);
    if boards.is_empty() {
        eprintln!("No board files found.");
        process::exit(1);
    }

    let mut code = 0;
    for board in &boards {
        let result = BoardLoader::new()
            .load(board)
            .and_then(|config| config.resolve().map(|_| config));
        match result {
            Ok(config) => println!("ok    {} ({})", board.display(), config.name),
            Err(e) => {
                println!("FAIL  {}: {}", board.display(), e);
                code = code.max(exit_code(&e));
            }
        }
    }

    println!("\n{} board(s) checked", boards.len());
    process::exit(code);
}
