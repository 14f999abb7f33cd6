mod config;
mod test_runner;

use std::error::Error;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};

use engine::{Engine, EngineError, FileLoader, RuntimeValue};

#[derive(Parser)]
#[command(name = "quill", version, about = "Template compiler and renderer")]
struct Cli {
    /// Disable colored error output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a template to stdout
    Render(RenderArgs),

    /// Run .test.tpl conformance files
    Test(TestArgs),
}

#[derive(clap::Args)]
struct RenderArgs {
    /// Template to render, relative to the template root
    file: String,

    /// Bind a variable, e.g. `--var name=World`. Repeatable.
    #[arg(long = "var", value_name = "NAME=VALUE")]
    vars: Vec<String>,

    /// Directory templates and their parents are loaded from
    /// (defaults to the directory containing FILE)
    #[arg(long)]
    root: Option<PathBuf>,

    /// Settings file (defaults to quill.toml in the template root)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the generated unit instead of rendering
    #[arg(long)]
    emit_unit: bool,

    /// Build the template and its parents without rendering
    #[arg(long)]
    check: bool,

    /// Treat reads of unbound variables as errors
    #[arg(long)]
    strict: bool,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test.tpl file or directory containing them
    path: String,

    /// Run only tests in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

fn main() {
    config::init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Render(args) => do_render(args, cli.no_color),
        Command::Test(args) => {
            let path = Path::new(&args.path);
            if args.list_categories {
                test_runner::list_categories(path);
                return;
            }
            let exit_code = test_runner::run_tests(path, cli.no_color, &args.category);
            process::exit(exit_code);
        }
    }
}

/// Split FILE into the loader root and the template name inside it.
fn locate(file: &str, root: Option<PathBuf>) -> (PathBuf, String) {
    match root {
        Some(root) => (root, file.to_string()),
        None => {
            let path = Path::new(file);
            let root = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| file.to_string());
            (root, name)
        }
    }
}

fn do_render(args: RenderArgs, no_color: bool) {
    let (root, name) = locate(&args.file, args.root);

    let mut settings = match config::load_settings(args.config.as_deref(), &root) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    };
    if args.strict {
        settings.strict_variables = true;
    }

    let engine = Engine::with_settings(FileLoader::new(root.clone()), settings);

    if args.emit_unit {
        let source = match std::fs::read_to_string(root.join(&name)) {
            Ok(source) => source,
            Err(e) => {
                eprintln!("error: cannot read '{}': {}", name, e);
                process::exit(1);
            }
        };
        match engine.parse(&name, &source) {
            Ok(node) => print!("{}", engine.emit_unit(&node)),
            Err(error) => fail(&error, no_color),
        }
        return;
    }

    if args.check {
        match engine.get_template(&name) {
            Ok(_) => eprintln!("ok: {} compiled successfully", name),
            Err(error) => fail(&error, no_color),
        }
        return;
    }

    let mut variables = Vec::new();
    for var in &args.vars {
        match var.split_once('=') {
            Some((key, value)) => variables.push((key.to_string(), parse_var(value))),
            None => {
                eprintln!("error: expected NAME=VALUE, got '{}'", var);
                process::exit(2);
            }
        }
    }

    let mut stdout = std::io::stdout().lock();
    if let Err(error) = engine.render_to(&name, variables, &mut stdout) {
        fail(&error, no_color);
    }
}

fn fail(error: &EngineError, no_color: bool) -> ! {
    report_error(error, no_color);
    process::exit(1);
}

/// Parse errors get source labels; everything else is printed as text.
fn report_error(error: &EngineError, no_color: bool) {
    match error {
        EngineError::Parse {
            filename,
            text,
            errors,
        } => {
            let color_choice = if no_color {
                ColorChoice::Never
            } else {
                ColorChoice::Auto
            };
            let writer = StandardStream::stderr(color_choice);
            let config = term::Config::default();
            let mut files = SimpleFiles::new();
            files.add(filename.clone(), text.clone());
            for parse_error in errors {
                let diagnostic = parse_error.to_diagnostic();
                let _ =
                    term::emit_to_write_style(&mut writer.lock(), &config, &files, &diagnostic);
            }
        }
        EngineError::Compilation(compilation) => {
            eprintln!("error: compilation of `{}` failed", compilation.target);
            for diagnostic in &compilation.diagnostics {
                eprintln!("  {}", diagnostic);
            }
        }
        other => {
            eprintln!("error: {}", other);
            let mut source = other.source();
            while let Some(cause) = source {
                eprintln!("  caused by: {}", cause);
                source = cause.source();
            }
        }
    }
}

/// Integers become int (or long when they overflow), decimals double,
/// `true`/`false` booleans, anything else a string.
fn parse_var(text: &str) -> RuntimeValue {
    if let Ok(n) = text.parse::<i32>() {
        return RuntimeValue::Int(n);
    }
    if let Ok(n) = text.parse::<i64>() {
        return RuntimeValue::Long(n);
    }
    if text.contains(|c: char| c.is_ascii_digit())
        && let Ok(x) = text.parse::<f64>()
    {
        return RuntimeValue::Double(x);
    }
    match text {
        "true" => RuntimeValue::Boolean(true),
        "false" => RuntimeValue::Boolean(false),
        _ => RuntimeValue::String(text.to_string()),
    }
}
