mod config;

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgAction, Parser, Subcommand};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use log::{LevelFilter, debug, info};
use simplelog::{ConfigBuilder, WriteLogger};

use stick_syntax::{FilesystemLoader, Loader, ParseError};
use stickgen::{GenerateError, Generator, GeneratorConfig};

use crate::config::Config;

#[derive(Parser)]
#[command(name = "stickgen", version, about = "Compile Twig templates into Rust render functions")]
struct Cli {
    /// Disable colored error output
    #[arg(long, global = true)]
    no_color: bool,

    /// Log more (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile templates into one Rust source file
    Gen(GenArgs),

    /// Compile templates and report errors, without writing anything
    Check(SourceArgs),

    /// Dump the parsed AST of a template
    Ast(AstArgs),
}

#[derive(clap::Args)]
struct SourceArgs {
    /// Template names, relative to the template directory
    names: Vec<String>,

    /// Template directory
    #[arg(short = 'd', long = "dir")]
    dir: Option<PathBuf>,

    /// Config file (defaults to ./stickgen.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(clap::Args)]
struct GenArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Output file; `-` or absent writes to stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Crate path the generated code imports as `stick`
    #[arg(long = "runtime")]
    runtime_crate: Option<String>,
}

#[derive(clap::Args)]
struct AstArgs {
    /// Template name, relative to the template directory
    name: String,

    /// Template directory
    #[arg(short = 'd', long = "dir", default_value = ".")]
    dir: PathBuf,
}

/// Resolved inputs of a `gen` or `check` run.
struct Job {
    templates: PathBuf,
    names: Vec<String>,
    output: Option<PathBuf>,
    runtime_crate: Option<String>,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let color_choice = if cli.no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };

    let result = match cli.command {
        Command::Gen(args) => do_gen(args, color_choice),
        Command::Check(args) => do_check(args, color_choice),
        Command::Ast(args) => do_ast(args, color_choice),
    };
    if result.is_err() {
        process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let config = ConfigBuilder::new().set_time_level(LevelFilter::Off).build();
    let _ = WriteLogger::init(level, config, std::io::stderr());
}

/// Merge command-line arguments over the config file.
fn resolve_job(
    source: SourceArgs,
    output: Option<PathBuf>,
    runtime_crate: Option<String>,
) -> Result<Job, ()> {
    let config = Config::load(source.config.as_deref()).map_err(|e| eprintln!("error: {}", e))?;
    debug!("config: {:?}", config);

    let names = if source.names.is_empty() {
        config.names
    } else {
        source.names
    };
    if names.is_empty() {
        eprintln!("error: no templates given (pass names or set `names` in {})", config::DEFAULT_CONFIG);
        return Err(());
    }

    Ok(Job {
        templates: source
            .dir
            .or(config.templates)
            .unwrap_or_else(|| PathBuf::from(".")),
        names,
        output: output.or(config.output),
        runtime_crate: runtime_crate.or(config.runtime_crate),
    })
}

fn do_gen(args: GenArgs, color_choice: ColorChoice) -> Result<(), ()> {
    let job = resolve_job(args.source, args.output, args.runtime_crate)?;
    let mut generator_config = GeneratorConfig::default();
    if let Some(runtime_crate) = job.runtime_crate {
        generator_config.runtime_crate = runtime_crate;
    }
    let generator = Generator::with_config(FilesystemLoader::new(&job.templates), generator_config);

    let unit = generator
        .generate_all(&job.names)
        .map_err(|e| emit_generate_error(&e, color_choice))?;
    let source = unit.to_source();

    match job.output.as_deref() {
        Some(path) if path != Path::new("-") => {
            fs::write(path, source)
                .map_err(|e| eprintln!("error: cannot write '{}': {}", path.display(), e))?;
            info!("wrote {} template(s) to {}", job.names.len(), path.display());
        }
        _ => print!("{}", source),
    }
    Ok(())
}

fn do_check(args: SourceArgs, color_choice: ColorChoice) -> Result<(), ()> {
    let job = resolve_job(args, None, None)?;
    let generator = Generator::new(FilesystemLoader::new(&job.templates));

    let mut failed = false;
    for name in &job.names {
        match generator.generate(name) {
            Ok(_) => eprintln!("ok: {}", name),
            Err(e) => {
                emit_generate_error(&e, color_choice);
                failed = true;
            }
        }
    }
    if failed { Err(()) } else { Ok(()) }
}

fn do_ast(args: AstArgs, color_choice: ColorChoice) -> Result<(), ()> {
    let loader = FilesystemLoader::new(&args.dir);
    let source = loader
        .load(&args.name)
        .map_err(|e| eprintln!("error: {}", e))?;

    let mut files = SimpleFiles::new();
    let file_id = files.add(args.name.clone(), source.clone());
    let parser = stick_syntax::Parser::new(source, file_id);
    match parser.parse() {
        Ok(module) => {
            println!("{:#?}", module);
            Ok(())
        }
        Err(error) => {
            emit_parse_error(&files, &error, color_choice);
            Err(())
        }
    }
}

fn emit_generate_error(error: &GenerateError, color_choice: ColorChoice) {
    match error {
        GenerateError::Syntax {
            name,
            source,
            error,
        } => {
            let mut files = SimpleFiles::new();
            // Parse errors from the generator always carry file id 0.
            files.add(name.clone(), source.clone());
            emit_parse_error(&files, error, color_choice);
        }
        other => eprintln!("error: {}", other),
    }
}

fn emit_parse_error(files: &SimpleFiles<String, String>, error: &ParseError, color_choice: ColorChoice) {
    let writer = StandardStream::stderr(color_choice);
    let config = term::Config::default();
    let diagnostic = error.to_diagnostic();
    let _ = term::emit_to_write_style(&mut writer.lock(), &config, files, &diagnostic);
}
