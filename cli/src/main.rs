mod settings;
mod test_runner;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use tracing_subscriber::EnvFilter;

use page::{LineLayout, Page, Termynal, Viewport};
use termynal::document::{self, line_number};
use termynal::render::Renderer;
use termynal::{ParseError, WidgetOptions};

use settings::{CliError, Settings};

const SUBCOMMANDS: &[&str] = &["parse", "scan", "render", "activate", "test", "help"];

/// Log filter when `RUST_LOG` is unset. Parse warnings are printed as
/// diagnostics instead.
const DEFAULT_LOG_FILTER: &str = "error";

#[derive(Parser)]
#[command(
    name = "termynal",
    version,
    about = "Console transcript animations for documentation"
)]
struct Cli {
    /// Disable colored diagnostics
    #[arg(long, global = true)]
    no_color: bool,

    /// Settings file (defaults to ./termynal.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a file as a single console transcript
    Parse(ParseArgs),

    /// List the console blocks of a Markdown file with their line data
    Scan(FileArgs),

    /// Render Markdown to HTML with animated console blocks
    Render(RenderArgs),

    /// Replay page activation for a Markdown file
    Activate(ActivateArgs),

    /// Run .test.md fixture files
    Test(TestArgs),
}

#[derive(clap::Args)]
struct ParseArgs {
    /// Transcript text file
    file: String,

    /// Print the widget options as JSON
    #[arg(long)]
    json: bool,
}

#[derive(clap::Args)]
struct FileArgs {
    /// Markdown source file
    file: String,
}

#[derive(clap::Args)]
struct RenderArgs {
    /// Markdown source file
    file: String,

    /// Write HTML here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(clap::Args)]
struct ActivateArgs {
    /// Markdown source file
    file: String,

    /// Viewport height in pixels
    #[arg(long, default_value_t = 800.0)]
    viewport: f64,

    /// Height of one source line in pixels
    #[arg(long, default_value_t = 24.0)]
    line_height: f64,

    /// Scroll offsets to check after the initial load. Repeatable.
    #[arg(short, long)]
    scroll: Vec<f64>,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test.md file or directory containing them
    path: String,

    /// Run only tests in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

fn init_tracing() {
    // RUST_LOG=termynal=debug,page=debug
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .compact()
        .try_init();
}

fn main() {
    // A bare file argument means `parse`.
    let mut args: Vec<String> = std::env::args().collect();
    let mut idx = 1;
    while idx < args.len() {
        if args[idx] == "--config" {
            idx += 2;
            continue;
        }
        if args[idx].starts_with('-') {
            idx += 1;
            continue;
        }
        if !SUBCOMMANDS.contains(&args[idx].as_str()) {
            args.insert(idx, "parse".to_string());
        }
        break;
    }

    let cli = Cli::parse_from(&args);
    init_tracing();

    let color_choice = if cli.no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };

    let settings = match Settings::load(cli.config.as_deref(), Path::new(".")) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Parse(args) => do_parse(args, &settings, color_choice),
        Command::Scan(args) => do_scan(args, &settings, color_choice),
        Command::Render(args) => do_render(args, &settings, color_choice),
        Command::Activate(args) => do_activate(args, &settings, color_choice),
        Command::Test(args) => {
            let path = Path::new(&args.path);
            if args.list_categories {
                test_runner::list_categories(path);
                return;
            }
            let exit_code =
                test_runner::run_tests(path, cli.no_color, &args.category, &settings.scan.languages);
            process::exit(exit_code);
        }
    };

    if let Err(e) = result {
        eprintln!("error: {}", e);
        process::exit(1);
    }
}

/// Source text registered with a codespan file database.
struct Loaded {
    files: SimpleFiles<String, String>,
    file_id: usize,
    source: String,
}

fn load(file: &str) -> Result<Loaded, CliError> {
    let source = std::fs::read_to_string(file).map_err(|error| CliError::Io {
        path: PathBuf::from(file),
        error,
    })?;
    let mut files = SimpleFiles::new();
    let file_id = files.add(file.to_string(), source.clone());
    Ok(Loaded {
        files,
        file_id,
        source,
    })
}

fn emit_warnings(loaded: &Loaded, warnings: &[ParseError], color_choice: ColorChoice) {
    if warnings.is_empty() {
        return;
    }
    let writer = StandardStream::stderr(color_choice);
    let config = term::Config::default();
    for warning in warnings {
        let diagnostic = warning.to_diagnostic();
        let _ = term::emit_to_write_style(&mut writer.lock(), &config, &loaded.files, &diagnostic);
    }
}

fn do_parse(args: ParseArgs, settings: &Settings, color_choice: ColorChoice) -> Result<(), CliError> {
    let loaded = load(&args.file)?;
    let transcript = termynal::Parser::new(&loaded.source, loaded.file_id).parse();
    emit_warnings(&loaded, &transcript.warnings, color_choice);

    if args.json {
        let options = WidgetOptions::new(settings.animation.to_config(), &transcript.lines);
        println!("{}", serde_json::to_string_pretty(&options)?);
    } else {
        for line in &transcript.lines {
            println!("{}", line);
        }
    }
    Ok(())
}

fn do_scan(args: FileArgs, settings: &Settings, color_choice: ColorChoice) -> Result<(), CliError> {
    let loaded = load(&args.file)?;
    let blocks = document::scan(&loaded.source, settings.scan.languages.as_slice());
    let mut warnings = Vec::new();

    for block in &blocks {
        let mut transcript = block.transcript(loaded.file_id);
        println!(
            "{}:{}: {} ({} lines)",
            args.file,
            line_number(&loaded.source, block.span.start),
            block.language,
            transcript.lines.len()
        );
        println!("{}", serde_json::to_string(&transcript.lines)?);
        warnings.append(&mut transcript.warnings);
    }

    emit_warnings(&loaded, &warnings, color_choice);
    if blocks.is_empty() {
        eprintln!("no console blocks in {}", args.file);
    }
    Ok(())
}

fn do_render(args: RenderArgs, settings: &Settings, color_choice: ColorChoice) -> Result<(), CliError> {
    let loaded = load(&args.file)?;
    let renderer = Renderer::new(settings.scan.languages.as_slice(), settings.animation.to_config());
    let page = renderer.render(&loaded.source, loaded.file_id)?;
    emit_warnings(&loaded, &page.warnings, color_choice);

    match &args.output {
        Some(path) => {
            std::fs::write(path, &page.html).map_err(|error| CliError::Io {
                path: path.clone(),
                error,
            })?;
            eprintln!(
                "ok: wrote {} ({} animations)",
                path.display(),
                page.animations
            );
        }
        None => print!("{}", page.html),
    }
    Ok(())
}

fn do_activate(
    args: ActivateArgs,
    settings: &Settings,
    color_choice: ColorChoice,
) -> Result<(), CliError> {
    let loaded = load(&args.file)?;
    let layout = LineLayout::new(args.line_height);
    let (mut page, warnings) = Page::<Termynal>::from_document(
        &loaded.source,
        loaded.file_id,
        settings.scan.languages.as_slice(),
        settings.animation.to_config(),
        &layout,
    );
    emit_warnings(&loaded, &warnings, color_choice);

    // One check at load time, then one per scroll event.
    for scroll_y in std::iter::once(0.0).chain(args.scroll.iter().copied()) {
        let started = page.load_visible(&Viewport::new(scroll_y, args.viewport));
        let ids: Vec<String> = started.iter().map(|t| format!("#{}", t.id)).collect();
        println!(
            "scroll {}: started [{}], {} pending",
            scroll_y,
            ids.join(", "),
            page.pending().len()
        );
    }
    Ok(())
}
