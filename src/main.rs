//! cartridge - Common Cartridge course metadata extractor

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser};
use tracing::{debug, info};

use cartridge::{Cartridge, CourseData, DecodeOptions, read_cartridge_with};

#[derive(Parser)]
#[command(name = "cartridge")]
#[command(version, about = "Extract course metadata from Common Cartridge packages", long_about = None)]
#[command(after_help = "EXAMPLES:
    cartridge course.imscc                 Write output/course-<timestamp>.json
    cartridge course.imscc --stdout        Print the course record
    cartridge -i course.imscc              Show a course summary
    cartridge course.imscc --tree I_LTI_1  Dump one decoded document")]
struct Cli {
    /// Cartridge archive (.imscc)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Directory for the course record
    #[arg(short, long, value_name = "DIR", default_value = "output")]
    output_dir: PathBuf,

    /// Print the course record instead of writing a file
    #[arg(long)]
    stdout: bool,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,

    /// Show a course summary instead of JSON
    #[arg(short, long, conflicts_with_all = ["stdout", "tree"])]
    info: bool,

    /// Print the decoded tree of one document (file name without .xml)
    #[arg(long, value_name = "ENTRY")]
    tree: Option<String>,

    /// Element name to always decode as a list (repeatable)
    #[arg(long = "always-array", value_name = "NAME")]
    always_array: Vec<String>,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match (cli.quiet, cli.verbose) {
        (true, _) => "cartridge=error",
        (false, 0) => "cartridge=info",
        (false, 1) => "cartridge=debug",
        _ => "cartridge=trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<(), String> {
    let options = cli
        .always_array
        .iter()
        .fold(DecodeOptions::default(), |options, name| {
            options.with_always_sequence(name.clone())
        });

    let cartridge = read_cartridge_with(&cli.input, &options).map_err(|e| e.to_string())?;
    debug!(
        resources = cartridge.resources.len(),
        "decoded cartridge documents"
    );

    if let Some(entry) = &cli.tree {
        return show_tree(&cartridge, entry, cli.pretty);
    }

    let course = cartridge.course_data().map_err(|e| e.to_string())?;

    if cli.info {
        show_info(&cli.input, &course);
        return Ok(());
    }

    let json = to_json(&course, cli.pretty)?;
    if cli.stdout {
        println!("{json}");
        return Ok(());
    }

    let path = write_record(&cli.input, &cli.output_dir, &json)?;
    info!(path = %path.display(), "wrote course record");
    Ok(())
}

fn show_tree(cartridge: &Cartridge, entry: &str, pretty: bool) -> Result<(), String> {
    let document = cartridge
        .document(entry)
        .ok_or_else(|| format!("no document named '{entry}' in cartridge"))?;
    println!("{}", to_json(&document.data, pretty)?);
    Ok(())
}

fn show_info(path: &Path, course: &CourseData) {
    println!("File: {}", path.display());
    println!("Title: {}", course.title.as_deref().unwrap_or("(none)"));
    if let Some(isbn) = &course.isbn {
        println!("ISBN: {isbn}");
    }
    println!(
        "Resources: {}",
        course.resources.as_ref().map_or(0, |r| r.len())
    );

    let sections = [
        ("Resource folders", &course.resource_folders.resources),
        ("Test folders", &course.resource_folders.tests),
    ];
    for (label, folders) in sections {
        let Some(folders) = folders else { continue };
        println!("{label}: {}", folders.len());
        for (key, folder) in folders {
            println!("  - {} ({key}): {} resources", folder.title, folder.resources.len());
        }
    }

    if let Some(products) = &course.products {
        println!("Products: {}", products.isbns.join(", "));
    }
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<String, String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    json.map_err(|e| e.to_string())
}

/// Write `<dir>/<input stem>-<unix seconds>.json`.
fn write_record(input: &Path, dir: &Path, json: &str) -> Result<PathBuf, String> {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "cartridge".to_string());

    std::fs::create_dir_all(dir).map_err(|e| format!("{}: {e}", dir.display()))?;
    let path = dir.join(format!("{stem}-{}.json", time_now_secs()));
    std::fs::write(&path, json).map_err(|e| format!("{}: {e}", path.display()))?;
    Ok(path)
}

/// Get current time as seconds since Unix epoch.
fn time_now_secs() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
