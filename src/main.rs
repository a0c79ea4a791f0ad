//! thermogrid - temperature readings spreadsheet with a TUI

#[cfg(feature = "tui")]
mod tui;

use std::env;
use std::path::PathBuf;

use anyhow::Context;
use thermogrid_core::{ChartSlot, Document, RemoteClient, load_config, parse_column_arg};
use thermogrid_engine::plot::Selection;

fn print_usage() {
    eprintln!("Usage: thermogrid [OPTIONS] [FILE]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  [FILE]                    Spreadsheet to import (.xlsx, .xls, .ods, .csv)");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <FILE>           Load settings from a TOML file");
    eprintln!("  --token <TOKEN>           Session token for verification and submission");
    eprintln!("  --verify                  Load the dataset stored for --token");
    eprintln!("  --column <SPEC>           Add a column: \"key Label [text|num|date]\"");
    eprintln!("                            or \"key Label =formula\" (can be repeated)");
    eprintln!("  --chart1 <KEYS>           Comma-separated columns for chart 1");
    eprintln!("  --chart2 <KEYS>           Comma-separated columns for chart 2");
    eprintln!("  -o, --output <FILE>       Export a Word report (non-interactive)");
    eprintln!("  --markdown <FILE>         Export a Markdown report (non-interactive)");
    eprintln!("  --submit                  Submit dataset and charts (non-interactive)");
    eprintln!("  --no-tui                  Print the report to stdout instead of opening the TUI");
    eprintln!("  -h, --help                Print help");
    eprintln!();
    eprintln!("Logging goes to stderr and is controlled by RUST_LOG.");
}

#[derive(Debug, Default)]
struct Options {
    file: Option<PathBuf>,
    config: Option<PathBuf>,
    token: Option<String>,
    verify: bool,
    columns: Vec<String>,
    chart1: Option<String>,
    chart2: Option<String>,
    output: Option<PathBuf>,
    markdown: Option<PathBuf>,
    submit: bool,
    no_tui: bool,
}

impl Options {
    fn is_batch(&self) -> bool {
        self.no_tui
            || self.output.is_some()
            || self.markdown.is_some()
            || self.submit
            || cfg!(not(feature = "tui"))
    }
}

enum Parsed {
    Run(Options),
    Help,
}

fn take_value(args: &[String], i: &mut usize, name: &str) -> Result<String, String> {
    *i += 1;
    args.get(*i)
        .cloned()
        .ok_or_else(|| format!("{} requires a value", name))
}

fn parse_args(args: &[String]) -> Result<Parsed, String> {
    let mut options = Options::default();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => return Ok(Parsed::Help),
            "--config" => {
                options.config = Some(PathBuf::from(take_value(args, &mut i, "--config")?));
            }
            "--token" => options.token = Some(take_value(args, &mut i, "--token")?),
            "--verify" => options.verify = true,
            "--column" => options.columns.push(take_value(args, &mut i, "--column")?),
            "--chart1" => options.chart1 = Some(take_value(args, &mut i, "--chart1")?),
            "--chart2" => options.chart2 = Some(take_value(args, &mut i, "--chart2")?),
            "-o" | "--output" => {
                options.output = Some(PathBuf::from(take_value(args, &mut i, "--output")?));
            }
            "--markdown" => {
                options.markdown = Some(PathBuf::from(take_value(args, &mut i, "--markdown")?));
            }
            "--submit" => options.submit = true,
            "--no-tui" => options.no_tui = true,
            arg if arg.starts_with('-') => return Err(format!("Unknown option: {}", arg)),
            arg => {
                if options.file.is_some() {
                    return Err(format!("Unexpected argument: {}", arg));
                }
                options.file = Some(PathBuf::from(arg));
            }
        }
        i += 1;
    }
    if options.verify && options.token.is_none() {
        return Err("--verify requires --token".to_string());
    }
    Ok(Parsed::Run(options))
}

/// Build the document from the command line: config, import, verification,
/// extra columns and chart selections.
fn prepare_document(options: &Options) -> anyhow::Result<Document> {
    let (config, warnings) = load_config(options.config.as_deref());
    for warning in warnings {
        eprintln!("Warning: {}", warning);
    }

    let mut doc = Document::new(config)?;
    doc.token = options.token.clone();

    if let Some(path) = &options.file {
        doc.import_file(path)
            .with_context(|| format!("importing {}", path.display()))?;
    }

    if options.verify
        && let Some(token) = options.token.as_deref()
    {
        let client = RemoteClient::new(&doc.config);
        if !doc.verify(&client, token).context("verifying session token")? {
            eprintln!("Warning: session token was rejected; keeping the current dataset");
        }
    }

    for spec in &options.columns {
        let column = parse_column_arg(spec).with_context(|| format!("--column '{}'", spec))?;
        doc.add_column(column)?;
    }

    for (slot, fields) in [
        (ChartSlot::First, &options.chart1),
        (ChartSlot::Second, &options.chart2),
    ] {
        if let Some(fields) = fields {
            doc.set_selection(slot, Selection::parse_list(fields))
                .with_context(|| format!("{} selection", slot.title()))?;
        }
    }
    Ok(doc)
}

fn run_batch(options: &Options, mut doc: Document) -> anyhow::Result<()> {
    let mut wrote = false;
    if let Some(path) = &options.output {
        doc.export_docx(path)
            .with_context(|| format!("exporting {}", path.display()))?;
        println!("Exported to {}", path.display());
        wrote = true;
    }
    if let Some(path) = &options.markdown {
        doc.export_markdown(path)
            .with_context(|| format!("exporting {}", path.display()))?;
        println!("Exported to {}", path.display());
        wrote = true;
    }
    if options.submit {
        let client = RemoteClient::new(&doc.config);
        let redirect = doc.submit(&client).context("submitting dataset")?;
        println!("Submitted. Continue at {}", redirect);
        wrote = true;
    }
    if !wrote {
        print!("{}", doc.render_markdown());
    }
    Ok(())
}

fn run(options: Options) -> anyhow::Result<()> {
    log::debug!("{:?}", options);
    let doc = prepare_document(&options)?;
    if options.is_batch() {
        return run_batch(&options, doc);
    }

    #[cfg(feature = "tui")]
    {
        let mut app = tui::App::new(doc);
        tui::run(&mut app)?;
        Ok(())
    }
    #[cfg(not(feature = "tui"))]
    {
        anyhow::bail!("built without the tui feature; use --no-tui")
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("off")).init();

    let args: Vec<String> = env::args().collect();
    let options = match parse_args(&args) {
        Ok(Parsed::Run(options)) => options,
        Ok(Parsed::Help) => {
            print_usage();
            return;
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            print_usage();
            std::process::exit(1);
        }
    };

    if let Err(e) = run(options) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
