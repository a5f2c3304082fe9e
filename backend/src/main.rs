//! Shelflife CLI - Import inventory spreadsheets with expiry dates
//!
//! # Main Commands
//!
//! ```bash
//! shelflife import estoque.csv         # Import to staged records JSON
//! shelflife serve                      # Start HTTP server (port 3000)
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! shelflife parse estoque.csv          # Just decode the CSV to JSON rows
//! shelflife validate records.json      # Validate records against the schema
//! shelflife aliases                    # Show the effective alias table
//! ```

use clap::{Parser, Subcommand};
use shelflife::{
    import_file, import_rows, load_alias_table, parse_file_auto, rows_from_json_str,
    validate_document, validate_records, AppState, ImportOptions, ImportOutcome, SourceLabel,
    LOG_BROADCASTER,
};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "shelflife")]
#[command(about = "Import inventory spreadsheets with expiry dates", long_about = None)]
struct Cli {
    /// Do not echo pipeline logs to stderr
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a spreadsheet (CSV, or JSON rows) into staged records
    Import {
        /// Input file (.csv, or .json array of row objects)
        input: PathBuf,

        /// Output file for records (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Alias table JSON (default: $SHELFLIFE_ALIASES or built-in)
        #[arg(short, long)]
        aliases: Option<PathBuf>,

        /// Write the import diagnostics to this file
        #[arg(short, long)]
        diagnostics: Option<PathBuf>,

        /// Skip validation
        #[arg(long)]
        no_validate: bool,
    },

    /// Parse a CSV file and output its rows as JSON
    Parse {
        /// Input CSV file
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate staged records JSON against the schema
    Validate {
        /// Input JSON file (array of records, or an import result)
        input: PathBuf,
    },

    /// Print the effective alias table as JSON
    Aliases {
        /// Alias table JSON to load instead of the default
        #[arg(short, long)]
        aliases: Option<PathBuf>,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Alias table JSON (default: $SHELFLIFE_ALIASES or built-in)
        #[arg(short, long)]
        aliases: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    if cli.quiet {
        LOG_BROADCASTER.set_echo(false);
    }

    let result = match cli.command {
        Commands::Import {
            input,
            output,
            aliases,
            diagnostics,
            no_validate,
        } => cmd_import(
            &input,
            output.as_deref(),
            aliases.as_deref(),
            diagnostics.as_deref(),
            &ImportOptions::default(),
            no_validate,
        ),

        Commands::Parse { input, output } => cmd_parse(&input, output.as_deref()),

        Commands::Validate { input } => cmd_validate(&input),

        Commands::Aliases { aliases } => cmd_aliases(aliases.as_deref()),

        Commands::Serve { port, aliases } => cmd_serve(port, aliases.as_deref()).await,
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_import(
    input: &Path,
    output: Option<&Path>,
    aliases: Option<&Path>,
    diagnostics_path: Option<&Path>,
    options: &ImportOptions,
    no_validate: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Importing: {}", input.display());

    let table = load_alias_table(aliases)?;
    let outcome = if is_json(input) {
        import_json_rows(input, &table, options)?
    } else {
        import_file(input, &table, options)
    };

    let success = match outcome {
        Ok(success) => success,
        Err(failure) => {
            if let Some(path) = diagnostics_path {
                let json = serde_json::to_string_pretty(&failure.report())?;
                fs::write(path, json)?;
                eprintln!("💾 Diagnostics written to: {}", path.display());
            }
            return Err(failure.into());
        }
    };

    let d = &success.diagnostics;
    eprintln!("\n📊 Rows: {}", d.total_rows_found);
    eprintln!("   ✅ Accepted: {}", d.success_count);
    eprintln!("   ⚠️  Skipped: {}", d.skipped_count());
    eprintln!("   Ignored (blank name): {}", d.ignored_count);
    for skipped in d.skipped_rows.iter().take(5) {
        eprintln!("     - Row {}: {}", skipped.row_number, skipped.reason);
    }

    if !no_validate {
        let errors = validate_records(&success.records);
        if errors.is_empty() {
            eprintln!("\n✔️  All {} records valid", success.records.len());
        } else {
            eprintln!("\n❌ {} records failed validation", errors.len());
            for (i, errs) in errors.iter().take(5) {
                eprintln!("   Record {}: {}", i, errs.join(", "));
            }
        }
    }

    if let Some(path) = diagnostics_path {
        fs::write(path, serde_json::to_string_pretty(&success.diagnostics)?)?;
        eprintln!("💾 Diagnostics written to: {}", path.display());
    }

    let json = serde_json::to_string_pretty(&success.records)?;
    write_output(&json, output)?;

    eprintln!("\n✨ Done!");
    Ok(())
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"))
}

/// JSON rows come from an upstream spreadsheet reader that kept cell types.
fn import_json_rows(
    input: &Path,
    table: &shelflife::AliasTable,
    options: &ImportOptions,
) -> Result<ImportOutcome, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(input)?;
    let rows = rows_from_json_str(&content)?;
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.display().to_string());
    let source = SourceLabel::new(name).with_size(content.len() as u64);

    Ok(import_rows(rows, source, table, options))
}

fn cmd_parse(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Parsing CSV: {}", input.display());

    let result = parse_file_auto(input)?;

    eprintln!("   Encoding: {}", result.encoding);
    eprintln!("   Delimiter: '{}'", shelflife::delimiter_name(result.delimiter));
    eprintln!("   Columns: {}", result.headers.join(", "));
    eprintln!("✅ Parsed {} rows", result.rows.len());

    let json = serde_json::to_string_pretty(&result.rows)?;
    write_output(&json, output)?;

    Ok(())
}

fn cmd_validate(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("✔️  Validating: {}", input.display());

    let content = fs::read_to_string(input)?;
    let document: Value = serde_json::from_str(&content)?;

    let count = validate_document(&document)?;
    eprintln!("\n📊 All {} records valid", count);

    Ok(())
}

fn cmd_aliases(aliases: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let table = load_alias_table(aliases)?;
    println!("{}", table.to_json()?);
    Ok(())
}

async fn cmd_serve(port: u16, aliases: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let table = load_alias_table(aliases)?;
    shelflife::server::start_server(port, AppState::new(table, ImportOptions::default())).await
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
