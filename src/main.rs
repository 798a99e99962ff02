use anyhow::{bail, Context, Result};
use clap::Parser;
use regex::Regex;
use std::path::PathBuf;
use std::process;
use xltab::{SheetSelector, Span, Spreadsheet, Table, TableOptions, Value};

#[derive(Parser, Debug)]
#[command(
    name = "xltab",
    about = "Extract a rectangular table from a spreadsheet worksheet as CSV",
    version
)]
struct Cli {
    /// Workbook path, optionally with a sheet suffix: path/to/book.xlsx!Sheet2
    #[arg(value_name = "SOURCE")]
    source: String,

    /// Worksheet to read: a name or a 0-based index (default: first sheet)
    #[arg(long, value_name = "SHEET")]
    sheet: Option<String>,

    /// Password for an encrypted workbook
    #[arg(long)]
    password: Option<String>,

    /// Top-left corner of the table as an A1-style address (e.g. B3)
    #[arg(short = 's', long, value_name = "ADDRESS")]
    start: Option<String>,

    /// Bottom-right corner of the table as an A1-style address (inclusive)
    #[arg(short = 'S', long, value_name = "ADDRESS")]
    stop: Option<String>,

    /// First table row (1-based)
    #[arg(short = 'r', long, value_name = "ROW", conflicts_with = "start")]
    start_row: Option<usize>,

    /// Last table row (1-based, inclusive)
    #[arg(short = 'R', long, value_name = "ROW", conflicts_with = "stop")]
    stop_row: Option<usize>,

    /// First table column as letters (e.g. B)
    #[arg(short = 'c', long, value_name = "COL", conflicts_with = "start")]
    start_col: Option<String>,

    /// Last table column as letters (inclusive)
    #[arg(short = 'C', long, value_name = "COL", conflicts_with = "stop")]
    stop_col: Option<String>,

    /// Number of header rows at the top of the table
    #[arg(long, value_name = "N", default_value_t = 1)]
    header_rows: usize,

    /// Replacement text for blank cells
    #[arg(long, value_name = "VALUE")]
    empty: Option<String>,

    /// Fill blank cells from the value above in the same column
    #[arg(long)]
    repeat: bool,

    /// Keep cell text as-is, without whitespace trimming
    #[arg(long)]
    raw: bool,

    /// Emit identifier-sanitized header names (non-word characters become _)
    #[arg(long)]
    sanitize: bool,
}

fn main() {
    if let Err(error) = run(Cli::parse()) {
        eprintln!("xltab: {error:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let (path, sheet_suffix) = split_source(&cli.source);
    let selector = match cli.sheet.as_deref().or(sheet_suffix) {
        Some(sheet) => SheetSelector::parse(sheet),
        None => SheetSelector::default(),
    };

    let mut book = Spreadsheet::open(&path, cli.password.as_deref())
        .with_context(|| format!("cannot open '{}'", path.display()))?;
    let sheet = book
        .read_sheet(&selector)
        .with_context(|| format!("cannot read worksheet from '{}'", path.display()))?;

    let options = TableOptions {
        span: build_span(&cli)?,
        header_rows: cli.header_rows,
        empty: match &cli.empty {
            Some(text) => Value::Text(text.to_owned()),
            None => Value::Missing,
        },
        repeat: cli.repeat,
        trim: !cli.raw,
    };
    let table = Table::new(&sheet, options)?;

    let mut writer = csv::Writer::from_writer(std::io::stdout().lock());
    if cli.sanitize {
        let records = table.records()?;
        writer.write_record(records.fields())?;
        for record in records {
            let record = record?;
            writer.write_record(record.values().iter().map(Value::to_string))?;
        }
    } else {
        writer.write_record(table.fields())?;
        for entry in table.entries() {
            let entry = entry?;
            writer.write_record(entry.values().map(Value::to_string))?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// Splits `path!SHEET` into the workbook path and the optional sheet part.
/// Only the last `!` counts, so paths containing `!` still work.
fn split_source(source: &str) -> (PathBuf, Option<&str>) {
    match source.rsplit_once('!') {
        Some((path, sheet)) if !sheet.is_empty() => (PathBuf::from(path), Some(sheet)),
        _ => (PathBuf::from(source), None),
    }
}

/// Builds the table span from either A1-style corner addresses or the
/// row/column flags. Rows are 1-based on the command line.
fn build_span(cli: &Cli) -> Result<Span> {
    let mut span = Span {
        start_row: cli.start_row.map(to_index).transpose()?,
        stop_row: cli.stop_row.map(to_index).transpose()?,
        start_col: cli.start_col.clone(),
        stop_col: cli.stop_col.clone(),
    };
    if let Some(address) = &cli.start {
        let (col, row) = decompose_address(address)?;
        span.start_col = Some(col);
        span.start_row = Some(to_index(row)?);
    }
    if let Some(address) = &cli.stop {
        let (col, row) = decompose_address(address)?;
        span.stop_col = Some(col);
        span.stop_row = Some(to_index(row)?);
    }
    Ok(span)
}

/// Splits an A1-style address like `$B$3` into its column letters and
/// 1-based row number.
fn decompose_address(address: &str) -> Result<(String, usize)> {
    let pattern = Regex::new(r"^(\$?[A-Za-z]+)\$?(\d+)$").expect("Hardcode regex pattern");
    let captures = pattern
        .captures(address.trim())
        .with_context(|| format!("invalid cell address '{address}'"))?;
    let column = captures[1].to_owned();
    let row = captures[2]
        .parse::<usize>()
        .with_context(|| format!("invalid row in address '{address}'"))?;
    Ok((column, row))
}

/// Converts a 1-based command-line row number to a 0-based index.
fn to_index(row: usize) -> Result<usize> {
    if row == 0 {
        bail!("row numbers are 1-based");
    }
    Ok(row - 1)
}
