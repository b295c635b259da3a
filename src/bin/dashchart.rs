use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use dashchart::counter::{CounterOptions, get_counter_data};
use dashchart::funnel::{FunnelOptions, prepare_funnel_data};
use dashchart::table::{prepare_details, prepare_table};
use dashchart::{Size, get_options, render_figure, stats, storage};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "dashchart",
    version,
    about = "Turn query results and saved visualization options into chart figures"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a Plotly figure (data + layout) from a query result.
    Chart(ChartArgs),
    /// Compute counter values.
    Counter(ViewArgs),
    /// Compute funnel steps.
    Funnel(ViewArgs),
    /// Format a query result as a table (or the details of its first row).
    Table(TableArgs),
}

#[derive(Args, Debug)]
struct Input {
    /// Query result: `.csv`, or JSON (`{columns, rows}` or `{query_result: {data}}`).
    #[arg(short, long)]
    data: PathBuf,
    /// Saved visualization options (JSON). Defaults apply when omitted.
    #[arg(short, long)]
    options: Option<PathBuf>,
    /// Write the result here instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ChartArgs {
    #[command(flatten)]
    input: Input,
    /// Container width in pixels.
    #[arg(long, default_value_t = 800.0)]
    width: f64,
    /// Container height in pixels.
    #[arg(long, default_value_t = 400.0)]
    height: f64,
    /// Print summary statistics of the numeric columns to stderr.
    #[arg(long, default_value_t = false)]
    stats: bool,
}

#[derive(Args, Debug)]
struct ViewArgs {
    #[command(flatten)]
    input: Input,
    /// Visualization name, used as the default counter label.
    #[arg(long, default_value = "")]
    name: String,
}

#[derive(Args, Debug)]
struct TableArgs {
    #[command(flatten)]
    input: Input,
    /// Show only the first row as a details list.
    #[arg(long, default_value_t = false)]
    details: bool,
}

fn fmt_opt(v: Option<f64>) -> String {
    match v {
        Some(x) if x.is_finite() => {
            let s = format!("{:.4}", x);
            s.trim_end_matches('0').trim_end_matches('.').to_string()
        }
        _ => "NA".to_string(),
    }
}

fn read_options(path: Option<&Path>) -> Result<Value> {
    match path {
        Some(p) => {
            let text =
                std::fs::read_to_string(p).with_context(|| format!("reading {}", p.display()))?;
            serde_json::from_str(&text).with_context(|| format!("parsing {}", p.display()))
        }
        None => Ok(Value::Object(Default::default())),
    }
}

fn emit<T: Serialize + ?Sized>(value: &T, out: Option<&Path>) -> Result<()> {
    match out {
        Some(path) => {
            storage::save_json(value, path)?;
            eprintln!("Wrote {}", path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Chart(args) => cmd_chart(args),
        Command::Counter(args) => cmd_counter(args),
        Command::Funnel(args) => cmd_funnel(args),
        Command::Table(args) => cmd_table(args),
    }
}

fn cmd_chart(args: ChartArgs) -> Result<()> {
    let result = storage::load_query_result(&args.input.data)?;
    let options = get_options(&read_options(args.input.options.as_deref())?)?;
    let figure = render_figure(&result, &options, Size::new(args.width, args.height))?;

    if args.stats {
        for column in result.columns.iter().filter(|c| c.kind.is_some_and(|k| k.is_numeric())) {
            let s = stats::summarize(&column.name, &storage::column_values(&result, &column.name));
            eprintln!(
                "{}  count={} missing={}  min={} max={} mean={} median={}",
                s.name,
                s.count,
                s.missing,
                fmt_opt(s.min),
                fmt_opt(s.max),
                fmt_opt(s.mean),
                fmt_opt(s.median)
            );
        }
    }
    emit(&figure, args.input.out.as_deref())
}

fn cmd_counter(args: ViewArgs) -> Result<()> {
    let result = storage::load_query_result(&args.input.data)?;
    let options: CounterOptions = serde_json::from_value(read_options(args.input.options.as_deref())?)
        .context("invalid counter options")?;
    match get_counter_data(&result.rows, &options, &args.name) {
        Some(data) => emit(&data, args.input.out.as_deref()),
        None => emit(&Value::Null, args.input.out.as_deref()),
    }
}

fn cmd_funnel(args: ViewArgs) -> Result<()> {
    let result = storage::load_query_result(&args.input.data)?;
    let options: FunnelOptions = serde_json::from_value(read_options(args.input.options.as_deref())?)
        .context("invalid funnel options")?;
    emit(&prepare_funnel_data(&result.rows, &options), args.input.out.as_deref())
}

fn cmd_table(args: TableArgs) -> Result<()> {
    let result = storage::load_query_result(&args.input.data)?;
    let saved = read_options(args.input.options.as_deref())?;
    let columns: Vec<Value> = saved
        .get("columns")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    let out = args.input.out.as_deref();

    if args.details {
        return emit(&prepare_details(&result, &columns), out);
    }
    let table = prepare_table(&result, &columns);
    match out {
        Some(path) if path.extension().is_some_and(|e| e.eq_ignore_ascii_case("csv")) => {
            storage::save_table_csv(&table, path)?;
            eprintln!("Saved {} rows to {}", table.rows.len(), path.display());
            Ok(())
        }
        _ => emit(&table, out),
    }
}
