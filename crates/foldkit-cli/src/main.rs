use std::{
    error::Error,
    fs::File,
    io::{self, BufRead, BufReader, Write},
    num::NonZeroUsize,
    path::PathBuf,
};

use clap::Parser;
use foldkit::{DataType, FunctionRegistry, Pipeline, PipelineConf, Value};

/// Runs a registered aggregate function over `key,value` rows
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Aggregate function to run (e.g. avg_udaf_gen, max_udaf)
    #[clap(short, long, required_unless_present = "list")]
    function: Option<String>,
    /// Type of the value column
    #[clap(short = 't', long, value_parser, default_value = "double")]
    input_type: DataType,
    /// Number of first-stage partitions
    #[clap(short, long, value_parser, default_value_t = 1)]
    partitions: usize,
    /// Number of intermediate merge stages
    #[clap(short, long, value_parser, default_value_t = 0)]
    merge_stages: usize,
    /// Encode partials between stages
    #[clap(long)]
    ship: bool,
    /// Input file, stdin when omitted
    #[clap(short, long)]
    input: Option<PathBuf>,
    /// List registered functions and exit
    #[clap(long)]
    list: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    // Log to stderr (if you run with `RUST_LOG=debug`).
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let registry = FunctionRegistry::with_builtins();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if args.list {
        for (kind, description) in registry.descriptions() {
            let usage = description.usage();
            writeln!(out, "{kind:?}\t{}\t{usage}", description.name)?;
        }
        return Ok(());
    }

    let name = args.function.as_deref().ok_or("--function is required")?;
    let function = registry.aggregate(name)?;
    let partitions = NonZeroUsize::new(args.partitions)
        .ok_or("--partitions must be at least 1")?;
    let pipeline = Pipeline::new(
        PipelineConf::default()
            .with_partitions(partitions)
            .with_merge_stages(args.merge_stages)
            .with_ship_partials(args.ship),
    );
    log::info!(
        "running {name} over {} values with {:?}",
        args.input_type,
        pipeline.conf()
    );

    let reader: Box<dyn BufRead> = match &args.input {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(io::stdin().lock()),
    };
    let rows = read_rows(reader, &args.input_type)?;
    log::debug!("read {} row(s)", rows.len());

    let results = pipeline.run(function.as_ref(), &[args.input_type], rows)?;
    for (key, value) in results {
        writeln!(out, "{key}\t{value}")?;
    }
    Ok(())
}

type Rows = Vec<(String, Value)>;

fn read_rows(reader: impl BufRead, data_type: &DataType) -> Result<Rows, Box<dyn Error>> {
    let mut rows = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let (key, value) = line
            .split_once(',')
            .ok_or_else(|| format!("line {}: expected key,value", line_no + 1))?;
        let value = Value::parse(value, data_type)
            .map_err(|e| format!("line {}: {e}", line_no + 1))?;
        rows.push((key.to_string(), value));
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rows() {
        let input = "a,1\n\nb,\\N\na,3\n";
        let rows = read_rows(input.as_bytes(), &DataType::Long).unwrap();
        assert_eq!(
            rows,
            vec![
                ("a".to_string(), Value::Long(1)),
                ("b".to_string(), Value::Null),
                ("a".to_string(), Value::Long(3)),
            ]
        );
        for bad in ["nocomma\n", "a,x\n"] {
            assert!(read_rows(bad.as_bytes(), &DataType::Long).is_err());
        }

        let input = "a,\nb,\\N\n";
        let rows = read_rows(input.as_bytes(), &DataType::String).unwrap();
        assert_eq!(
            rows,
            vec![
                ("a".to_string(), Value::String(String::new())),
                ("b".to_string(), Value::Null),
            ]
        );
    }

    #[test]
    fn args_parse() {
        let args = Args::try_parse_from([
            "foldkit",
            "--function",
            "max_udaf",
            "-t",
            "bigint",
            "--partitions",
            "4",
            "--merge-stages",
            "1",
        ])
        .unwrap();
        assert_eq!(args.input_type, DataType::Long);
        assert_eq!(args.partitions, 4);
        assert!(Args::try_parse_from(["foldkit"]).is_err());
        assert!(Args::try_parse_from(["foldkit", "--list"]).is_ok());
    }
}
