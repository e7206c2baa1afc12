use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use env_logger::Env;
use pretraining_data::prepare::inspect_token_file;
use pretraining_data::{
    CharDatasetConfig, DatasetConfig, Newlines, OutputConfig, PrepareConfig, PrepareReport,
    SubwordDatasetConfig,
};
use serde_json::{Number, Value};
use tokenizer::SubwordCfg;

fn main() {
    if let Err(err) = run() {
        eprintln!("preparation failed: {err:#}");
        std::process::exit(1);
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Build u16 token files from text corpora", long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Decrease verbosity (-q, -qq)
    #[arg(short = 'q', long, global = true, action = ArgAction::Count)]
    quiet: u8,

    /// Print the run report as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a preparation described by a TOML or JSON config file
    Run(RunArgs),
    /// Character-level preparation of a single corpus
    Char(CharArgs),
    /// Subword preparation of pre-partitioned corpora
    Subword(SubwordArgs),
    /// Summarize a token file, decoding a preview through a manifest
    Inspect(InspectArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    #[arg(short, long, value_name = "PATH", help = "Path to preparation config file")]
    config: PathBuf,

    #[arg(
        long = "override",
        value_name = "KEY=VALUE",
        help = "Override configuration value using dot-separated paths"
    )]
    overrides: Vec<OverrideArg>,
}

#[derive(Args, Debug)]
struct CharArgs {
    /// Corpus to tokenize
    #[arg(short, long, value_name = "PATH")]
    input: PathBuf,

    /// Directory receiving train.bin, val.bin and meta.json
    #[arg(short, long, value_name = "DIR")]
    out_dir: PathBuf,

    /// Leading share of the corpus used for training
    #[arg(long, value_name = "FRACTION", default_value_t = 0.9)]
    train_fraction: f64,

    /// Keep `\r` line endings instead of folding them into `\n`
    #[arg(long)]
    keep_carriage_returns: bool,
}

#[derive(Args, Debug)]
struct SubwordArgs {
    #[arg(long, value_name = "PATH")]
    train: PathBuf,

    #[arg(long, value_name = "PATH")]
    validation: PathBuf,

    /// Only counted towards the reported corpus size
    #[arg(long, value_name = "PATH")]
    test: Option<PathBuf>,

    /// Bundled tokenizer.json
    #[arg(long, value_name = "PATH", conflicts_with_all = ["vocab_json", "merges_txt"])]
    tokenizer_json: Option<PathBuf>,

    #[arg(long, value_name = "PATH", requires = "merges_txt")]
    vocab_json: Option<PathBuf>,

    #[arg(long, value_name = "PATH", requires = "vocab_json")]
    merges_txt: Option<PathBuf>,

    /// Directory receiving train.bin and val.bin
    #[arg(short, long, value_name = "DIR")]
    out_dir: PathBuf,

    /// Skip the encode/decode check on the head of the training corpus
    #[arg(long)]
    no_verify: bool,

    /// Keep `\r` line endings instead of folding them into `\n`
    #[arg(long)]
    keep_carriage_returns: bool,
}

#[derive(Args, Debug)]
struct InspectArgs {
    /// Token file to read
    bin: PathBuf,

    /// Character manifest used to decode the preview
    #[arg(short, long, value_name = "PATH")]
    manifest: Option<PathBuf>,

    /// Number of leading tokens to decode
    #[arg(long, value_name = "COUNT", default_value_t = 64)]
    preview: usize,
}

#[derive(Debug, Clone)]
struct OverrideArg {
    path: String,
    value: String,
}

impl FromStr for OverrideArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (path, value) = s
            .split_once('=')
            .ok_or_else(|| "override must be in the form key=value".to_string())?;
        if path.trim().is_empty() {
            return Err("override key must not be empty".into());
        }
        Ok(Self {
            path: path.trim().to_string(),
            value: value.trim().to_string(),
        })
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let config = match cli.command {
        Commands::Run(args) => {
            let mut config = PrepareConfig::from_path(&args.config).with_context(|| {
                format!("failed to load config from {}", args.config.display())
            })?;
            if !args.overrides.is_empty() {
                config = apply_overrides(config, &args.overrides)?;
            }
            config
        }
        Commands::Char(args) => PrepareConfig {
            output: OutputConfig::new(args.out_dir),
            dataset: DatasetConfig::Char(CharDatasetConfig {
                input: args.input,
                train_fraction: args.train_fraction,
                newlines: newlines(args.keep_carriage_returns),
            }),
        },
        Commands::Subword(args) => {
            let tokenizer = match (args.tokenizer_json, args.vocab_json, args.merges_txt) {
                (Some(json), _, _) => SubwordCfg::from_tokenizer_json(json),
                (None, Some(vocab), Some(merges)) => SubwordCfg::from_vocab_merges(vocab, merges),
                _ => bail!("pass --tokenizer-json or both --vocab-json and --merges-txt"),
            };
            PrepareConfig {
                output: OutputConfig::new(args.out_dir),
                dataset: DatasetConfig::Subword(SubwordDatasetConfig {
                    tokenizer,
                    train: args.train,
                    validation: args.validation,
                    test: args.test,
                    verify_roundtrip: !args.no_verify,
                    roundtrip_sample_chars: 1024,
                    newlines: newlines(args.keep_carriage_returns),
                }),
            }
        }
        Commands::Inspect(args) => {
            let inspection = inspect_token_file(&args.bin, args.manifest.as_deref(), args.preview)
                .with_context(|| format!("failed to inspect {}", args.bin.display()))?;
            println!("tokens: {}", inspection.tokens);
            match inspection.max_id {
                Some(max_id) => println!("max id: {max_id}"),
                None => println!("max id: -"),
            }
            if let Some(preview) = inspection.preview {
                println!("preview: {preview:?}");
            }
            return Ok(());
        }
    };

    config.validate()?;
    let report = pretraining_data::run(&config)?;
    print_report(&report, cli.json)
}

fn newlines(keep_carriage_returns: bool) -> Newlines {
    if keep_carriage_returns {
        Newlines::Keep
    } else {
        Newlines::Universal
    }
}

fn init_logging(verbose: u8, quiet: u8) {
    use log::LevelFilter;

    let level = match (verbose, quiet) {
        (_, 1) => LevelFilter::Warn,
        (_, q) if q > 1 => LevelFilter::Error,
        (0, _) => LevelFilter::Info,
        (1, _) => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("info"));
    builder.format_timestamp_millis();
    builder.filter_level(level);
    let _ = builder.try_init();
}

fn print_report(report: &PrepareReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!("corpus characters: {}", report.corpus_chars);
    println!("vocab size: {}", report.vocab_size);
    for segment in [&report.train, &report.validation] {
        println!(
            "{}: {} tokens, {} bytes -> {}",
            segment.label,
            segment.tokens,
            segment.bytes,
            segment.path.display()
        );
    }
    if let Some(manifest) = &report.manifest {
        println!("manifest: {}", manifest.display());
    }
    Ok(())
}

fn apply_overrides(config: PrepareConfig, overrides: &[OverrideArg]) -> Result<PrepareConfig> {
    let mut value =
        serde_json::to_value(config).context("failed to serialize config for overrides")?;

    for override_arg in overrides {
        let new_value = parse_override_value(&override_arg.value);
        set_value_at_path(&mut value, &override_arg.path, new_value)?;
    }

    serde_json::from_value(value).context("failed to deserialize config after overrides")
}

fn parse_override_value(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    if trimmed.eq_ignore_ascii_case("null") {
        return Value::Null;
    }
    if let Ok(int_val) = trimmed.parse::<i64>() {
        return Value::Number(Number::from(int_val));
    }
    if let Ok(float_val) = trimmed.parse::<f64>() {
        if let Some(number) = Number::from_f64(float_val) {
            return Value::Number(number);
        }
    }
    Value::String(trimmed.to_string())
}

/// Sets a dotted path such as `dataset.train_fraction`, creating objects for
/// missing intermediate keys.
fn set_value_at_path(root: &mut Value, path: &str, new_value: Value) -> Result<()> {
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|segment| segment.is_empty()) {
        bail!("override path '{path}' has an empty segment");
    }

    let (last, parents) = segments
        .split_last()
        .ok_or_else(|| anyhow!("override path must not be empty"))?;

    let mut current = root;
    for segment in parents {
        if current.is_null() {
            *current = Value::Object(serde_json::Map::new());
        }
        let map = current.as_object_mut().ok_or_else(|| {
            anyhow!("override path segment '{segment}' points to non-object value")
        })?;
        current = map.entry(segment.to_string()).or_insert(Value::Null);
    }

    if current.is_null() {
        *current = Value::Object(serde_json::Map::new());
    }
    let map = current
        .as_object_mut()
        .ok_or_else(|| anyhow!("override path '{path}' points into a non-object value"))?;
    map.insert(last.to_string(), new_value);
    Ok(())
}
