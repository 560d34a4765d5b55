/// Slide A5/1: command-line front end.
///
/// Runs one simulation, prints the keystream, and optionally writes the
/// full step log as CSV.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use a51_slide::bits::parse_hex;
use a51_slide::export::{trace_rows, write_csv_file};
use a51_slide::hashing::canonical_hash;
use a51_slide::{simulate, SimulationConfig};

/// Simple A5/1 (slide spec)
#[derive(Parser)]
#[command(name = "a51-slide", about = "Simple A5/1 (slide spec)")]
struct Args {
    /// Kc hex (default: BEEF)
    #[arg(long)]
    kc: Option<String>,

    /// FN hex (default: 3A)
    #[arg(long = "fn")]
    frame: Option<String>,

    /// Warm-up cycles (default: 10)
    #[arg(long, allow_negative_numbers = true)]
    warmup: Option<i64>,

    /// Keystream bits to output (default: 8)
    #[arg(long, allow_negative_numbers = true)]
    ks: Option<i64>,

    /// Optional CSV path to save the full step log
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Print step rows to stdout
    #[arg(long)]
    verbose: bool,

    /// JSON configuration file; explicit flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Also print the canonical trace hash
    #[arg(long)]
    hash: bool,
}

impl Args {
    fn to_config(&self) -> Result<SimulationConfig> {
        let mut config = match &self.config {
            Some(path) => SimulationConfig::from_json_file(path)
                .with_context(|| format!("reading config {}", path.display()))?,
            None => SimulationConfig::default(),
        };
        if let Some(kc) = &self.kc {
            config.key = parse_hex("key", kc)?;
        }
        if let Some(frame) = &self.frame {
            config.frame = parse_hex("frame", frame)?;
        }
        if let Some(warmup) = self.warmup {
            config.warmup_cycles = warmup;
        }
        if let Some(ks) = self.ks {
            config.keystream_bits = ks;
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = args.to_config()?;
    let output = simulate(&config)?;

    if args.verbose {
        for row in trace_rows(&output.trace) {
            println!("{}", row);
        }
    }

    println!("Keystream bits: {:?}", output.keystream.bits());
    println!("Keystream as string: {}", output.keystream);
    if args.hash {
        println!("Trace hash: {}", canonical_hash(&output));
    }

    if let Some(path) = &args.csv {
        write_csv_file(&output.trace, path)
            .with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), rows = output.trace.len(), "step log written");
        println!("Wrote step log to: {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("a51-slide").chain(argv.iter().copied())).unwrap()
    }

    #[test]
    fn test_no_flags_gives_defaults() {
        assert_eq!(parse(&[]).to_config().unwrap(), SimulationConfig::default());
    }

    #[test]
    fn test_flags_parse_hex_and_counts() {
        let config = parse(&["--kc", "0x1234", "--fn", "56", "--warmup", "20", "--ks", "32"])
            .to_config()
            .unwrap();
        assert_eq!(config, SimulationConfig::new(0x1234, 0x56, 20, 32));
    }

    #[test]
    fn test_explicit_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        fs::write(&path, r#"{"key": 4660, "frame": 86, "warmup_cycles": 20}"#).unwrap();
        let path_arg = path.to_str().unwrap();

        // file values win over defaults, missing fields keep defaults
        let from_file = parse(&["--config", path_arg]).to_config().unwrap();
        assert_eq!(from_file, SimulationConfig::new(0x1234, 0x56, 20, 8));

        let merged = parse(&["--config", path_arg, "--warmup", "3", "--kc", "FFFF"])
            .to_config()
            .unwrap();
        assert_eq!(merged, SimulationConfig::new(0xFFFF, 0x56, 3, 8));
    }

    #[test]
    fn test_negative_count_passes_through_to_validation() {
        let config = parse(&["--ks", "-1"]).to_config().unwrap();
        assert_eq!(config.keystream_bits, -1);
        assert!(simulate(&config).is_err());
    }

    #[test]
    fn test_bad_hex_flag_is_an_error() {
        let err = parse(&["--fn", "zz"]).to_config().unwrap_err();
        assert!(err.to_string().contains("not a valid hex value"), "{}", err);
    }
}
