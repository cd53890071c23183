//! Enhance chroma tables in parallel
//!
//! Usage:
//!   chroma_enhance [--jobs N] [--json] [--config FILE] [--rotate N] [--out-dir DIR] <file1.csv> ...
//!
//! Notes:
//! - Parallelism is across files. Each table is still enhanced single-threaded.
//! - Output for `<dir>/song.csv` is written to `<out-dir>/song_enhanced.csv`.
//! - Default workers: (available CPU threads - 1), keeping one core free for the system.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chroma_enhance::io::csv_table::{read_chroma_csv_file, write_chroma_csv_file};
use chroma_enhance::{enhance_chroma, ChromaError, EnhanceConfig, EnhancementResult};
use rayon::prelude::*;
use serde::Serialize;

const USAGE: &str = "Usage: chroma_enhance [--jobs N] [--json] [--config FILE] [--rotate N] [--out-dir DIR] <file1.csv> ...\n\
     \n\
     --jobs N       Parallel workers (default: CPU-1)\n\
     --json         Emit one JSON object per line (JSONL)\n\
     --config FILE  JSON enhancement config (missing fields use defaults)\n\
     --rotate N     Rotate pitch classes so row N becomes C (3 for A-referenced tables)\n\
     --out-dir DIR  Output directory (default: output)\n";

fn default_jobs() -> usize {
    let n = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    std::cmp::max(1, n.saturating_sub(1))
}

#[derive(Debug)]
struct Options {
    jobs: usize,
    json: bool,
    config: EnhanceConfig,
    rotate: usize,
    out_dir: PathBuf,
    paths: Vec<PathBuf>,
}

#[derive(Debug)]
enum Command {
    Run(Options),
    Help,
}

fn take_value(args: &mut Vec<String>, flag: &str) -> Result<String, String> {
    if args.is_empty() {
        return Err(format!("{} requires a value", flag));
    }
    Ok(args.remove(0))
}

fn parse_count(value: &str, flag: &str) -> Result<usize, String> {
    value
        .parse::<usize>()
        .map_err(|e| format!("{} expects a non-negative integer, got {:?} ({})", flag, value, e))
}

fn load_config(path: &str) -> Result<EnhanceConfig, String> {
    let text =
        fs::read_to_string(path).map_err(|e| format!("cannot read config {}: {}", path, e))?;
    let config: EnhanceConfig =
        serde_json::from_str(&text).map_err(|e| format!("invalid config {}: {}", path, e))?;
    config
        .validate()
        .map_err(|e| format!("invalid config {}: {}", path, e))?;
    Ok(config)
}

/// Parse command-line arguments (without the program name)
///
/// Any `Err` is a usage error.
fn parse_args(mut args: Vec<String>) -> Result<Command, String> {
    let mut jobs = None;
    let mut json = false;
    let mut config = EnhanceConfig::default();
    let mut rotate = 0;
    let mut out_dir = PathBuf::from("output");
    let mut paths = Vec::new();

    while !args.is_empty() {
        let a = args.remove(0);
        match a.as_str() {
            "--json" => json = true,
            "--jobs" => {
                let v = parse_count(&take_value(&mut args, "--jobs")?, "--jobs")?;
                jobs = Some(std::cmp::max(1, v));
            }
            "--config" => config = load_config(&take_value(&mut args, "--config")?)?,
            "--rotate" => rotate = parse_count(&take_value(&mut args, "--rotate")?, "--rotate")?,
            "--out-dir" => out_dir = PathBuf::from(take_value(&mut args, "--out-dir")?),
            "--help" | "-h" => return Ok(Command::Help),
            _ if a.starts_with('-') && a.len() > 1 => {
                return Err(format!("unknown option {}", a));
            }
            _ => paths.push(PathBuf::from(a)),
        }
    }

    if paths.is_empty() {
        return Err("provide at least one chroma table".to_string());
    }

    Ok(Command::Run(Options {
        jobs: jobs.unwrap_or_else(default_jobs),
        json,
        config,
        rotate,
        out_dir,
        paths,
    }))
}

fn output_path(input: &Path, out_dir: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "chroma".to_string());
    out_dir.join(format!("{}_enhanced.csv", stem))
}

fn process_file(
    input: &Path,
    output: &Path,
    rotate: usize,
    config: &EnhanceConfig,
) -> Result<EnhancementResult, ChromaError> {
    let mut chroma = read_chroma_csv_file(input)?;
    if rotate % 12 != 0 {
        chroma = chroma.rotate(rotate);
    }
    let result = enhance_chroma(&chroma, config)?;
    write_chroma_csv_file(output, &result.chroma)?;
    Ok(result)
}

#[derive(Serialize)]
struct ItemOut {
    file: String,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    frames: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    silent_frames: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dominant: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    processing_time_ms: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let opts = match parse_args(env::args().skip(1).collect()) {
        Ok(Command::Run(opts)) => opts,
        Ok(Command::Help) => {
            eprintln!("{}", USAGE);
            return Ok(());
        }
        Err(msg) => {
            eprintln!("ERROR: {}\n\n{}", msg, USAGE);
            std::process::exit(2);
        }
    };

    eprintln!("Batch: {} files, jobs={}", opts.paths.len(), opts.jobs);

    let t0 = Instant::now();
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(opts.jobs)
        .build()?;

    let outs: Vec<ItemOut> = pool.install(|| {
        opts.paths
            .par_iter()
            .map(|path| {
                let output = output_path(path, &opts.out_dir);
                match process_file(path, &output, opts.rotate, &opts.config) {
                    Ok(result) => ItemOut {
                        file: path.display().to_string(),
                        ok: true,
                        output: Some(output.display().to_string()),
                        frames: Some(result.metadata.num_frames),
                        silent_frames: Some(result.metadata.silent_frames),
                        dominant: result.dominant_pitch_class().map(|p| p.name()),
                        processing_time_ms: Some(result.metadata.processing_time_ms),
                        error: None,
                    },
                    Err(e) => {
                        log::warn!("Enhancement failed for {}: {}", path.display(), e);
                        ItemOut {
                            file: path.display().to_string(),
                            ok: false,
                            output: None,
                            frames: None,
                            silent_frames: None,
                            dominant: None,
                            processing_time_ms: None,
                            error: Some(e.to_string()),
                        }
                    }
                }
            })
            .collect()
    });

    for o in &outs {
        if opts.json {
            println!("{}", serde_json::to_string(o)?);
        } else if o.ok {
            println!(
                "{} -> {} ({} frames, {} silent, dominant {}, {:.2} ms)",
                o.file,
                o.output.as_deref().unwrap_or(""),
                o.frames.unwrap_or(0),
                o.silent_frames.unwrap_or(0),
                o.dominant.unwrap_or("-"),
                o.processing_time_ms.unwrap_or(0.0)
            );
        } else {
            println!(
                "{} FAILED: {}",
                o.file,
                o.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    let failed = outs.iter().filter(|o| !o.ok).count();
    eprintln!(
        "Done: {} ok, {} failed in {:.2} s",
        outs.len() - failed,
        failed,
        t0.elapsed().as_secs_f32()
    );

    if failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_run_options() {
        let cmd = parse_args(args(&[
            "--jobs", "3", "--json", "--rotate", "3", "--out-dir", "out", "a.csv", "b.csv",
        ]))
        .unwrap();
        let Command::Run(opts) = cmd else {
            panic!("expected run command");
        };
        assert_eq!(opts.jobs, 3);
        assert!(opts.json);
        assert_eq!(opts.rotate, 3);
        assert_eq!(opts.out_dir, PathBuf::from("out"));
        assert_eq!(opts.paths, vec![PathBuf::from("a.csv"), PathBuf::from("b.csv")]);
        assert_eq!(opts.config, EnhanceConfig::default());
    }

    #[test]
    fn test_parse_help() {
        assert!(matches!(parse_args(args(&["--help"])), Ok(Command::Help)));
        assert!(matches!(parse_args(args(&["x.csv", "-h"])), Ok(Command::Help)));
    }

    #[test]
    fn test_non_numeric_count_is_usage_error() {
        let err = parse_args(args(&["--jobs", "abc", "x.csv"])).unwrap_err();
        assert!(err.contains("--jobs"));
        let err = parse_args(args(&["--rotate", "-1", "x.csv"])).unwrap_err();
        assert!(err.contains("--rotate"));
    }

    #[test]
    fn test_missing_value_is_usage_error() {
        let err = parse_args(args(&["--rotate"])).unwrap_err();
        assert_eq!(err, "--rotate requires a value");
        assert!(parse_args(args(&["x.csv", "--out-dir"])).is_err());
    }

    #[test]
    fn test_unknown_option_is_usage_error() {
        let err = parse_args(args(&["--bogus", "x.csv"])).unwrap_err();
        assert!(err.contains("--bogus"));
    }

    #[test]
    fn test_no_inputs_is_usage_error() {
        assert!(parse_args(args(&["--json"])).is_err());
        assert!(parse_args(Vec::new()).is_err());
    }

    #[test]
    fn test_bad_config_is_usage_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        let err = parse_args(args(&["--config", missing.to_str().unwrap(), "x.csv"])).unwrap_err();
        assert!(err.contains("cannot read config"));

        let invalid = dir.path().join("invalid.json");
        fs::write(&invalid, r#"{"median_window": 0}"#).unwrap();
        let err = parse_args(args(&["--config", invalid.to_str().unwrap(), "x.csv"])).unwrap_err();
        assert!(err.contains("invalid config"));

        let valid = dir.path().join("valid.json");
        fs::write(&valid, r#"{"median_window": 5}"#).unwrap();
        let Ok(Command::Run(opts)) = parse_args(args(&["--config", valid.to_str().unwrap(), "x.csv"]))
        else {
            panic!("expected run command");
        };
        assert_eq!(opts.config.median_window, 5);
    }
}
