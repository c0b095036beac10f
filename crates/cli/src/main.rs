use anyhow::{Context as AnyhowContext, Result};
use clap::Parser;
use context_trace::{PathAlias, ProjectRoots, ResolutionReport, TraceConfig, Tracer};
use std::env;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_FILE: &str = "context-trace.toml";

#[derive(Parser)]
#[command(name = "context-trace")]
#[command(about = "Expand seed files with everything they import", long_about = None)]
#[command(version)]
struct Cli {
    /// Seed files as glob patterns (`src/**/*.py`); plain paths are taken as-is
    #[arg(required = true, value_name = "PATTERNS")]
    patterns: Vec<String>,

    /// Project root for non-relative imports, in priority order (repeatable).
    /// Defaults to the detected project root of the working directory.
    #[arg(long = "root", value_name = "DIR")]
    roots: Vec<PathBuf>,

    /// Maximum import depth from the seeds
    #[arg(long)]
    max_depth: Option<usize>,

    /// Stop expanding after this many files have been visited
    #[arg(long)]
    max_files: Option<usize>,

    /// Wall-clock budget in milliseconds
    #[arg(long)]
    time_budget_ms: Option<u64>,

    /// Files scanned in parallel per depth tier
    #[arg(long)]
    concurrency: Option<usize>,

    /// Path alias for bare JS/TS specifiers (repeatable), e.g. `@/=src`
    #[arg(long = "alias", value_name = "PREFIX=TARGET")]
    aliases: Vec<String>,

    /// Config file (default: ./context-trace.toml when present)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print the resolution report as JSON instead of the file list
    #[arg(long)]
    json: bool,

    /// Enable verbose logging and print diagnostics to stderr
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let cwd = env::current_dir().context("Failed to read working directory")?;
    let config = load_config(&cli, &cwd)?;
    let roots = select_roots(&cli, &config, &cwd)?;
    log::debug!(
        "Project roots: {}",
        roots
            .iter()
            .map(|root| root.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let seeds = expand_patterns(&cli.patterns)?;
    let tracer = Tracer::new(config, roots)?;
    let run = tracer.trace(&seeds).await?;
    let report = ResolutionReport::new(&run);

    if cli.json {
        println!("{}", report.to_json_pretty()?);
    } else {
        for path in run.inclusion.paths() {
            println!("{}", path.display());
        }
    }
    if cli.verbose {
        eprintln!("{}", report.to_markdown());
    }
    Ok(())
}

/// Config file values with command-line flags layered on top.
fn load_config(cli: &Cli, cwd: &Path) -> Result<TraceConfig> {
    let default_file = cwd.join(DEFAULT_CONFIG_FILE);
    let mut config = match &cli.config {
        Some(path) => TraceConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None if default_file.is_file() => TraceConfig::load(&default_file)
            .with_context(|| format!("Failed to load config {}", default_file.display()))?,
        None => TraceConfig::default(),
    };

    if cli.max_depth.is_some() {
        config.max_depth = cli.max_depth;
    }
    if cli.max_files.is_some() {
        config.max_files = cli.max_files;
    }
    if cli.time_budget_ms.is_some() {
        config.time_budget_ms = cli.time_budget_ms;
    }
    if let Some(concurrency) = cli.concurrency {
        config.concurrency = concurrency;
    }

    let mut aliases = cli
        .aliases
        .iter()
        .map(|raw| PathAlias::parse(raw))
        .collect::<context_trace::Result<Vec<_>>>()?;
    aliases.append(&mut config.aliases);
    config.aliases = aliases;

    config.validate()?;
    Ok(config)
}

fn select_roots(cli: &Cli, config: &TraceConfig, cwd: &Path) -> Result<ProjectRoots> {
    if !cli.roots.is_empty() {
        return Ok(ProjectRoots::new(&cli.roots)?);
    }
    if !config.roots.is_empty() {
        return Ok(ProjectRoots::new(&config.roots)?);
    }
    Ok(ProjectRoots::detect(cwd)?)
}

fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

/// Expand glob patterns into seed files, keeping pattern order. Literal paths
/// pass through unchanged so a missing file surfaces as a setup error.
fn expand_patterns(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut seeds = Vec::new();
    for pattern in patterns {
        if !is_glob(pattern) {
            seeds.push(PathBuf::from(pattern));
            continue;
        }

        let mut matched = 0usize;
        for entry in glob::glob(pattern).with_context(|| format!("Invalid pattern `{pattern}`"))? {
            let path = entry.with_context(|| format!("Failed to expand `{pattern}`"))?;
            if path.is_file() {
                seeds.push(path);
                matched += 1;
            }
        }
        if matched == 0 {
            log::warn!("Pattern `{pattern}` matched no files");
        }
    }
    Ok(seeds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_is_glob() {
        assert!(is_glob("src/**/*.py"));
        assert!(is_glob("a?.ts"));
        assert!(!is_glob("src/main.rs"));
    }

    #[test]
    fn test_expand_patterns_keeps_literals_and_order() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("b.py"), "").unwrap();
        fs::write(temp.path().join("a.py"), "").unwrap();
        fs::create_dir(temp.path().join("dir.py")).unwrap();

        let literal = temp.path().join("missing.rs").display().to_string();
        let pattern = temp.path().join("*.py").display().to_string();
        let seeds = expand_patterns(&[literal.clone(), pattern]).unwrap();

        assert_eq!(
            seeds,
            vec![
                PathBuf::from(literal),
                temp.path().join("a.py"),
                temp.path().join("b.py"),
            ]
        );
    }

    #[test]
    fn test_cli_overrides_config() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(
            temp.path().join(DEFAULT_CONFIG_FILE),
            "max_depth = 5\nmax_files = 10\n[[aliases]]\nprefix = \"~/\"\ntargets = [\"lib\"]\n",
        )
        .unwrap();

        let cli = Cli::parse_from([
            "context-trace",
            "--max-depth",
            "2",
            "--alias",
            "@/=src",
            "main.py",
        ]);
        let config = load_config(&cli, temp.path()).unwrap();
        assert_eq!(config.max_depth, Some(2));
        assert_eq!(config.max_files, Some(10));
        let prefixes: Vec<_> = config.aliases.iter().map(|a| a.prefix.as_str()).collect();
        assert_eq!(prefixes, vec!["@/", "~/"]);
    }
}
