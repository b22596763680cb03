use clap::{Args as ClapArgs, Parser, Subcommand};
use std::fs::File;
#[cfg(test)]
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use uniques_sweep_bench::logging;
use uniques_sweep_bench::plan::{build_plan, PlanParams};
use uniques_sweep_bench::schema::{self, PlanReport, RunMeta, SCHEMA_VERSION};
use uniques_sweep_bench::PlanFormat;

/// Sweep parameters. Each flag can also come from the environment, so a
/// harness script can export `LG_MAX_U=20` instead of passing flags.
#[derive(ClapArgs, Debug)]
struct ParamArgs {
    /// log2 of the first input size.
    #[arg(long, env = "LG_MIN_U", default_value_t = PlanParams::default().lg_min_u)]
    lg_min_u: u32,

    /// log2 of the input size that ends the sweep.
    #[arg(long, env = "LG_MAX_U", default_value_t = PlanParams::default().lg_max_u)]
    lg_max_u: u32,

    /// Input sizes sampled per doubling.
    #[arg(long, env = "U_PPO", default_value_t = PlanParams::default().u_ppo)]
    u_ppo: u32,

    /// log2 of the size at and below which trials stay at their maximum.
    #[arg(long, env = "LG_MIN_BP_U", default_value_t = PlanParams::default().lg_min_bp_u)]
    lg_min_bp_u: u32,

    /// log2 of the size at and above which trials stay at their minimum.
    #[arg(long, env = "LG_MAX_BP_U", default_value_t = PlanParams::default().lg_max_bp_u)]
    lg_max_bp_u: u32,

    #[arg(long, env = "LG_MIN_T", default_value_t = PlanParams::default().lg_min_t)]
    lg_min_t: u32,

    #[arg(long, env = "LG_MAX_T", default_value_t = PlanParams::default().lg_max_t)]
    lg_max_t: u32,

    /// First input counter value handed to the executor.
    #[arg(long, env = "V_IN", default_value_t = 0)]
    start_offset: u64,

    /// Load all parameters from a JSON file instead; missing keys take defaults.
    #[arg(long, value_name = "FILE")]
    params: Option<PathBuf>,
}

impl ParamArgs {
    fn resolve(&self) -> io::Result<PlanParams> {
        if let Some(path) = &self.params {
            return PlanParams::from_json_file(path).map_err(io::Error::other);
        }
        Ok(PlanParams {
            lg_min_u: self.lg_min_u,
            lg_max_u: self.lg_max_u,
            u_ppo: self.u_ppo,
            lg_min_bp_u: self.lg_min_bp_u,
            lg_max_bp_u: self.lg_max_bp_u,
            lg_min_t: self.lg_min_t,
            lg_max_t: self.lg_max_t,
            start_offset: self.start_offset,
        })
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the iteration plan and write it out.
    Plan {
        #[command(flatten)]
        params: ParamArgs,

        #[arg(long, value_enum, default_value_t = PlanFormat::Json)]
        format: PlanFormat,
    },

    /// Print the trial count the policy assigns to one input size.
    Trials {
        #[command(flatten)]
        params: ParamArgs,

        #[arg(long, short = 'u')]
        uniques: u64,
    },

    /// Print the default sweep parameters as JSON.
    Defaults,
}

#[derive(Parser, Debug)]
#[command(name = "uniques-sweep-bench")]
#[command(about = "Iteration plan generator for input-size sweeps (JSON or TSV output)")]
struct Args {
    /// Where to write the output. If omitted, prints to stdout.
    #[arg(long, global = true)]
    out: Option<PathBuf>,

    /// Default log level for stderr logging; RUST_LOG overrides it.
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    cmd: Command,
}

fn now_unix_stamp() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    format!("unix:{secs}")
}

fn git_sha_short() -> Option<String> {
    // Best-effort: read from environment set by CI/build scripts.
    std::env::var("GIT_SHA")
        .ok()
        .or_else(|| std::env::var("GITHUB_SHA").ok())
        .map(|s| s.chars().take(12).collect())
}

/// Produce the full command output in memory; nothing is emitted on error.
fn render(cmd: &Command) -> io::Result<Vec<u8>> {
    let mut body = Vec::new();

    match cmd {
        Command::Plan { params, format } => {
            let params = params.resolve()?;
            let plan = build_plan(&params).map_err(io::Error::other)?;

            match format {
                PlanFormat::Json => {
                    let report = PlanReport::new(
                        RunMeta {
                            schema_version: SCHEMA_VERSION,
                            bench_version: env!("CARGO_PKG_VERSION").to_string(),
                            timestamp_utc: now_unix_stamp(),
                            git_sha: git_sha_short(),
                        },
                        params,
                        &plan,
                    );
                    let json = serde_json::to_string_pretty(&report).map_err(io::Error::other)?;
                    writeln!(body, "{json}")?;
                }
                PlanFormat::Tsv => {
                    schema::write_tsv(&plan, &mut body).map_err(io::Error::other)?;
                }
            }
            info!(steps = plan.len(), ?format, "plan rendered");
        }
        Command::Trials { params, uniques } => {
            let policy = params
                .resolve()?
                .trial_policy()
                .map_err(io::Error::other)?;
            writeln!(body, "{}", policy.trials_for(*uniques))?;
        }
        Command::Defaults => {
            let json =
                serde_json::to_string_pretty(&PlanParams::default()).map_err(io::Error::other)?;
            writeln!(body, "{json}")?;
        }
    }

    Ok(body)
}

fn emit(out: Option<&Path>, body: &[u8]) -> io::Result<()> {
    match out {
        Some(path) => {
            let mut writer = BufWriter::new(File::create(path)?);
            writer.write_all(body)?;
            writer.flush()
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(body)?;
            stdout.flush()
        }
    }
}

fn run(args: &Args) -> io::Result<()> {
    let body = render(&args.cmd)?;
    emit(args.out.as_deref(), &body)
}

fn main() -> io::Result<()> {
    let args = Args::parse();
    logging::init(&args.log_level).map_err(io::Error::other)?;
    run(&args)
}
