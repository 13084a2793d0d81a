//! `popsim`: the command-line driver for the population-protocol
//! simulators. Parses a delta/urn selection plus a step and snapshot budget
//! from argv, reads the protocol description from stdin, runs `-t`
//! independent trials in parallel, and prints `nsnap + 1` whitespace-
//! separated configuration rows per trial to stdout.

mod protocol;

use std::io::{self, Write};
use std::process::exit;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{ensure, Context, Result};
use clap::{Parser, ValueEnum};
use env_logger::{Builder, Env, Target};
use indicatif::{ParallelProgressIterator, ProgressStyle};
use log::{error, info};
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

use popsim_core::{
    AliasUrn, ArrayUrn, BatchedSimulator, BstUrn, LinearUrn, MultiBatchedSimulator,
    SequentialSimulator, SimError, VecSink,
};
use popsim_rng::Mt19937_64;
use popsim_urn::{ColorId, Urn};

use protocol::Protocol;

/// The four bare urn flavors plus the two batched simulator pairings that
/// make up the `sim` positional's value set.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lower")]
enum SimKind {
    Array,
    Linear,
    Bst,
    Alias,
    Batch,
    Mbatch,
}

/// The two interchangeable representations of the transition function delta.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default, ValueEnum)]
#[value(rename_all = "lower")]
pub enum DeltaRepr {
    #[default]
    Array,
    Map,
}

/// Typical alias-urn rebuild bounds ("a typical choice is alpha=0.8,
/// beta=1.5"); the CLI surface has no flag to tune these, keeping the
/// argument set fixed.
const ALIAS_ALPHA: f64 = 0.8;
const ALIAS_BETA: f64 = 1.5;

#[derive(Parser)]
#[command(
    name = "popsim",
    about = "Simulate a population protocol over T pairwise interactions",
    version
)]
struct Cli {
    /// Print section prompts and info-level progress.
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    /// Representation of the transition function delta.
    #[arg(short = 'd', long = "delta", value_enum, default_value = "array")]
    delta: DeltaRepr,

    /// Number of equidistant snapshots to emit (excluding the initial row,
    /// including the final one).
    #[arg(short = 's', long = "nsnap", default_value_t = 1)]
    nsnap: u64,

    /// Number of independent trials to run.
    #[arg(short = 't', long = "ntrials", default_value_t = 1)]
    ntrials: u64,

    /// Urn / simulator pairing to drive the protocol with.
    sim: SimKind,

    /// Interaction budget T.
    nsteps: u64,
}

fn main() {
    let cli = Cli::parse();

    let mut builder = Builder::from_env(Env::default().default_filter_or(if cli.verbose {
        "info"
    } else {
        "warn"
    }));
    builder.target(Target::Stderr);
    builder.init();

    if let Err(e) = do_main(cli) {
        error!("error: {e}");
        exit(1);
    }
}

fn do_main(cli: Cli) -> Result<()> {
    ensure!(cli.nsteps >= 1, "nsteps must be >= 1, got {}", cli.nsteps);
    ensure!(
        cli.nsteps <= u64::MAX - 1,
        "nsteps must be <= 2^64-2, got {}",
        cli.nsteps
    );
    ensure!(
        cli.ntrials >= 1 && cli.ntrials <= u64::MAX - 1,
        "ntrials must be in [1, 2^64-2], got {}",
        cli.ntrials
    );
    ensure!(
        cli.nsnap >= 1 && cli.nsnap <= cli.nsteps,
        "nsnap must be in [1, nsteps ({})], got {}",
        cli.nsteps,
        cli.nsnap
    );

    if cli.verbose {
        info!(
            "reading protocol description (nstates ndist ntrans, then the distribution and \
             transition lines) from stdin"
        );
    }
    let protocol = Protocol::read(io::stdin().lock(), cli.nsnap, cli.delta)
        .context("parsing protocol description from stdin")?;
    if cli.verbose {
        info!(
            "parsed {} states, population {}, running {:?} x{} trial(s) for {} steps with {} \
             snapshot(s)",
            protocol.nstates,
            protocol.initial.iter().sum::<u64>(),
            cli.sim,
            cli.ntrials,
            cli.nsteps,
            cli.nsnap
        );
    }

    let base_seed = process_seed();
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} trials")
        .unwrap();

    let trial_indices: Vec<u64> = (0..cli.ntrials).collect();
    let results: Vec<Result<Vec<Vec<u64>>, SimError>> = if cli.verbose {
        trial_indices
            .par_iter()
            .progress_with_style(style)
            .map(|&t| run_trial(&protocol, &cli, mix_seed(base_seed, t)))
            .collect()
    } else {
        trial_indices
            .par_iter()
            .map(|&t| run_trial(&protocol, &cli, mix_seed(base_seed, t)))
            .collect()
    };

    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    for (t, result) in results.into_iter().enumerate() {
        let rows = result.with_context(|| format!("trial {t} failed"))?;
        if t > 0 {
            writeln!(out)?;
        }
        for row in &rows {
            let line = row
                .iter()
                .map(u64::to_string)
                .collect::<Vec<_>>()
                .join(" ");
            writeln!(out, "{line}")?;
        }
    }
    out.flush()?;
    Ok(())
}

/// A process-wide base seed, mixed with each trial's index below. The CLI's
/// argument set has no `-seed` flag, so every invocation draws a fresh base
/// seed from the system clock; determinism is a property of the core
/// simulators taking an explicit seed, exercised directly by their own unit
/// tests rather than through this CLI.
fn process_seed() -> u64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);
    Mt19937_64::new(nanos).rand()
}

/// Derive trial `t`'s seed from the shared run seed, keeping trials on
/// disjoint streams: each trial spins up its own [`Mt19937_64`] stream from
/// a distinct `(base, t)` pair, so the result is independent of how many
/// threads actually run the trials.
fn mix_seed(base: u64, t: u64) -> u64 {
    Mt19937_64::new(base ^ t.wrapping_mul(0x9E37_79B9_7F4A_7C15)).rand()
}

/// Populate a freshly-constructed urn with the initial distribution.
fn seed_initial(urn: &mut impl Urn, initial: &[u64]) -> Result<(), SimError> {
    for (c, &q) in initial.iter().enumerate() {
        if q > 0 {
            urn.cinsert(c as ColorId, q)?;
        }
    }
    Ok(())
}

/// Run one trial, returning the `nsnap + 1` snapshot rows as plain `Vec<u64>`
/// configuration vectors.
fn run_trial(protocol: &Protocol, cli: &Cli, seed: u64) -> Result<Vec<Vec<u64>>, SimError> {
    let delta = protocol.delta.as_ref();
    let nstates = protocol.nstates;
    let nsteps = cli.nsteps;
    let nsnap = cli.nsnap;

    let mut sink = VecSink::default();
    match cli.sim {
        SimKind::Array => {
            let mut urn = ArrayUrn::new(seed, nstates)?;
            seed_initial(&mut urn, &protocol.initial)?;
            SequentialSimulator::new(urn).run(delta, nsteps, nsnap, &mut sink)?;
        }
        SimKind::Linear => {
            let mut urn = LinearUrn::new(seed, nstates)?;
            seed_initial(&mut urn, &protocol.initial)?;
            SequentialSimulator::new(urn).run(delta, nsteps, nsnap, &mut sink)?;
        }
        SimKind::Bst => {
            let mut urn = BstUrn::new(seed, nstates)?;
            seed_initial(&mut urn, &protocol.initial)?;
            SequentialSimulator::new(urn).run(delta, nsteps, nsnap, &mut sink)?;
        }
        SimKind::Alias => {
            let mut urn = AliasUrn::new(seed, nstates, ALIAS_ALPHA, ALIAS_BETA)?;
            seed_initial(&mut urn, &protocol.initial)?;
            SequentialSimulator::new(urn).run(delta, nsteps, nsnap, &mut sink)?;
        }
        SimKind::Batch => {
            let mut u = LinearUrn::new(seed, nstates)?;
            seed_initial(&mut u, &protocol.initial)?;
            let un = LinearUrn::new(seed ^ 0xD1B5_4A32_D192_ED03, nstates)?;
            BatchedSimulator::new(u, un, seed)?.run(delta, nsteps, nsnap, &mut sink)?;
        }
        SimKind::Mbatch => {
            let mut u = BstUrn::new(seed, nstates)?;
            seed_initial(&mut u, &protocol.initial)?;
            let un = BstUrn::new(seed ^ 0xD1B5_4A32_D192_ED03, nstates)?;
            MultiBatchedSimulator::new(u, un, seed)?.run(delta, nsteps, nsnap, &mut sink)?;
        }
    }

    Ok(sink.rows.into_iter().map(|d| d.to_vec()).collect())
}
