use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::info;
use simd_mandelbrot::{
    kernel, nbody::System, pbm, timing::time_it, Builder, Error, Precision, Strategy,
};

const DEFAULT_DIM: usize = 200;
const DEFAULT_STEPS: usize = 1000;

#[derive(Parser)]
#[command(about = "Benchmark-game Mandelbrot and n-body kernels")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render the Mandelbrot set to a binary PBM.
    Mandelbrot(MandelbrotArgs),
    /// Integrate the five-body Jovian system and report its energy drift.
    Nbody(NbodyArgs),
}

#[derive(Args)]
struct MandelbrotArgs {
    /// Image side length; 0 or less selects the default.
    #[arg(default_value_t = DEFAULT_DIM as i64, allow_negative_numbers = true)]
    dim: i64,

    #[arg(long, default_value_t = kernel::DEFAULT_MAX_ITERATIONS)]
    iterations: usize,

    #[arg(long, value_enum, default_value_t = PrecisionArg::Double)]
    precision: PrecisionArg,

    #[arg(long, value_enum, default_value_t = StrategyArg::Stealing)]
    strategy: StrategyArg,

    /// Worker threads; defaults to the number of CPUs.
    #[arg(long)]
    workers: Option<usize>,

    /// Test for escape after every block, even inside the set.
    #[arg(long)]
    no_coherence: bool,

    #[arg(long, default_value = "mandelbrot.pbm")]
    output: PathBuf,
}

#[derive(Args)]
struct NbodyArgs {
    /// Steps to advance; 0 or less selects the default.
    #[arg(default_value_t = DEFAULT_STEPS as i64, allow_negative_numbers = true)]
    steps: i64,

    #[arg(long, default_value_t = 0.01)]
    step: f64,
}

#[derive(Clone, Copy, ValueEnum)]
enum PrecisionArg {
    Double,
    Single,
}

impl From<PrecisionArg> for Precision {
    fn from(arg: PrecisionArg) -> Self {
        match arg {
            PrecisionArg::Double => Precision::Double,
            PrecisionArg::Single => Precision::Single,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    Sequential,
    Static,
    Stealing,
}

fn main() {
    env_logger::init();

    let result = match Cli::parse().command {
        Command::Mandelbrot(args) => mandelbrot(args),
        Command::Nbody(args) => {
            nbody(args);
            Ok(())
        }
    };

    if let Err(err) = result {
        let code = err.downcast_ref::<Error>().map_or(1, Error::exit_code);
        eprintln!("{:#}", err);
        std::process::exit(code);
    }
}

fn effective_dim(dim: i64) -> usize {
    usize::try_from(dim).ok().filter(|dim| *dim > 0).unwrap_or(DEFAULT_DIM)
}

fn effective_steps(steps: i64) -> usize {
    usize::try_from(steps).ok().filter(|steps| *steps > 0).unwrap_or(DEFAULT_STEPS)
}

fn mandelbrot(args: MandelbrotArgs) -> anyhow::Result<()> {
    let dim = effective_dim(args.dim);
    let workers = args.workers.unwrap_or_else(num_cpus::get);
    let strategy = match args.strategy {
        StrategyArg::Sequential => Strategy::Sequential,
        StrategyArg::Static => Strategy::StaticBands { workers },
        StrategyArg::Stealing => Strategy::WorkStealing { workers },
    };

    let renderer = Builder::new(dim)
        .with_iterations(args.iterations)
        .with_precision(args.precision.into())
        .with_strategy(strategy)
        .with_coherence(!args.no_coherence)
        .create()
        .inspect_err(|err| {
            if let Error::DimensionNotMultiple { batch_width, .. } = err {
                println!("Dimension must be modulo {}", batch_width);
            }
        })?;

    println!("Generating mandelbrot set {}x{}({})", dim, dim, args.iterations);
    let (elapsed, (bitmap, stats)) = time_it("render", || renderer.render_with_stats());
    println!("  it took {} ms", elapsed.as_millis());
    info!(
        "{} batches, {} interior, {} without block checks ({:?})",
        stats.batches, stats.interior_batches, stats.coherent_batches, strategy
    );

    pbm::save(&bitmap, &args.output)
        .with_context(|| format!("writing {}", args.output.display()))?;
    Ok(())
}

fn nbody(args: NbodyArgs) {
    let steps = effective_steps(args.steps);
    let mut system = System::jovian();

    println!("Energy before: {:.9}", system.total_energy());
    let (elapsed, ()) = time_it("advance", || system.advance_n(steps, args.step));
    println!("Energy after : {:.9}", system.total_energy());
    println!(
        "It took {} ms for n={} and step={:.6}",
        elapsed.as_millis(),
        steps,
        args.step
    );
}
