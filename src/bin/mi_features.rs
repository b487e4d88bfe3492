use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use mindmotor::{
    run_epoch_extraction, write_features_with_view, ComponentOrder, CovEstimation, Csp, CspConfig,
    DisplayConfig, EpochWindow, PipelineConfig,
};

#[derive(Clone, Copy, ValueEnum)]
enum Order {
    MutualInfo,
    Alternate,
}

#[derive(Clone, Copy, ValueEnum)]
enum CovEst {
    Concat,
    Epoch,
}

#[derive(Parser)]
#[command(name = "mi_features", about = "Motor-imagery CSP features from a .mat recording")]
struct Args {
    /// Subject file with cnt / mrk / nfo variables
    #[arg(long)]
    input: PathBuf,

    /// features.safetensors output path
    #[arg(long)]
    output: PathBuf,

    /// Channel type applied to every channel
    #[arg(long, default_value = "eeg")]
    ch_type: String,

    /// Number of CSP components kept as features
    #[arg(long, default_value_t = 4)]
    n_components: usize,

    /// Covariance estimator: ledoit_wolf, oas, empirical, shrunk, or a number in [0, 1]
    #[arg(long, default_value = "ledoit_wolf")]
    reg: String,

    /// Keep raw variances instead of their natural log
    #[arg(long)]
    no_log: bool,

    /// Epoch start relative to the cue, seconds
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    tmin: f64,

    /// Epoch end relative to the cue, seconds (inclusive)
    #[arg(long, default_value_t = 2.0, allow_negative_numbers = true)]
    tmax: f64,

    /// Remove each channel's epoch mean
    #[arg(long)]
    baseline: bool,

    /// Component ranking
    #[arg(long, value_enum, default_value_t = Order::MutualInfo)]
    order: Order,

    /// Per-class covariance estimation
    #[arg(long, value_enum, default_value_t = CovEst::Concat)]
    cov_est: CovEst,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();

    let cfg = PipelineConfig {
        ch_type: args.ch_type,
        window: EpochWindow { tmin: args.tmin, tmax: args.tmax, baseline: args.baseline },
        csp: CspConfig {
            n_components: args.n_components,
            log: !args.no_log,
            reg: args.reg,
            component_order: match args.order {
                Order::MutualInfo => ComponentOrder::MutualInfo,
                Order::Alternate => ComponentOrder::Alternate,
            },
            cov_est: match args.cov_est {
                CovEst::Concat => CovEstimation::Concat,
                CovEst::Epoch => CovEstimation::Epoch,
            },
        },
        ..PipelineConfig::default()
    };

    let csp = Csp::new(cfg.csp.clone()).context("invalid CSP settings")?;
    let epochs = run_epoch_extraction(&args.input, &cfg)
        .with_context(|| format!("extracting epochs from {}", args.input.display()))?;
    let model = csp.fit_epochs(&epochs).context("fitting CSP")?;
    let features = model.transform(epochs.get_data()).context("computing features")?;
    println!(
        "{} trials × {} features, eigenvalues {:.4?}",
        features.nrows(),
        features.ncols(),
        &model.eigenvalues().to_vec()[..model.n_components()]
    );

    let view = model.pattern_view(&DisplayConfig::bci_competition_iva());
    write_features_with_view(&args.output, &model, &features, epochs.targets(), &view)
        .with_context(|| format!("writing {}", args.output.display()))?;
    println!("Written → {}", args.output.display());

    Ok(())
}
