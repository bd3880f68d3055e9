use anyhow::{Context, Result};
use clap::Parser;
use informe::cli::{Cli, OutputFormat, ReportKind};
use informe::config::{ReferenceParams, ReportConfig};
use informe::render::{ChartRenderer, JsonChartWriter, NullRenderer};
use informe::report::{
    ReportGenerator, SensitivityReport, TestingSetComparison, VariantsReport,
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Everything one run produced, for --format json
#[derive(Debug, Default, Serialize)]
struct RunSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    testing_sets: Option<TestingSetComparison>,
    #[serde(skip_serializing_if = "Option::is_none")]
    variants: Option<VariantsReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sensitivity: Option<SensitivityReport>,
}

fn run<R: ChartRenderer>(args: &Cli, config: &ReportConfig, renderer: &mut R) -> Result<()> {
    let print_text = args.format == OutputFormat::Text;
    let mut generator = ReportGenerator::new(config, renderer, print_text);
    let mut summary = RunSummary::default();

    if matches!(args.report, ReportKind::All | ReportKind::TestingSets) {
        summary.testing_sets = Some(
            generator
                .compare_testing_sets()
                .context("testing-set comparison report failed")?,
        );
    }
    if matches!(args.report, ReportKind::All | ReportKind::Variants) {
        summary.variants = Some(
            generator
                .detector_variants()
                .context("detector variants report failed")?,
        );
    }
    if matches!(args.report, ReportKind::All | ReportKind::Sensitivity) {
        summary.sensitivity = Some(
            generator
                .params_sensitivity()
                .context("parameter sensitivity report failed")?,
        );
    }

    if args.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Cli::parse();

    if args.window == 0 {
        anyhow::bail!("Invalid value for --window: 0 (must be positive)");
    }

    init_tracing(args.debug);

    let mut config = ReportConfig::new(&args.data_dir, &args.detector);
    config.reference = ReferenceParams {
        n_bins: args.ref_n_bins,
        alpha: args.ref_alpha,
        n_obs_per_period: args.ref_n_obs_per_period,
    };
    config.window = args.window;

    match &args.charts_dir {
        Some(dir) => {
            let mut renderer = JsonChartWriter::new(dir)?;
            run(&args, &config, &mut renderer)
        }
        None => {
            let mut renderer = NullRenderer;
            run(&args, &config, &mut renderer)
        }
    }
}
