use anyhow::{bail, Context, Result};
use orderscope::{
    build_report,
    geo::{to_feature_collection, Boundaries},
    ingest::load_orders_path,
    report::render::render_text,
    GeoJoin, ReportConfig,
};
use std::{env, fs::File, io::BufWriter, path::PathBuf, process::ExitCode};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> ExitCode {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let mut args = env::args().skip(1);
    let Some(csv_path) = args.next().map(PathBuf::from) else {
        bail!("usage: orderscope <orders.csv> [config.yaml]");
    };

    // ─── 2) configuration ────────────────────────────────────────────
    let config = match args.next() {
        Some(path) => ReportConfig::load(&path).with_context(|| format!("loading config {}", path))?,
        None => ReportConfig::default(),
    };
    info!(grammar = ?config.timestamp_grammar, mode = ?config.monthly_mode, "configured");

    // ─── 3) load upload + optional boundaries ────────────────────────
    let table = load_orders_path(&csv_path, config.preview_rows)
        .with_context(|| format!("reading {}", csv_path.display()))?;
    let boundaries = config
        .geo
        .as_ref()
        .map(|g| Boundaries::from_path(&g.boundaries, g.key_property.as_deref()))
        .transpose()
        .context("loading state boundaries")?;

    // ─── 4) build + print ────────────────────────────────────────────
    let geo = GeoJoin {
        boundaries: boundaries.as_ref(),
        hints: config.geo.as_ref().map(|g| &g.hints),
    };
    let report = build_report(&table, &config, geo)?;
    print!("{}", render_text(&report, &config.currency_symbol));

    // ─── 5) hand-off files for the renderer ──────────────────────────
    if let Some(path) = &config.output.report_json {
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &report)
            .with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), "wrote report json");
    }
    if let Some(path) = &config.output.geojson {
        match (&boundaries, report.states.regions()) {
            (Some(b), Ok(regions)) => {
                let file =
                    File::create(path).with_context(|| format!("creating {}", path.display()))?;
                serde_json::to_writer(BufWriter::new(file), &to_feature_collection(b, regions))
                    .with_context(|| format!("writing {}", path.display()))?;
                info!(path = %path.display(), "wrote choropleth geojson");
            }
            (_, Err(reason)) => warn!(path = %path.display(), reason, "skipping geojson"),
            (None, Ok(_)) => {
                warn!(path = %path.display(), "no boundaries loaded; skipping geojson")
            }
        }
    }

    Ok(())
}
