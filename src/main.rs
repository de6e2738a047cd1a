use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use serde_json::json;

use grovemap_rs::app::Visualization;
use grovemap_rs::query::load_update;
use grovemap_rs::ui::drill::RecordedDrills;
use grovemap_rs::ui::input::Activation;
use grovemap_rs::validate::{ErrorSink, VisError};

/// Reports validation errors on stderr.
#[derive(Default)]
struct StderrErrors {
    reported: usize,
}

impl ErrorSink for StderrErrors {
    fn add_error(&mut self, error: &VisError) {
        self.reported += 1;
        eprintln!("[{}] {}: {}", error.group, error.title, error.message);
    }

    fn clear_errors(&mut self, _group: Option<&str>) {}
}

struct Args {
    update: PathBuf,
    activate: Option<(f64, f64)>,
}

fn parse_args() -> Result<Args> {
    let mut args = std::env::args().skip(1);
    let mut update = None;
    let mut activate = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--activate" => {
                let point = args.next().context("--activate needs a point like 120,45")?;
                let (x, y) = point
                    .split_once(',')
                    .with_context(|| format!("Expected x,y but got '{}'", point))?;
                activate = Some((
                    x.trim().parse::<f64>().context("Bad x coordinate")?,
                    y.trim().parse::<f64>().context("Bad y coordinate")?,
                ));
            }
            _ if update.is_none() => update = Some(PathBuf::from(arg)),
            _ => bail!("Unexpected argument '{}'", arg),
        }
    }

    let update = update.context("Usage: grovemap <update.json> [--activate x,y]")?;
    Ok(Args { update, activate })
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("grovemap_rs=info".parse()?),
        )
        .init();

    let args = parse_args()?;
    let doc = load_update(&args.update)
        .with_context(|| format!("Failed to read {}", args.update.display()))?;

    let mut vis = Visualization::new();
    let mut errors = StderrErrors::default();
    let nodes = match vis.update(doc.query, &doc.config, doc.bounds, &mut errors) {
        Some(frame) => frame.nodes(),
        None => bail!("Update rejected with {} error(s)", errors.reported),
    };

    let mut output = json!({ "nodes": nodes });
    if let Some((x, y)) = args.activate {
        let mut drills = RecordedDrills::default();
        let link = vis.activate(Activation::Pointer { x, y }, &mut drills);
        if link.is_none() {
            tracing::info!("Nothing to drill into at ({}, {})", x, y);
        }
        output["drill"] = json!(link);
    }

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
