/// Diagnostic tool to verify rows → tree → layout → labels
use std::path::PathBuf;

use anyhow::{bail, Context};
use grovemap_rs::pipeline::render;
use grovemap_rs::query::load_update;
use grovemap_rs::render::text::AverageCharMeasurer;
use grovemap_rs::tree::arena::IdGenerator;
use grovemap_rs::ui::tooltip::build_path;
use grovemap_rs::validate::Requirements;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("grovemap_rs=debug".parse()?),
        )
        .init();

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .context("Usage: debug-layout <update.json>")?;

    println!("=== DIAGNOSTIC: Rows → Tree → Layout Pipeline ===");
    println!("Loading: {}", path.display());

    let doc = load_update(&path).with_context(|| format!("Failed to read {}", path.display()))?;
    println!(
        "\n[1] Update loaded: {} rows, {} dimensions, bounds {}x{}",
        doc.query.rows.len(),
        doc.query.fields.dimension_like.len(),
        doc.bounds.width,
        doc.bounds.height
    );

    let mut ids = IdGenerator::new();
    let frame = match render(
        &doc.query,
        &doc.config,
        doc.bounds,
        &Requirements::default(),
        &mut ids,
        &AverageCharMeasurer::default(),
    ) {
        Ok(frame) => frame,
        Err(e) => bail!("[{}] {}", e.group(), e),
    };

    let tree = &frame.tree;
    let leaves = tree.ids().filter(|&id| tree.get(id).is_leaf()).count();
    println!(
        "\n[2] Tree built: {} nodes ({} leaves), total size {}",
        tree.len(),
        leaves,
        frame.total_size()
    );
    if frame.stats.clamped_negative > 0 || frame.stats.non_numeric > 0 {
        println!(
            "    Coerced values: {} negative, {} non-numeric",
            frame.stats.clamped_negative, frame.stats.non_numeric
        );
    }

    // Show top 10 top-level groups by size
    println!("\n[3] Top 10 top-level groups:");
    let mut top: Vec<_> = tree.children(tree.root).collect();
    top.sort_by(|&a, &b| tree.get(b).size.total_cmp(&tree.get(a).size));
    for (i, id) in top.iter().take(10).enumerate() {
        let node = tree.get(*id);
        println!(
            "    [{}] '{}' - size {} (children={}, metric={:?})",
            i,
            node.display_key(),
            node.size,
            tree.children(*id).count(),
            node.color_metric
        );
    }

    println!("\n[4] Layout computed: {} rectangles", frame.layout.rects.len());

    // Show top 10 largest rectangles
    println!("\n[5] Top 10 largest rectangles by area:");
    let mut sorted_rects = frame.layout.rects.clone();
    sorted_rects.sort_by(|a, b| b.rect.area().total_cmp(&a.rect.area()));
    for (i, placed) in sorted_rects.iter().skip(1).take(10).enumerate() {
        let r = placed.rect;
        println!(
            "    [{}] '{}' - rect: {}x{} ({:.0}px²) at ({}, {}) header={} fill={}",
            i,
            build_path(tree, placed.node),
            r.width,
            r.height,
            r.area(),
            r.x,
            r.y,
            placed.header,
            frame.style(placed.node).fill.to_hex()
        );
    }

    // Leaf coverage of the usable area
    println!("\n[6] Checking for anomalies:");
    let leaf_area: f64 = frame
        .layout
        .rects
        .iter()
        .filter(|lr| tree.get(lr.node).is_leaf())
        .map(|lr| lr.rect.area())
        .sum();
    let usable = frame.layout.rects.first().map(|r| r.rect.area()).unwrap_or(0.0);
    let zero_area = frame.layout.rects.iter().filter(|lr| lr.rect.area() == 0.0).count();
    println!("    Leaf area:   {:.0}px²", leaf_area);
    println!("    Usable area: {:.0}px²", usable);
    if usable > 0.0 {
        println!("    Coverage: {:.1}%", leaf_area / usable * 100.0);
    }
    println!("    Zero-area rects: {}", zero_area);

    let labels = frame.labels.iter().flatten().count();
    let occluded = frame.labels.iter().flatten().filter(|l| l.occluded).count();
    println!("\n[7] Labels: {} placed, {} occluded", labels, occluded);

    Ok(())
}
