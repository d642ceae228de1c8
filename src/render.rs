use std::fmt::Write;

use crate::view::{DashboardView, MapPanel};

const BAR_WIDTH: usize = 40;

/// Plain-text version of the dashboard, for the `report` command.
pub fn render_text(view: &DashboardView) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    write_report(&mut out, view)?;
    Ok(out)
}

fn write_report(out: &mut String, view: &DashboardView) -> std::fmt::Result {
    writeln!(out, "{}", view.country)?;
    let profile = [
        view.profile.cca3.as_deref(),
        view.profile.capital.as_deref(),
        view.profile.continent.as_deref(),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>();
    if !profile.is_empty() {
        writeln!(out, "{}", profile.join(" | "))?;
    }
    writeln!(out)?;

    writeln!(out, "== {} ==", view.population.title)?;
    let points = &view.population.points;
    if points.is_empty() {
        writeln!(out, "(no years selected)")?;
    }
    let max = points.iter().map(|p| p.population).max().unwrap_or(0);
    for point in points {
        writeln!(
            out,
            "{}  {:>13}  {}",
            point.year,
            point.population,
            bar(point.population, max)
        )?;
    }
    writeln!(out)?;

    writeln!(out, "== Country Statistics ==")?;
    writeln!(out, "{}", view.stats)?;
    writeln!(out)?;

    writeln!(out, "== Country Map ==")?;
    match &view.map {
        MapPanel::Available { bounds, .. } => writeln!(
            out,
            "lat {} .. {}, lon {} .. {}",
            bounds.min_lat, bounds.max_lat, bounds.min_lon, bounds.max_lon
        )?,
        MapPanel::Unavailable { notice } => writeln!(out, "{notice}")?,
    }

    Ok(())
}

fn bar(value: u64, max: u64) -> String {
    if max == 0 {
        return String::new();
    }
    let len = ((value as f64 / max as f64) * BAR_WIDTH as f64).round() as usize;
    "#".repeat(len.max(usize::from(value > 0)))
}
