//! Regional bar chart rendered as SVG.

use claims_common::RegionTotal;
use serde::Serialize;

use crate::error::DashboardError;
use crate::report::format_eur;
use crate::templates::{Templates, REGION_CHART};

const WIDTH: f64 = 640.0;
const HEIGHT: f64 = 360.0;
const MARGIN_LEFT: f64 = 80.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 40.0;
const MARGIN_BOTTOM: f64 = 50.0;
const TICK_COUNT: usize = 4;
/// Fraction of each slot filled by its bar
const BAR_FILL: f64 = 0.6;

pub const CHART_TITLE: &str = "Claim amount by region";

#[derive(Debug, Serialize)]
struct ChartView {
    width: f64,
    height: f64,
    title: &'static str,
    center_x: f64,
    plot_left: f64,
    plot_right: f64,
    plot_bottom: f64,
    tick_label_x: f64,
    axis_label_y: f64,
    y_axis_label: &'static str,
    bars: Vec<Bar>,
    ticks: Vec<Tick>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct Bar {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    label_x: f64,
    label_y: f64,
    region: String,
    total: String,
    claim_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct Tick {
    y: f64,
    label: String,
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn plot_height() -> f64 {
    HEIGHT - MARGIN_TOP - MARGIN_BOTTOM
}

fn layout_bars(totals: &[RegionTotal]) -> Vec<Bar> {
    if totals.is_empty() {
        return Vec::new();
    }

    let max_total = totals.iter().map(|t| t.total_amount).fold(0.0_f64, f64::max);
    let slot = (WIDTH - MARGIN_LEFT - MARGIN_RIGHT) / totals.len() as f64;
    let bar_width = slot * BAR_FILL;
    let bottom = HEIGHT - MARGIN_BOTTOM;

    totals
        .iter()
        .enumerate()
        .map(|(idx, total)| {
            let height = if max_total > 0.0 {
                plot_height() * total.total_amount / max_total
            } else {
                0.0
            };
            let slot_left = MARGIN_LEFT + slot * idx as f64;
            Bar {
                x: round1(slot_left + (slot - bar_width) / 2.0),
                y: round1(bottom - height),
                width: round1(bar_width),
                height: round1(height),
                label_x: round1(slot_left + slot / 2.0),
                label_y: bottom + 18.0,
                region: total.region.clone(),
                total: format_eur(total.total_amount),
                claim_count: total.claim_count,
            }
        })
        .collect()
}

fn layout_ticks(totals: &[RegionTotal]) -> Vec<Tick> {
    let max_total = totals.iter().map(|t| t.total_amount).fold(0.0_f64, f64::max);
    if max_total <= 0.0 {
        return Vec::new();
    }

    let bottom = HEIGHT - MARGIN_BOTTOM;
    (0..=TICK_COUNT)
        .map(|step| {
            let fraction = step as f64 / TICK_COUNT as f64;
            Tick {
                y: round1(bottom - plot_height() * fraction),
                label: format!("{:.0}", max_total * fraction),
            }
        })
        .collect()
}

/// Render one bar per region, in the order given. An empty slice renders a
/// placeholder chart rather than an error.
pub fn render_region_chart(templates: &Templates, totals: &[RegionTotal]) -> Result<String, DashboardError> {
    let view = ChartView {
        width: WIDTH,
        height: HEIGHT,
        title: CHART_TITLE,
        center_x: WIDTH / 2.0,
        plot_left: MARGIN_LEFT,
        plot_right: WIDTH - MARGIN_RIGHT,
        plot_bottom: HEIGHT - MARGIN_BOTTOM,
        tick_label_x: MARGIN_LEFT - 6.0,
        axis_label_y: MARGIN_TOP + plot_height() / 2.0,
        y_axis_label: "Amount (EUR)",
        bars: layout_bars(totals),
        ticks: layout_ticks(totals),
    };
    templates.render_markup(REGION_CHART, &view)
}
