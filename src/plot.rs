use plotters::prelude::*;

use crate::args::DynError;

const PLOT_FONT_SCALE: f64 = 1.2;

fn scaled_font_size(base: i32) -> i32 {
    ((base as f64) * PLOT_FONT_SCALE).round() as i32
}

fn scaled_area_size(base: i32) -> i32 {
    ((base as f64) * PLOT_FONT_SCALE).round() as i32
}

// Blue (low) to red (high) through the HSL hue circle.
fn heat_colour(norm: f64) -> HSLColor {
    let t = norm.clamp(0.0, 1.0);
    HSLColor(0.66 * (1.0 - t), 0.9, 0.3 + 0.35 * t)
}

fn cell_edges(axis: &[f64]) -> Vec<f64> {
    if axis.len() == 1 {
        return vec![axis[0] - 0.5, axis[0] + 0.5];
    }
    let mut edges = Vec::with_capacity(axis.len() + 1);
    edges.push(axis[0] - (axis[1] - axis[0]) / 2.0);
    for pair in axis.windows(2) {
        edges.push((pair[0] + pair[1]) / 2.0);
    }
    let n = axis.len();
    edges.push(axis[n - 1] + (axis[n - 1] - axis[n - 2]) / 2.0);
    edges
}

fn edge_range(edges: &[f64]) -> (f64, f64) {
    let first = edges[0];
    let last = edges[edges.len() - 1];
    (first.min(last), first.max(last))
}

/// Heatmap of `values[ix][iy]` over the `x_vals` by `y_vals` plane.
pub fn plot_slice_heatmap(
    x_vals: &[f64],
    y_vals: &[f64],
    values: &[Vec<f64>],
    title: &str,
    filename: &str,
    x_label: &str,
    y_label: &str,
) -> Result<(), DynError> {
    if x_vals.is_empty() || y_vals.is_empty() {
        return Err("No data points to plot".into());
    }
    if values.len() != x_vals.len() || values.iter().any(|col| col.len() != y_vals.len()) {
        return Err("Slice dimensions do not match axis lengths".into());
    }

    let x_edges = cell_edges(x_vals);
    let y_edges = cell_edges(y_vals);
    let (x_lo, x_hi) = edge_range(&x_edges);
    let (y_lo, y_hi) = edge_range(&y_edges);

    let min_val = values.iter().flatten().cloned().fold(f64::INFINITY, f64::min);
    let max_val = values.iter().flatten().cloned().fold(f64::NEG_INFINITY, f64::max);
    let span = if max_val > min_val { max_val - min_val } else { 1.0 };

    let root = BitMapBackend::new(filename, (1024, 960)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", scaled_font_size(24)).into_font())
        .margin(10)
        .x_label_area_size(scaled_area_size(40))
        .y_label_area_size(scaled_area_size(60))
        .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)?;

    chart
        .configure_mesh()
        .x_desc(x_label)
        .y_desc(y_label)
        .label_style(("sans-serif", scaled_font_size(20)).into_font())
        .axis_desc_style(("sans-serif", scaled_font_size(24)).into_font())
        .disable_mesh()
        .draw()?;

    chart.draw_series(values.iter().enumerate().flat_map(|(ix, column)| {
        let x_edges = &x_edges;
        let y_edges = &y_edges;
        column.iter().enumerate().map(move |(iy, &value)| {
            Rectangle::new(
                [(x_edges[ix], y_edges[iy]), (x_edges[ix + 1], y_edges[iy + 1])],
                heat_colour((value - min_val) / span).filled(),
            )
        })
    }))?;

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::cell_edges;

    #[test]
    fn cell_edges_bracket_every_sample() {
        assert_eq!(cell_edges(&[0.0, 1.0, 3.0]), vec![-0.5, 0.5, 2.0, 4.0]);
        assert_eq!(cell_edges(&[2.0]), vec![1.5, 2.5]);
    }
}
