//! SVG Chart Generator for Training Curves
//!
//! Renders loss and accuracy against epoch index on a single chart, one per
//! phase. The output is a standalone SVG file that can be dropped into a
//! report as-is.

use std::fs;
use std::path::{Path, PathBuf};

/// Chart styling constants
const CHART_WIDTH: f64 = 800.0;
const CHART_HEIGHT: f64 = 500.0;
const MARGIN_TOP: f64 = 60.0;
const MARGIN_RIGHT: f64 = 40.0;
const MARGIN_BOTTOM: f64 = 80.0;
const MARGIN_LEFT: f64 = 80.0;

const COLOR_LOSS: &str = "#3498db";
const COLOR_ACCURACY: &str = "#e74c3c";
const COLOR_GRID: &str = "#ecf0f1";
const COLOR_AXIS: &str = "#2c3e50";
const COLOR_TEXT: &str = "#2c3e50";

/// A named line series on the curve chart
#[derive(Debug, Clone)]
struct Series<'a> {
    name: &'a str,
    values: &'a [f64],
    color: &'a str,
}

/// Render one phase's loss and accuracy curves.
///
/// `epochs` carries the 1-based epoch indices; `losses` and `accuracies` must
/// have the same length. When `persist` is set, the chart is written to
/// `<output_dir>/<title>.svg` and the path is returned.
pub fn draw_curves(
    epochs: &[usize],
    losses: &[f64],
    accuracies: &[f64],
    title: &str,
    output_dir: &Path,
    persist: bool,
) -> std::io::Result<Option<PathBuf>> {
    let svg = render_svg(epochs, losses, accuracies, title);

    if !persist {
        return Ok(None);
    }

    fs::create_dir_all(output_dir)?;
    let path = output_dir.join(format!("{}.svg", title));
    fs::write(&path, svg)?;
    Ok(Some(path))
}

fn render_svg(epochs: &[usize], losses: &[f64], accuracies: &[f64], title: &str) -> String {
    let plot_width = CHART_WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_height = CHART_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;

    let series = [
        Series {
            name: "loss",
            values: losses,
            color: COLOR_LOSS,
        },
        Series {
            name: "accuracy",
            values: accuracies,
            color: COLOR_ACCURACY,
        },
    ];

    let x_min = epochs.first().copied().unwrap_or(1) as f64;
    let x_max = epochs.last().copied().unwrap_or(1) as f64;
    let x_span = (x_max - x_min).max(1.0);

    // Y axis starts at zero; losses can exceed 1 so the top comes from data
    let y_min = 0.0;
    let y_max = series
        .iter()
        .flat_map(|s| s.values.iter().copied())
        .fold(1.0f64, f64::max);

    let mut svg = String::new();

    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {} {}" width="{}" height="{}">"#,
        CHART_WIDTH, CHART_HEIGHT, CHART_WIDTH, CHART_HEIGHT
    ));

    svg.push_str(&format!(
        r#"<rect width="{}" height="{}" fill="white"/>"#,
        CHART_WIDTH, CHART_HEIGHT
    ));

    // Title
    svg.push_str(&format!(
        r#"<text x="{}" y="35" text-anchor="middle" font-family="Arial, sans-serif" font-size="18" font-weight="bold" fill="{}">{}</text>"#,
        CHART_WIDTH / 2.0,
        COLOR_TEXT,
        escape_xml(title)
    ));

    // Grid lines with y-axis labels
    for i in 0..=5 {
        let y = MARGIN_TOP + plot_height - (i as f64 / 5.0) * plot_height;
        let value = y_min + (i as f64 / 5.0) * (y_max - y_min);

        svg.push_str(&format!(
            r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-width="1"/>"#,
            MARGIN_LEFT,
            y,
            MARGIN_LEFT + plot_width,
            y,
            COLOR_GRID
        ));

        svg.push_str(&format!(
            r#"<text x="{}" y="{}" text-anchor="end" font-family="Arial, sans-serif" font-size="12" fill="{}">{:.2}</text>"#,
            MARGIN_LEFT - 10.0,
            y + 4.0,
            COLOR_TEXT,
            value
        ));
    }

    // Axes
    svg.push_str(&format!(
        r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-width="2"/>"#,
        MARGIN_LEFT,
        MARGIN_TOP + plot_height,
        MARGIN_LEFT + plot_width,
        MARGIN_TOP + plot_height,
        COLOR_AXIS
    ));
    svg.push_str(&format!(
        r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-width="2"/>"#,
        MARGIN_LEFT,
        MARGIN_TOP,
        MARGIN_LEFT,
        MARGIN_TOP + plot_height,
        COLOR_AXIS
    ));

    // X-axis label
    svg.push_str(&format!(
        r#"<text x="{}" y="{}" text-anchor="middle" font-family="Arial, sans-serif" font-size="14" fill="{}">epochs</text>"#,
        MARGIN_LEFT + plot_width / 2.0,
        CHART_HEIGHT - 20.0,
        COLOR_TEXT
    ));

    // Plot both series
    for s in &series {
        if s.values.is_empty() {
            continue;
        }

        let mut path = String::new();
        for (i, (&epoch, &value)) in epochs.iter().zip(s.values.iter()).enumerate() {
            let x = MARGIN_LEFT + ((epoch as f64 - x_min) / x_span) * plot_width;
            let y = MARGIN_TOP + plot_height - ((value - y_min) / (y_max - y_min)) * plot_height;

            if i == 0 {
                path.push_str(&format!("M {} {}", x, y));
            } else {
                path.push_str(&format!(" L {} {}", x, y));
            }
        }

        svg.push_str(&format!(
            r#"<path d="{}" fill="none" stroke="{}" stroke-width="3"/>"#,
            path, s.color
        ));

        for (&epoch, &value) in epochs.iter().zip(s.values.iter()) {
            let x = MARGIN_LEFT + ((epoch as f64 - x_min) / x_span) * plot_width;
            let y = MARGIN_TOP + plot_height - ((value - y_min) / (y_max - y_min)) * plot_height;

            svg.push_str(&format!(
                r#"<circle cx="{}" cy="{}" r="4" fill="{}" stroke="white" stroke-width="2"/>"#,
                x, y, s.color
            ));
        }
    }

    // X-axis tick labels
    for &epoch in epochs {
        let x = MARGIN_LEFT + ((epoch as f64 - x_min) / x_span) * plot_width;
        svg.push_str(&format!(
            r#"<text x="{}" y="{}" text-anchor="middle" font-family="Arial, sans-serif" font-size="11" fill="{}">{}</text>"#,
            x,
            MARGIN_TOP + plot_height + 20.0,
            COLOR_TEXT,
            epoch
        ));
    }

    // Legend
    let mut legend_y = MARGIN_TOP + 10.0;
    for s in &series {
        svg.push_str(&format!(
            r#"<rect x="{}" y="{}" width="15" height="15" fill="{}"/>"#,
            CHART_WIDTH - MARGIN_RIGHT - 100.0,
            legend_y,
            s.color
        ));
        svg.push_str(&format!(
            r#"<text x="{}" y="{}" font-family="Arial, sans-serif" font-size="12" fill="{}">{}</text>"#,
            CHART_WIDTH - MARGIN_RIGHT - 80.0,
            legend_y + 12.0,
            COLOR_TEXT,
            escape_xml(s.name)
        ));
        legend_y += 25.0;
    }

    svg.push_str("</svg>");
    svg
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_curve_chart_written_when_persisted() {
        let epochs = vec![1, 2, 3];
        let losses = vec![1.2, 0.8, 0.6];
        let accuracies = vec![0.4, 0.6, 0.7];

        let dir = std::env::temp_dir().join("vggtune_chart_test");
        let path = draw_curves(&epochs, &losses, &accuracies, "Adam Optimizer Train", &dir, true)
            .unwrap()
            .unwrap();

        assert_eq!(path, dir.join("Adam Optimizer Train.svg"));
        assert!(path.exists());
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("Adam Optimizer Train"));
        assert!(contents.contains("accuracy"));
    }

    #[test]
    fn test_no_file_without_persist() {
        let epochs = vec![1, 2];
        let result = draw_curves(
            &epochs,
            &[0.5, 0.4],
            &[0.5, 0.6],
            "ephemeral",
            &PathBuf::from("/nonexistent"),
            false,
        )
        .unwrap();
        assert!(result.is_none());
    }
}
