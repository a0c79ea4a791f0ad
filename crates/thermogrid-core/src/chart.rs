//! Chart snapshots: projected series rendered to an in-memory PNG.

use image::ImageEncoder;
use image::codecs::png::PngEncoder;
use plotters::prelude::*;
use thermogrid_engine::plot::PlotData;

use crate::error::{Result, ThermogridError};

const GRID_LINES: usize = 5;

/// Render `data` as a line chart and return the PNG bytes.
///
/// Each series gets its own hue, 60 degrees apart. The image carries no
/// text; titles and legends belong to the surrounding report.
pub fn render_png(data: &PlotData, width: u32, height: u32) -> Result<Vec<u8>> {
    let mut pixels = vec![0u8; width as usize * height as usize * 3];
    draw(data, &mut pixels, width, height)
        .map_err(|e| ThermogridError::Export(format!("chart rendering failed: {}", e)))?;

    let mut png = Vec::new();
    PngEncoder::new(&mut png)
        .write_image(&pixels, width, height, image::ColorType::Rgb8)
        .map_err(|e| ThermogridError::Export(format!("PNG encoding failed: {}", e)))?;
    Ok(png)
}

fn draw(
    data: &PlotData,
    pixels: &mut [u8],
    width: u32,
    height: u32,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let root = BitMapBackend::with_buffer(pixels, (width, height)).into_drawing_area();
    root.fill(&WHITE)?;

    let (xmin, xmax) = (data.x_range.0 as f64, data.x_range.1 as f64);
    let (ymin, ymax) = pad_range(data.y_range);

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .build_cartesian_2d(xmin..xmax, ymin..ymax)?;

    let grid = RGBColor(220, 220, 220);
    for i in 0..=GRID_LINES {
        let y = ymin + (ymax - ymin) * i as f64 / GRID_LINES as f64;
        chart.draw_series(LineSeries::new(vec![(xmin, y), (xmax, y)], &grid))?;
    }
    chart.draw_series(LineSeries::new(vec![(xmin, ymin), (xmin, ymax)], &BLACK))?;
    chart.draw_series(LineSeries::new(vec![(xmin, ymin), (xmax, ymin)], &BLACK))?;

    for (index, series) in data.series.iter().enumerate() {
        let color = series_color(index);
        let points: Vec<(f64, f64)> = series
            .points
            .iter()
            .map(|(x, y)| (*x as f64, *y as f64))
            .collect();
        chart.draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(2)))?;
        chart.draw_series(points.iter().map(|p| Circle::new(*p, 2, color.filled())))?;
    }

    root.present()?;
    Ok(())
}

fn series_color(index: usize) -> HSLColor {
    HSLColor(((index * 60) % 360) as f64 / 360.0, 0.7, 0.5)
}

/// Widen the y range by 5% on both sides so lines do not sit on the frame.
fn pad_range((min, max): (f32, f32)) -> (f64, f64) {
    let (min, max) = (min as f64, max as f64);
    let pad = (max - min).abs() * 0.05;
    (min - pad, max + pad)
}

/// Encode PNG bytes as a `data:` URL.
pub fn png_data_url(png: &[u8]) -> String {
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD as B64;
    format!("data:image/png;base64,{}", B64.encode(png))
}
