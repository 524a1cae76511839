use crate::config::PlotConfig;
use crate::join::JoinedCounty;
use anyhow::{anyhow, Context, Result};
use geo::Area;
use image::RgbImage;
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use plotters::style::FontTransform;
use std::path::Path;

// ColorBrewer OrRd, 9 classes
const ORRD: [&str; 9] = [
    "#fff7ec", "#fee8c8", "#fdd49e", "#fdbb84", "#fc8d59", "#ef6548", "#d7301f", "#b30000",
    "#7f0000",
];
const BOUNDARY: RGBColor = RGBColor(90, 90, 90);
const TITLE: &str = "Real Estate Map with Highlighted Counties";
const LEGEND_LABEL: &str = "Number of Matching Properties";
const TITLE_HEIGHT: u32 = 40;
const LEGEND_WIDTH: u32 = 120;
const LEGEND_MARGIN: i32 = 16;
const BAR_WIDTH: i32 = 24;
const BAR_STEPS: usize = 32;
const MAX_TICKS: usize = 5;

fn hex_to_rgb(hex: &str) -> RGBColor {
    let hex = hex.trim_start_matches('#');
    let channel = |i: usize| {
        hex.get(i..i + 2)
            .and_then(|h| u8::from_str_radix(h, 16).ok())
            .unwrap_or(0)
    };
    RGBColor(channel(0), channel(2), channel(4))
}

pub fn ramp_color(t: f64) -> RGBColor {
    let t = t.clamp(0.0, 1.0) * (ORRD.len() - 1) as f64;
    let lower = t.floor() as usize;
    let upper = (lower + 1).min(ORRD.len() - 1);
    let frac = t - lower as f64;
    let (a, b) = (hex_to_rgb(ORRD[lower]), hex_to_rgb(ORRD[upper]));
    let mix = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * frac).round() as u8;
    RGBColor(mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
}

pub fn legend_ticks(max_count: usize) -> Vec<usize> {
    let intervals = (MAX_TICKS - 1).min(max_count.max(1));
    let mut ticks: Vec<usize> = (0..=intervals)
        .map(|i| (max_count as f64 * i as f64 / intervals as f64).round() as usize)
        .collect();
    ticks.dedup();
    ticks
}

fn draw_counties<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    extent: [f64; 4],
    counties: &[JoinedCounty<'_>],
    max_count: usize,
) -> Result<()> {
    let [min_lon, min_lat, max_lon, max_lat] = extent;
    let mut chart = ChartBuilder::on(area)
        .build_cartesian_2d(min_lon..max_lon, min_lat..max_lat)
        .map_err(|e| anyhow!("Failed to build map chart: {:?}", e))?;

    // Larger counties first so enclosed ones (holes) are painted on top.
    let mut order: Vec<&JoinedCounty<'_>> = counties.iter().collect();
    order.sort_by(|a, b| {
        b.geometry.geometry.unsigned_area().total_cmp(&a.geometry.geometry.unsigned_area())
    });

    for county in order {
        let t = if max_count > 0 { county.count as f64 / max_count as f64 } else { 0.0 };
        let fill = ramp_color(t);
        for polygon in &county.geometry.geometry.0 {
            let ring: Vec<(f64, f64)> = polygon.exterior().coords().map(|c| (c.x, c.y)).collect();
            chart
                .draw_series(std::iter::once(Polygon::new(ring.clone(), fill.filled())))
                .map_err(|e| anyhow!("Failed to fill {}: {:?}", county.geometry.name, e))?;
            chart
                .draw_series(LineSeries::new(ring, &BOUNDARY))
                .map_err(|e| anyhow!("Failed to outline {}: {:?}", county.geometry.name, e))?;
        }
    }
    Ok(())
}

fn bar_span(area_height: i32) -> (i32, i32) {
    (LEGEND_MARGIN, (area_height - LEGEND_MARGIN).max(LEGEND_MARGIN + 1))
}

fn tick_y(value: usize, max_count: usize, (top, bottom): (i32, i32)) -> i32 {
    if max_count == 0 {
        return bottom;
    }
    bottom - ((bottom - top) as f64 * value as f64 / max_count as f64).round() as i32
}

fn draw_color_bar<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>) -> Result<()> {
    let (top, bottom) = bar_span(area.dim_in_pixel().1 as i32);
    let x0 = LEGEND_MARGIN;
    let x1 = LEGEND_MARGIN + BAR_WIDTH;
    let span = (bottom - top) as f64;

    // Highest count at the top.
    for step in 0..BAR_STEPS {
        let y0 = top + (span * step as f64 / BAR_STEPS as f64).round() as i32;
        let y1 = top + (span * (step + 1) as f64 / BAR_STEPS as f64).round() as i32;
        let color = ramp_color(1.0 - step as f64 / (BAR_STEPS - 1) as f64);
        area.draw(&Rectangle::new([(x0, y0), (x1, y1)], color.filled()))
            .map_err(|e| anyhow!("Failed to draw legend: {:?}", e))?;
    }
    area.draw(&Rectangle::new([(x0, top), (x1, bottom)], BOUNDARY.stroke_width(1)))
        .map_err(|e| anyhow!("Failed to draw legend border: {:?}", e))?;
    Ok(())
}

fn draw_labels<DB: DrawingBackend>(
    title_area: &DrawingArea<DB, Shift>,
    legend_area: &DrawingArea<DB, Shift>,
    max_count: usize,
) -> Result<()> {
    let label_err = |e: DrawingAreaErrorKind<DB::ErrorType>| anyhow!("Failed to draw label: {:?}", e);

    title_area
        .draw(&Text::new(TITLE, (10, 10), ("sans-serif", 22).into_font().color(&BLACK)))
        .map_err(label_err)?;

    let span = bar_span(legend_area.dim_in_pixel().1 as i32);
    let tick_style = ("sans-serif", 13).into_font().color(&BLACK);
    for tick in legend_ticks(max_count) {
        let y = tick_y(tick, max_count, span);
        let x = LEGEND_MARGIN + BAR_WIDTH;
        legend_area
            .draw(&PathElement::new(vec![(x, y), (x + 4, y)], &BLACK))
            .map_err(label_err)?;
        legend_area
            .draw(&Text::new(tick.to_string(), (x + 7, y - 6), tick_style.clone()))
            .map_err(label_err)?;
    }

    let label_style = ("sans-serif", 14)
        .into_font()
        .transform(FontTransform::Rotate270)
        .color(&BLACK);
    legend_area
        .draw(&Text::new(LEGEND_LABEL, (LEGEND_WIDTH as i32 - 24, span.1), label_style))
        .map_err(label_err)?;
    Ok(())
}

pub fn render_choropleth(config: &PlotConfig, counties: &[JoinedCounty<'_>]) -> Result<RgbImage> {
    let [min_lon, min_lat, max_lon, max_lat] = config.extent;
    if max_lon <= min_lon || max_lat <= min_lat {
        return Err(anyhow!("Invalid plot extent: {:?}", config.extent));
    }

    let width = config.width + LEGEND_WIDTH;
    let height = config.height + TITLE_HEIGHT;
    let max_count = counties.iter().map(|c| c.count).max().unwrap_or(0);
    let mut buffer = vec![0u8; (width * height * 3) as usize];

    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(|e| anyhow!("Failed to clear plot: {:?}", e))?;

        let (title_area, body) = root.split_vertically(TITLE_HEIGHT as i32);
        let (map_area, legend_area) = body.split_horizontally(config.width as i32);

        draw_counties(&map_area, config.extent, counties, max_count)?;
        draw_color_bar(&legend_area)?;
        // Text needs a system font; the plot stays usable without one.
        if let Err(e) = draw_labels(&title_area, &legend_area, max_count) {
            tracing::warn!("Plot labels skipped: {:#}", e);
        }

        root.present().map_err(|e| anyhow!("Failed to finish plot: {:?}", e))?;
    }

    RgbImage::from_raw(width, height, buffer)
        .ok_or_else(|| anyhow!("Plot buffer does not match {}x{}", width, height))
}

pub fn write_plot(path: &Path, config: &PlotConfig, counties: &[JoinedCounty<'_>]) -> Result<()> {
    let img = render_choropleth(config, counties)?;
    img.save(path).with_context(|| format!("Failed to save plot: {:?}", path))?;
    tracing::info!("Wrote choropleth of {} counties to {:?}", counties.len(), path);
    Ok(())
}
