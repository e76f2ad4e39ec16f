use std::path::Path;

use ab_glyph::FontRef;
use image::{GrayImage, ImageFormat, Luma, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_line_segment_mut, draw_polygon_mut, draw_text_mut, text_size};
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};
use imageproc::pixelops::interpolate;
use imageproc::point::Point;
use imageproc::rect::Rect;
use tracing::info;

use crate::error::TrackerError;
use crate::record::ParticipationRecord;

const FONT_DATA: &[u8] = include_bytes!("../assets/fonts/DejaVuSans.ttf");

const CHART_WIDTH: u32 = 1800;
const CHART_HEIGHT: u32 = 900;
const PLACEHOLDER_WIDTH: u32 = 1000;
const PLACEHOLDER_HEIGHT: u32 = 500;

const MARGIN_LEFT: u32 = 120;
const MARGIN_RIGHT: u32 = 40;
const MARGIN_TOP: u32 = 80;
const MARGIN_BOTTOM: u32 = 250;

const GRID_LINES: u32 = 6;
const MARKER_SIZE: i32 = 7;
const EVENT_LABEL_CHARS: usize = 25;
const EVENT_LABEL_ANGLE: f32 = 65.0;

const TITLE_SIZE: f32 = 28.0;
const CAPTION_SIZE: f32 = 19.0;
const TICK_SIZE: f32 = 16.0;
const LABEL_SIZE: f32 = 14.0;

const CANVAS: Rgb<u8> = Rgb([0x1e, 0x1e, 0x1e]);
const PLOT_AREA: Rgb<u8> = Rgb([0x28, 0x28, 0x28]);
const LABEL_BOX: Rgb<u8> = Rgb([0x33, 0x33, 0x33]);
const GRID: Rgb<u8> = Rgb([0x80, 0x80, 0x80]);
const LIGHT_GRAY: Rgb<u8> = Rgb([0xd3, 0xd3, 0xd3]);
const WHITE: Rgb<u8> = Rgb([0xff, 0xff, 0xff]);
pub const PERCENTILE_COLOR: Rgb<u8> = Rgb([0x00, 0xff, 0xff]);

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// What ended up in the image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartOutcome {
    /// Number of events plotted
    Plotted(usize),
    /// Nothing to plot; a placeholder was drawn instead
    Placeholder,
}

/// Maps percentiles to pixel rows. Lower percentiles are better and sit higher.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotScale {
    /// Value drawn at the top edge of the plot area
    pub best: f64,
    /// Value drawn at the bottom edge of the plot area
    pub worst: f64,
    top: u32,
    height: u32,
}

impl PlotScale {
    /// Pads the data range by 10% of its span, or by 5 points when the span is zero.
    pub fn from_values(values: &[f64], top: u32, height: u32) -> Option<Self> {
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if !min.is_finite() || !max.is_finite() {
            return None;
        }

        let mut padding = (max - min) * 0.1;
        if padding == 0.0 {
            padding = 5.0;
        }

        Some(PlotScale { best: min - padding, worst: max + padding, top, height })
    }

    pub fn y_pixel(&self, value: f64) -> f32 {
        let fraction = (value - self.best) / (self.worst - self.best);
        (self.top as f64 + fraction * self.height as f64) as f32
    }

    pub fn value_at(&self, y: f32) -> f64 {
        let fraction = (y as f64 - self.top as f64) / self.height as f64;
        self.best + fraction * (self.worst - self.best)
    }
}

pub fn chart_title(team_name: &str) -> String {
    format!("{team_name} - CTF Rank Percentile Over Time")
}

/// X-axis label: year plus the first 25 characters of the event name.
pub fn event_label(record: &ParticipationRecord) -> String {
    let name: String = record.event_name_or_na().chars().take(EVENT_LABEL_CHARS).collect();
    format!("{}: {}", record.year, name)
}

fn load_font() -> Result<FontRef<'static>, TrackerError> {
    Ok(FontRef::try_from_slice(FONT_DATA)?)
}

// ============================================================================
// RENDERING
// ============================================================================

/// Draws the rank percentile of each record in the given (chronological) order.
/// Records without a percentile are left out; with none left, the placeholder is drawn.
pub fn render_chart(
    records: &[ParticipationRecord],
    team_name: &str,
) -> Result<(RgbImage, ChartOutcome), TrackerError> {
    let font = load_font()?;
    let plotted: Vec<(&ParticipationRecord, f64)> =
        records.iter().filter_map(|r| r.rank_percentile.map(|p| (r, p))).collect();
    let values: Vec<f64> = plotted.iter().map(|&(_, p)| p).collect();

    let plot_width = CHART_WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_height = CHART_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
    let plot_bottom = MARGIN_TOP + plot_height;

    let Some(scale) = PlotScale::from_values(&values, MARGIN_TOP, plot_height) else {
        return Ok((render_placeholder(&font), ChartOutcome::Placeholder));
    };

    let mut img = RgbImage::from_pixel(CHART_WIDTH, CHART_HEIGHT, CANVAS);
    draw_filled_rect_mut(
        &mut img,
        Rect::at(MARGIN_LEFT as i32, MARGIN_TOP as i32).of_size(plot_width, plot_height),
        PLOT_AREA,
    );

    draw_centered_text(&mut img, &font, TITLE_SIZE, WHITE, (CHART_WIDTH / 2) as i32, 24, &chart_title(team_name));

    // Y axis: dotted grid with the percentile at each line
    for i in 0..=GRID_LINES {
        let y = MARGIN_TOP + plot_height * i / GRID_LINES;
        draw_dotted_hline(&mut img, MARGIN_LEFT, MARGIN_LEFT + plot_width, y, GRID);

        let tick = format!("{:.1}", scale.value_at(y as f32));
        let (w, h) = text_size(TICK_SIZE, &font, &tick);
        draw_text_mut(
            &mut img,
            PERCENTILE_COLOR,
            MARGIN_LEFT as i32 - 10 - w as i32,
            y as i32 - h as i32 / 2,
            TICK_SIZE,
            &font,
            &tick,
        );
    }
    draw_rotated_text(
        &mut img,
        &font,
        CAPTION_SIZE,
        PERCENTILE_COLOR,
        (34.0, (MARGIN_TOP + plot_height / 2) as f32),
        90.0,
        0.5,
        "Rank Percentile (Lower is better)",
    );

    let step = plot_width as f32 / plotted.len() as f32;
    let points: Vec<(f32, f32)> = values
        .iter()
        .enumerate()
        .map(|(i, &v)| (MARGIN_LEFT as f32 + step * (i as f32 + 0.5), scale.y_pixel(v)))
        .collect();

    for pair in points.windows(2) {
        draw_thick_line(&mut img, pair[0], pair[1], PERCENTILE_COLOR);
    }
    for (&(x, y), &(record, value)) in points.iter().zip(&plotted) {
        draw_marker(&mut img, (x.round() as i32, y.round() as i32), PERCENTILE_COLOR);
        draw_point_label(&mut img, &font, (x.round() as i32, y.round() as i32), &format!("{value:.1}%"));
        draw_rotated_text(
            &mut img,
            &font,
            LABEL_SIZE,
            LIGHT_GRAY,
            (x, (plot_bottom + 8) as f32),
            EVENT_LABEL_ANGLE,
            1.0,
            &event_label(record),
        );
    }

    draw_centered_text(
        &mut img,
        &font,
        CAPTION_SIZE,
        LIGHT_GRAY,
        (MARGIN_LEFT + plot_width / 2) as i32,
        (CHART_HEIGHT - 34) as i32,
        "CTF Event (Chronological Order)",
    );
    draw_legend(&mut img, &font, MARGIN_LEFT + plot_width - 230, MARGIN_TOP + 14);

    Ok((img, ChartOutcome::Plotted(points.len())))
}

/// Dark canvas with a "no data" message.
fn render_placeholder(font: &FontRef) -> RgbImage {
    let mut img = RgbImage::from_pixel(PLACEHOLDER_WIDTH, PLACEHOLDER_HEIGHT, CANVAS);
    let message = "No CTF Data Available to Plot";
    let (_, h) = text_size(CAPTION_SIZE, font, message);
    draw_centered_text(
        &mut img,
        font,
        CAPTION_SIZE,
        LIGHT_GRAY,
        (PLACEHOLDER_WIDTH / 2) as i32,
        (PLACEHOLDER_HEIGHT / 2) as i32 - h as i32 / 2,
        message,
    );
    img
}

/// Renders the chart and writes it as PNG.
pub fn write_chart(records: &[ParticipationRecord], team_name: &str, path: &Path) -> Result<ChartOutcome, TrackerError> {
    let (img, outcome) = render_chart(records, team_name)?;
    img.save_with_format(path, ImageFormat::Png)?;

    match outcome {
        ChartOutcome::Plotted(n) => info!("Chart with {} events saved as {}", n, path.display()),
        ChartOutcome::Placeholder => info!("Placeholder chart saved as {}", path.display()),
    }
    Ok(outcome)
}

// ============================================================================
// DRAWING HELPERS
// ============================================================================

fn draw_centered_text(img: &mut RgbImage, font: &FontRef, size: f32, color: Rgb<u8>, center_x: i32, y: i32, text: &str) {
    let (w, _) = text_size(size, font, text);
    draw_text_mut(img, color, center_x - w as i32 / 2, y, size, font, text);
}

fn draw_dotted_hline(img: &mut RgbImage, x0: u32, x1: u32, y: u32, color: Rgb<u8>) {
    for x in (x0..x1).step_by(6) {
        draw_line_segment_mut(img, (x as f32, y as f32), ((x + 1) as f32, y as f32), color);
    }
}

fn draw_thick_line(img: &mut RgbImage, from: (f32, f32), to: (f32, f32), color: Rgb<u8>) {
    for offset in [-1.0, 0.0, 1.0] {
        draw_line_segment_mut(img, (from.0, from.1 + offset), (to.0, to.1 + offset), color);
    }
}

// Upward-pointing triangle centered on the point
fn draw_marker(img: &mut RgbImage, (x, y): (i32, i32), color: Rgb<u8>) {
    let triangle = [
        Point::new(x, y - MARKER_SIZE),
        Point::new(x + MARKER_SIZE, y + MARKER_SIZE),
        Point::new(x - MARKER_SIZE, y + MARKER_SIZE),
    ];
    draw_polygon_mut(img, &triangle, color);
}

// Boxed value label just above a marker
fn draw_point_label(img: &mut RgbImage, font: &FontRef, (x, y): (i32, i32), text: &str) {
    let (w, h) = text_size(LABEL_SIZE, font, text);
    let (w, h) = (w as i32, h as i32);
    let text_x = x - w / 2;
    let text_y = y - MARKER_SIZE - 10 - h;

    draw_filled_rect_mut(img, Rect::at(text_x - 4, text_y - 4).of_size((w + 8) as u32, (h + 8) as u32), LABEL_BOX);
    draw_text_mut(img, PERCENTILE_COLOR, text_x, text_y, LABEL_SIZE, font, text);
}

fn draw_legend(img: &mut RgbImage, font: &FontRef, x: u32, y: u32) {
    let (x, y) = (x as i32, y as i32);
    draw_filled_rect_mut(img, Rect::at(x, y).of_size(210, 40), LABEL_BOX);
    draw_thick_line(img, ((x + 12) as f32, (y + 20) as f32), ((x + 52) as f32, (y + 20) as f32), PERCENTILE_COLOR);
    draw_marker(img, (x + 32, y + 20), PERCENTILE_COLOR);
    draw_text_mut(img, LIGHT_GRAY, x + 64, y + 11, TICK_SIZE, font, "Rank Percentile");
}

/// Draws `text` rotated counter-clockwise by `degrees`. `align` is the point along
/// the text (0.0 start, 1.0 end) that lands on `anchor`.
#[allow(clippy::too_many_arguments)]
fn draw_rotated_text(
    img: &mut RgbImage,
    font: &FontRef,
    size: f32,
    color: Rgb<u8>,
    anchor: (f32, f32),
    degrees: f32,
    align: f32,
    text: &str,
) {
    let (w, h) = text_size(size, font, text);
    let side = w + 2 * h;
    let mut mask = GrayImage::new(side, side);
    draw_text_mut(&mut mask, Luma([255]), ((side - w) / 2) as i32, ((side - h) / 2) as i32, size, font, text);

    // rotate_about_center turns clockwise for positive angles
    let rotated = rotate_about_center(&mask, -degrees.to_radians(), Interpolation::Bilinear, Luma([0]));

    let (sin, cos) = degrees.to_radians().sin_cos();
    let along = (align - 0.5) * w as f32;
    let origin_x = (anchor.0 - along * cos).round() as i32 - (side / 2) as i32;
    let origin_y = (anchor.1 + along * sin).round() as i32 - (side / 2) as i32;

    for (mx, my, coverage) in rotated.enumerate_pixels() {
        let alpha = coverage[0];
        if alpha == 0 {
            continue;
        }
        let (px, py) = (origin_x + mx as i32, origin_y + my as i32);
        if px < 0 || py < 0 || px >= img.width() as i32 || py >= img.height() as i32 {
            continue;
        }
        let background = *img.get_pixel(px as u32, py as u32);
        img.put_pixel(px as u32, py as u32, interpolate(color, background, f32::from(alpha) / 255.0));
    }
}
