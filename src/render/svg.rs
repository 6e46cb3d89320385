// SVG rendering of colored track paths and lap time charts

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::errors::TrackpaintError;
use crate::laps::LapTimeChart;
use crate::path::palette::to_hex;
use crate::path::{ColorNormalization, PathSegment, RenderablePath};

const TITLE_LINE_HEIGHT: f32 = 28.0;
const COLORBAR_HEIGHT: f32 = 18.0;
const COLORBAR_AREA_HEIGHT: f32 = 80.0;
const AXIS_AREA: f32 = 70.0;
const MAX_SVG_BYTES: usize = 10_000_000;

/// Configuration for SVG output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SvgRenderConfig {
    /// Canvas dimensions (width, height) in pixels
    pub canvas_size: (u32, u32),
    /// Stroke width of the colored segments
    pub stroke_width: f32,
    /// Stroke width of the dark line drawn under the segments
    pub outline_width: f32,
    /// Radius of lap time markers
    pub point_radius: f32,
    pub scaling_algorithm: ScalingAlgorithm,
    /// Margin around the content as percentage of canvas size
    pub margin_percentage: f32,
}

impl Default for SvgRenderConfig {
    fn default() -> Self {
        Self {
            canvas_size: (1200, 675),
            stroke_width: 5.0,
            outline_width: 16.0,
            point_radius: 5.0,
            scaling_algorithm: ScalingAlgorithm::AutoFit,
            margin_percentage: 0.05,
        }
    }
}

/// Scaling algorithms for fitting track coordinates on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ScalingAlgorithm {
    /// Uniform scaling, the track keeps its shape
    AutoFit,
    /// Scale each axis to fill the plot area (may distort aspect ratio)
    FillCanvas,
    /// Use fixed scale factor, pixels per meter
    FixedScale(f32),
}

/// Represents a 2D coordinate point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point2D {
    pub x: f32,
    pub y: f32,
}

impl Point2D {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Bounding box for coordinate calculations
#[derive(Debug, Clone, Copy)]
pub struct BoundingBox {
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
}

impl BoundingBox {
    pub fn new() -> Self {
        Self {
            min_x: f32::INFINITY,
            max_x: f32::NEG_INFINITY,
            min_y: f32::INFINITY,
            max_y: f32::NEG_INFINITY,
        }
    }

    pub fn update(&mut self, point: Point2D) {
        self.min_x = self.min_x.min(point.x);
        self.max_x = self.max_x.max(point.x);
        self.min_y = self.min_y.min(point.y);
        self.max_y = self.max_y.max(point.y);
    }

    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::new()
    }
}

/// Rectangle of the canvas that content is drawn into
#[derive(Debug, Clone, Copy, PartialEq)]
struct PlotArea {
    x: f32,
    y: f32,
    width: f32,
    height: f32,
}

/// Maps track coordinates into a plot area, north up
struct TrackProjection {
    bbox: BoundingBox,
    scale: (f32, f32),
    origin: Point2D,
}

impl TrackProjection {
    fn project(&self, (x, y): (f32, f32)) -> Point2D {
        Point2D::new(
            self.origin.x + (x - self.bbox.min_x) * self.scale.0,
            self.origin.y + (self.bbox.max_y - y) * self.scale.1,
        )
    }
}

/// Renders pipeline artifacts as standalone SVG documents
pub struct SvgRenderer {
    config: SvgRenderConfig,
}

impl SvgRenderer {
    /// Create a new renderer with default configuration
    pub fn new() -> Self {
        Self {
            config: SvgRenderConfig::default(),
        }
    }

    /// Create a new renderer with custom configuration
    pub fn with_config(config: SvgRenderConfig) -> Self {
        Self { config }
    }

    /// Get current configuration
    pub fn config(&self) -> &SvgRenderConfig {
        &self.config
    }

    /// Render a colored track path with its title and colorbar
    pub fn render_path(&self, path: &RenderablePath) -> Result<String, TrackpaintError> {
        info!(
            "Rendering path \"{}\" with {} segments",
            path.title.replace('\n', " "),
            path.segments.len()
        );
        self.validate_config()?;

        let mut bbox = BoundingBox::new();
        for colored in path.segments.iter().filter(|c| c.segment.is_drawable()) {
            let PathSegment {
                start_point: (x1, y1),
                end_point: (x2, y2),
                ..
            } = colored.segment;
            bbox.update(Point2D::new(x1, y1));
            bbox.update(Point2D::new(x2, y2));
        }
        if bbox.is_empty() {
            return Err(TrackpaintError::SvgRenderError {
                reason: "Path has no segment with finite coordinates".to_string(),
            });
        }

        let title_lines = path.title.lines().count().max(1);
        let area = self.content_area(
            title_lines as f32 * TITLE_LINE_HEIGHT,
            COLORBAR_AREA_HEIGHT,
            0.0,
        )?;
        let projection = self.track_projection(&bbox, area);
        debug!(
            "Track bounding box ({:.2}, {:.2}) to ({:.2}, {:.2}), scale ({:.4}, {:.4})",
            bbox.min_x, bbox.min_y, bbox.max_x, bbox.max_y, projection.scale.0, projection.scale.1
        );

        let mut svg = String::with_capacity(1024 + path.segments.len() * 96);
        self.write_header(&mut svg, Some(&path.normalization));
        self.write_title(&mut svg, &path.title);

        if path.track_outline {
            svg.push_str("\n  <path class=\"track-outline\" d=\"");
            let mut pen_down = false;
            for colored in &path.segments {
                if !colored.segment.is_drawable() {
                    pen_down = false;
                    continue;
                }
                let start = projection.project(colored.segment.start_point);
                let end = projection.project(colored.segment.end_point);
                if !pen_down {
                    svg.push_str(&format!("M {:.2},{:.2} ", start.x, start.y));
                    pen_down = true;
                }
                svg.push_str(&format!("L {:.2},{:.2} ", end.x, end.y));
            }
            svg.push_str("\" />");
        }

        let mut drawn = 0;
        let mut skipped = 0;
        for colored in &path.segments {
            if !colored.segment.is_drawable() || colored.color.a == 0 {
                skipped += 1;
                continue;
            }
            let start = projection.project(colored.segment.start_point);
            let end = projection.project(colored.segment.end_point);
            svg.push_str(&format!(
                "\n  <line class=\"segment\" x1=\"{:.2}\" y1=\"{:.2}\" x2=\"{:.2}\" y2=\"{:.2}\" stroke=\"{}\"{} />",
                start.x,
                start.y,
                end.x,
                end.y,
                to_hex(colored.color),
                opacity_attr("stroke-opacity", colored.color.a),
            ));
            drawn += 1;
        }
        if skipped > 0 {
            warn!("Skipped {} segments without geometry or color", skipped);
        }

        self.write_colorbar(&mut svg, path);
        self.finish(svg, drawn)
    }

    /// Render lap times as a scatter plot, faster laps towards the top
    pub fn render_lap_chart(&self, chart: &LapTimeChart) -> Result<String, TrackpaintError> {
        info!(
            "Rendering lap chart \"{}\" with {} series",
            chart.title,
            chart.series.len()
        );
        self.validate_config()?;

        let points: Vec<(u32, f32)> = chart
            .series
            .iter()
            .flat_map(|s| s.points())
            .filter(|(_, time)| time.is_finite())
            .collect();
        if points.is_empty() {
            return Err(TrackpaintError::SvgRenderError {
                reason: "Lap chart has no timed laps".to_string(),
            });
        }

        let mut bbox = BoundingBox::new();
        for &(lap, time) in &points {
            bbox.update(Point2D::new(lap as f32, time));
        }
        // Half a lap and a sliver of time around the data
        let time_pad = (bbox.height() * 0.05).max(0.5);
        bbox.update(Point2D::new(bbox.min_x - 0.5, bbox.min_y - time_pad));
        bbox.update(Point2D::new(bbox.max_x + 0.5, bbox.max_y + time_pad));

        let area = self.content_area(TITLE_LINE_HEIGHT * 2.0, AXIS_AREA, AXIS_AREA * 1.5)?;
        let to_canvas = |lap: f32, time: f32| {
            Point2D::new(
                area.x + (lap - bbox.min_x) / bbox.width() * area.width,
                area.y + (time - bbox.min_y) / bbox.height() * area.height,
            )
        };

        let mut svg = String::with_capacity(2048 + points.len() * 80);
        self.write_header(&mut svg, None);
        self.write_title(&mut svg, &chart.title);
        svg.push_str(&format!(
            "\n  <rect class=\"plot-area\" x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" />",
            area.x, area.y, area.width, area.height
        ));

        for time in axis_ticks(bbox.min_y, bbox.max_y, 6) {
            let p = to_canvas(bbox.min_x, time);
            svg.push_str(&format!(
                "\n  <line class=\"grid\" x1=\"{:.2}\" y1=\"{:.2}\" x2=\"{:.2}\" y2=\"{:.2}\" />\
                 \n  <text class=\"tick\" x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"end\">{}</text>",
                area.x,
                p.y,
                area.x + area.width,
                p.y,
                area.x - 6.0,
                p.y + 4.0,
                format_lap_time(time)
            ));
        }
        for lap in lap_ticks(bbox.min_x, bbox.max_x, 10) {
            let p = to_canvas(lap as f32, bbox.max_y);
            svg.push_str(&format!(
                "\n  <line class=\"grid\" x1=\"{:.2}\" y1=\"{:.2}\" x2=\"{:.2}\" y2=\"{:.2}\" />\
                 \n  <text class=\"tick\" x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"middle\">{}</text>",
                p.x,
                area.y,
                p.x,
                area.y + area.height,
                p.x,
                area.y + area.height + 18.0,
                lap
            ));
        }
        svg.push_str(&format!(
            "\n  <text class=\"axis-label\" x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"middle\">{}</text>\
             \n  <text class=\"axis-label\" x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"middle\" transform=\"rotate(-90 {:.2} {:.2})\">{}</text>",
            area.x + area.width / 2.0,
            area.y + area.height + 44.0,
            escape_xml(&chart.x_label),
            area.x - 80.0,
            area.y + area.height / 2.0,
            area.x - 80.0,
            area.y + area.height / 2.0,
            escape_xml(&chart.y_label),
        ));

        let mut drawn = 0;
        for series in &chart.series {
            for (lap, time) in series.points() {
                if !time.is_finite() {
                    continue;
                }
                let p = to_canvas(lap as f32, time);
                svg.push_str(&format!(
                    "\n  <circle class=\"lap\" cx=\"{:.2}\" cy=\"{:.2}\" r=\"{:.2}\" fill=\"{}\"{} />",
                    p.x,
                    p.y,
                    self.config.point_radius,
                    to_hex(series.color),
                    opacity_attr("fill-opacity", series.color.a),
                ));
                drawn += 1;
            }
        }

        // Legend in series order, top right of the plot area
        for (i, series) in chart.series.iter().enumerate() {
            let y = area.y + 16.0 + i as f32 * 20.0;
            let x = area.x + area.width - 130.0;
            svg.push_str(&format!(
                "\n  <circle class=\"legend-marker\" cx=\"{:.2}\" cy=\"{:.2}\" r=\"{:.2}\" fill=\"{}\" />\
                 \n  <text class=\"legend-label\" x=\"{:.2}\" y=\"{:.2}\">{}</text>",
                x,
                y,
                self.config.point_radius,
                to_hex(series.color),
                x + 12.0,
                y + 4.0,
                escape_xml(&series.category)
            ));
        }

        self.finish(svg, drawn)
    }

    fn validate_config(&self) -> Result<(), TrackpaintError> {
        let (width, height) = self.config.canvas_size;
        if width == 0 || height == 0 {
            return Err(TrackpaintError::SvgRenderError {
                reason: "Invalid canvas size: dimensions cannot be zero".to_string(),
            });
        }
        if self.config.margin_percentage < 0.0 || self.config.margin_percentage >= 0.5 {
            return Err(TrackpaintError::SvgRenderError {
                reason: format!(
                    "Invalid margin percentage: {} (must be 0.0-0.5)",
                    self.config.margin_percentage
                ),
            });
        }
        if self.config.stroke_width <= 0.0 || self.config.stroke_width > 50.0 {
            return Err(TrackpaintError::SvgRenderError {
                reason: format!(
                    "Invalid stroke width: {} (must be 0.1-50.0)",
                    self.config.stroke_width
                ),
            });
        }
        Ok(())
    }

    /// Canvas minus margins and reserved bands at the top, bottom and left
    fn content_area(&self, top: f32, bottom: f32, left: f32) -> Result<PlotArea, TrackpaintError> {
        let (width, height) = (
            self.config.canvas_size.0 as f32,
            self.config.canvas_size.1 as f32,
        );
        let margin_x = width * self.config.margin_percentage;
        let margin_y = height * self.config.margin_percentage;
        let area = PlotArea {
            x: margin_x + left,
            y: margin_y + top,
            width: width - 2.0 * margin_x - left,
            height: height - 2.0 * margin_y - top - bottom,
        };
        if area.width <= 0.0 || area.height <= 0.0 {
            return Err(TrackpaintError::SvgRenderError {
                reason: format!(
                    "Invalid usable canvas size: {}x{} (margins too large)",
                    area.width, area.height
                ),
            });
        }
        Ok(area)
    }

    /// Calculate scaling factors based on the configured scaling algorithm.
    /// Axes without extent borrow the scale of the other axis.
    fn calculate_scaling_factors(&self, bbox: &BoundingBox, area: PlotArea) -> (f32, f32) {
        let fit = |extent: f32, available: f32| (extent > 0.0).then(|| available / extent);
        let scale_x = fit(bbox.width(), area.width);
        let scale_y = fit(bbox.height(), area.height);

        match self.config.scaling_algorithm {
            ScalingAlgorithm::AutoFit => {
                let scale = match (scale_x, scale_y) {
                    (Some(x), Some(y)) => x.min(y),
                    (Some(s), None) | (None, Some(s)) => s,
                    (None, None) => 1.0,
                };
                (scale, scale)
            }
            ScalingAlgorithm::FillCanvas => {
                let fallback = scale_x.or(scale_y).unwrap_or(1.0);
                (scale_x.unwrap_or(fallback), scale_y.unwrap_or(fallback))
            }
            ScalingAlgorithm::FixedScale(scale) => (scale, scale),
        }
    }

    fn track_projection(&self, bbox: &BoundingBox, area: PlotArea) -> TrackProjection {
        let scale = self.calculate_scaling_factors(bbox, area);
        // Center the scaled track inside the area
        let origin = Point2D::new(
            area.x + (area.width - bbox.width() * scale.0) / 2.0,
            area.y + (area.height - bbox.height() * scale.1) / 2.0,
        );
        TrackProjection {
            bbox: *bbox,
            scale,
            origin,
        }
    }

    /// Opening tag plus style definitions, and the colorbar gradient if any
    fn write_header(&self, svg: &mut String, colorbar: Option<&ColorNormalization>) {
        let (width, height) = self.config.canvas_size;
        svg.push_str(&format!(
            r#"<svg width="{w}" height="{h}" xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {w} {h}">
  <defs>
    <style>
      .segment {{ stroke-width: {sw:.2}; stroke-linecap: round; }}
      .track-outline {{ stroke: #000; stroke-width: {ow:.2}; fill: none; stroke-linecap: round; stroke-linejoin: round; }}
      .title {{ font: 22px sans-serif; }}
      .tick, .legend-label {{ font: 12px sans-serif; }}
      .axis-label {{ font: 14px sans-serif; }}
      .plot-area {{ fill: #eaeaf2; }}
      .grid {{ stroke: #fff; stroke-width: 1; }}
      .colorbar {{ stroke: #333; stroke-width: 0.5; }}
    </style>"#,
            w = width,
            h = height,
            sw = self.config.stroke_width,
            ow = self.config.outline_width,
        ));
        if let Some(normalization) = colorbar {
            write_colorbar_gradient(svg, normalization);
        }
        svg.push_str("\n  </defs>");
    }

    fn write_title(&self, svg: &mut String, title: &str) {
        let center = self.config.canvas_size.0 as f32 / 2.0;
        let top = self.config.canvas_size.1 as f32 * self.config.margin_percentage;
        svg.push_str("\n  <text class=\"title\" text-anchor=\"middle\">");
        for (i, line) in title.lines().enumerate() {
            svg.push_str(&format!(
                "<tspan x=\"{:.2}\" y=\"{:.2}\">{}</tspan>",
                center,
                top + (i + 1) as f32 * TITLE_LINE_HEIGHT - 6.0,
                escape_xml(line)
            ));
        }
        svg.push_str("</text>");
    }

    fn write_colorbar(&self, svg: &mut String, path: &RenderablePath) {
        let (width, height) = (
            self.config.canvas_size.0 as f32,
            self.config.canvas_size.1 as f32,
        );
        let bar_width = width * 0.5;
        let x = (width - bar_width) / 2.0;
        let y = height - height * self.config.margin_percentage - COLORBAR_AREA_HEIGHT + 10.0;

        svg.push_str(&format!(
            "\n  <rect class=\"colorbar\" x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"url(#colorbar)\" />",
            x, y, bar_width, COLORBAR_HEIGHT
        ));
        for tick in &path.legend.ticks {
            let tick_x = x + path.normalization.offset_of(tick.position) * bar_width;
            svg.push_str(&format!(
                "\n  <line class=\"colorbar\" x1=\"{:.2}\" y1=\"{:.2}\" x2=\"{:.2}\" y2=\"{:.2}\" />\
                 \n  <text class=\"tick\" x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"middle\">{}</text>",
                tick_x,
                y + COLORBAR_HEIGHT,
                tick_x,
                y + COLORBAR_HEIGHT + 5.0,
                tick_x,
                y + COLORBAR_HEIGHT + 18.0,
                escape_xml(&tick.label)
            ));
        }
        svg.push_str(&format!(
            "\n  <text class=\"axis-label\" x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"middle\">{}</text>",
            width / 2.0,
            y + COLORBAR_HEIGHT + 38.0,
            escape_xml(&path.legend.label)
        ));
    }

    fn finish(&self, mut svg: String, drawn: usize) -> Result<String, TrackpaintError> {
        if drawn == 0 {
            return Err(TrackpaintError::SvgRenderError {
                reason: "Nothing could be drawn".to_string(),
            });
        }
        svg.push_str(&format!("\n  <!-- {} elements drawn -->\n</svg>", drawn));

        if svg.len() > MAX_SVG_BYTES {
            return Err(TrackpaintError::SvgRenderError {
                reason: format!("Generated SVG too large: {} bytes (max 10MB)", svg.len()),
            });
        }
        debug!("Generated SVG with {} characters, {} elements", svg.len(), drawn);
        Ok(svg)
    }
}

impl Default for SvgRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Gradient definition referenced by the colorbar rectangle
fn write_colorbar_gradient(svg: &mut String, normalization: &ColorNormalization) {
    svg.push_str("\n    <linearGradient id=\"colorbar\" x1=\"0\" y1=\"0\" x2=\"1\" y2=\"0\">");
    for stop in &normalization.colorbar {
        svg.push_str(&format!(
            "\n      <stop offset=\"{:.4}\" stop-color=\"{}\" />",
            stop.offset,
            to_hex(stop.color)
        ));
    }
    svg.push_str("\n    </linearGradient>");
}

fn opacity_attr(name: &str, alpha: u8) -> String {
    if alpha == 255 {
        String::new()
    } else {
        format!(" {}=\"{:.3}\"", name, alpha as f32 / 255.0)
    }
}

/// Roughly `count` evenly spaced values from min to max inclusive
fn axis_ticks(min: f32, max: f32, count: usize) -> Vec<f32> {
    if max <= min || count < 2 {
        return vec![min];
    }
    let step = (max - min) / (count - 1) as f32;
    (0..count).map(|i| min + step * i as f32).collect()
}

/// Whole lap numbers inside [min, max], at most about `count` of them
fn lap_ticks(min: f32, max: f32, count: usize) -> Vec<u32> {
    let first = min.max(0.0).ceil() as u32;
    let last = max.max(0.0).floor() as u32;
    if last < first {
        return Vec::new();
    }
    let step = (last - first).div_ceil(count.max(1) as u32).max(1);
    (first..=last).step_by(step as usize).collect()
}

/// Format seconds as m:ss.sss
pub fn format_lap_time(seconds: f32) -> String {
    let millis = (seconds * 1000.0).round() as i64;
    let minutes = millis / 60_000;
    let rest = millis % 60_000;
    format!("{}:{:02}.{:03}", minutes, rest / 1000, rest % 1000)
}

pub fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
