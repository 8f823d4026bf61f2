//! Inline SVG charts. Every chart is a standalone `<svg>` element with no
//! external assets.

use crate::html::escape;

const WIDTH: f64 = 640.0;
const LABEL_WIDTH: f64 = 200.0;
const VALUE_WIDTH: f64 = 90.0;
const BAR_HEIGHT: f64 = 22.0;
const BAR_GAP: f64 = 8.0;

pub const GREEN: &str = "#10B981";
pub const AMBER: &str = "#F59E0B";
pub const RED: &str = "#EF4444";
pub const BLUE: &str = "#3B82F6";
pub const GREY: &str = "#9CA3AF";

#[derive(Debug, Clone)]
pub struct Bar {
    pub label: String,
    pub value: f64,
    pub color: &'static str,
}

impl Bar {
    pub fn new(label: impl Into<String>, value: f64, color: &'static str) -> Self {
        Self {
            label: label.into(),
            value,
            color,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Series {
    pub name: String,
    pub color: &'static str,
    /// `(x, y)` points in data units.
    pub points: Vec<(f64, f64)>,
    /// Hover label per point, e.g. its date. Points without one show `x`.
    pub labels: Vec<String>,
    pub dashed: bool,
}

impl Series {
    fn point_label(&self, i: usize, x: f64) -> String {
        self.labels.get(i).cloned().unwrap_or_else(|| format!("{x}"))
    }
}

/// Horizontal bar chart. Negative values extend left of the zero line.
pub fn bar_chart(title: &str, bars: &[Bar], format: impl Fn(f64) -> String) -> String {
    let height = bars.len() as f64 * (BAR_HEIGHT + BAR_GAP) + BAR_GAP;
    let plot = WIDTH - LABEL_WIDTH - VALUE_WIDTH;

    let finite = bars.iter().map(|b| b.value).filter(|v| v.is_finite());
    let min = finite.clone().fold(0.0_f64, f64::min);
    let max = finite.fold(0.0_f64, f64::max);
    let span = if max - min > 0.0 { max - min } else { 1.0 };
    let x = |v: f64| LABEL_WIDTH + (v - min) / span * plot;

    let mut svg = format!(
        r#"<svg class="chart" role="img" aria-label="{title}" viewBox="0 0 {WIDTH} {height}" width="{WIDTH}" height="{height}" xmlns="http://www.w3.org/2000/svg">"#,
        title = escape(title),
    );
    let zero = x(0.0);
    for (i, bar) in bars.iter().enumerate() {
        let y = BAR_GAP + i as f64 * (BAR_HEIGHT + BAR_GAP);
        let value = if bar.value.is_finite() { bar.value } else { 0.0 };
        let (left, right) = if value < 0.0 { (x(value), zero) } else { (zero, x(value)) };
        svg.push_str(&format!(
            r#"<text x="{lx:.1}" y="{ty:.1}" text-anchor="end" font-size="12">{label}</text><rect x="{left:.1}" y="{y:.1}" width="{w:.1}" height="{BAR_HEIGHT}" fill="{color}"><title>{label}: {value}</title></rect><text x="{vx:.1}" y="{ty:.1}" font-size="12">{value}</text>"#,
            lx = LABEL_WIDTH - 6.0,
            ty = y + BAR_HEIGHT * 0.7,
            label = escape(&bar.label),
            w = (right - left).max(1.0),
            color = bar.color,
            vx = WIDTH - VALUE_WIDTH + 6.0,
            value = escape(&format(bar.value)),
        ));
    }
    svg.push_str(&format!(
        r#"<line x1="{zero:.1}" y1="0" x2="{zero:.1}" y2="{height}" stroke="{GREY}"/></svg>"#
    ));
    svg
}

/// Line chart over shared axes. The y axis always includes zero.
pub fn line_chart(title: &str, series: &[Series]) -> String {
    const HEIGHT: f64 = 260.0;
    const PAD: f64 = 36.0;

    let points = series.iter().flat_map(|s| s.points.iter().copied());
    let (mut x_min, mut x_max, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY, 0.0_f64);
    let mut y_min = 0.0_f64;
    for (x, y) in points.filter(|(x, y)| x.is_finite() && y.is_finite()) {
        x_min = x_min.min(x);
        x_max = x_max.max(x);
        y_min = y_min.min(y);
        y_max = y_max.max(y);
    }
    if !x_min.is_finite() {
        x_min = 0.0;
        x_max = 1.0;
    }
    let x_span = if x_max - x_min > 0.0 { x_max - x_min } else { 1.0 };
    let y_span = if y_max - y_min > 0.0 { y_max - y_min } else { 1.0 };
    let sx = |x: f64| PAD + (x - x_min) / x_span * (WIDTH - 2.0 * PAD);
    let sy = |y: f64| HEIGHT - PAD - (y - y_min) / y_span * (HEIGHT - 2.0 * PAD);

    let mut svg = format!(
        r#"<svg class="chart" role="img" aria-label="{title}" viewBox="0 0 {WIDTH} {HEIGHT}" width="{WIDTH}" height="{HEIGHT}" xmlns="http://www.w3.org/2000/svg"><line x1="{PAD}" y1="{base:.1}" x2="{right}" y2="{base:.1}" stroke="{GREY}"/><text x="4" y="{top}" font-size="11">{y_max:.0}</text><text x="4" y="{base:.1}" font-size="11">{y_min:.0}</text>"#,
        title = escape(title),
        base = sy(y_min),
        right = WIDTH - PAD,
        top = PAD,
    );
    for (i, s) in series.iter().enumerate() {
        let visible: Vec<(usize, f64, f64)> = s
            .points
            .iter()
            .enumerate()
            .filter(|(_, (x, y))| x.is_finite() && y.is_finite())
            .map(|(j, &(x, y))| (j, x, y))
            .collect();
        let path: Vec<String> = visible
            .iter()
            .map(|&(_, x, y)| format!("{:.1},{:.1}", sx(x), sy(y)))
            .collect();
        let dash = if s.dashed { r#" stroke-dasharray="6 4""# } else { "" };
        let name = escape(&s.name);
        svg.push_str(&format!(
            r#"<polyline fill="none" stroke="{color}" stroke-width="2"{dash} points="{points}"/><text x="{lx:.1}" y="{ly:.1}" font-size="12" fill="{color}">{name}</text>"#,
            color = s.color,
            points = path.join(" "),
            lx = PAD + 10.0 + i as f64 * 140.0,
            ly = PAD - 12.0,
        ));
        for &(j, x, y) in &visible {
            svg.push_str(&format!(
                r#"<circle cx="{cx:.1}" cy="{cy:.1}" r="3.5" fill="{color}"><title>{name} {label}: {y:.1}</title></circle>"#,
                cx = sx(x),
                cy = sy(y),
                color = s.color,
                label = escape(&s.point_label(j, x)),
            ));
        }
    }
    svg.push_str("</svg>");
    svg
}

/// Progress towards a target, capped at a full bar.
pub fn progress_bar(label: &str, current: f64, target: f64, color: &'static str) -> String {
    const HEIGHT: f64 = 28.0;
    let fraction = if target > 0.0 {
        (current / target).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let plot = WIDTH - LABEL_WIDTH - VALUE_WIDTH;
    format!(
        r##"<svg class="progress" role="img" aria-label="{label}" viewBox="0 0 {WIDTH} {HEIGHT}" width="{WIDTH}" height="{HEIGHT}" xmlns="http://www.w3.org/2000/svg"><text x="{lx}" y="18" text-anchor="end" font-size="12">{label}</text><rect x="{LABEL_WIDTH}" y="4" width="{plot}" height="20" fill="#E5E7EB"/><rect x="{LABEL_WIDTH}" y="4" width="{filled:.1}" height="20" fill="{color}"><title>{label}: {current:.0} of {target:.0} ({pct:.0}%)</title></rect><text x="{vx}" y="18" font-size="12">{current:.0} / {target:.0}</text></svg>"##,
        label = escape(label),
        lx = LABEL_WIDTH - 6.0,
        filled = fraction * plot,
        pct = fraction * 100.0,
        vx = WIDTH - VALUE_WIDTH + 6.0,
    )
}

/// Colour band for an ROI multiple.
pub fn roi_color(roi: Option<f64>) -> &'static str {
    match roi {
        Some(r) if r > 3.0 => GREEN,
        Some(r) if r > 1.0 => AMBER,
        Some(_) => RED,
        None => GREY,
    }
}
