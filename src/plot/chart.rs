use crate::config::PlotConfig;
use crate::plot::tally::{Comparison, Row};
use crate::plot::{Error, Series};
use crate::st_debug;
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use plotters::style::{register_font, FontStyle};
use std::fs;
use std::path::{Path, PathBuf};
use strum::IntoEnumIterator;

/// Well known locations of a sans-serif TrueType font on common linux distributions.
pub const FONT_CANDIDATES: &[&str] = &[
    // debian, ubuntu
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    // fedora, rhel
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
    // arch
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    // alpine, opensuse
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
];

/// Height of a single bar, two bars of a mnemonic take 0.8 of a row.
const BAR_HEIGHT: f64 = 0.4;

/// Chart geometry and fonts.
#[derive(Clone, Debug, PartialEq)]
pub struct ChartStyle {
    pub width: u32,
    pub height: u32,
    pub font_size: f64,
}

impl From<&PlotConfig> for ChartStyle {
    fn from(cfg: &PlotConfig) -> Self {
        Self {
            width: cfg.width,
            height: cfg.height,
            font_size: cfg.font_size as f64,
        }
    }
}

impl Series {
    fn color(self) -> RGBColor {
        match self {
            Series::Baseline => RGBColor(31, 119, 180),
            Series::Optimized => RGBColor(255, 127, 14),
        }
    }

    /// Offset of a series bar from the center of a row.
    fn offset(self) -> f64 {
        match self {
            Series::Baseline => -BAR_HEIGHT,
            Series::Optimized => 0.0,
        }
    }
}

/// Return a font file for chart labels.
///
/// An explicitly configured font is used as is, otherwise the first existing
/// of [`FONT_CANDIDATES`] is taken.
pub fn find_font(configured: Option<&Path>) -> Result<PathBuf, Error> {
    find_font_in(configured, FONT_CANDIDATES.iter().map(PathBuf::from))
}

fn find_font_in(
    configured: Option<&Path>,
    candidates: impl IntoIterator<Item = PathBuf>,
) -> Result<PathBuf, Error> {
    if let Some(path) = configured {
        return Ok(path.to_path_buf());
    }

    let mut tried = vec![];
    for path in candidates {
        if path.is_file() {
            st_debug!(target: "plot", "use font {}", path.display());
            return Ok(path);
        }
        tried.push(path);
    }
    Err(Error::FontNotFound(tried))
}

/// Register a TrueType font as a `sans-serif` family for all charts.
pub fn load_font(path: &Path) -> Result<(), Error> {
    let bytes = fs::read(path).map_err(|e| Error::Font(path.to_path_buf(), e.to_string()))?;
    let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
    register_font("sans-serif", FontStyle::Normal, bytes)
        .map_err(|_| Error::Font(path.to_path_buf(), "not a TrueType font".to_string()))
}

/// Render a horizontal bar chart of a comparison into an image file.
/// Existing file is overwritten, `.svg` extension selects a vector image.
pub fn render(comparison: &Comparison, path: &Path, style: &ChartStyle) -> Result<(), Error> {
    let size = (style.width, style.height);
    let is_svg = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("svg"));

    if is_svg {
        draw(SVGBackend::new(path, size).into_drawing_area(), comparison, style)
    } else {
        draw(BitMapBackend::new(path, size).into_drawing_area(), comparison, style)
    }
}

fn render_err<E: std::error::Error + Send + Sync>(e: DrawingAreaErrorKind<E>) -> Error {
    Error::Render(e.to_string())
}

pub(crate) fn draw<DB: DrawingBackend>(
    root: DrawingArea<DB, Shift>,
    comparison: &Comparison,
    style: &ChartStyle,
) -> Result<(), Error> {
    root.fill(&WHITE).map_err(render_err)?;

    let rows: Vec<&Row> = comparison.plot_order().collect();
    let row_count = rows.len().max(1);
    let x_max = comparison.max_count().max(1) as f64 * 1.05;
    // row `i` is centered at `i`, key points of this range fall on row centers
    let y_range = -0.5..row_count as f64 - 0.5;

    let font = ("sans-serif", style.font_size).into_font();
    let label_area = style.font_size as u32;

    let mut chart = ChartBuilder::on(&root)
        .margin(label_area)
        .x_label_area_size(label_area * 3)
        .y_label_area_size(label_area * 6)
        .build_cartesian_2d(0.0..x_max, y_range)
        .map_err(render_err)?;

    let mnemonic_label = |y: &f64| {
        let idx = y.round();
        if idx < 0.0 || (y - idx).abs() > 0.01 {
            return String::new();
        }
        rows.get(idx as usize)
            .map(|row| row.mnemonic.clone())
            .unwrap_or_default()
    };
    chart
        .configure_mesh()
        .y_labels(rows.len())
        .y_label_formatter(&mnemonic_label)
        .x_label_formatter(&|x: &f64| format!("{x:.0}"))
        .x_desc("count")
        .y_desc("instruction")
        .label_style(font.clone())
        .axis_desc_style(font.clone())
        .draw()
        .map_err(render_err)?;

    for series in Series::iter() {
        let color = series.color();
        chart
            .draw_series(rows.iter().enumerate().map(|(i, row)| {
                let y = i as f64 + series.offset();
                Rectangle::new(
                    [(0.0, y), (row.count(series) as f64, y + BAR_HEIGHT)],
                    color.filled(),
                )
            }))
            .map_err(render_err)?
            .label(series.as_ref())
            .legend(move |(x, y)| Rectangle::new([(x, y - 8), (x + 24, y + 8)], color.filled()));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::LowerRight)
        .label_font(font)
        .background_style(WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()
        .map_err(render_err)?;

    root.present().map_err(render_err)?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_style_from_config() {
        let style = ChartStyle::from(&PlotConfig::default());
        assert_eq!(style.width, 1920);
        assert_eq!(style.height, 1440);
        assert_eq!(style.font_size, 25.0);
    }

    #[test]
    fn test_bars_do_not_overlap() {
        let baseline = (Series::Baseline.offset(), Series::Baseline.offset() + BAR_HEIGHT);
        let optimized = (Series::Optimized.offset(), Series::Optimized.offset() + BAR_HEIGHT);
        assert!(baseline.1 <= optimized.0);
        // bars stay inside of a row
        assert!(baseline.0 >= -0.5 && optimized.1 <= 0.5);
    }

    #[test]
    fn test_missing_font() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_font(&dir.path().join("missing.ttf")).unwrap_err();
        assert!(matches!(err, Error::Font(_, _)));

        let not_a_font = dir.path().join("font.ttf");
        fs::write(&not_a_font, "not a font").unwrap();
        let err = load_font(&not_a_font).unwrap_err();
        assert!(matches!(err, Error::Font(_, _)));
    }

    #[test]
    fn test_font_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.ttf");
        let present = dir.path().join("present.ttf");
        fs::write(&present, b"ttf").unwrap();

        let font = find_font_in(None, [missing.clone(), present.clone()]).unwrap();
        assert_eq!(font, present);

        // configured font is never replaced
        let font = find_font_in(Some(&missing), [present.clone()]).unwrap();
        assert_eq!(font, missing);
    }

    #[test]
    fn test_font_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let candidates = vec![dir.path().join("a.ttf"), dir.path().join("b.ttf")];

        let err = find_font_in(None, candidates.clone()).unwrap_err();
        let msg = err.to_string();
        assert!(matches!(err, Error::FontNotFound(ref tried) if *tried == candidates));
        assert!(msg.contains("a.ttf") && msg.contains("b.ttf"));
    }

    #[test]
    #[cfg(feature = "int_test")]
    fn test_draw_labels() {
        use crate::plot::Tally;

        load_font(&find_font(None).unwrap()).unwrap();
        let baseline: Tally = ["mov", "mov", "push", "add"].into_iter().collect();
        let optimized: Tally = ["mov", "add", "add", "ret", "vmulpd"].into_iter().collect();
        let comparison = Comparison::new(&baseline, &optimized);

        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, (1920, 1440)).into_drawing_area();
            draw(root, &comparison, &ChartStyle::from(&PlotConfig::default())).unwrap();
        }

        for row in comparison.rows() {
            assert_eq!(
                svg.matches(&format!("{}</text>", row.mnemonic)).count(),
                1,
                "label of {}",
                row.mnemonic
            );
        }
        assert!(svg.contains("baseline</text>"));
        assert!(svg.contains("optimized</text>"));
    }
}
