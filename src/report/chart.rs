//! SVG chart rendering.
//!
//! Thin layer over plotters. Every function writes one SVG file.

use crate::analysis::{Activity, DaySchedule, GroupChatStats, RankChange, TimeBasis, TopN, YearRanking};
use anyhow::{Context, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::f64::consts::TAU;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

type Area<'a> = DrawingArea<SVGBackend<'a>, Shift>;

const FONT: &str = "sans-serif";
const GRID_COLUMNS: usize = 2;

/// One bar of a bar chart.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub label: String,
    pub value: f64,
}

/// Resolve the chart path inside the images directory, creating the directory.
///
/// Only SVG is rendered; any other extension is replaced.
pub fn prepare_output(images_dir: &Path, file_name: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(images_dir)
        .with_context(|| format!("Failed to create {}", images_dir.display()))?;

    let mut path = images_dir.join(file_name);
    let is_svg = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("svg"))
        .unwrap_or(false);
    if !is_svg {
        warn!("Charts are rendered as SVG, writing {}.svg instead", path.with_extension("").display());
        path.set_extension("svg");
    }

    Ok(path)
}

/// Pie chart of the top contacts plus an "Others" slice.
pub fn pie_chart(path: &Path, title: &str, top: &TopN) -> Result<()> {
    let mut slices: Vec<(String, f64)> = top
        .entries
        .iter()
        .map(|r| (r.name.clone(), r.count as f64))
        .collect();
    if top.others > 0 {
        slices.push(("Others".to_string(), top.others as f64));
    }

    let root = SVGBackend::new(path, (1000, 800)).into_drawing_area();
    root.fill(&WHITE)?;
    let area = root.titled(title, (FONT, 28))?;

    let total: f64 = slices.iter().map(|(_, v)| v).sum();
    if total > 0.0 {
        let (w, h) = area.dim_in_pixel();
        let center = (w as i32 / 2, h as i32 / 2);
        let radius = w.min(h) as f64 * 0.35;
        let point = |angle: f64, r: f64| {
            (
                center.0 + (r * angle.cos()).round() as i32,
                center.1 - (r * angle.sin()).round() as i32,
            )
        };

        let mut angle = 0.0;
        for (i, (label, value)) in slices.iter().enumerate() {
            let sweep = value / total * TAU;
            let steps = ((sweep / TAU) * 360.0).ceil().max(2.0) as usize;

            let mut outline = vec![center];
            outline.extend((0..=steps).map(|s| point(angle + sweep * s as f64 / steps as f64, radius)));
            area.draw(&Polygon::new(outline, Palette99::pick(i).filled()))?;

            let middle = angle + sweep / 2.0;
            area.draw(&Text::new(
                label.clone(),
                point(middle, radius * 1.12),
                (FONT, 15).into_font(),
            ))?;
            area.draw(&Text::new(
                format!("{:.1}%", value / total * 100.0),
                point(middle, radius * 0.6),
                (FONT, 13).into_font(),
            ))?;

            angle += sweep;
        }
    }

    root.present()?;
    debug!("Wrote pie chart to {}", path.display());
    Ok(())
}

/// Grid of per-contact histograms over the date window.
pub fn activity_grid(path: &Path, activity: &Activity, basis: TimeBasis, eq_y: bool) -> Result<()> {
    let rows = grid_rows(activity.series.len());
    let root = SVGBackend::new(path, (1600, 320 * rows as u32 + 60)).into_drawing_area();
    root.fill(&WHITE)?;

    let title = if activity.cumulative {
        "Cumulative messages per contact"
    } else {
        "Messages per contact"
    };
    let area = root.titled(title, (FONT, 28))?;
    let cells = area.split_evenly((rows, GRID_COLUMNS));

    let (Some(first), Some(last)) = (activity.edges.first(), activity.edges.last()) else {
        root.present()?;
        return Ok(());
    };
    let global_max = activity.max();

    for (i, (series, cell)) in activity.series.iter().zip(cells.iter()).enumerate() {
        let max = if eq_y { global_max } else { series.max() };
        let top = axis_top(max as f64);
        let color = Palette99::pick(i).to_rgba();

        let mut chart = ChartBuilder::on(cell)
            .caption(&series.name, (FONT, 18))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(*first..*last, 0f64..top)?;

        chart
            .configure_mesh()
            .x_labels(6)
            .x_label_formatter(&|x| basis.format(*x as i64, "%Y-%m-%d"))
            .y_desc("# messages")
            .draw()?;

        if activity.cumulative {
            chart.draw_series(
                AreaSeries::new(
                    activity
                        .edges
                        .iter()
                        .zip(series.values.iter())
                        .map(|(x, y)| (*x, *y as f64)),
                    0.0,
                    color.mix(0.5),
                )
                .border_style(color.stroke_width(1)),
            )?;
        } else {
            chart.draw_series(activity.edges.windows(2).zip(series.values.iter()).map(
                |(edge, value)| {
                    Rectangle::new([(edge[0], 0.0), (edge[1], *value as f64)], color.mix(0.8).filled())
                },
            ))?;
        }
    }

    root.present()?;
    debug!("Wrote activity grid to {}", path.display());
    Ok(())
}

/// Grid of per-contact hour-of-day distributions, in percent.
pub fn day_schedule_grid(path: &Path, schedules: &[DaySchedule], eq_y: bool) -> Result<()> {
    let rows = grid_rows(schedules.len());
    let root = SVGBackend::new(path, (1600, 320 * rows as u32 + 60)).into_drawing_area();
    root.fill(&WHITE)?;
    let area = root.titled("Messages per hour of day", (FONT, 28))?;
    let cells = area.split_evenly((rows, GRID_COLUMNS));

    let max_share = |s: &DaySchedule| s.shares.iter().copied().fold(0.0, f64::max);
    let global_max = schedules.iter().map(max_share).fold(0.0, f64::max);

    for (i, (schedule, cell)) in schedules.iter().zip(cells.iter()).enumerate() {
        let max = if eq_y { global_max } else { max_share(schedule) };
        let top = axis_top(max * 100.0);
        let color = Palette99::pick(i).to_rgba();

        let mut chart = ChartBuilder::on(cell)
            .caption(&schedule.name, (FONT, 18))
            .margin(10)
            .x_label_area_size(30)
            .y_label_area_size(50)
            .build_cartesian_2d((0u32..24u32).into_segmented(), 0f64..top)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(24)
            .x_label_formatter(&|v| match v {
                SegmentValue::CenterOf(hour) => hour.to_string(),
                _ => String::new(),
            })
            .y_desc("% messages")
            .draw()?;

        chart.draw_series(schedule.shares.iter().enumerate().map(|(hour, share)| {
            bar((hour as u32, share * 100.0), color.mix(0.8).filled())
        }))?;
    }

    root.present()?;
    debug!("Wrote day schedule grid to {}", path.display());
    Ok(())
}

/// One bar chart per year, bars colored by rank change.
pub fn evolution_chart(path: &Path, rankings: &[YearRanking]) -> Result<()> {
    let rows = rankings.len().max(1);
    let root = SVGBackend::new(path, (1600, 260 * rows as u32 + 60)).into_drawing_area();
    root.fill(&WHITE)?;
    let area = root.titled(
        "Top contacts per year (green: higher than previous year, yellow: same, red: lower)",
        (FONT, 24),
    )?;
    let cells = area.split_evenly((rows, 1));

    for (ranking, cell) in rankings.iter().zip(cells.iter()) {
        let bars: Vec<(String, f64, RGBAColor)> = ranking
            .entries
            .iter()
            .map(|e| (e.name.clone(), e.count as f64, change_color(e.change)))
            .collect();
        draw_bars(cell, &ranking.year.to_string(), "# messages", &bars)?;
    }

    root.present()?;
    debug!("Wrote evolution chart to {}", path.display());
    Ok(())
}

/// A single bar chart.
pub fn bar_chart(path: &Path, title: &str, y_desc: &str, bars: &[Bar]) -> Result<()> {
    let root = SVGBackend::new(path, (1400, 700)).into_drawing_area();
    root.fill(&WHITE)?;

    let colored: Vec<(String, f64, RGBAColor)> = bars
        .iter()
        .enumerate()
        .map(|(i, b)| (b.label.clone(), b.value, Palette99::pick(i).to_rgba()))
        .collect();
    draw_bars(&root, title, y_desc, &colored)?;

    root.present()?;
    debug!("Wrote bar chart to {}", path.display());
    Ok(())
}

/// Messages per group chat member with the admin cut-off line.
pub fn group_chat_chart(path: &Path, stats: &GroupChatStats) -> Result<()> {
    let root = SVGBackend::new(path, (1400, 700)).into_drawing_area();
    root.fill(&WHITE)?;

    let n = stats.senders.len().max(1) as u32;
    let names: Vec<&str> = stats.senders.iter().map(|r| r.name.as_str()).collect();
    let max = stats.senders.first().map(|r| r.count).unwrap_or(0) as f64;

    let mut chart = ChartBuilder::on(&root)
        .caption("Activity in group chat", (FONT, 28))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(60)
        .build_cartesian_2d((0u32..n).into_segmented(), 0f64..axis_top(max))?;

    chart
        .configure_mesh()
        .x_labels(names.len().max(1))
        .x_label_formatter(&|v| segment_label(v, &names))
        .y_desc("# messages")
        .draw()?;

    let points: Vec<(SegmentValue<u32>, f64)> = stats
        .senders
        .iter()
        .enumerate()
        .map(|(i, r)| (SegmentValue::CenterOf(i as u32), r.count as f64))
        .collect();

    chart.draw_series(LineSeries::new(points.clone(), &BLUE))?;
    chart.draw_series(points.into_iter().map(|p| Cross::new(p, 5, RED.filled())))?;
    chart
        .draw_series(LineSeries::new(
            vec![
                (SegmentValue::Exact(0), stats.admin_cutoff),
                (SegmentValue::Exact(n), stats.admin_cutoff),
            ],
            &GREEN,
        ))?
        .label("Admin cut-off")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &GREEN));

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    root.present()?;
    debug!("Wrote group chat chart to {}", path.display());
    Ok(())
}

/// Draw labelled bars on a drawing area.
fn draw_bars(area: &Area<'_>, caption: &str, y_desc: &str, bars: &[(String, f64, RGBAColor)]) -> Result<()> {
    let n = bars.len().max(1) as u32;
    let labels: Vec<&str> = bars.iter().map(|(label, _, _)| label.as_str()).collect();
    let max = bars.iter().map(|(_, v, _)| *v).fold(0.0, f64::max);

    let mut chart = ChartBuilder::on(area)
        .caption(caption, (FONT, 18))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d((0u32..n).into_segmented(), 0f64..axis_top(max))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(labels.len().max(1))
        .x_label_formatter(&|v| segment_label(v, &labels))
        .y_desc(y_desc)
        .draw()?;

    chart.draw_series(
        bars.iter()
            .enumerate()
            .map(|(i, (_, value, color))| bar((i as u32, *value), color.mix(0.8).filled())),
    )?;

    Ok(())
}

fn bar(at: (u32, f64), style: ShapeStyle) -> Rectangle<(SegmentValue<u32>, f64)> {
    let mut rect = Rectangle::new(
        [(SegmentValue::Exact(at.0), 0.0), (SegmentValue::Exact(at.0 + 1), at.1)],
        style,
    );
    rect.set_margin(0, 0, 4, 4);
    rect
}

fn segment_label(value: &SegmentValue<u32>, labels: &[&str]) -> String {
    match value {
        SegmentValue::CenterOf(i) => labels.get(*i as usize).map(|l| l.to_string()).unwrap_or_default(),
        _ => String::new(),
    }
}

fn change_color(change: RankChange) -> RGBAColor {
    match change {
        RankChange::Baseline => BLUE.to_rgba(),
        RankChange::Improved => GREEN.to_rgba(),
        RankChange::Same => YELLOW.to_rgba(),
        RankChange::Worsened => RED.to_rgba(),
    }
}

fn grid_rows(items: usize) -> usize {
    ((items + GRID_COLUMNS - 1) / GRID_COLUMNS).max(1)
}

/// Upper bound of a y-axis showing values up to `max`.
fn axis_top(max: f64) -> f64 {
    if max <= 0.0 {
        1.0
    } else {
        max * 1.1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::ranking::{Ranked, YearEntry};
    use crate::analysis::timeline::ActivitySeries;
    use tempfile::TempDir;

    fn read(path: &Path) -> String {
        std::fs::read_to_string(path).unwrap()
    }

    #[test]
    fn test_prepare_output_creates_dir_and_forces_svg() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("images");

        let path = prepare_output(&dir, "activity.png").unwrap();
        assert!(dir.is_dir());
        assert_eq!(path, dir.join("activity.svg"));

        let path = prepare_output(&dir, "top.SVG").unwrap();
        assert_eq!(path, dir.join("top.SVG"));
    }

    #[test]
    fn test_grid_rows_and_axis_top() {
        assert_eq!(grid_rows(0), 1);
        assert_eq!(grid_rows(3), 2);
        assert_eq!(grid_rows(4), 2);
        assert_eq!(axis_top(0.0), 1.0);
        assert!(axis_top(10.0) > 10.0);
    }

    #[test]
    fn test_pie_chart_writes_labels() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("top.svg");
        let top = TopN {
            entries: vec![Ranked::new("Alice", 3), Ranked::new("Bob", 1)],
            others: 1,
        };

        pie_chart(&path, "Top 2 most messaged contacts", &top).unwrap();
        let svg = read(&path);
        assert!(svg.contains("<svg"));
        assert!(svg.contains("Alice"));
        assert!(svg.contains("Others"));
    }

    #[test]
    fn test_activity_grid_renders_both_modes() {
        let temp = TempDir::new().unwrap();
        let activity = Activity {
            edges: vec![0.0, 86_400_000.0, 172_800_000.0],
            cumulative: false,
            series: vec![
                ActivitySeries {
                    name: "Amy".to_string(),
                    values: vec![1, 3],
                },
                ActivitySeries {
                    name: "Bob".to_string(),
                    values: vec![2, 0],
                },
                ActivitySeries {
                    name: "Cid".to_string(),
                    values: vec![0, 1],
                },
            ],
            inactive: vec![],
        };

        let path = temp.path().join("activity.svg");
        activity_grid(&path, &activity, TimeBasis::Utc, true).unwrap();
        assert!(read(&path).contains("Cid"));

        let cumulative = Activity {
            cumulative: true,
            ..activity
        };
        let path = temp.path().join("cumulative.svg");
        activity_grid(&path, &cumulative, TimeBasis::Utc, false).unwrap();
        assert!(read(&path).contains("Cumulative"));
    }

    #[test]
    fn test_evolution_and_bar_charts() {
        let temp = TempDir::new().unwrap();
        let rankings = vec![YearRanking {
            year: 2020,
            entries: vec![YearEntry {
                name: "Amy".to_string(),
                count: 5,
                change: RankChange::Improved,
            }],
        }];

        let path = temp.path().join("years.svg");
        evolution_chart(&path, &rankings).unwrap();
        assert!(read(&path).contains("2020"));

        let path = temp.path().join("bars.svg");
        bar_chart(
            &path,
            "Interaction factor",
            "factor",
            &[Bar {
                label: "Bob".to_string(),
                value: 0.5,
            }],
        )
        .unwrap();
        assert!(read(&path).contains("Bob"));
    }

    #[test]
    fn test_group_chat_and_day_schedule_charts() {
        let temp = TempDir::new().unwrap();
        let stats = GroupChatStats {
            chat: "Friends_1".to_string(),
            participants: vec!["Ann".to_string(), "Bob".to_string()],
            senders: vec![Ranked::new("Ann", 8), Ranked::new("Bob", 2)],
            admin_cutoff: 3.0,
        };
        let path = temp.path().join("group.svg");
        group_chat_chart(&path, &stats).unwrap();
        assert!(read(&path).contains("Admin cut-off"));

        let mut shares = vec![0.0; 24];
        shares[9] = 1.0;
        let mut counts = vec![0; 24];
        counts[9] = 4;
        let schedules = vec![DaySchedule {
            name: "Amy".to_string(),
            counts,
            shares,
        }];
        let path = temp.path().join("hours.svg");
        day_schedule_grid(&path, &schedules, false).unwrap();
        assert!(read(&path).contains("Amy"));
    }
}
