//! # 能谱图生成
//!
//! 使用 `plotters` 生成对数纵轴的阶梯能谱图（PNG）。
//!
//! ## 功能
//! - 每层一张图：各同位素与层汇总
//! - 总计一张图：各层与总计
//! - 对数坐标下只绘制正值，非正分箱处断开曲线
//!
//! ## 依赖关系
//! - 被 `commands/process.rs` 调用
//! - 使用 `pipeline/` 的 PipelineOutput
//! - 使用 `plotters` 渲染图表

use super::RATE_UNIT;
use crate::error::{BgnormError, Result};
use crate::models::{Binning, Component, NormalizedSpectrum};
use crate::pipeline::PipelineOutput;

use plotters::prelude::*;
use std::path::{Path, PathBuf};

const WIDTH: u32 = 1024;
const HEIGHT: u32 = 768;

fn plot_err<E: std::fmt::Debug>(e: E) -> BgnormError {
    BgnormError::PlotError(format!("{:?}", e))
}

/// 把分箱值转换为阶梯折线，按非正值断开
pub fn step_runs(edges: &[f64], values: &[f64]) -> Vec<Vec<(f64, f64)>> {
    let mut runs = Vec::new();
    let mut current: Vec<(f64, f64)> = Vec::new();

    for (i, &v) in values.iter().enumerate() {
        let (Some(&lo), Some(&hi)) = (edges.get(i), edges.get(i + 1)) else {
            break;
        };
        if v > 0.0 && v.is_finite() {
            current.push((lo, v));
            current.push((hi, v));
        } else if !current.is_empty() {
            runs.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

/// 所有曲线中正值的范围
fn positive_range(series: &[(String, &[f64])]) -> Option<(f64, f64)> {
    let positives = series
        .iter()
        .flat_map(|(_, values)| values.iter())
        .copied()
        .filter(|v| *v > 0.0 && v.is_finite());

    positives.fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

/// 绘制一组阶梯曲线；没有正值时不生成文件并返回 false
pub fn draw_spectra(
    series: &[(String, &[f64])],
    binning: &Binning,
    title: &str,
    output_path: &Path,
) -> Result<bool> {
    let Some((y_min, y_max)) = positive_range(series) else {
        return Ok(false);
    };
    let edges = binning.edges();

    let root = BitMapBackend::new(output_path, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 28).into_font())
        .margin(30)
        .x_label_area_size(50)
        .y_label_area_size(80)
        .build_cartesian_2d(binning.low..binning.high, (y_min * 0.5..y_max * 2.0).log_scale())
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .x_desc("Energy (keV)")
        .y_desc(format!("Rate [{}]", RATE_UNIT))
        .y_label_formatter(&|y| format!("{:.0e}", y))
        .x_label_style(("sans-serif", 16))
        .y_label_style(("sans-serif", 16))
        .axis_desc_style(("sans-serif", 18))
        .draw()
        .map_err(plot_err)?;

    for (i, (label, values)) in series.iter().enumerate() {
        let color = Palette99::pick(i).to_rgba();
        for (j, run) in step_runs(&edges, values).into_iter().enumerate() {
            let anno = chart
                .draw_series(LineSeries::new(run, color.stroke_width(2)))
                .map_err(plot_err)?;
            if j == 0 {
                anno.label(label.as_str()).legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                });
            }
        }
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    Ok(true)
}

/// 为每层与总计各生成一张图，返回写入的文件
pub fn write_plots(
    output: &PipelineOutput,
    component: Component,
    binning: &Binning,
    dir: &Path,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir).map_err(|e| BgnormError::FileWriteError {
        path: dir.display().to_string(),
        source: e,
    })?;

    let spectra: Vec<&NormalizedSpectrum> = output.spectra().collect();
    let totals = &output.totals;
    let mut written = Vec::new();

    for layer in &totals.layers {
        let mut series: Vec<(String, &[f64])> = spectra
            .iter()
            .filter(|s| s.key.layer == layer.layer)
            .map(|s| (s.key.isotope.clone(), s.rate.as_slice()))
            .collect();
        series.push(("Total".to_string(), layer.totals.rate.as_slice()));

        let path = dir.join(format!("{}_{}.png", component, layer.layer));
        let title = format!("{} {}", component, layer.layer);
        if draw_spectra(&series, binning, &title, &path)? {
            written.push(path);
        } else {
            log::info!("layer={} reason=\"no positive bins\" plot skipped", layer.layer);
        }
    }

    let mut series: Vec<(String, &[f64])> = totals
        .layers
        .iter()
        .map(|l| (l.layer.clone(), l.totals.rate.as_slice()))
        .collect();
    series.push(("Total".to_string(), totals.grand.rate.as_slice()));

    let path = dir.join(format!("{}_total.png", component));
    if draw_spectra(&series, binning, &format!("{} total", component), &path)? {
        written.push(path);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_runs_break_on_zero() {
        let edges = [0.0, 1.0, 2.0, 3.0, 4.0];
        let runs = step_runs(&edges, &[1.0, 0.0, 2.0, 3.0]);
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0], vec![(0.0, 1.0), (1.0, 1.0)]);
        assert_eq!(runs[1], vec![(2.0, 2.0), (3.0, 2.0), (3.0, 3.0), (4.0, 3.0)]);
    }

    #[test]
    fn test_step_runs_all_zero() {
        let edges = [0.0, 1.0, 2.0];
        assert!(step_runs(&edges, &[0.0, -1.0]).is_empty());
    }

    #[test]
    fn test_positive_range() {
        let a = [0.0, 2.0, 5.0];
        let b = [0.5, 0.0, 0.0];
        let series = vec![("a".to_string(), &a[..]), ("b".to_string(), &b[..])];
        assert_eq!(positive_range(&series), Some((0.5, 5.0)));

        let zeros = [0.0, 0.0];
        let series = vec![("z".to_string(), &zeros[..])];
        assert_eq!(positive_range(&series), None);
    }

    #[test]
    fn test_draw_without_positive_values_writes_nothing() {
        let zeros = [0.0; 20];
        let series = vec![("z".to_string(), &zeros[..])];
        let path = std::env::temp_dir().join("bgnorm_plot_never_written.png");
        let drawn = draw_spectra(&series, &Binning::default(), "empty", &path).unwrap();
        assert!(!drawn);
        assert!(!path.exists());
    }
}
