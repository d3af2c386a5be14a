//! # 能谱数据导出
//!
//! 导出所有归一化能谱与汇总结果到 CSV，每个 (layer, isotope, 分箱) 一行。
//!
//! 列：component, layer, isotope, energy_keV, rate, uncertainty。
//! 层汇总的 isotope 为 `total`；总计的 layer 与 isotope 均为 `total`。
//!
//! ## 依赖关系
//! - 被 `commands/process.rs` 调用
//! - 使用 `pipeline/` 的 PipelineOutput
//! - 使用 `csv` + `serde` 写入 CSV 文件

use crate::error::{BgnormError, Result};
use crate::models::Component;
use crate::pipeline::PipelineOutput;

use serde::Serialize;
use std::io::Write;
use std::path::Path;

const TOTAL: &str = "total";

#[derive(Debug, Serialize)]
struct SpectrumRow<'a> {
    component: Component,
    layer: &'a str,
    isotope: &'a str,
    #[serde(rename = "energy_keV")]
    energy_kev: f64,
    rate: f64,
    uncertainty: f64,
}

/// 写入 CSV 到任意输出
pub fn write_csv<W: Write>(writer: W, output: &PipelineOutput, component: Component) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    let mut write_bins = |layer: &str, isotope: &str, energy: &[f64], rate: &[f64], unc: &[f64]| {
        for ((e, r), u) in energy.iter().zip(rate).zip(unc) {
            wtr.serialize(SpectrumRow {
                component,
                layer,
                isotope,
                energy_kev: *e,
                rate: *r,
                uncertainty: *u,
            })?;
        }
        Ok::<(), csv::Error>(())
    };

    for spectrum in output.spectra() {
        write_bins(
            &spectrum.key.layer,
            &spectrum.key.isotope,
            &spectrum.energy,
            &spectrum.rate,
            &spectrum.uncertainty,
        )?;
    }

    let totals = &output.totals;
    for layer in &totals.layers {
        write_bins(
            &layer.layer,
            TOTAL,
            &totals.energy,
            &layer.totals.rate,
            &layer.totals.uncertainty,
        )?;
    }
    write_bins(
        TOTAL,
        TOTAL,
        &totals.energy,
        &totals.grand.rate,
        &totals.grand.uncertainty,
    )?;

    wtr.flush().map_err(|e| BgnormError::FileWriteError {
        path: "<csv>".to_string(),
        source: e,
    })?;
    Ok(())
}

/// 导出为 CSV 文件
pub fn export_csv(output: &PipelineOutput, component: Component, output_path: &Path) -> Result<()> {
    let file = std::fs::File::create(output_path).map_err(|e| BgnormError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    })?;
    write_csv(file, output, component)
}
