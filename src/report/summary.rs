//! # 终端汇总表
//!
//! - 每个组合：文件数、事件数、状态
//! - 每层：参与的同位素、积分计数率 ± 积分不确定度
//! - 最后一行为所有层的总计
//!
//! 积分值为各分箱之和；不确定度同样逐分箱相加
//! （活度 sigma 在分箱间完全相关）。
//!
//! ## 依赖关系
//! - 被 `commands/process.rs` 调用
//! - 使用 `tabled` 渲染表格

use super::RATE_UNIT;
use crate::models::RollupTotals;
use crate::pipeline::PairReport;
use crate::utils::output;

use tabled::{Table, Tabled};

/// 每层一行的汇总
#[derive(Debug, Clone, Tabled)]
pub struct SummaryRow {
    #[tabled(rename = "Layer")]
    pub layer: String,
    #[tabled(rename = "Isotopes")]
    pub isotopes: String,
    #[tabled(rename = "Rate")]
    pub rate: String,
    #[tabled(rename = "Uncertainty")]
    pub uncertainty: String,
}

/// 每个组合一行
#[derive(Debug, Clone, Tabled)]
pub struct PairRow {
    #[tabled(rename = "Layer")]
    pub layer: String,
    #[tabled(rename = "Isotope")]
    pub isotope: String,
    #[tabled(rename = "Files")]
    pub files: String,
    #[tabled(rename = "Events")]
    pub events: u64,
    #[tabled(rename = "Status")]
    pub status: String,
}

/// 生成汇总行（各层 + Total）
pub fn summary_rows(totals: &RollupTotals) -> Vec<SummaryRow> {
    let mut rows: Vec<SummaryRow> = totals
        .layers
        .iter()
        .map(|layer| SummaryRow {
            layer: layer.layer.clone(),
            isotopes: layer.isotopes.join(", "),
            rate: format!("{:.4e}", layer.totals.integrated_rate()),
            uncertainty: format!("{:.4e}", layer.totals.integrated_uncertainty()),
        })
        .collect();

    rows.push(SummaryRow {
        layer: "Total".to_string(),
        isotopes: String::new(),
        rate: format!("{:.4e}", totals.grand.integrated_rate()),
        uncertainty: format!("{:.4e}", totals.grand.integrated_uncertainty()),
    });
    rows
}

/// 生成组合明细行
pub fn pair_rows(reports: &[PairReport]) -> Vec<PairRow> {
    reports
        .iter()
        .map(|r| PairRow {
            layer: r.key.layer.clone(),
            isotope: r.key.isotope.clone(),
            files: if r.failed_files > 0 {
                format!("{} ({} failed)", r.file_count, r.failed_files)
            } else {
                r.file_count.to_string()
            },
            events: r.events,
            status: match &r.outcome {
                Ok(_) => "ok".to_string(),
                // 跳过原因只写入日志
                Err(_) => "skipped".to_string(),
            },
        })
        .collect()
}

/// 打印组合明细表
pub fn print_pair_table(reports: &[PairReport]) {
    let rows = pair_rows(reports);
    if rows.is_empty() {
        return;
    }
    output::print_header(&format!("{} (layer, isotope) pairs", rows.len()));
    println!("{}", Table::new(&rows));
}

/// 打印分层汇总表
pub fn print_summary(totals: &RollupTotals) {
    output::print_header(&format!("Integrated rate [{}]", RATE_UNIT));
    println!("{}\n", Table::new(summary_rows(totals)));
    output::print_rate(
        "Total",
        totals.grand.integrated_rate(),
        totals.grand.integrated_uncertainty(),
        RATE_UNIT,
    );
}
