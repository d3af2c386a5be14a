//! # 结果报告模块
//!
//! 将归一化结果输出为终端表格、CSV 文件和能谱图。
//!
//! ## 依赖关系
//! - 被 `commands/process.rs` 调用
//! - 子模块: summary, export, plot
//! - 使用 `pipeline/` 的 PipelineOutput

pub mod export;
pub mod plot;
pub mod summary;

pub use export::export_csv;
pub use plot::write_plots;
pub use summary::{print_pair_table, print_summary};

/// 计数率单位
pub const RATE_UNIT: &str = "counts/(keV·kg·day)";
