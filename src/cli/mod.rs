//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `process`: 归一化一个组件的全部模拟结果并汇总
//! - `inspect`: 查看单个结果文件的列、beamOn 与几何质量表
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: process, inspect

pub mod inspect;
pub mod process;

use clap::{Parser, Subcommand};

/// bgnorm - 放射性本底模拟结果归一化工具
#[derive(Parser)]
#[command(name = "bgnorm")]
#[command(author = "Changjiang Wu")]
#[command(version)]
#[command(
    about = "Normalize and aggregate radioactive-background simulation outputs",
    long_about = None
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Normalize every (layer, isotope) pair of a component and print the rollup
    Process(process::ProcessArgs),

    /// Show the columns, beamOn and geometry masses of one result file
    Inspect(inspect::InspectArgs),
}
