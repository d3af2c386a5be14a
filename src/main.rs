//! # bgnorm - 放射性本底模拟结果归一化工具
//!
//! 将 Geant4 本底模拟的原始能量沉积换算为单位探测器质量、单位时间的计数率，
//! 并按材料层与总计汇总。
//!
//! ## 子命令
//! - `process` - 加载、分箱、归一化并汇总一个组件（内部材料 / 岩石 / 混凝土）
//! - `inspect` - 查看单个结果文件
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   │     ├── catalog/   (参考表)
//!   │     ├── pipeline/  (加载 / 归一化 / 汇总)
//!   │     ├── parsers/   (结果文件与运行元数据)
//!   │     ├── report/    (表格 / CSV / 图)
//!   │     └── models/    (数据模型)
//!   ├── batch/      (并行执行)
//!   ├── utils/      (工具函数)
//!   └── error.rs    (错误处理)
//! ```

mod batch;
mod catalog;
mod cli;
mod commands;
mod error;
mod models;
mod parsers;
mod pipeline;
mod report;
mod utils;

use clap::Parser;
use cli::Cli;
use env_logger::Env;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    if let Err(e) = commands::run(cli.command) {
        utils::output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}
