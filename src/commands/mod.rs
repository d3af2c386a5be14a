//! # 命令执行模块
//!
//! 实现各子命令的业务逻辑。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `cli/`, `catalog/`, `pipeline/`, `report/`, `utils/`
//! - 子模块: process, inspect

pub mod inspect;
pub mod process;

use crate::cli::Commands;

/// 执行命令
pub fn run(cmd: Commands) -> anyhow::Result<()> {
    match cmd {
        Commands::Process(args) => process::execute(args),
        Commands::Inspect(args) => inspect::execute(args),
    }
}
