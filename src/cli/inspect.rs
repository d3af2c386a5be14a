//! # inspect 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/inspect.rs`

use crate::parsers::SchemaVersion;

use clap::Args;
use std::path::PathBuf;

/// inspect 子命令参数
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Result file to inspect
    pub file: PathBuf,

    /// Result file schema (locates the energy deposition column)
    #[arg(long, value_enum, default_value_t = SchemaVersion::Filtered)]
    pub schema: SchemaVersion,

    /// File name suffix used to parse the file identity
    #[arg(long, default_value = "filtered.root")]
    pub suffix: String,
}
