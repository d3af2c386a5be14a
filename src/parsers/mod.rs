//! # 解析器模块
//!
//! 读取模拟结果文件及其嵌入的运行配置记录。
//!
//! ## 依赖关系
//! - 被 `pipeline/` 和 `commands/` 模块使用
//! - 子模块: event_file, run_macro

pub mod event_file;
pub mod run_macro;

pub use event_file::{DumpReader, EventFileReader, SchemaVersion};
pub use run_macro::RunMetadata;
