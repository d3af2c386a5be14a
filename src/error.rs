//! # 统一错误处理模块
//!
//! 定义 bgnorm 的所有错误类型，使用 `thiserror` 派生。
//!
//! 注意：单个 (layer, isotope) 组合的可恢复失败不走这里，
//! 而是作为 `pipeline::SkipReason` 返回。
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 无外部模块依赖

use thiserror::Error;

/// bgnorm 统一错误类型
#[derive(Error, Debug)]
pub enum BgnormError {
    // ─────────────────────────────────────────────────────────────
    // I/O 错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to read file: {path}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: String },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ─────────────────────────────────────────────────────────────
    // 参考表错误（启动阶段致命）
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to load catalog table: {path}\nReason: {reason}")]
    CatalogLoadError { path: String, reason: String },

    // ─────────────────────────────────────────────────────────────
    // 结果文件解析错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to parse {format} file: {path}\nReason: {reason}")]
    ParseError {
        format: String,
        path: String,
        reason: String,
    },

    #[error("Column '{column}' (expected at position {position}) not found in {path}")]
    MissingColumn {
        path: String,
        column: String,
        position: usize,
    },

    // ─────────────────────────────────────────────────────────────
    // 参数错误
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid range format: {0}")]
    InvalidRange(String),

    // ─────────────────────────────────────────────────────────────
    // CSV 错误
    // ─────────────────────────────────────────────────────────────
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    // ─────────────────────────────────────────────────────────────
    // 其他
    // ─────────────────────────────────────────────────────────────
    #[error("Plotting failed: {0}")]
    PlotError(String),
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, BgnormError>;
