//! # 美化输出工具
//!
//! 终端状态行与结果行的统一样式。状态行写到 stdout，错误写到 stderr；
//! 诊断细节走 `log`，不在这里输出。
//!
//! ## 依赖关系
//! - 被 `commands/`, `report/summary.rs`, `main.rs` 使用
//! - 使用 `colored` crate

use colored::Colorize;

/// 打印成功消息
pub fn print_success(msg: &str) {
    println!("{} {}", "[OK]".green().bold(), msg);
}

/// 打印错误消息
pub fn print_error(msg: &str) {
    eprintln!("{} {}", "[ERR]".red().bold(), msg);
}

/// 打印警告消息
pub fn print_warning(msg: &str) {
    println!("{} {}", "[WARN]".yellow().bold(), msg);
}

/// 打印信息消息
pub fn print_info(msg: &str) {
    println!("{} {}", "[*]".blue().bold(), msg);
}

/// 打印跳过消息
pub fn print_skip(msg: &str) {
    println!("{} {}", "[SKIP]".dimmed(), msg);
}

/// 打印 `值 ± 不确定度 单位`
pub fn print_rate(label: &str, rate: f64, uncertainty: f64, unit: &str) {
    println!(
        "  {} {} {} {} {}",
        format!("{}:", label).bold(),
        format!("{:.4e}", rate).cyan(),
        "±".dimmed(),
        format!("{:.4e}", uncertainty).cyan(),
        unit.dimmed()
    );
}

/// 打印完成消息
pub fn print_done(msg: &str) {
    println!("{} {}", "[DONE]".green().bold(), msg);
}

/// 打印标题栏
pub fn print_header(title: &str) {
    let line = "─".repeat(60);
    println!("\n{}", line.dimmed());
    println!("  {}", title.bold());
    println!("{}\n", line.dimmed());
}
