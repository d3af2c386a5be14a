//! # 批量执行器
//!
//! 并行执行互相独立的 (layer, isotope) 任务。
//!
//! ## 功能
//! - 基于 rayon 的并行迭代，结果顺序与输入一致
//! - 进度条显示
//! - 线程池创建失败时退回顺序执行
//!
//! ## 依赖关系
//! - 被 `pipeline/mod.rs` 调用
//! - 使用 `utils/progress.rs` 创建进度条
//! - 使用 `rayon` 进行并行计算

use crate::utils::progress;

use rayon::prelude::*;

/// 批量执行器
#[derive(Debug, Clone, Copy)]
pub struct BatchRunner {
    /// 并行作业数
    jobs: usize,
    /// 是否显示进度条
    show_progress: bool,
}

impl BatchRunner {
    /// 创建新的批量执行器（`jobs == 0` 时使用全部 CPU）
    pub fn new(jobs: usize) -> Self {
        let jobs = if jobs == 0 { num_cpus::get() } else { jobs };
        Self {
            jobs,
            show_progress: true,
        }
    }

    /// 关闭进度条
    #[cfg(test)]
    pub fn quiet(mut self) -> Self {
        self.show_progress = false;
        self
    }

    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// 并行处理任务列表，返回值与输入一一对应
    pub fn run<T, R, F>(&self, items: &[T], message: &str, processor: F) -> Vec<R>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> R + Sync + Send,
    {
        let pb = if self.show_progress {
            progress::create_progress_bar(items.len() as u64, message)
        } else {
            indicatif::ProgressBar::hidden()
        };

        let task = |item: &T| {
            let result = processor(item);
            pb.inc(1);
            result
        };

        // 配置 rayon 线程池
        let results: Vec<R> = match rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs)
            .build()
        {
            Ok(pool) => pool.install(|| items.par_iter().map(task).collect()),
            Err(e) => {
                log::warn!("thread pool unavailable, running sequentially: {}", e);
                items.iter().map(task).collect()
            }
        };

        pb.finish_and_clear();
        results
    }
}
