// 该文件是 Shanan （山南西风） 项目的一部分。
// src/fps.rs - 滑动窗口帧率估计
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

//! 每路视频流的帧率估计。
//!
//! 帧率按 `样本数 / (最新时间戳 - 最早时间戳)` 计算，
//! 分子用的是样本数而不是间隔数，窗口较小时结果会偏高一点，
//! 例如 2 个间隔 1 秒的样本得到 2.0 FPS。

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Instant;

/// 每路视频流保留的时间戳数量
pub const FPS_WINDOW: usize = 30;

/// 以秒为单位的时钟
pub trait Clock: Send + Sync {
  fn now_secs(&self) -> f64;
}

/// 基于 `Instant` 的单调时钟
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
  start: Instant,
}

impl Default for MonotonicClock {
  fn default() -> Self {
    Self {
      start: Instant::now(),
    }
  }
}

impl Clock for MonotonicClock {
  fn now_secs(&self) -> f64 {
    self.start.elapsed().as_secs_f64()
  }
}

pub fn format_fps(fps: f64) -> String {
  format!("FPS: {:.1}", fps)
}

/// 按视频流编号保存最近的帧到达时间
///
/// 映射由一把锁保护，可以被多个流水线线程同时调用。
#[derive(Debug, Default)]
pub struct FpsEstimator {
  history: Mutex<HashMap<u32, VecDeque<f64>>>,
}

impl FpsEstimator {
  pub fn new() -> Self {
    Self::default()
  }

  /// 记录一帧的到达时间并返回该流当前的帧率
  pub fn record(&self, stream_id: u32, timestamp: f64) -> f64 {
    let mut history = self
      .history
      .lock()
      .unwrap_or_else(|poisoned| poisoned.into_inner());
    let samples = history
      .entry(stream_id)
      .or_insert_with(|| VecDeque::with_capacity(FPS_WINDOW + 1));

    samples.push_back(timestamp);
    while samples.len() > FPS_WINDOW {
      samples.pop_front();
    }

    window_fps(samples)
  }

  pub fn samples(&self, stream_id: u32) -> Vec<f64> {
    let history = self
      .history
      .lock()
      .unwrap_or_else(|poisoned| poisoned.into_inner());
    history
      .get(&stream_id)
      .map(|samples| samples.iter().copied().collect())
      .unwrap_or_default()
  }
}

fn window_fps(samples: &VecDeque<f64>) -> f64 {
  let (Some(oldest), Some(newest)) = (samples.front(), samples.back()) else {
    return 0.0;
  };
  if samples.len() < 2 {
    return 0.0;
  }

  let span = newest - oldest;
  if span > 0.0 {
    samples.len() as f64 / span
  } else {
    0.0
  }
}
