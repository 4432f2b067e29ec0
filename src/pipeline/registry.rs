// 该文件是 Shanan （山南西风） 项目的一部分。
// src/pipeline/registry.rs - 视频源登记
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

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use tracing::info;

use crate::meta::Frame;

#[derive(Debug, Default, Clone, Copy)]
struct SourceState {
  width: u32,
  height: u32,
  frames_seen: u64,
}

/// 各路视频源的原始分辨率与帧计数
///
/// 分辨率在解码器协商 caps 时写入，探针回调中读取，克隆后共享同一份数据。
#[derive(Debug, Default, Clone)]
pub struct SourceRegistry {
  sources: Arc<Mutex<BTreeMap<u32, SourceState>>>,
}

impl SourceRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<u32, SourceState>> {
    self
      .sources
      .lock()
      .unwrap_or_else(|poisoned| poisoned.into_inner())
  }

  /// 登记视频源，分辨率未知时为 0x0
  pub fn register(&self, stream_id: u32) {
    self.lock().entry(stream_id).or_default();
  }

  pub fn update_resolution(&self, stream_id: u32, width: u32, height: u32) {
    let mut sources = self.lock();
    let state = sources.entry(stream_id).or_default();
    if (state.width, state.height) != (width, height) {
      info!("视频源 {} 分辨率: {}x{}", stream_id, width, height);
      state.width = width;
      state.height = height;
    }
  }

  pub fn resolution(&self, stream_id: u32) -> Option<(u32, u32)> {
    self
      .lock()
      .get(&stream_id)
      .map(|state| (state.width, state.height))
  }

  /// 为该视频源生成下一帧的记录，帧号从 0 开始递增
  pub fn next_frame(&self, stream_id: u32) -> Frame {
    let mut sources = self.lock();
    let state = sources.entry(stream_id).or_default();
    let frame = Frame::new(stream_id, state.frames_seen, state.width, state.height);
    state.frames_seen += 1;
    frame
  }
}
