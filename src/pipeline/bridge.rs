// 该文件是 Shanan （山南西风） 项目的一部分。
// src/pipeline/bridge.rs - 缓冲区元数据桥接
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

use gstreamer as gst;

use crate::meta::FrameBatch;
use crate::normalizer::ProbeReturn;

/// 把缓冲区上的框架元数据转换为 [`FrameBatch`]，交给回调处理后再写回
///
/// 缓冲区上没有批次元数据时以 `None` 调用回调。
pub trait BatchMetaBridge: Send + Sync + 'static {
  fn with_batch(
    &self,
    buffer: &mut gst::Buffer,
    normalize: &mut dyn FnMut(Option<&mut FrameBatch>) -> ProbeReturn,
  ) -> ProbeReturn;
}
