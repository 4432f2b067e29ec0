// 该文件是 Shanan （山南西风） 项目的一部分。
// src/pipeline/probe.rs - 元数据规范化探针
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

use std::sync::Arc;

use gstreamer::{self as gst, prelude::*};
use tracing::{info, warn};

use crate::fps::Clock;
use crate::meta::FrameBatch;
use crate::normalizer::{MetadataNormalizer, ProbeReturn};
use crate::pipeline::bridge::BatchMetaBridge;
use crate::pipeline::build::{PipelineError, model_geometry, static_pad};

impl From<ProbeReturn> for gst::PadProbeReturn {
  fn from(value: ProbeReturn) -> Self {
    match value {
      ProbeReturn::Ok => gst::PadProbeReturn::Ok,
    }
  }
}

/// 在元素的 sink pad 上安装缓冲区探针
///
/// 每个缓冲区上的批次元数据经 `bridge` 读出、规范化后写回，缓冲区始终放行。
/// 模型输入分辨率取自该 pad 当前协商的 caps。
pub fn attach_normalizer<C: Clock + 'static, B: BatchMetaBridge>(
  element: &gst::Element,
  normalizer: Arc<MetadataNormalizer<C>>,
  bridge: B,
) -> Result<gst::PadProbeId, PipelineError> {
  let pad = static_pad(element, "sink")?;

  let probe = pad.add_probe(gst::PadProbeType::BUFFER, move |pad, info| {
    let model = match model_geometry(pad) {
      Ok(model) => model,
      Err(e) => {
        warn!("无法获取模型输入分辨率: {}", e);
        return gst::PadProbeReturn::Ok;
      }
    };

    let Some(gst::PadProbeData::Buffer(ref mut buffer)) = info.data else {
      return normalizer.process_batch(None, model).into();
    };

    bridge
      .with_batch(buffer, &mut |batch: Option<&mut FrameBatch>| {
        normalizer.process_batch(batch, model)
      })
      .into()
  });

  let probe = probe.ok_or_else(|| PipelineError::ProbeFailed(pad.name().to_string()))?;
  info!("已在 {} 的 sink pad 上安装规范化探针", element.name());
  Ok(probe)
}
