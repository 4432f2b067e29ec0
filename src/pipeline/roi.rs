// 该文件是 Shanan （山南西风） 项目的一部分。
// src/pipeline/roi.rs - ROI 元数据与帧记录之间的转换
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

//! 缓冲区上的 `GstVideoRegionOfInterestMeta` 与 [`FrameBatch`] 之间的转换。
//!
//! DeepStream 元素不读写这种元数据，实际管道使用 `NvDsBridge`。
//! [`RoiBridge`] 只在没有 DeepStream 的环境里驱动同一套规范化回调，
//! 主要用于测试。
//!
//! 每个检测目标对应一个 ROI，参数结构约定如下：
//!
//! - `detection`：`class-id` (i32)、`confidence` (f64)、`stream-id` (u32，缺省为 0)
//! - `classification`：`classifier-id` (u32，缺省为 0)、`label` (string)、`prob` (f64)，
//!   同一分类器编号的标签按出现顺序归为一组
//!
//! 写回时在目标 ROI 上更新矩形，并追加 `normalized-rect` 与 `display-text` 参数；
//! 每帧的文字叠加写成类型为 `overlay` 的独立 ROI。

use gstreamer as gst;
use gstreamer_video as gst_video;
use thiserror::Error;
use tracing::warn;

use crate::bbox::pixel_rect;
use crate::meta::{
  BBox, ClassifierResult, DetectedObject, Frame, FrameBatch, LabelInfo, SourceGeometry,
};
use crate::normalizer::ProbeReturn;
use crate::pipeline::bridge::BatchMetaBridge;
use crate::pipeline::registry::SourceRegistry;

pub const ROI_TYPE_OVERLAY: &str = "overlay";
pub const PARAM_DETECTION: &str = "detection";
pub const PARAM_CLASSIFICATION: &str = "classification";
pub const PARAM_DISPLAY_TEXT: &str = "display-text";
pub const PARAM_NORMALIZED_RECT: &str = "normalized-rect";

#[derive(Error, Debug)]
pub enum RoiError {
  #[error("ROI {roi_id} 缺少 {param} 参数")]
  MissingParam { roi_id: i32, param: &'static str },
  #[error("ROI {roi_id} 的字段 {field} 无效: {message}")]
  Field {
    roi_id: i32,
    field: &'static str,
    message: String,
  },
}

/// 读取出的批次，以及每个 ROI 对应的 (帧下标, 目标下标)
#[derive(Debug, Default)]
pub struct RoiBatch {
  pub batch: FrameBatch,
  slots: Vec<Option<(usize, usize)>>,
}

fn field_error<E: std::fmt::Display>(roi_id: i32, field: &'static str) -> impl FnOnce(E) -> RoiError {
  move |e| RoiError::Field {
    roi_id,
    field,
    message: e.to_string(),
  }
}

fn optional_u32(roi_id: i32, structure: &gst::StructureRef, name: &'static str) -> Result<u32, RoiError> {
  structure
    .get_optional::<u32>(name)
    .map(|value| value.unwrap_or(0))
    .map_err(field_error(roi_id, name))
}

fn object_from_roi(roi: &gst_video::VideoRegionOfInterestMeta) -> Result<(u32, DetectedObject), RoiError> {
  let roi_id = roi.id();
  let detection = roi.param(PARAM_DETECTION).ok_or(RoiError::MissingParam {
    roi_id,
    param: PARAM_DETECTION,
  })?;

  let class_id = detection
    .get::<i32>("class-id")
    .map_err(field_error(roi_id, "class-id"))?;
  let confidence = detection
    .get::<f64>("confidence")
    .map_err(field_error(roi_id, "confidence"))? as f32;
  let stream_id = optional_u32(roi_id, detection, "stream-id")?;

  let (x, y, w, h) = roi.rect();
  let mut object = DetectedObject::new(
    class_id,
    confidence,
    BBox::new(x as f32, y as f32, w as f32, h as f32),
  );

  let mut groups: Vec<(u32, Vec<LabelInfo>)> = Vec::new();
  for param in roi.params().filter(|s| s.has_name(PARAM_CLASSIFICATION)) {
    let classifier_id = optional_u32(roi_id, param, "classifier-id")?;
    let label = param
      .get::<String>("label")
      .map_err(field_error(roi_id, "label"))?;
    let probability = param
      .get::<f64>("prob")
      .map_err(field_error(roi_id, "prob"))? as f32;

    let info = LabelInfo::new(label, probability);
    match groups.iter_mut().find(|(id, _)| *id == classifier_id) {
      Some((_, labels)) => labels.push(info),
      None => groups.push((classifier_id, vec![info])),
    }
  }
  object.classifiers = groups
    .into_iter()
    .map(|(_, labels)| ClassifierResult::new(labels))
    .collect();

  Ok((stream_id, object))
}

fn frame_index(frames: &mut Vec<Frame>, stream_id: u32, registry: &SourceRegistry) -> usize {
  match frames.iter().position(|f| f.stream_id == stream_id) {
    Some(index) => index,
    None => {
      frames.push(registry.next_frame(stream_id));
      frames.len() - 1
    }
  }
}

/// 把缓冲区上的 ROI 转换为帧记录
///
/// 只有缓冲区中出现过的视频流才会得到一帧。
/// 格式不正确的 ROI 记录警告后跳过。
pub fn read_batch(buffer: &gst::BufferRef, registry: &SourceRegistry) -> RoiBatch {
  let mut frames: Vec<Frame> = Vec::new();
  let mut slots = Vec::new();

  for roi in buffer.iter_meta::<gst_video::VideoRegionOfInterestMeta>() {
    if roi.roi_type() == ROI_TYPE_OVERLAY {
      slots.push(None);
      continue;
    }

    match object_from_roi(&roi) {
      Ok((stream_id, object)) => {
        let index = frame_index(&mut frames, stream_id, registry);
        frames[index].objects.push(object);
        slots.push(Some((index, frames[index].objects.len() - 1)));
      }
      Err(e) => {
        warn!("跳过目标: {}", e);
        slots.push(None);
      }
    }
  }

  RoiBatch {
    batch: FrameBatch::new(frames),
    slots,
  }
}

/// 把规范化后的目标与文字叠加写回缓冲区
///
/// 分辨率无效的帧与坐标不是有限值的目标保持原样。
pub fn write_batch(buffer: &mut gst::BufferRef, roi_batch: &RoiBatch) {
  let frames = &roi_batch.batch.frames;

  for (mut roi, slot) in buffer
    .iter_meta_mut::<gst_video::VideoRegionOfInterestMeta>()
    .zip(roi_batch.slots.iter())
  {
    let Some((frame_index, object_index)) = *slot else {
      continue;
    };
    let frame = &frames[frame_index];
    let object = &frame.objects[object_index];
    if SourceGeometry::of_frame(frame).is_err() || !object.bbox.is_finite() {
      continue;
    }

    roi.set_rect(pixel_rect(&object.bbox));
    roi.add_param(
      gst::Structure::builder(PARAM_NORMALIZED_RECT)
        .field("left", object.bbox.left as f64)
        .field("top", object.bbox.top as f64)
        .field("width", object.bbox.width as f64)
        .field("height", object.bbox.height as f64)
        .build(),
    );
    if let Some(text) = &object.display_text {
      roi.add_param(
        gst::Structure::builder(PARAM_DISPLAY_TEXT)
          .field("text", text.as_str())
          .build(),
      );
    }
  }

  for frame in frames {
    for overlay in &frame.overlays {
      let mut meta = gst_video::VideoRegionOfInterestMeta::add(
        buffer,
        ROI_TYPE_OVERLAY,
        (overlay.x_offset, overlay.y_offset, 0, 0),
      );
      meta.add_param(
        gst::Structure::builder(PARAM_DISPLAY_TEXT)
          .field("text", overlay.text.as_str())
          .field("stream-id", frame.stream_id)
          .field("font-name", overlay.font_name.as_str())
          .field("font-size", overlay.font_size)
          .field("font-color", gst::Array::new(overlay.font_color))
          .build(),
      );
    }
  }
}

/// 通过 ROI 元数据读写批次，缓冲区在回调中被设为可写
#[derive(Debug, Clone, Default)]
pub struct RoiBridge {
  registry: SourceRegistry,
}

impl RoiBridge {
  pub fn new(registry: SourceRegistry) -> Self {
    Self { registry }
  }
}

impl BatchMetaBridge for RoiBridge {
  fn with_batch(
    &self,
    buffer: &mut gst::Buffer,
    normalize: &mut dyn FnMut(Option<&mut FrameBatch>) -> ProbeReturn,
  ) -> ProbeReturn {
    let buffer = buffer.make_mut();
    let mut roi_batch = read_batch(buffer, &self.registry);
    let verdict = normalize(Some(&mut roi_batch.batch));
    write_batch(buffer, &roi_batch);
    verdict
  }
}
