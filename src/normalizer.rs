// 该文件是 Shanan （山南西风） 项目的一部分。
// src/normalizer.rs - 逐批次元数据归一化
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

//! # 元数据归一化
//!
//! 流水线每到达一个批次调用一次 [`MetadataNormalizer::process_batch`]：
//!
//! 1. 按到达顺序遍历帧，校验源分辨率；
//! 2. 开启帧率叠加时，为每帧生成一条 `FPS: x.x` 文本；
//! 3. 按顺序遍历目标，缩放并裁剪边界框，选择显示标签，输出一条结构化日志。
//!
//! 单帧或单个目标出错只会被记录并跳过，不会中断整个批次，
//! 返回值始终是 [`ProbeReturn::Ok`]。
//!
//! ```
//! use shanan_osd::meta::{BBox, DetectedObject, Frame, FrameBatch, ModelGeometry};
//! use shanan_osd::normalizer::{MetadataNormalizer, ProbeReturn};
//!
//! let normalizer = MetadataNormalizer::new();
//! let model = ModelGeometry::new(640, 640).unwrap();
//! let mut batch = FrameBatch::new(vec![
//!   Frame::new(0, 1, 1280, 720).with_object(DetectedObject::new(0, 0.9, BBox::new(10.0, 10.0, 20.0, 20.0))),
//! ]);
//!
//! assert_eq!(normalizer.process_batch(Some(&mut batch), model), ProbeReturn::Ok);
//! assert_eq!(batch.frames[0].objects[0].bbox.left, 20.0);
//! ```

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
  bbox::{ScaleFactors, rescale_and_clamp},
  fps::{Clock, FpsEstimator, MonotonicClock, format_fps},
  label::apply_label,
  meta::{BBox, DetectedObject, Frame, FrameBatch, GeometryError, ModelGeometry, SourceGeometry, TextOverlay},
};

/// 回调返回给外部框架的信号，固定为继续处理
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeReturn {
  Ok,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NormalizeError {
  #[error("帧几何信息错误: {0}")]
  Geometry(#[from] GeometryError),
  #[error("视频源 {stream_id} 第 {frame_number} 帧第 {index} 个目标的边界框不是有限值: {bbox:?}")]
  NonFiniteBox {
    stream_id: u32,
    frame_number: u64,
    index: usize,
    bbox: BBox,
  },
}

/// 单个目标的处理结果摘要
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectSummary {
  pub class_id: i32,
  pub confidence: f32,
  pub bbox: BBox,
  pub label: String,
}

/// 单个批次的处理统计
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
  pub frames: usize,
  pub objects: usize,
  pub skipped_frames: usize,
  pub skipped_objects: usize,
  pub errors: Vec<NormalizeError>,
}

impl BatchReport {
  pub fn is_clean(&self) -> bool {
    self.errors.is_empty()
  }
}

pub struct MetadataNormalizer<C: Clock = MonotonicClock> {
  fps: Option<FpsEstimator>,
  clock: C,
}

impl Default for MetadataNormalizer<MonotonicClock> {
  fn default() -> Self {
    Self::new()
  }
}

impl MetadataNormalizer<MonotonicClock> {
  pub fn new() -> Self {
    Self {
      fps: None,
      clock: MonotonicClock::default(),
    }
  }
}

impl<C: Clock> MetadataNormalizer<C> {
  pub fn with_clock<T: Clock>(self, clock: T) -> MetadataNormalizer<T> {
    MetadataNormalizer {
      fps: self.fps,
      clock,
    }
  }

  /// 开启每路视频流的帧率叠加
  pub fn with_fps_overlay(mut self, estimator: FpsEstimator) -> Self {
    self.fps = Some(estimator);
    self
  }

  pub fn fps_estimator(&self) -> Option<&FpsEstimator> {
    self.fps.as_ref()
  }

  /// 回调入口，批次可以不存在
  pub fn process_batch(&self, batch: Option<&mut FrameBatch>, model: ModelGeometry) -> ProbeReturn {
    match batch {
      Some(batch) => {
        let report = self.normalize_batch(batch, model);
        debug!(
          "批次处理完成: {} 帧 / {} 个目标, 跳过 {} 帧 / {} 个目标",
          report.frames, report.objects, report.skipped_frames, report.skipped_objects
        );
      }
      None => warn!("没有批次元数据"),
    }
    ProbeReturn::Ok
  }

  pub fn normalize_batch(&self, batch: &mut FrameBatch, model: ModelGeometry) -> BatchReport {
    let mut report = BatchReport::default();

    for frame in batch.frames.iter_mut() {
      match self.normalize_frame(frame, model, &mut report) {
        Ok(()) => report.frames += 1,
        Err(e) => {
          warn!("跳过帧: {}", e);
          report.skipped_frames += 1;
          report.errors.push(e);
        }
      }
    }

    report
  }

  fn normalize_frame(
    &self,
    frame: &mut Frame,
    model: ModelGeometry,
    report: &mut BatchReport,
  ) -> Result<(), NormalizeError> {
    let source = SourceGeometry::of_frame(frame)?;
    let scale = ScaleFactors::between(model, source);
    debug!(
      "帧 {} 缩放系数 - X: {:.4}, Y: {:.4}",
      frame.frame_number, scale.x, scale.y
    );

    if let Some(estimator) = &self.fps {
      let fps = estimator.record(frame.stream_id, self.clock.now_secs());
      frame.overlays.push(TextOverlay::new(format_fps(fps)));
      info!(
        "视频流 {} | 帧 {} | FPS: {:.2}",
        frame.stream_id, frame.frame_number, fps
      );
    } else {
      info!("处理帧 {}", frame.frame_number);
    }

    let (stream_id, frame_number) = (frame.stream_id, frame.frame_number);
    for (index, object) in frame.objects.iter_mut().enumerate() {
      let Some(summary) = normalize_object(object, scale, source) else {
        let e = NormalizeError::NonFiniteBox {
          stream_id,
          frame_number,
          index,
          bbox: object.bbox,
        };
        warn!("跳过目标: {}", e);
        report.skipped_objects += 1;
        report.errors.push(e);
        continue;
      };

      info!(
        stream_id,
        frame_number,
        class_id = summary.class_id,
        confidence = summary.confidence,
        left = summary.bbox.left,
        top = summary.bbox.top,
        width = summary.bbox.width,
        height = summary.bbox.height,
        label = %summary.label,
        "目标 Class: {}, Confidence: {:.2}, BBox: [{:.2}, {:.2}, {:.2}, {:.2}] {}",
        summary.class_id,
        summary.confidence,
        summary.bbox.left,
        summary.bbox.top,
        summary.bbox.width,
        summary.bbox.height,
        summary.label
      );
      report.objects += 1;
    }

    Ok(())
  }
}

/// 缩放、裁剪并选择标签，边界框含 NaN 或无穷值时返回 `None` 且不修改目标
fn normalize_object(
  object: &mut DetectedObject,
  scale: ScaleFactors,
  source: SourceGeometry,
) -> Option<ObjectSummary> {
  if !object.bbox.is_finite() {
    return None;
  }

  rescale_and_clamp(&mut object.bbox, scale, source);
  let label = apply_label(object);

  Some(ObjectSummary {
    class_id: object.class_id,
    confidence: object.confidence,
    bbox: object.bbox,
    label,
  })
}
