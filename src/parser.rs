// 该文件是 Shanan （山南西风） 项目的一部分。
// src/parser.rs - MMYOLO 检测输出解析
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

//! 解析 MMYOLO 导出模型的推理输出。
//!
//! 输出层约定：
//! - 第 0 层：`num_dets x 5` 个 `f32`，依次为 `x0, y0, x1, y1, score`，`num_dets` 取自第一维；
//! - 第 1 层：`num_dets` 个 `i32` 类别编号。
//!
//! 解析后按类别分别做一次 NMS，结果按类别编号升序排列。

use thiserror::Error;
use tracing::{debug, warn};

use crate::meta::{BBox, DetectedObject};

const MMYOLO_CLASS_NUM: usize = 3;
const MMYOLO_NMS_IOU_THRESHOLD: f32 = 0.3;
const MMYOLO_DET_STRIDE: usize = 5;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
  #[error("MMYOLO 至少需要 2 个输出层，实际为 {0}")]
  InsufficientLayers(usize),
  #[error("输出层 {index} ({name}) 数据类型错误，期望 {expected}")]
  LayerType {
    index: usize,
    name: String,
    expected: &'static str,
  },
  #[error("输出层 {index} ({name}) 缺少维度信息")]
  MissingDims { index: usize, name: String },
  #[error("输出层 {index} 大小不匹配: 期望至少 {expected} 个元素, 实际 {actual} 个")]
  LayerSize {
    index: usize,
    expected: usize,
    actual: usize,
  },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LayerData<'a> {
  Float(&'a [f32]),
  Int(&'a [i32]),
}

/// 推理输出层视图
#[derive(Debug, Clone, PartialEq)]
pub struct OutputLayer<'a> {
  pub name: &'a str,
  pub dims: Vec<u32>,
  pub data: LayerData<'a>,
}

impl<'a> OutputLayer<'a> {
  fn floats(&self, index: usize) -> Result<&'a [f32], ParseError> {
    match self.data {
      LayerData::Float(data) => Ok(data),
      LayerData::Int(_) => Err(ParseError::LayerType {
        index,
        name: self.name.to_string(),
        expected: "f32",
      }),
    }
  }

  fn ints(&self, index: usize) -> Result<&'a [i32], ParseError> {
    match self.data {
      LayerData::Int(data) => Ok(data),
      LayerData::Float(_) => Err(ParseError::LayerType {
        index,
        name: self.name.to_string(),
        expected: "i32",
      }),
    }
  }
}

/// 网络输入分辨率
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkInfo {
  pub width: u32,
  pub height: u32,
}

/// 检测阈值参数
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionParams {
  pub per_class_threshold: Vec<f32>,
  /// 没有单独配置阈值的类别使用该值
  pub default_threshold: f32,
}

impl DetectionParams {
  pub fn threshold(&self, class_id: usize) -> f32 {
    self
      .per_class_threshold
      .get(class_id)
      .copied()
      .unwrap_or(self.default_threshold)
  }
}

impl Default for DetectionParams {
  fn default() -> Self {
    Self {
      per_class_threshold: Vec::new(),
      default_threshold: 0.25,
    }
  }
}

/// 解析得到的目标，坐标为网络输入像素
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParsedObject {
  pub class_id: usize,
  pub left: f32,
  pub top: f32,
  pub width: f32,
  pub height: f32,
  pub confidence: f32,
}

impl From<ParsedObject> for DetectedObject {
  fn from(obj: ParsedObject) -> Self {
    DetectedObject::new(
      obj.class_id as i32,
      obj.confidence,
      BBox::new(obj.left, obj.top, obj.width, obj.height),
    )
  }
}

pub fn iou(a: &ParsedObject, b: &ParsedObject) -> f32 {
  let x1 = a.left.max(b.left);
  let y1 = a.top.max(b.top);
  let x2 = (a.left + a.width).min(b.left + b.width);
  let y2 = (a.top + a.height).min(b.top + b.height);

  let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
  let union = a.width * a.height + b.width * b.height - inter;
  if union <= 0.0 {
    return 0.0;
  }
  inter / union
}

/// 贪心 NMS，只抑制同类别的目标，返回结果按置信度降序
pub fn non_max_suppression(mut detections: Vec<ParsedObject>, iou_threshold: f32) -> Vec<ParsedObject> {
  detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

  let mut suppressed = vec![false; detections.len()];
  let mut kept = Vec::new();

  for i in 0..detections.len() {
    if suppressed[i] {
      continue;
    }
    kept.push(detections[i]);
    for j in (i + 1)..detections.len() {
      if !suppressed[j]
        && detections[i].class_id == detections[j].class_id
        && iou(&detections[i], &detections[j]) > iou_threshold
      {
        suppressed[j] = true;
      }
    }
  }

  kept
}

#[derive(Debug, Clone, Copy)]
pub struct MmyoloParser {
  num_classes: usize,
  iou_threshold: f32,
}

impl Default for MmyoloParser {
  fn default() -> Self {
    Self {
      num_classes: MMYOLO_CLASS_NUM,
      iou_threshold: MMYOLO_NMS_IOU_THRESHOLD,
    }
  }
}

impl MmyoloParser {
  pub fn num_classes(mut self, num_classes: usize) -> Self {
    self.num_classes = num_classes.max(1);
    self
  }

  pub fn iou_threshold(mut self, iou_threshold: f32) -> Self {
    self.iou_threshold = iou_threshold;
    self
  }

  pub fn parse(
    &self,
    layers: &[OutputLayer<'_>],
    network: NetworkInfo,
    params: &DetectionParams,
  ) -> Result<Vec<ParsedObject>, ParseError> {
    for (i, layer) in layers.iter().enumerate() {
      debug!("输出层 {}: {} | dims: {:?}", i, layer.name, layer.dims);
    }

    if layers.len() < 2 {
      return Err(ParseError::InsufficientLayers(layers.len()));
    }

    let dets = layers[0].floats(0)?;
    let labels = layers[1].ints(1)?;
    let num_dets = *layers[0].dims.first().ok_or_else(|| ParseError::MissingDims {
      index: 0,
      name: layers[0].name.to_string(),
    })? as usize;

    if dets.is_empty() || labels.is_empty() || num_dets == 0 {
      warn!("输出缓冲区中没有检测结果");
      return Ok(Vec::new());
    }

    if dets.len() < num_dets * MMYOLO_DET_STRIDE {
      return Err(ParseError::LayerSize {
        index: 0,
        expected: num_dets * MMYOLO_DET_STRIDE,
        actual: dets.len(),
      });
    }
    if labels.len() < num_dets {
      return Err(ParseError::LayerSize {
        index: 1,
        expected: num_dets,
        actual: labels.len(),
      });
    }

    let candidates = self.decode(&dets[..num_dets * MMYOLO_DET_STRIDE], &labels[..num_dets], network, params);

    let mut objects = Vec::with_capacity(candidates.len());
    for class_id in 0..self.num_classes {
      let class_objects = candidates
        .iter()
        .filter(|obj| obj.class_id == class_id)
        .copied()
        .collect();
      objects.extend(non_max_suppression(class_objects, self.iou_threshold));
    }

    debug!("解析得到 {} 个目标", objects.len());
    for (i, obj) in objects.iter().enumerate() {
      debug!(
        "目标 {} | 类别: {} | 置信度: {} | BBox: [{}, {}, {}, {}]",
        i, obj.class_id, obj.confidence, obj.left, obj.top, obj.width, obj.height
      );
    }

    Ok(objects)
  }

  fn decode(
    &self,
    dets: &[f32],
    labels: &[i32],
    network: NetworkInfo,
    params: &DetectionParams,
  ) -> Vec<ParsedObject> {
    let (net_w, net_h) = (network.width as f32, network.height as f32);
    let mut class_counts = vec![0usize; self.num_classes];
    let mut objects = Vec::new();

    for (det, &label) in dets.chunks_exact(MMYOLO_DET_STRIDE).zip(labels) {
      let class_id = label.clamp(0, self.num_classes as i32 - 1) as usize;
      let [x0, y0, x1, y1, score] = [det[0], det[1], det[2], det[3], det[4]];
      // 宽高取自裁剪前的角点
      let width = x1 - x0;
      let height = y1 - y0;

      debug!(
        "候选框 - 类别: {}, 置信度: {}, W: {}, H: {}",
        class_id, score, width, height
      );

      if score < params.threshold(class_id) {
        continue;
      }

      objects.push(ParsedObject {
        class_id,
        left: x0.clamp(0.0, net_w),
        top: y0.clamp(0.0, net_h),
        width,
        height,
        confidence: score,
      });
      class_counts[class_id] += 1;
    }

    debug!(
      "类别分布: {}",
      class_counts
        .iter()
        .enumerate()
        .map(|(i, n)| format!("类别 {}: {}", i, n))
        .collect::<Vec<_>>()
        .join(" | ")
    );

    objects
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use approx::assert_abs_diff_eq;

  const NETWORK: NetworkInfo = NetworkInfo {
    width: 640,
    height: 640,
  };

  fn layers<'a>(dets: &'a [f32], labels: &'a [i32]) -> Vec<OutputLayer<'a>> {
    vec![
      OutputLayer {
        name: "dets",
        dims: vec![(dets.len() / 5) as u32, 5],
        data: LayerData::Float(dets),
      },
      OutputLayer {
        name: "labels",
        dims: vec![labels.len() as u32],
        data: LayerData::Int(labels),
      },
    ]
  }

  fn object(class_id: usize, left: f32, top: f32, size: f32, confidence: f32) -> ParsedObject {
    ParsedObject {
      class_id,
      left,
      top,
      width: size,
      height: size,
      confidence,
    }
  }

  #[test]
  fn test_iou() {
    let a = object(0, 0.0, 0.0, 10.0, 0.9);
    let b = object(0, 5.0, 5.0, 10.0, 0.8);
    assert_abs_diff_eq!(iou(&a, &b), 25.0 / 175.0, epsilon = 1e-6);
    assert_eq!(iou(&a, &object(0, 20.0, 20.0, 5.0, 0.1)), 0.0);
    assert_eq!(iou(&object(0, 0.0, 0.0, 0.0, 0.1), &object(0, 0.0, 0.0, 0.0, 0.1)), 0.0);
  }

  #[test]
  fn test_nms_suppresses_overlapping_same_class() {
    let kept = non_max_suppression(
      vec![
        object(0, 1.0, 1.0, 10.0, 0.6),
        object(0, 0.0, 0.0, 10.0, 0.9),
        object(0, 100.0, 100.0, 10.0, 0.5),
      ],
      0.3,
    );
    assert_eq!(kept.len(), 2);
    assert_eq!(kept[0].confidence, 0.9);
    assert_eq!(kept[1].confidence, 0.5);
  }

  #[test]
  fn test_nms_keeps_other_classes() {
    let kept = non_max_suppression(
      vec![object(0, 0.0, 0.0, 10.0, 0.9), object(1, 0.0, 0.0, 10.0, 0.8)],
      0.3,
    );
    assert_eq!(kept.len(), 2);
  }

  #[test]
  fn test_insufficient_layers() {
    let dets = [0.0f32; 5];
    let parser = MmyoloParser::default();
    let all = layers(&dets, &[0]);
    assert_eq!(
      parser.parse(&all[..1], NETWORK, &DetectionParams::default()),
      Err(ParseError::InsufficientLayers(1))
    );
  }

  #[test]
  fn test_empty_output() {
    let parser = MmyoloParser::default();
    let result = parser.parse(&layers(&[], &[]), NETWORK, &DetectionParams::default());
    assert_eq!(result, Ok(Vec::new()));
  }

  #[test]
  fn test_layer_size_mismatch() {
    let dets = [10.0f32, 10.0, 20.0, 20.0, 0.9];
    let mut layers = layers(&dets, &[0]);
    layers[0].dims[0] = 3;
    let result = MmyoloParser::default().parse(&layers, NETWORK, &DetectionParams::default());
    assert_eq!(
      result,
      Err(ParseError::LayerSize {
        index: 0,
        expected: 15,
        actual: 5
      })
    );
  }

  #[test]
  fn test_parse_threshold_clamp_and_nms() {
    #[rustfmt::skip]
    let dets = [
      // 类别 1，超出左上角
      -10.0, -4.0, 90.0, 96.0, 0.95,
      // 与上一个重叠，被抑制
      -8.0, -2.0, 92.0, 98.0, 0.80,
      // 类别 0，低于阈值
      200.0, 200.0, 260.0, 260.0, 0.20,
      // 类别编号越界，裁剪为 2
      300.0, 300.0, 340.0, 350.0, 0.70,
      // 类别 0
      400.0, 400.0, 420.0, 430.0, 0.60,
    ];
    let labels = [1, 1, 0, 7, 0];
    let params = DetectionParams {
      per_class_threshold: vec![0.5, 0.5, 0.5],
      default_threshold: 0.5,
    };

    let objects = MmyoloParser::default()
      .parse(&layers(&dets, &labels), NETWORK, &params)
      .unwrap();

    assert_eq!(objects.len(), 3);
    assert_eq!(objects[0].class_id, 0);
    assert_eq!(objects[0].left, 400.0);
    assert_eq!(objects[1].class_id, 1);
    assert_eq!(objects[1].left, 0.0);
    assert_eq!(objects[1].top, 0.0);
    assert_eq!(objects[1].width, 100.0);
    assert_eq!(objects[1].height, 100.0);
    assert_eq!(objects[2].class_id, 2);
    assert_eq!(objects[2].height, 50.0);
  }
}
