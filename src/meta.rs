// 该文件是 Shanan （山南西风） 项目的一部分。
// src/meta.rs - 帧批次元数据定义
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

//! 推理框架输出的逐帧检测元数据。
//!
//! 外部框架的对象图在边界处转换为这里的类型化记录，
//! 归一化逻辑只依赖这些记录。

use thiserror::Error;

/// 叠加文本的默认样式
pub const OVERLAY_X_OFFSET: u32 = 10;
pub const OVERLAY_Y_OFFSET: u32 = 20;
pub const OVERLAY_FONT_SIZE: u32 = 16;
pub const OVERLAY_FONT_NAME: &str = "Serif";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
  #[error("模型输入尺寸不能为零: {width}x{height}")]
  ZeroModelDimension { width: u32, height: u32 },
  #[error("视频源 {stream_id} 的分辨率无效: {width}x{height}")]
  ZeroSourceDimension {
    stream_id: u32,
    width: u32,
    height: u32,
  },
}

/// 边界框，`{left, top, width, height}`，单位为像素
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BBox {
  pub left: f32,
  pub top: f32,
  pub width: f32,
  pub height: f32,
}

impl BBox {
  pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
    Self {
      left,
      top,
      width,
      height,
    }
  }

  pub fn is_finite(&self) -> bool {
    self.left.is_finite() && self.top.is_finite() && self.width.is_finite() && self.height.is_finite()
  }
}

/// 模型输入分辨率，整个运行期间固定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelGeometry {
  width: u32,
  height: u32,
}

impl ModelGeometry {
  pub fn new(width: u32, height: u32) -> Result<Self, GeometryError> {
    if width == 0 || height == 0 {
      return Err(GeometryError::ZeroModelDimension { width, height });
    }
    Ok(Self { width, height })
  }

  pub fn width(&self) -> u32 {
    self.width
  }

  pub fn height(&self) -> u32 {
    self.height
  }
}

/// 视频源原始分辨率
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceGeometry {
  width: u32,
  height: u32,
}

impl SourceGeometry {
  pub fn of_frame(frame: &Frame) -> Result<Self, GeometryError> {
    if frame.source_width == 0 || frame.source_height == 0 {
      return Err(GeometryError::ZeroSourceDimension {
        stream_id: frame.stream_id,
        width: frame.source_width,
        height: frame.source_height,
      });
    }
    Ok(Self {
      width: frame.source_width,
      height: frame.source_height,
    })
  }

  pub fn width(&self) -> u32 {
    self.width
  }

  pub fn height(&self) -> u32 {
    self.height
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelInfo {
  pub label: String,
  /// 上游给出的概率，不保证落在 [0, 1]
  pub probability: f32,
}

impl LabelInfo {
  pub fn new(label: impl Into<String>, probability: f32) -> Self {
    Self {
      label: label.into(),
      probability,
    }
  }
}

/// 一个二级分类器对目标给出的结果
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClassifierResult {
  pub labels: Vec<LabelInfo>,
}

impl ClassifierResult {
  pub fn new(labels: Vec<LabelInfo>) -> Self {
    Self { labels }
  }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DetectedObject {
  pub class_id: i32,
  pub confidence: f32,
  pub bbox: BBox,
  pub classifiers: Vec<ClassifierResult>,
  pub display_text: Option<String>,
}

impl DetectedObject {
  pub fn new(class_id: i32, confidence: f32, bbox: BBox) -> Self {
    Self {
      class_id,
      confidence,
      bbox,
      classifiers: Vec::new(),
      display_text: None,
    }
  }

  pub fn with_classifier(mut self, classifier: ClassifierResult) -> Self {
    self.classifiers.push(classifier);
    self
  }
}

/// 帧级叠加文本
#[derive(Debug, Clone, PartialEq)]
pub struct TextOverlay {
  pub text: String,
  pub x_offset: u32,
  pub y_offset: u32,
  pub font_name: String,
  pub font_size: u32,
  /// RGBA, 0.0 - 1.0
  pub font_color: [f64; 4],
}

impl TextOverlay {
  pub fn new(text: impl Into<String>) -> Self {
    Self {
      text: text.into(),
      x_offset: OVERLAY_X_OFFSET,
      y_offset: OVERLAY_Y_OFFSET,
      font_name: OVERLAY_FONT_NAME.to_string(),
      font_size: OVERLAY_FONT_SIZE,
      font_color: [1.0, 1.0, 1.0, 1.0],
    }
  }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
  pub frame_number: u64,
  pub stream_id: u32,
  pub source_width: u32,
  pub source_height: u32,
  pub objects: Vec<DetectedObject>,
  pub overlays: Vec<TextOverlay>,
}

impl Frame {
  pub fn new(stream_id: u32, frame_number: u64, source_width: u32, source_height: u32) -> Self {
    Self {
      frame_number,
      stream_id,
      source_width,
      source_height,
      objects: Vec::new(),
      overlays: Vec::new(),
    }
  }

  pub fn with_object(mut self, object: DetectedObject) -> Self {
    self.objects.push(object);
    self
  }
}

/// 一次解码周期产生的帧批次，只在单次回调内有效
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FrameBatch {
  pub frames: Vec<Frame>,
}

impl FrameBatch {
  pub fn new(frames: Vec<Frame>) -> Self {
    Self { frames }
  }

  pub fn is_empty(&self) -> bool {
    self.frames.is_empty()
  }
}
