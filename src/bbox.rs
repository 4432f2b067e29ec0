// 该文件是 Shanan （山南西风） 项目的一部分。
// src/bbox.rs - 边界框缩放与裁剪
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

use crate::meta::{BBox, ModelGeometry, SourceGeometry};

/// 模型输入坐标到源分辨率坐标的缩放系数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleFactors {
  pub x: f32,
  pub y: f32,
}

impl ScaleFactors {
  pub fn between(model: ModelGeometry, source: SourceGeometry) -> Self {
    Self {
      x: source.width() as f32 / model.width() as f32,
      y: source.height() as f32 / model.height() as f32,
    }
  }
}

/// 将边界框从模型输入坐标缩放到源分辨率坐标，然后裁剪到画面内
pub fn rescale_and_clamp(bbox: &mut BBox, scale: ScaleFactors, source: SourceGeometry) {
  bbox.left *= scale.x;
  bbox.width *= scale.x;
  bbox.top *= scale.y;
  bbox.height *= scale.y;

  clamp_to_source(bbox, source);
}

/// 按 left、top、width、height 的顺序裁剪
///
/// 裁剪后满足 `0 <= left <= W-1`、`0 <= top <= H-1`、
/// `left + width <= W`、`top + height <= H`。
/// 对已经裁剪过的边界框再次调用不会改变它。坐标中不能有 NaN。
pub fn clamp_to_source(bbox: &mut BBox, source: SourceGeometry) {
  let source_w = source.width() as f32;
  let source_h = source.height() as f32;

  bbox.left = bbox.left.clamp(0.0, source_w - 1.0);
  bbox.top = bbox.top.clamp(0.0, source_h - 1.0);
  bbox.width = fit_extent(bbox.left, bbox.width.clamp(0.0, source_w - bbox.left), source_w);
  bbox.height = fit_extent(bbox.top, bbox.height.clamp(0.0, source_h - bbox.top), source_h);
}

/// 取整到像素网格，返回 `(left, top, width, height)`
///
/// 右、下边缘向下取整，原点四舍五入后不超过该边缘，
/// 所以裁剪过的边界框取整后仍在画面内。
pub fn pixel_rect(bbox: &BBox) -> (u32, u32, u32, u32) {
  let (left, width) = pixel_span(bbox.left, bbox.width);
  let (top, height) = pixel_span(bbox.top, bbox.height);
  (left, top, width, height)
}

fn pixel_span(origin: f32, extent: f32) -> (u32, u32) {
  let origin = origin.max(0.0);
  let end = (origin + extent.max(0.0)).floor();
  let start = origin.round().min(end);
  (start as u32, (end - start) as u32)
}

// origin + extent 的舍入结果可能比 limit 大一个 ulp
fn fit_extent(origin: f32, extent: f32, limit: f32) -> f32 {
  let mut extent = extent;
  while extent > 0.0 && origin + extent > limit {
    extent = f32::from_bits(extent.to_bits() - 1);
  }
  extent
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::meta::Frame;
  use approx::assert_abs_diff_eq;
  use rand::{Rng, SeedableRng, rngs::StdRng};

  fn source(width: u32, height: u32) -> SourceGeometry {
    SourceGeometry::of_frame(&Frame::new(0, 0, width, height)).unwrap()
  }

  fn assert_inside(bbox: &BBox, source: SourceGeometry) {
    let (w, h) = (source.width() as f32, source.height() as f32);
    assert!(bbox.left >= 0.0 && bbox.left <= w - 1.0, "left: {:?}", bbox);
    assert!(bbox.top >= 0.0 && bbox.top <= h - 1.0, "top: {:?}", bbox);
    assert!(bbox.width >= 0.0 && bbox.left + bbox.width <= w, "width: {:?}", bbox);
    assert!(bbox.height >= 0.0 && bbox.top + bbox.height <= h, "height: {:?}", bbox);
  }

  #[test]
  fn test_scale_factors() {
    let model = ModelGeometry::new(640, 640).unwrap();
    let scale = ScaleFactors::between(model, source(1920, 1080));
    assert_abs_diff_eq!(scale.x, 3.0, epsilon = 1e-6);
    assert_abs_diff_eq!(scale.y, 1.6875, epsilon = 1e-6);
  }

  #[test]
  fn test_rescale_inside_frame() {
    let model = ModelGeometry::new(640, 640).unwrap();
    let src = source(1920, 1080);
    let mut bbox = BBox::new(100.0, 200.0, 50.0, 40.0);
    rescale_and_clamp(&mut bbox, ScaleFactors::between(model, src), src);

    assert_abs_diff_eq!(bbox.left, 300.0, epsilon = 1e-3);
    assert_abs_diff_eq!(bbox.top, 337.5, epsilon = 1e-3);
    assert_abs_diff_eq!(bbox.width, 150.0, epsilon = 1e-3);
    assert_abs_diff_eq!(bbox.height, 67.5, epsilon = 1e-3);
  }

  #[test]
  fn test_rescale_overflowing_box() {
    let model = ModelGeometry::new(640, 640).unwrap();
    let src = source(1280, 720);
    let mut bbox = BBox::new(600.0, -20.0, 100.0, 700.0);
    rescale_and_clamp(&mut bbox, ScaleFactors::between(model, src), src);

    assert_abs_diff_eq!(bbox.left, 1200.0, epsilon = 1e-3);
    assert_abs_diff_eq!(bbox.width, 80.0, epsilon = 1e-3);
    assert_eq!(bbox.top, 0.0);
    assert_abs_diff_eq!(bbox.height, 720.0, epsilon = 1e-3);
    assert_inside(&bbox, src);
  }

  #[test]
  fn test_left_beyond_right_edge() {
    let src = source(100, 100);
    let mut bbox = BBox::new(250.0, 250.0, 30.0, 30.0);
    clamp_to_source(&mut bbox, src);

    assert_eq!(bbox.left, 99.0);
    assert_eq!(bbox.top, 99.0);
    assert_eq!(bbox.width, 1.0);
    assert_eq!(bbox.height, 1.0);
  }

  #[test]
  fn test_negative_extent_clamped_to_zero() {
    let src = source(100, 100);
    let mut bbox = BBox::new(10.0, 10.0, -5.0, -1.0);
    clamp_to_source(&mut bbox, src);
    assert_eq!(bbox.width, 0.0);
    assert_eq!(bbox.height, 0.0);
  }

  #[test]
  fn test_random_boxes_stay_inside_source() {
    let mut rng = StdRng::seed_from_u64(0x5eed_0b0c);

    for _ in 0..20_000 {
      let model = ModelGeometry::new(rng.gen_range(1..=2048), rng.gen_range(1..=2048)).unwrap();
      let src = source(rng.gen_range(1..=4096), rng.gen_range(1..=4096));
      let mut bbox = BBox::new(
        rng.gen_range(-4096.0..8192.0),
        rng.gen_range(-4096.0..8192.0),
        rng.gen_range(-4096.0..8192.0),
        rng.gen_range(-4096.0..8192.0),
      );

      rescale_and_clamp(&mut bbox, ScaleFactors::between(model, src), src);
      assert_inside(&bbox, src);
    }
  }

  #[test]
  fn test_pixel_rect_right_edge_inside_source() {
    let model = ModelGeometry::new(640, 640).unwrap();
    let src = source(1920, 1080);
    let mut bbox = BBox::new(33.5, 0.0, 700.0, 10.0);
    rescale_and_clamp(&mut bbox, ScaleFactors::between(model, src), src);
    assert_abs_diff_eq!(bbox.left, 100.5, epsilon = 1e-3);
    assert_abs_diff_eq!(bbox.width, 1819.5, epsilon = 1e-3);

    let (left, top, width, height) = pixel_rect(&bbox);
    assert_eq!((left, width), (101, 1819));
    assert_eq!((top, height), (0, 16));
    assert!(left + width <= 1920);
  }

  #[test]
  fn test_random_pixel_rects_stay_inside_source() {
    let mut rng = StdRng::seed_from_u64(0x5eed_9e1);

    for _ in 0..20_000 {
      let (w, h) = (rng.gen_range(1..=4096u32), rng.gen_range(1..=4096u32));
      let src = source(w, h);
      let mut bbox = BBox::new(
        rng.gen_range(-100.0..5000.0),
        rng.gen_range(-100.0..5000.0),
        rng.gen_range(-100.0..5000.0),
        rng.gen_range(-100.0..5000.0),
      );
      clamp_to_source(&mut bbox, src);

      let (left, top, width, height) = pixel_rect(&bbox);
      assert!(left + width <= w, "{:?} -> {:?} in {}x{}", bbox, (left, width), w, h);
      assert!(top + height <= h, "{:?} -> {:?} in {}x{}", bbox, (top, height), w, h);
    }
  }

  #[test]
  fn test_clamp_is_idempotent() {
    let mut rng = StdRng::seed_from_u64(42);

    for _ in 0..20_000 {
      let src = source(rng.gen_range(1..=4096), rng.gen_range(1..=4096));
      let mut bbox = BBox::new(
        rng.gen_range(-100.0..5000.0),
        rng.gen_range(-100.0..5000.0),
        rng.gen_range(-100.0..5000.0),
        rng.gen_range(-100.0..5000.0),
      );
      clamp_to_source(&mut bbox, src);

      let once = bbox;
      clamp_to_source(&mut bbox, src);
      assert_eq!(once, bbox);
    }
  }
}
