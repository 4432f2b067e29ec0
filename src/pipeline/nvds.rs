// 该文件是 Shanan （山南西风） 项目的一部分。
// src/pipeline/nvds.rs - DeepStream 批次元数据
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

//! `nvinfer` 挂在缓冲区上的 `NvDsBatchMeta` 与 [`FrameBatch`] 之间的转换。
//!
//! 下面的结构只声明了 `nvdsmeta.h` / `nvll_osd_struct.h` 中实际访问到的前缀字段，
//! 顺序与 DeepStream 6.x/7.x 的头文件一致。这些结构只通过 DeepStream 分配的指针访问，
//! 不能按值创建后交给 DeepStream。
//!
//! 链接 `nvds_meta` / `nvdsgst_meta` 的部分在 `deepstream` 特性之后。

use std::ffi::{CStr, CString, c_char, c_void};
use std::marker::PhantomData;

use gstreamer::glib;
use tracing::{debug, warn};

use crate::meta::{
  BBox, ClassifierResult, DetectedObject, Frame, FrameBatch, LabelInfo, SourceGeometry,
  TextOverlay,
};
use crate::pipeline::registry::SourceRegistry;

pub const MAX_LABEL_SIZE: usize = 128;
pub const MAX_ELEMENTS_IN_DISPLAY_META: usize = 16;

#[repr(C)]
pub struct NvDsBaseMeta {
  pub batch_meta: *mut NvDsBatchMeta,
  pub meta_type: i32,
  pub u_context: *mut c_void,
  pub copy_func: *mut c_void,
  pub release_func: *mut c_void,
}

#[repr(C)]
pub struct NvDsBatchMeta {
  pub base_meta: NvDsBaseMeta,
  pub max_frames_in_batch: u32,
  pub num_frames_in_batch: u32,
  pub meta_pools: [*mut c_void; 6],
  pub frame_meta_list: *mut glib::ffi::GList,
}

#[repr(C)]
pub struct NvDsFrameMeta {
  pub base_meta: NvDsBaseMeta,
  pub pad_index: u32,
  pub batch_id: u32,
  pub frame_num: i32,
  pub buf_pts: u64,
  pub ntp_timestamp: u64,
  pub source_id: u32,
  pub num_surfaces_per_frame: i32,
  pub source_frame_width: u32,
  pub source_frame_height: u32,
  pub surface_type: u32,
  pub surface_index: u32,
  pub num_obj_meta: u32,
  pub infer_done: i32,
  pub obj_meta_list: *mut glib::ffi::GList,
  pub display_meta_list: *mut glib::ffi::GList,
  pub frame_user_meta_list: *mut glib::ffi::GList,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NvOsdColorParams {
  pub red: f64,
  pub green: f64,
  pub blue: f64,
  pub alpha: f64,
}

#[repr(C)]
pub struct NvOsdRectParams {
  pub left: f32,
  pub top: f32,
  pub width: f32,
  pub height: f32,
  pub border_width: u32,
  pub border_color: NvOsdColorParams,
  pub has_bg_color: u32,
  pub reserved: u32,
  pub bg_color: NvOsdColorParams,
  pub has_color_info: i32,
  pub color_id: i32,
}

#[repr(C)]
pub struct NvOsdMaskParams {
  pub data: *mut f32,
  pub size: u32,
  pub threshold: f32,
  pub width: u32,
  pub height: u32,
}

#[repr(C)]
pub struct NvOsdFontParams {
  pub font_name: *mut c_char,
  pub font_size: u32,
  pub font_color: NvOsdColorParams,
}

#[repr(C)]
pub struct NvOsdTextParams {
  pub display_text: *mut c_char,
  pub x_offset: u32,
  pub y_offset: u32,
  pub font_params: NvOsdFontParams,
  pub set_bg_clr: i32,
  pub text_bg_clr: NvOsdColorParams,
}

#[repr(C)]
pub struct NvBboxCoords {
  pub left: f32,
  pub top: f32,
  pub width: f32,
  pub height: f32,
}

#[repr(C)]
pub struct NvDsObjectMeta {
  pub base_meta: NvDsBaseMeta,
  pub parent: *mut NvDsObjectMeta,
  pub unique_component_id: i32,
  pub class_id: i32,
  pub object_id: u64,
  pub detector_bbox_info: NvBboxCoords,
  pub tracker_bbox_info: NvBboxCoords,
  pub confidence: f32,
  pub tracker_confidence: f32,
  pub rect_params: NvOsdRectParams,
  pub mask_params: NvOsdMaskParams,
  pub text_params: NvOsdTextParams,
  pub obj_label: [c_char; MAX_LABEL_SIZE],
  pub classifier_meta_list: *mut glib::ffi::GList,
}

#[repr(C)]
pub struct NvDsClassifierMeta {
  pub base_meta: NvDsBaseMeta,
  pub num_labels: u32,
  pub unique_component_id: i32,
  pub label_info_list: *mut glib::ffi::GList,
}

#[repr(C)]
pub struct NvDsLabelInfo {
  pub base_meta: NvDsBaseMeta,
  pub num_classes: u32,
  pub result_label: [c_char; MAX_LABEL_SIZE],
  pub p_result_label: *mut c_char,
  pub result_class_id: u32,
  pub label_id: u32,
  pub result_prob: f32,
}

#[repr(C)]
pub struct NvDsDisplayMeta {
  pub base_meta: NvDsBaseMeta,
  pub num_rects: u32,
  pub num_labels: u32,
  pub num_lines: u32,
  pub num_arrows: u32,
  pub num_circles: u32,
  pub rect_params: [NvOsdRectParams; MAX_ELEMENTS_IN_DISPLAY_META],
  pub text_params: [NvOsdTextParams; MAX_ELEMENTS_IN_DISPLAY_META],
}

/// 依次产出 `GList` 节点中的 `data` 指针
pub struct GListIter<T> {
  node: *mut glib::ffi::GList,
  _marker: PhantomData<*mut T>,
}

/// # Safety
///
/// `list` 为空指针或有效的 `GList`，遍历期间链表不被修改，
/// 且每个节点的 `data` 都指向 `T`。
pub unsafe fn glist_iter<T>(list: *mut glib::ffi::GList) -> GListIter<T> {
  GListIter {
    node: list,
    _marker: PhantomData,
  }
}

impl<T> Iterator for GListIter<T> {
  type Item = *mut T;

  fn next(&mut self) -> Option<*mut T> {
    if self.node.is_null() {
      return None;
    }
    // SAFETY: 由 `glist_iter` 的调用方保证
    let node = unsafe { &*self.node };
    self.node = node.next;
    Some(node.data as *mut T)
  }
}

fn fixed_label(label: &[c_char; MAX_LABEL_SIZE]) -> String {
  let bytes: Vec<u8> = label
    .iter()
    .take_while(|&&c| c != 0)
    .map(|&c| c as u8)
    .collect();
  String::from_utf8_lossy(&bytes).into_owned()
}

/// # Safety
///
/// `p_result_label` 为空指针或以 NUL 结尾的字符串。
unsafe fn label_from_meta(info: &NvDsLabelInfo) -> LabelInfo {
  let mut label = fixed_label(&info.result_label);
  if label.is_empty() && !info.p_result_label.is_null() {
    label = unsafe { CStr::from_ptr(info.p_result_label) }
      .to_string_lossy()
      .into_owned();
  }
  LabelInfo::new(label, info.result_prob)
}

/// # Safety
///
/// 目标的分类器与标签链表必须有效。
unsafe fn object_from_meta(obj: &NvDsObjectMeta) -> DetectedObject {
  let rect = &obj.rect_params;
  let mut object = DetectedObject::new(
    obj.class_id,
    obj.confidence,
    BBox::new(rect.left, rect.top, rect.width, rect.height),
  );

  for classifier in unsafe { glist_iter::<NvDsClassifierMeta>(obj.classifier_meta_list) } {
    let classifier = unsafe { &*classifier };
    let labels = unsafe { glist_iter::<NvDsLabelInfo>(classifier.label_info_list) }
      .map(|info| unsafe { label_from_meta(&*info) })
      .collect();
    object.classifiers.push(ClassifierResult::new(labels));
  }

  object
}

/// 读取出的批次，以及每一帧、每个目标对应的元数据指针
#[derive(Debug, Default)]
pub struct NvDsBatch {
  pub batch: FrameBatch,
  frames: Vec<*mut NvDsFrameMeta>,
  objects: Vec<Vec<*mut NvDsObjectMeta>>,
}

impl NvDsBatch {
  /// 与 `batch.frames` 一一对应的帧元数据
  pub fn frame_metas(&self) -> &[*mut NvDsFrameMeta] {
    &self.frames
  }
}

/// 把批次元数据转换为帧记录
///
/// 只产出批次中实际携带的帧。帧元数据没有源分辨率时使用登记表中的值。
///
/// # Safety
///
/// `batch_meta` 指向有效的 `NvDsBatchMeta`，在返回值使用期间保持有效，
/// 且调用方持有元数据锁。
pub unsafe fn read_batch_meta(batch_meta: *mut NvDsBatchMeta, registry: &SourceRegistry) -> NvDsBatch {
  let mut nvds = NvDsBatch::default();

  for frame_ptr in unsafe { glist_iter::<NvDsFrameMeta>((*batch_meta).frame_meta_list) } {
    let frame_meta = unsafe { &*frame_ptr };
    let stream_id = frame_meta.pad_index;
    let (mut width, mut height) = (frame_meta.source_frame_width, frame_meta.source_frame_height);
    if width == 0 || height == 0 {
      if let Some((w, h)) = registry.resolution(stream_id) {
        (width, height) = (w, h);
      }
    }

    let frame_number = u64::try_from(frame_meta.frame_num).unwrap_or(0);
    let mut frame = Frame::new(stream_id, frame_number, width, height);
    let mut objects = Vec::new();
    for obj_ptr in unsafe { glist_iter::<NvDsObjectMeta>(frame_meta.obj_meta_list) } {
      frame.objects.push(unsafe { object_from_meta(&*obj_ptr) });
      objects.push(obj_ptr);
    }

    debug!(
      "读取帧元数据: 视频流 {} | 帧 {} | {} 个目标",
      stream_id,
      frame_number,
      objects.len()
    );
    nvds.batch.frames.push(frame);
    nvds.frames.push(frame_ptr);
    nvds.objects.push(objects);
  }

  nvds
}

/// 用 `g_strdup` 替换 glib 分配的字符串，文本含 NUL 时保持原样
///
/// # Safety
///
/// `slot` 为空指针或由 glib 分配的字符串。
unsafe fn replace_string(slot: &mut *mut c_char, text: &str) -> bool {
  let Ok(text) = CString::new(text) else {
    warn!("文本中含有 NUL 字符: {:?}", text);
    return false;
  };
  unsafe {
    if !slot.is_null() {
      glib::ffi::g_free(*slot as *mut c_void);
    }
    *slot = glib::ffi::g_strdup(text.as_ptr());
  }
  true
}

/// 把规范化后的边界框与显示文字写回目标元数据
///
/// 分辨率无效的帧与坐标不是有限值的目标保持原样。
///
/// # Safety
///
/// 与 [`read_batch_meta`] 相同，且 `nvds` 来自同一批次元数据。
pub unsafe fn write_objects(nvds: &NvDsBatch) {
  for (frame, objects) in nvds.batch.frames.iter().zip(&nvds.objects) {
    if SourceGeometry::of_frame(frame).is_err() {
      continue;
    }
    for (object, &obj_ptr) in frame.objects.iter().zip(objects) {
      if !object.bbox.is_finite() {
        continue;
      }
      let meta = unsafe { &mut *obj_ptr };
      meta.rect_params.left = object.bbox.left;
      meta.rect_params.top = object.bbox.top;
      meta.rect_params.width = object.bbox.width;
      meta.rect_params.height = object.bbox.height;
      if let Some(text) = &object.display_text {
        unsafe { replace_string(&mut meta.text_params.display_text, text) };
      }
    }
  }
}

fn color(rgba: [f64; 4]) -> NvOsdColorParams {
  NvOsdColorParams {
    red: rgba[0],
    green: rgba[1],
    blue: rgba[2],
    alpha: rgba[3],
  }
}

/// 把文字叠加填入显示元数据，返回写入的条数
///
/// # Safety
///
/// `display` 来自 DeepStream 的显示元数据池，其中的字符串为空指针或由 glib 分配。
pub unsafe fn fill_display_meta(display: &mut NvDsDisplayMeta, overlays: &[TextOverlay]) -> usize {
  if overlays.len() > MAX_ELEMENTS_IN_DISPLAY_META {
    warn!(
      "文字叠加数量 {} 超过上限 {}，多余部分被丢弃",
      overlays.len(),
      MAX_ELEMENTS_IN_DISPLAY_META
    );
  }

  let mut written = 0;
  for overlay in overlays.iter().take(MAX_ELEMENTS_IN_DISPLAY_META) {
    let params = &mut display.text_params[written];
    if !unsafe { replace_string(&mut params.display_text, &overlay.text) } {
      continue;
    }
    unsafe { replace_string(&mut params.font_params.font_name, &overlay.font_name) };
    params.x_offset = overlay.x_offset;
    params.y_offset = overlay.y_offset;
    params.font_params.font_size = overlay.font_size;
    params.font_params.font_color = color(overlay.font_color);
    written += 1;
  }

  display.num_labels = written as u32;
  written
}

#[cfg(feature = "deepstream")]
mod ffi {
  use super::{NvDsBatchMeta, NvDsDisplayMeta, NvDsFrameMeta};
  use gstreamer as gst;

  // 由 build.rs 链接 nvdsgst_meta 与 nvds_meta
  unsafe extern "C" {
    pub fn gst_buffer_get_nvds_batch_meta(buffer: *mut gst::ffi::GstBuffer) -> *mut NvDsBatchMeta;
    pub fn nvds_acquire_meta_lock(batch_meta: *mut NvDsBatchMeta);
    pub fn nvds_release_meta_lock(batch_meta: *mut NvDsBatchMeta);
    pub fn nvds_acquire_display_meta_from_pool(batch_meta: *mut NvDsBatchMeta) -> *mut NvDsDisplayMeta;
    pub fn nvds_add_display_meta_to_frame(frame_meta: *mut NvDsFrameMeta, display_meta: *mut NvDsDisplayMeta);
  }
}

#[cfg(feature = "deepstream")]
mod bridge {
  use gstreamer as gst;
  use tracing::warn;

  use super::{NvDsBatchMeta, fill_display_meta, ffi, read_batch_meta, write_objects};
  use crate::meta::FrameBatch;
  use crate::normalizer::ProbeReturn;
  use crate::pipeline::bridge::BatchMetaBridge;
  use crate::pipeline::registry::SourceRegistry;

  struct MetaLock(*mut NvDsBatchMeta);

  impl MetaLock {
    /// # Safety
    ///
    /// `batch_meta` 指向有效的 `NvDsBatchMeta`。
    unsafe fn acquire(batch_meta: *mut NvDsBatchMeta) -> Self {
      unsafe { ffi::nvds_acquire_meta_lock(batch_meta) };
      Self(batch_meta)
    }
  }

  impl Drop for MetaLock {
    fn drop(&mut self) {
      // SAFETY: 锁由 `acquire` 取得，批次元数据在缓冲区释放前一直有效
      unsafe { ffi::nvds_release_meta_lock(self.0) };
    }
  }

  /// 读写 `nvinfer` / `nvdsosd` 使用的 DeepStream 批次元数据
  #[derive(Debug, Clone, Default)]
  pub struct NvDsBridge {
    registry: SourceRegistry,
  }

  impl NvDsBridge {
    pub fn new(registry: SourceRegistry) -> Self {
      Self { registry }
    }
  }

  impl BatchMetaBridge for NvDsBridge {
    fn with_batch(
      &self,
      buffer: &mut gst::Buffer,
      normalize: &mut dyn FnMut(Option<&mut FrameBatch>) -> ProbeReturn,
    ) -> ProbeReturn {
      // DeepStream 的元数据就地修改，不需要让缓冲区可写
      let raw = buffer.as_ptr() as *mut gst::ffi::GstBuffer;
      // SAFETY: raw 指向回调持有的有效缓冲区
      let batch_meta = unsafe { ffi::gst_buffer_get_nvds_batch_meta(raw) };
      if batch_meta.is_null() {
        return normalize(None);
      }

      // SAFETY: batch_meta 非空，属于当前缓冲区，回调返回前一直有效
      let _lock = unsafe { MetaLock::acquire(batch_meta) };
      let mut nvds = unsafe { read_batch_meta(batch_meta, &self.registry) };
      let verdict = normalize(Some(&mut nvds.batch));

      unsafe { write_objects(&nvds) };
      for (frame, &frame_meta) in nvds.batch.frames.iter().zip(nvds.frame_metas()) {
        if frame.overlays.is_empty() {
          continue;
        }
        let display = unsafe { ffi::nvds_acquire_display_meta_from_pool(batch_meta) };
        if display.is_null() {
          warn!("无法从元数据池获取显示元数据: 视频流 {}", frame.stream_id);
          continue;
        }
        unsafe {
          fill_display_meta(&mut *display, &frame.overlays);
          ffi::nvds_add_display_meta_to_frame(frame_meta, display);
        }
      }

      verdict
    }
  }
}

#[cfg(feature = "deepstream")]
pub use self::bridge::NvDsBridge;

#[cfg(test)]
mod tests {
  use super::*;
  use crate::fps::FpsEstimator;
  use crate::meta::ModelGeometry;
  use crate::normalizer::MetadataNormalizer;
  use approx::assert_abs_diff_eq;
  use std::mem::offset_of;
  use std::ptr;

  fn zeroed<T>() -> Box<T> {
    // 测试中的结构只含整数、浮点、数组与指针，全零是合法值
    Box::new(unsafe { std::mem::zeroed() })
  }

  /// 用 Box 持有的节点拼出 GList
  fn glist<T>(items: &mut [Box<T>], nodes: &mut Vec<Box<glib::ffi::GList>>) -> *mut glib::ffi::GList {
    let start = nodes.len();
    for item in items.iter_mut() {
      nodes.push(Box::new(glib::ffi::GList {
        data: &mut **item as *mut T as *mut c_void,
        next: ptr::null_mut(),
        prev: ptr::null_mut(),
      }));
    }
    for i in start..nodes.len().saturating_sub(1) {
      let next: *mut glib::ffi::GList = &mut *nodes[i + 1];
      nodes[i].next = next;
    }
    if nodes.len() > start {
      &mut *nodes[start]
    } else {
      ptr::null_mut()
    }
  }

  fn label(text: &str, prob: f32) -> Box<NvDsLabelInfo> {
    let mut info = zeroed::<NvDsLabelInfo>();
    for (slot, byte) in info.result_label.iter_mut().zip(text.bytes()) {
      *slot = byte as c_char;
    }
    info.result_prob = prob;
    info
  }

  unsafe fn take_string(slot: &mut *mut c_char) -> Option<String> {
    if slot.is_null() {
      return None;
    }
    let text = unsafe { CStr::from_ptr(*slot) }.to_string_lossy().into_owned();
    unsafe { glib::ffi::g_free(*slot as *mut c_void) };
    *slot = ptr::null_mut();
    Some(text)
  }

  #[cfg(target_pointer_width = "64")]
  #[test]
  fn test_layout_offsets() {
    assert_eq!(std::mem::size_of::<NvDsBaseMeta>(), 40);
    assert_eq!(std::mem::size_of::<NvOsdRectParams>(), 104);
    assert_eq!(std::mem::size_of::<NvOsdTextParams>(), 104);
    assert_eq!(offset_of!(NvDsFrameMeta, source_frame_width), 80);
    assert_eq!(offset_of!(NvDsFrameMeta, obj_meta_list), 104);
    assert_eq!(offset_of!(NvDsObjectMeta, rect_params), 104);
    assert_eq!(offset_of!(NvDsObjectMeta, text_params), 232);
    assert_eq!(offset_of!(NvDsObjectMeta, classifier_meta_list), 464);
    assert_eq!(offset_of!(NvDsBatchMeta, frame_meta_list), 96);
  }

  #[test]
  fn test_batch_meta_round_trip_through_normalizer() {
    let mut nodes = Vec::new();

    let mut make_labels = [label("sedan", 0.4), label("suv", 222.65)];
    let mut classifiers = [zeroed::<NvDsClassifierMeta>()];
    classifiers[0].label_info_list = glist(&mut make_labels, &mut nodes);

    let mut objects = [zeroed::<NvDsObjectMeta>(), zeroed::<NvDsObjectMeta>()];
    objects[0].class_id = 2;
    objects[0].confidence = 0.9;
    objects[0].rect_params.left = 33.5;
    objects[0].rect_params.width = 700.0;
    objects[0].rect_params.height = 10.0;
    objects[0].classifier_meta_list = glist(&mut classifiers, &mut nodes);
    objects[1].class_id = 0;
    objects[1].rect_params.left = f32::NAN;

    let mut frames = [zeroed::<NvDsFrameMeta>()];
    frames[0].pad_index = 1;
    frames[0].frame_num = 42;
    frames[0].source_frame_width = 1920;
    frames[0].source_frame_height = 1080;
    frames[0].obj_meta_list = glist(&mut objects, &mut nodes);

    let mut batch_meta = zeroed::<NvDsBatchMeta>();
    batch_meta.frame_meta_list = glist(&mut frames, &mut nodes);

    let registry = SourceRegistry::new();
    registry.register(0);
    registry.register(1);

    let mut nvds = unsafe { read_batch_meta(&mut *batch_meta, &registry) };
    assert_eq!(nvds.batch.frames.len(), 1);
    let frame = &nvds.batch.frames[0];
    assert_eq!((frame.stream_id, frame.frame_number), (1, 42));
    assert_eq!(frame.objects.len(), 2);
    assert_eq!(frame.objects[0].classifiers[0].labels[1].label, "suv");

    let normalizer = MetadataNormalizer::new().with_fps_overlay(FpsEstimator::new());
    let report = normalizer.normalize_batch(&mut nvds.batch, ModelGeometry::new(640, 640).unwrap());
    assert_eq!(report.objects, 1);
    assert_eq!(report.skipped_objects, 1);
    unsafe { write_objects(&nvds) };

    let rect = &objects[0].rect_params;
    assert_abs_diff_eq!(rect.left, 100.5, epsilon = 1e-3);
    assert_abs_diff_eq!(rect.width, 1819.5, epsilon = 1e-3);
    assert!(rect.left + rect.width <= 1920.0);
    let text = unsafe { take_string(&mut objects[0].text_params.display_text) };
    assert_eq!(text.as_deref(), Some("suv (1.00)"));

    assert!(objects[1].rect_params.left.is_nan());
    assert!(objects[1].text_params.display_text.is_null());

    // 只有批次中携带的视频流记录了帧率样本
    let fps = normalizer.fps_estimator().unwrap();
    assert!(fps.samples(0).is_empty());
    assert_eq!(fps.samples(1).len(), 1);
  }

  #[test]
  fn test_frame_without_source_size_uses_registry() {
    let mut nodes = Vec::new();
    let mut frames = [zeroed::<NvDsFrameMeta>()];
    frames[0].pad_index = 3;
    let mut batch_meta = zeroed::<NvDsBatchMeta>();
    batch_meta.frame_meta_list = glist(&mut frames, &mut nodes);

    let registry = SourceRegistry::new();
    registry.update_resolution(3, 1280, 720);

    let nvds = unsafe { read_batch_meta(&mut *batch_meta, &registry) };
    let frame = &nvds.batch.frames[0];
    assert_eq!((frame.source_width, frame.source_height), (1280, 720));
    assert!(frame.objects.is_empty());
  }

  #[test]
  fn test_fill_display_meta() {
    let mut display = zeroed::<NvDsDisplayMeta>();
    let overlays = [TextOverlay::new("FPS: 29.9")];

    let written = unsafe { fill_display_meta(&mut display, &overlays) };
    assert_eq!(written, 1);
    assert_eq!(display.num_labels, 1);

    let params = &mut display.text_params[0];
    assert_eq!((params.x_offset, params.y_offset), (10, 20));
    assert_eq!(params.font_params.font_size, 16);
    assert_eq!(params.font_params.font_color, color([1.0, 1.0, 1.0, 1.0]));
    assert_eq!(unsafe { take_string(&mut params.display_text) }.as_deref(), Some("FPS: 29.9"));
    assert_eq!(unsafe { take_string(&mut params.font_params.font_name) }.as_deref(), Some("Serif"));
  }
}
