// 该文件是 Shanan （山南西风） 项目的一部分。
// src/pipeline/build.rs - GStreamer 管道构建
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

use gstreamer::{self as gst, prelude::*};
use thiserror::Error;
use tracing::{debug, error, info};
use url::Url;

use crate::config::{ConfigError, InferConfig, MuxerConfig, TilerConfig};
use crate::meta::{GeometryError, ModelGeometry};
use crate::pipeline::description::{
  DECODER_NAME, MUX_NAME, OSD_NAME, PRIMARY_INFER_NAME, SECONDARY_INFER_NAME, SINK_NAME,
  TILER_NAME,
};
use crate::pipeline::registry::SourceRegistry;

#[derive(Error, Debug)]
pub enum PipelineError {
  #[error("无法创建元素: {0}")]
  MissingElement(String),
  #[error("无法获取 {element} 的 pad {pad}")]
  MissingPad { element: String, pad: String },
  #[error("pad 上没有可用的视频分辨率: {0}")]
  MissingResolution(String),
  #[error("无法安装探针: {0}")]
  ProbeFailed(String),
  #[error("GStreamer error: {0}")]
  GStreamerError(#[from] gst::glib::Error),
  #[error("GStreamer boolean error: {0}")]
  GStreamerBoolError(#[from] gst::glib::BoolError),
  #[error("Pad link error: {0}")]
  PadLinkError(#[from] gst::PadLinkError),
  #[error("Pipeline error: {0}")]
  PipelineError(String),
  #[error(transparent)]
  Config(#[from] ConfigError),
  #[error(transparent)]
  Geometry(#[from] GeometryError),
}

pub fn make_element(factory: &str, name: &str) -> Result<gst::Element, PipelineError> {
  gst::ElementFactory::make(factory)
    .name(name)
    .build()
    .map_err(|_| {
      error!("无法创建 {} 元素 ({})", factory, name);
      PipelineError::MissingElement(factory.to_string())
    })
}

pub fn element_by_name(pipeline: &gst::Pipeline, name: &str) -> Result<gst::Element, PipelineError> {
  pipeline
    .by_name(name)
    .ok_or_else(|| PipelineError::MissingElement(name.to_string()))
}

pub fn static_pad(element: &gst::Element, pad: &str) -> Result<gst::Pad, PipelineError> {
  element
    .static_pad(pad)
    .ok_or_else(|| PipelineError::MissingPad {
      element: element.name().to_string(),
      pad: pad.to_string(),
    })
}

/// caps 第一个结构中的 `width` 与 `height`
pub fn caps_resolution(caps: &gst::CapsRef) -> Option<(u32, u32)> {
  let structure = caps.structure(0)?;
  let width = structure.get::<i32>("width").ok()?;
  let height = structure.get::<i32>("height").ok()?;
  Some((u32::try_from(width).ok()?, u32::try_from(height).ok()?))
}

/// 从 pad 当前协商的 caps 读取模型输入分辨率
pub fn model_geometry(pad: &gst::Pad) -> Result<ModelGeometry, PipelineError> {
  let (width, height) = pad
    .current_caps()
    .and_then(|caps| caps_resolution(&caps))
    .ok_or_else(|| PipelineError::MissingResolution(pad.name().to_string()))?;
  Ok(ModelGeometry::new(width, height)?)
}

/// 监听 pad 上的 caps 事件，把视频源分辨率写入登记表
pub fn watch_source_caps(
  pad: &gst::Pad,
  stream_id: u32,
  registry: SourceRegistry,
) -> Result<gst::PadProbeId, PipelineError> {
  if let Some((width, height)) = pad.current_caps().and_then(|caps| caps_resolution(&caps)) {
    registry.update_resolution(stream_id, width, height);
  }

  pad
    .add_probe(gst::PadProbeType::EVENT_DOWNSTREAM, move |_, info| {
      if let Some(gst::PadProbeData::Event(ref event)) = info.data {
        if let gst::EventView::Caps(caps) = event.view() {
          if let Some((width, height)) = caps_resolution(caps.caps()) {
            registry.update_resolution(stream_id, width, height);
          }
        }
      }
      gst::PadProbeReturn::Ok
    })
    .ok_or_else(|| PipelineError::ProbeFailed(pad.name().to_string()))
}

/// 解析单路管道描述，并登记 0 号视频源
pub fn launch_single_stream(
  description: &str,
  registry: &SourceRegistry,
) -> Result<gst::Pipeline, PipelineError> {
  gst::init()?;
  info!("GStreamer pipeline description: {}", description);

  let pipeline = gst::parse::launch(description)
    .map_err(|e| {
      if e.matches(gst::ParseError::NoSuchElement) {
        PipelineError::MissingElement(e.message().to_string())
      } else {
        PipelineError::GStreamerError(e)
      }
    })?
    .downcast::<gst::Pipeline>()
    .map_err(|_| PipelineError::PipelineError("Failed to create pipeline".to_string()))?;

  registry.register(0);
  let decoder = element_by_name(&pipeline, DECODER_NAME)?;
  watch_source_caps(&static_pad(&decoder, "src")?, 0, registry.clone())?;

  Ok(pipeline)
}

fn link_source_pad(
  src_pad: &gst::Pad,
  mux: &gst::Element,
  stream_id: u32,
  registry: &SourceRegistry,
) -> Result<(), PipelineError> {
  let caps = src_pad
    .current_caps()
    .unwrap_or_else(|| src_pad.query_caps(None));
  let is_video = caps
    .structure(0)
    .map(|s| s.name().as_str().starts_with("video/"))
    .unwrap_or(false);
  if !is_video {
    debug!("忽略视频源 {} 的非视频 pad {}", stream_id, src_pad.name());
    return Ok(());
  }

  let pad_name = format!("sink_{}", stream_id);
  let sink_pad = mux
    .request_pad_simple(&pad_name)
    .ok_or_else(|| PipelineError::MissingPad {
      element: MUX_NAME.to_string(),
      pad: pad_name.clone(),
    })?;
  src_pad.link(&sink_pad)?;
  watch_source_caps(src_pad, stream_id, registry.clone())?;

  info!("视频源 {} 已连接到 {}.{}", stream_id, MUX_NAME, pad_name);
  Ok(())
}

/// 多路拼接显示管道
///
/// `uridecodebin` 动态产生的视频 pad 连接到 `nvstreammux` 的 `sink_{i}`，
/// 之后依次为一级推理、二级推理、拼接、OSD、转换与显示。
pub fn build_tiled_pipeline(
  sources: &[Url],
  muxer: &MuxerConfig,
  infer: &InferConfig,
  tiler: &TilerConfig,
  registry: &SourceRegistry,
) -> Result<gst::Pipeline, PipelineError> {
  muxer.validate()?;
  gst::init()?;

  let pipeline = gst::Pipeline::with_name("tiled-view");

  let mux = make_element("nvstreammux", MUX_NAME)?;
  mux.set_property_from_str("batch-size", &muxer.batch_size.to_string());
  mux.set_property_from_str("width", &muxer.width.to_string());
  mux.set_property_from_str("height", &muxer.height.to_string());
  mux.set_property_from_str("live-source", if muxer.live_source { "1" } else { "0" });
  mux.set_property_from_str("sync-inputs", if muxer.sync_inputs { "1" } else { "0" });

  let primary = make_element("nvinfer", PRIMARY_INFER_NAME)?;
  primary.set_property_from_str("config-file-path", &infer.primary.to_string_lossy());
  let secondary = make_element("nvinfer", SECONDARY_INFER_NAME)?;
  secondary.set_property_from_str("config-file-path", &infer.secondary.to_string_lossy());

  let tiler_element = make_element("nvmultistreamtiler", TILER_NAME)?;
  tiler_element.set_property_from_str("rows", &tiler.rows.to_string());
  tiler_element.set_property_from_str("columns", &tiler.columns.to_string());
  tiler_element.set_property_from_str("width", &tiler.width.to_string());
  tiler_element.set_property_from_str("height", &tiler.height.to_string());

  let osd = make_element("nvdsosd", OSD_NAME)?;
  osd.set_property_from_str("display-clock", "0");
  let convert = make_element("nvvideoconvert", "convert")?;
  let sink = make_element("nveglglessink", SINK_NAME)?;

  let chain = [&mux, &primary, &secondary, &tiler_element, &osd, &convert, &sink];
  pipeline.add_many(chain)?;
  gst::Element::link_many(chain)?;

  for (index, uri) in sources.iter().enumerate() {
    let stream_id = index as u32;
    registry.register(stream_id);

    let source = gst::ElementFactory::make("uridecodebin")
      .name(format!("source-{}", stream_id))
      .property("uri", uri.as_str())
      .build()
      .map_err(|_| PipelineError::MissingElement("uridecodebin".to_string()))?;
    pipeline.add(&source)?;

    let mux_weak = mux.downgrade();
    let registry = registry.clone();
    source.connect_pad_added(move |_, src_pad| {
      let Some(mux) = mux_weak.upgrade() else {
        return;
      };
      if let Err(e) = link_source_pad(src_pad, &mux, stream_id, &registry) {
        error!("视频源 {} 连接失败: {}", stream_id, e);
      }
    });
    info!("添加视频源 {}: {}", stream_id, uri);
  }

  Ok(pipeline)
}
