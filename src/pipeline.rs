// 该文件是 Shanan （山南西风） 项目的一部分。
// src/pipeline.rs - 推理管道
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

mod description;
mod registry;

#[cfg(feature = "gstreamer_pipeline")]
mod bridge;
#[cfg(feature = "gstreamer_pipeline")]
mod build;
#[cfg(feature = "gstreamer_pipeline")]
pub mod nvds;
#[cfg(feature = "gstreamer_pipeline")]
mod probe;
#[cfg(feature = "gstreamer_pipeline")]
pub mod roi;

pub use self::description::{
  DECODER_NAME, MUX_NAME, OSD_NAME, PRIMARY_INFER_NAME, PipelineItem, SECONDARY_INFER_NAME,
  SINK_NAME, TILER_NAME, single_stream_description, sink_items,
};
pub use self::registry::SourceRegistry;

#[cfg(feature = "gstreamer_pipeline")]
pub use self::build::{
  PipelineError, build_tiled_pipeline, caps_resolution, element_by_name, launch_single_stream,
  make_element, model_geometry, static_pad, watch_source_caps,
};
#[cfg(feature = "gstreamer_pipeline")]
pub use self::bridge::BatchMetaBridge;
#[cfg(feature = "deepstream")]
pub use self::nvds::NvDsBridge;
#[cfg(feature = "gstreamer_pipeline")]
pub use self::probe::attach_normalizer;
#[cfg(feature = "gstreamer_pipeline")]
pub use self::roi::RoiBridge;
