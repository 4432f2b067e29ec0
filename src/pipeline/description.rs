// 该文件是 Shanan （山南西风） 项目的一部分。
// src/pipeline/description.rs - 管道描述生成
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use std::path::{Path, PathBuf};

use crate::config::{EncoderConfig, InferConfig, MuxerConfig, SinkTarget};

pub const MUX_NAME: &str = "mux";
pub const DECODER_NAME: &str = "decoder";
pub const PRIMARY_INFER_NAME: &str = "primary-infer";
pub const SECONDARY_INFER_NAME: &str = "secondary-infer";
pub const TILER_NAME: &str = "tiler";
pub const OSD_NAME: &str = "osd";
pub const SINK_NAME: &str = "sink";

pub enum PipelineItem {
  FileSource(PathBuf),
  AviDemux,
  H264Parse,
  Decoder,
  Convert,
  /// 设备内存中的 RGBA 帧
  DeviceCaps {
    width: u32,
    height: u32,
  },
  MuxSinkPad(u32),
  StreamMux(MuxerConfig),
  Infer {
    name: &'static str,
    config: PathBuf,
  },
  Osd {
    display_clock: bool,
  },
  Encoder(EncoderConfig),
  Mp4Mux,
  FileSink(PathBuf),
  DisplaySink,
}

fn quoted(path: &Path) -> String {
  format!("\"{}\"", path.display())
}

fn flag(value: bool) -> u8 {
  u8::from(value)
}

impl PipelineItem {
  pub fn to_pipeline(&self) -> String {
    match self {
      PipelineItem::FileSource(path) => format!("filesrc location={}", quoted(path)),
      PipelineItem::AviDemux => "avidemux".to_string(),
      PipelineItem::H264Parse => "h264parse".to_string(),
      PipelineItem::Decoder => format!("nvv4l2decoder name={}", DECODER_NAME),
      PipelineItem::Convert => "nvvideoconvert".to_string(),
      PipelineItem::DeviceCaps { width, height } => format!(
        "video/x-raw(memory:NVMM), format=RGBA, width={}, height={}",
        width, height
      ),
      PipelineItem::MuxSinkPad(index) => format!("{}.sink_{}", MUX_NAME, index),
      PipelineItem::StreamMux(muxer) => format!(
        "nvstreammux name={} batch-size={} width={} height={} live-source={} sync-inputs={}",
        MUX_NAME,
        muxer.batch_size,
        muxer.width,
        muxer.height,
        flag(muxer.live_source),
        flag(muxer.sync_inputs)
      ),
      PipelineItem::Infer { name, config } => format!(
        "nvinfer config-file-path={} name={}",
        quoted(config),
        name
      ),
      PipelineItem::Osd { display_clock } => format!(
        "nvdsosd name={} display-clock={}",
        OSD_NAME,
        flag(*display_clock)
      ),
      PipelineItem::Encoder(encoder) => format!("nvv4l2h264enc bitrate={}", encoder.bitrate),
      PipelineItem::Mp4Mux => "qtmux".to_string(),
      PipelineItem::FileSink(path) => format!("filesink location={}", quoted(path)),
      PipelineItem::DisplaySink => format!("nveglglessink name={}", SINK_NAME),
    }
  }
}

fn join(items: &[PipelineItem]) -> String {
  items
    .iter()
    .map(PipelineItem::to_pipeline)
    .collect::<Vec<String>>()
    .join(" ! ")
}

/// 输出端元素
pub fn sink_items(sink: &SinkTarget) -> Vec<PipelineItem> {
  match sink {
    SinkTarget::File { path, encoder } => vec![
      PipelineItem::Convert,
      PipelineItem::Encoder(encoder.clone()),
      PipelineItem::H264Parse,
      PipelineItem::Mp4Mux,
      PipelineItem::FileSink(path.clone()),
    ],
    SinkTarget::Display => vec![PipelineItem::Convert, PipelineItem::DisplaySink],
  }
}

/// 单路视频文件的完整管道描述
///
/// 源分支连接到多路复用器的 `sink_0`，推理、OSD 与输出在复用器之后。
pub fn single_stream_description(
  source: &Path,
  muxer: &MuxerConfig,
  infer: &InferConfig,
  sink: &SinkTarget,
) -> String {
  let source_branch = [
    PipelineItem::FileSource(source.to_path_buf()),
    PipelineItem::AviDemux,
    PipelineItem::H264Parse,
    PipelineItem::Decoder,
    PipelineItem::Convert,
    PipelineItem::DeviceCaps {
      width: muxer.width,
      height: muxer.height,
    },
    PipelineItem::MuxSinkPad(0),
  ];

  let mut main_branch = vec![
    PipelineItem::StreamMux(muxer.clone()),
    PipelineItem::Infer {
      name: PRIMARY_INFER_NAME,
      config: infer.primary.clone(),
    },
    PipelineItem::Infer {
      name: SECONDARY_INFER_NAME,
      config: infer.secondary.clone(),
    },
    PipelineItem::Osd {
      display_clock: false,
    },
  ];
  main_branch.extend(sink_items(sink));

  format!("{} {}", join(&source_branch), join(&main_branch))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn infer() -> InferConfig {
    InferConfig {
      primary: PathBuf::from("/configs/config_infer_primary.txt"),
      secondary: PathBuf::from("/configs/config_infer_secondary.txt"),
    }
  }

  #[test]
  fn test_single_stream_to_file() {
    let sink = SinkTarget::File {
      path: PathBuf::from("/videos/output_video.mp4"),
      encoder: EncoderConfig::default(),
    };
    let description = single_stream_description(
      Path::new("/videos/event.avi"),
      &MuxerConfig::default(),
      &infer(),
      &sink,
    );

    assert_eq!(
      description,
      "filesrc location=\"/videos/event.avi\" ! avidemux ! h264parse ! nvv4l2decoder name=decoder \
       ! nvvideoconvert ! video/x-raw(memory:NVMM), format=RGBA, width=640, height=640 ! mux.sink_0 \
       nvstreammux name=mux batch-size=1 width=640 height=640 live-source=0 sync-inputs=0 \
       ! nvinfer config-file-path=\"/configs/config_infer_primary.txt\" name=primary-infer \
       ! nvinfer config-file-path=\"/configs/config_infer_secondary.txt\" name=secondary-infer \
       ! nvdsosd name=osd display-clock=0 ! nvvideoconvert ! nvv4l2h264enc bitrate=8000000 \
       ! h264parse ! qtmux ! filesink location=\"/videos/output_video.mp4\""
    );
  }

  #[test]
  fn test_single_stream_to_display() {
    let muxer = MuxerConfig::default().with_resolution(1280, 736);
    let description = single_stream_description(
      Path::new("in.avi"),
      &muxer,
      &infer(),
      &SinkTarget::Display,
    );

    assert!(description.contains("width=1280, height=736 ! mux.sink_0 nvstreammux"));
    assert!(description.ends_with("nvdsosd name=osd display-clock=0 ! nvvideoconvert ! nveglglessink name=sink"));
  }
}
