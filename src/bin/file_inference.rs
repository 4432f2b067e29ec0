// 该文件是 Shanan （山南西风） 项目的一部分。
// src/bin/file_inference.rs - 单路视频文件推理
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, bail};
use clap::Parser;
use tracing::info;
use url::Url;

use shanan_osd::{
  FromUrl,
  config::{DEFAULT_MUX_HEIGHT, DEFAULT_MUX_WIDTH, InferConfig, MuxerConfig, SinkTarget},
  fps::FpsEstimator,
  normalizer::MetadataNormalizer,
  pipeline::{
    OSD_NAME, NvDsBridge, SourceRegistry, attach_normalizer, element_by_name, launch_single_stream,
    single_stream_description,
  },
  task::{FORCE_EXIT_AFTER, PipelineTask},
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 输入视频文件（AVI 封装的 H.264）
  #[arg(long, value_name = "FILE")]
  pub input: PathBuf,
  /// 一级检测器配置文件
  #[arg(long, value_name = "FILE")]
  pub primary_config: PathBuf,
  /// 二级分类器配置文件
  #[arg(long, value_name = "FILE")]
  pub secondary_config: PathBuf,
  /// 输出目标
  /// - file:///path/output.mp4?bitrate=8000000
  /// - display://
  #[arg(long, value_name = "OUTPUT")]
  pub output: Url,

  #[arg(long, default_value_t = DEFAULT_MUX_WIDTH)]
  pub width: u32,
  #[arg(long, default_value_t = DEFAULT_MUX_HEIGHT)]
  pub height: u32,

  /// 在画面上叠加帧率
  #[arg(long)]
  pub fps: bool,

  /// 收到中断信号后等待多少秒强制退出
  #[arg(long, value_name = "SECONDS", default_value_t = FORCE_EXIT_AFTER.as_secs())]
  pub force_exit_after: u64,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("输入文件: {}", args.input.display());
  info!("输出目标: {}", args.output);

  if !args.input.is_file() {
    bail!("输入文件不存在: {}", args.input.display());
  }

  let muxer = MuxerConfig::default().with_resolution(args.width, args.height);
  muxer.validate()?;
  let infer = InferConfig {
    primary: args.primary_config,
    secondary: args.secondary_config,
  };
  let sink = SinkTarget::from_url(&args.output)?;

  let description = single_stream_description(&args.input, &muxer, &infer, &sink);
  let registry = SourceRegistry::new();
  let pipeline = launch_single_stream(&description, &registry)?;

  let mut normalizer = MetadataNormalizer::new();
  if args.fps {
    normalizer = normalizer.with_fps_overlay(FpsEstimator::new());
  }
  let osd = element_by_name(&pipeline, OSD_NAME)?;
  attach_normalizer(&osd, Arc::new(normalizer), NvDsBridge::new(registry))?;

  PipelineTask::new(pipeline)
    .with_force_exit_after(Duration::from_secs(args.force_exit_after))
    .run()?;

  Ok(())
}
