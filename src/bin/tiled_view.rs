// 该文件是 Shanan （山南西风） 项目的一部分。
// src/bin/tiled_view.rs - 多路视频拼接显示
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

use anyhow::Result;
use clap::Parser;
use tracing::info;
use url::Url;

use shanan_osd::{
  config::{
    DEFAULT_MUX_HEIGHT, DEFAULT_MUX_WIDTH, DEFAULT_TILER_HEIGHT, DEFAULT_TILER_WIDTH, InferConfig,
    MuxerConfig, TilerConfig, read_source_list, source_uri,
  },
  fps::FpsEstimator,
  normalizer::MetadataNormalizer,
  pipeline::{
    NvDsBridge, SourceRegistry, TILER_NAME, attach_normalizer, build_tiled_pipeline, element_by_name,
  },
  task::{FORCE_EXIT_AFTER, PipelineTask},
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 视频源列表文件，每行一个路径
  #[arg(long, value_name = "FILE")]
  pub sources: PathBuf,
  /// 一级检测器配置文件
  #[arg(long, value_name = "FILE")]
  pub primary_config: PathBuf,
  /// 二级分类器配置文件
  #[arg(long, value_name = "FILE")]
  pub secondary_config: PathBuf,

  /// 处理分辨率
  #[arg(long, default_value_t = DEFAULT_MUX_WIDTH)]
  pub width: u32,
  #[arg(long, default_value_t = DEFAULT_MUX_HEIGHT)]
  pub height: u32,

  /// 拼接后的画面分辨率
  #[arg(long, default_value_t = DEFAULT_TILER_WIDTH)]
  pub tiler_width: u32,
  #[arg(long, default_value_t = DEFAULT_TILER_HEIGHT)]
  pub tiler_height: u32,

  /// 视频源为实时流
  #[arg(long)]
  pub live: bool,

  /// 收到中断信号后等待多少秒强制退出
  #[arg(long, value_name = "SECONDS", default_value_t = FORCE_EXIT_AFTER.as_secs())]
  pub force_exit_after: u64,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  let sources = read_source_list(&args.sources)?;
  let uris = sources
    .iter()
    .map(|path| source_uri(path))
    .collect::<Result<Vec<Url>, _>>()?;
  let num_sources = uris.len() as u32;

  let mut muxer = MuxerConfig::default()
    .with_batch_size(num_sources)
    .with_resolution(args.width, args.height);
  muxer.live_source = args.live;
  let tiler = TilerConfig::for_sources(num_sources)?.with_resolution(args.tiler_width, args.tiler_height)?;
  let infer = InferConfig {
    primary: args.primary_config,
    secondary: args.secondary_config,
  };
  info!(
    "{} 路视频源, 拼接为 {} 行 {} 列, {}x{}",
    num_sources, tiler.rows, tiler.columns, tiler.width, tiler.height
  );

  let registry = SourceRegistry::new();
  let pipeline = build_tiled_pipeline(&uris, &muxer, &infer, &tiler, &registry)?;

  // 拼接之前的 caps 仍是处理分辨率
  let normalizer = MetadataNormalizer::new().with_fps_overlay(FpsEstimator::new());
  let tiler_element = element_by_name(&pipeline, TILER_NAME)?;
  attach_normalizer(&tiler_element, Arc::new(normalizer), NvDsBridge::new(registry))?;

  PipelineTask::new(pipeline)
    .with_force_exit_after(Duration::from_secs(args.force_exit_after))
    .run()?;

  Ok(())
}
