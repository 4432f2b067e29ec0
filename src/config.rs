// 该文件是 Shanan （山南西风） 项目的一部分。
// src/config.rs - 管道配置
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

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::FromUrl;

pub const DEFAULT_MUX_WIDTH: u32 = 640;
pub const DEFAULT_MUX_HEIGHT: u32 = 640;
pub const DEFAULT_TILER_WIDTH: u32 = 1280;
pub const DEFAULT_TILER_HEIGHT: u32 = 720;
pub const DEFAULT_ENCODER_BITRATE: u32 = 8_000_000;

#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("无法读取视频源列表 {path}: {source}")]
  SourceList {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("视频源列表为空: {0}")]
  NoSources(PathBuf),
  #[error("无效的视频源路径: {0}")]
  InvalidSourcePath(PathBuf),
  #[error("无效的尺寸 {what}: {width}x{height}")]
  ZeroDimension {
    what: &'static str,
    width: u32,
    height: u32,
  },
  #[error("批大小不能为零")]
  ZeroBatchSize,
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

/// 读取视频源列表，每行一个路径，忽略空行
pub fn read_source_list(path: impl AsRef<Path>) -> Result<Vec<PathBuf>, ConfigError> {
  let path = path.as_ref();
  let content = std::fs::read_to_string(path).map_err(|source| ConfigError::SourceList {
    path: path.to_path_buf(),
    source,
  })?;

  let sources = parse_source_list(&content);
  if sources.is_empty() {
    return Err(ConfigError::NoSources(path.to_path_buf()));
  }

  info!("从 {} 读取到 {} 个视频源", path.display(), sources.len());
  Ok(sources)
}

pub fn parse_source_list(content: &str) -> Vec<PathBuf> {
  content
    .lines()
    .map(str::trim)
    .filter(|line| !line.is_empty())
    .map(PathBuf::from)
    .collect()
}

/// 将本地路径转换为 `file://` URI
pub fn source_uri(path: &Path) -> Result<Url, ConfigError> {
  let absolute =
    std::path::absolute(path).map_err(|_| ConfigError::InvalidSourcePath(path.to_path_buf()))?;
  let uri =
    Url::from_file_path(&absolute).map_err(|_| ConfigError::InvalidSourcePath(path.to_path_buf()))?;
  debug!("视频源 {} -> {}", path.display(), uri);
  Ok(uri)
}

/// 拼接网格的行列数，`rows = floor(sqrt(n))`，`columns = ceil(n / rows)`
pub fn tiler_dims(num_sources: u32) -> Result<(u32, u32), ConfigError> {
  if num_sources == 0 {
    return Err(ConfigError::ZeroBatchSize);
  }
  let rows = num_sources.isqrt();
  let columns = num_sources.div_ceil(rows);
  Ok((rows, columns))
}

fn non_zero(what: &'static str, width: u32, height: u32) -> Result<(), ConfigError> {
  if width == 0 || height == 0 {
    return Err(ConfigError::ZeroDimension {
      what,
      width,
      height,
    });
  }
  Ok(())
}

/// 多路复用器参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MuxerConfig {
  pub batch_size: u32,
  /// 共享的处理分辨率，也是模型输入分辨率
  pub width: u32,
  pub height: u32,
  pub live_source: bool,
  pub sync_inputs: bool,
}

impl Default for MuxerConfig {
  fn default() -> Self {
    Self {
      batch_size: 1,
      width: DEFAULT_MUX_WIDTH,
      height: DEFAULT_MUX_HEIGHT,
      live_source: false,
      sync_inputs: false,
    }
  }
}

impl MuxerConfig {
  pub fn with_batch_size(mut self, batch_size: u32) -> Self {
    self.batch_size = batch_size;
    self
  }

  pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
    self.width = width;
    self.height = height;
    self
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.batch_size == 0 {
      return Err(ConfigError::ZeroBatchSize);
    }
    non_zero("muxer", self.width, self.height)
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TilerConfig {
  pub rows: u32,
  pub columns: u32,
  pub width: u32,
  pub height: u32,
}

impl TilerConfig {
  pub fn for_sources(num_sources: u32) -> Result<Self, ConfigError> {
    let (rows, columns) = tiler_dims(num_sources)?;
    Ok(Self {
      rows,
      columns,
      width: DEFAULT_TILER_WIDTH,
      height: DEFAULT_TILER_HEIGHT,
    })
  }

  pub fn with_resolution(mut self, width: u32, height: u32) -> Result<Self, ConfigError> {
    non_zero("tiler", width, height)?;
    self.width = width;
    self.height = height;
    Ok(self)
  }
}

/// 一级检测器与二级分类器的配置文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferConfig {
  pub primary: PathBuf,
  pub secondary: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderConfig {
  pub bitrate: u32,
}

impl Default for EncoderConfig {
  fn default() -> Self {
    Self {
      bitrate: DEFAULT_ENCODER_BITRATE,
    }
  }
}

/// 输出目标
///
/// - `file:///path/output.mp4?bitrate=8000000`：编码保存为文件
/// - `display://`：实时窗口显示
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkTarget {
  File { path: PathBuf, encoder: EncoderConfig },
  Display,
}

const FILE_SINK_SCHEME: &str = "file";
const DISPLAY_SINK_SCHEME: &str = "display";

impl FromUrl for SinkTarget {
  type Error = ConfigError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    match url.scheme() {
      FILE_SINK_SCHEME => {
        let bitrate = url
          .query_pairs()
          .find(|(k, _)| k == "bitrate")
          .and_then(|(_, v)| v.parse::<u32>().ok())
          .unwrap_or(DEFAULT_ENCODER_BITRATE);
        let path = url
          .to_file_path()
          .map_err(|_| ConfigError::InvalidSourcePath(PathBuf::from(url.path())))?;
        Ok(SinkTarget::File {
          path,
          encoder: EncoderConfig { bitrate },
        })
      }
      DISPLAY_SINK_SCHEME => Ok(SinkTarget::Display),
      other => Err(ConfigError::SchemeMismatch(other.to_string())),
    }
  }
}
