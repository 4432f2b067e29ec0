// 该文件是 Shanan （山南西风） 项目的一部分。
// build.rs - 链接 DeepStream 元数据库
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

use std::{env, path::PathBuf};

const DEFAULT_DEEPSTREAM_DIR: &str = "/opt/nvidia/deepstream/deepstream";

fn main() {
  println!("cargo:rerun-if-env-changed=DEEPSTREAM_DIR");
  if env::var_os("CARGO_FEATURE_DEEPSTREAM").is_none() {
    return;
  }

  let root = env::var("DEEPSTREAM_DIR")
    .map(PathBuf::from)
    .unwrap_or_else(|_| PathBuf::from(DEFAULT_DEEPSTREAM_DIR));
  let lib_dir = root.join("lib");
  if lib_dir.exists() {
    println!("cargo:rustc-link-search=native={}", lib_dir.display());
  } else {
    println!("cargo:warning=DeepStream 库目录不存在: {}", lib_dir.display());
  }

  println!("cargo:rustc-link-lib=nvdsgst_meta");
  println!("cargo:rustc-link-lib=nvds_meta");
}
