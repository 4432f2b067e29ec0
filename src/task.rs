// 该文件是 Shanan （山南西风） 项目的一部分。
// src/task.rs - 管道运行任务
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

use std::sync::{Arc, Mutex};
use std::{thread, time::Duration};

use gstreamer::{self as gst, glib, prelude::*};
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// 收到中断信号后等待主循环退出的时长
pub const FORCE_EXIT_AFTER: Duration = Duration::from_secs(30);

#[derive(Error, Debug)]
pub enum TaskError {
  #[error("State change error: {0}")]
  StateChangeError(#[from] gst::StateChangeError),
  #[error("GStreamer boolean error: {0}")]
  GStreamerBoolError(#[from] glib::BoolError),
  #[error("无法设置中断信号处理: {0}")]
  CtrlCError(#[from] ctrlc::Error),
  #[error("管道没有消息总线")]
  NoBus,
  #[error("{source_name} 运行出错: {message}")]
  PipelineError {
    source_name: String,
    message: String,
    debug: Option<String>,
  },
}

/// 运行管道直到 EOS、出错或收到中断信号
pub struct PipelineTask {
  pipeline: gst::Pipeline,
  force_exit_after: Duration,
}

impl PipelineTask {
  pub fn new(pipeline: gst::Pipeline) -> Self {
    Self {
      pipeline,
      force_exit_after: FORCE_EXIT_AFTER,
    }
  }

  pub fn with_force_exit_after(mut self, force_exit_after: Duration) -> Self {
    self.force_exit_after = force_exit_after;
    self
  }

  pub fn run(self) -> Result<(), TaskError> {
    info!("开始任务...");
    let main_loop = glib::MainLoop::new(None, false);
    let failure: Arc<Mutex<Option<TaskError>>> = Arc::new(Mutex::new(None));

    let force_exit_after = self.force_exit_after;
    let interrupt_loop = main_loop.clone();
    ctrlc::set_handler(move || {
      info!("收到中断信号，准备退出...");
      interrupt_loop.quit();
      thread::spawn(move || {
        thread::sleep(force_exit_after);
        warn!("强制退出程序");
        std::process::exit(1);
      });
    })?;

    let bus = self.pipeline.bus().ok_or(TaskError::NoBus)?;
    let _watch = bus.add_watch({
      let main_loop = main_loop.clone();
      let failure = failure.clone();
      move |_, message| {
        use gst::MessageView;

        match message.view() {
          MessageView::Eos(..) => {
            info!("视频流结束");
            main_loop.quit();
          }
          MessageView::Error(err) => {
            let source_name = err
              .src()
              .map(|s| s.path_string().to_string())
              .unwrap_or_else(|| "pipeline".to_string());
            let debug = err.debug().map(|d| d.to_string());
            error!(
              "{} 出错: {} ({})",
              source_name,
              err.error(),
              debug.as_deref().unwrap_or("")
            );
            let mut failure = failure.lock().unwrap_or_else(|p| p.into_inner());
            *failure = Some(TaskError::PipelineError {
              source_name,
              message: err.error().to_string(),
              debug,
            });
            main_loop.quit();
          }
          MessageView::Warning(w) => {
            warn!("管道警告: {}", w.error());
          }
          MessageView::StateChanged(s) => {
            debug!("状态变化: {:?} -> {:?}", s.old(), s.current());
          }
          _ => (),
        }
        glib::ControlFlow::Continue
      }
    })?;

    self.pipeline.set_state(gst::State::Playing)?;
    info!("管道开始运行");
    main_loop.run();

    info!("停止管道...");
    self.pipeline.set_state(gst::State::Null)?;

    let failure = failure.lock().unwrap_or_else(|p| p.into_inner()).take();
    match failure {
      Some(e) => Err(e),
      None => {
        info!("任务完成，退出");
        Ok(())
      }
    }
  }
}
