// 该文件是 Shoushi （手势） 项目的一部分。
// src/task.rs - 手势识别任务
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

use std::{
  sync::{
    Mutex,
    mpsc::{self, Receiver},
  },
  thread,
  time::Duration,
};

use once_cell::sync::OnceCell;
use tracing::{info, warn};

use crate::{
  classifier::DetectedEvent,
  detector::{DetectorFrame, HandDetector, HandPoseDetection},
  gesture::GestureEstimator,
  output::Render,
  service::HandGestureService,
};

static INTERRUPT: OnceCell<Mutex<Receiver<()>>> = OnceCell::new();

/// 进程内只注册一次 Ctrl-C 处理，之后的任务共用同一个信号通道
fn interrupt_signal() -> Result<&'static Mutex<Receiver<()>>, ctrlc::Error> {
  INTERRUPT.get_or_try_init(|| {
    let (tx, rx) = mpsc::channel();
    ctrlc::set_handler(move || {
      info!("收到中断信号，准备退出...");
      let _ = tx.send(());
      thread::spawn(|| {
        thread::sleep(Duration::from_secs(30));
        warn!("强制退出程序");
        std::process::exit(1);
      });
    })?;
    Ok(Mutex::new(rx))
  })
}

fn interrupted(signal: &Mutex<Receiver<()>>) -> bool {
  signal
    .lock()
    .map(|rx| rx.try_recv().is_ok())
    .unwrap_or(false)
}

pub trait Task<I, P: HandPoseDetection, G, O>: Sized {
  type Error;
  fn run_task(
    self,
    input: I,
    service: &HandGestureService<P, G>,
    output: O,
  ) -> Result<(), Self::Error>;
}

/// 处理单帧：推理、识别并输出，返回事件数量
fn process_frame<P, G, O, RE>(
  frame_index: usize,
  frame: &DetectorFrame<P>,
  service: &HandGestureService<P, G>,
  output: &O,
) -> anyhow::Result<usize>
where
  P: HandPoseDetection,
  G: GestureEstimator,
  RE: std::error::Error + Sync + Send + 'static,
  O: Render<usize, Vec<DetectedEvent>, Error = RE>,
{
  let hands = service.estimate_hands(frame)?;
  let events = service
    .detect_gestures(&hands)
    .collect::<Result<Vec<_>, _>>()?;
  output.render_result(&frame_index, &events)?;
  Ok(events.len())
}

pub struct OneShotTask;

impl<F, I, P, G, O, RE> Task<I, P, G, O> for OneShotTask
where
  I: Iterator<Item = F>,
  P: HandPoseDetection,
  P::Detector: HandDetector<Frame = F>,
  G: GestureEstimator,
  RE: std::error::Error + Sync + Send + 'static,
  O: Render<usize, Vec<DetectedEvent>, Error = RE>,
{
  type Error = anyhow::Error;

  fn run_task(
    self,
    mut input: I,
    service: &HandGestureService<P, G>,
    output: O,
  ) -> Result<(), Self::Error> {
    info!("开始任务...");
    service.initialize_detector()?;
    let frame = input.next().ok_or_else(|| anyhow::anyhow!("没有输入帧"))?;
    info!("输入帧获取成功，开始识别...");
    let now = std::time::Instant::now();
    let count = process_frame(0, &frame, service, &output)?;
    info!("识别完成，{} 个事件，耗时: {:.2?}", count, now.elapsed());
    Ok(())
  }
}

#[derive(Default, Debug)]
pub struct ContinuousTask {
  frame_number: Option<usize>,
}

impl ContinuousTask {
  pub fn with_frame_number(mut self, frame_number: Option<usize>) -> Self {
    self.frame_number = frame_number;
    self
  }
}

impl<F, I, P, G, O, RE> Task<I, P, G, O> for ContinuousTask
where
  I: Iterator<Item = F>,
  P: HandPoseDetection,
  P::Detector: HandDetector<Frame = F>,
  G: GestureEstimator,
  RE: std::error::Error + Sync + Send + 'static,
  O: Render<usize, Vec<DetectedEvent>, Error = RE>,
{
  type Error = anyhow::Error;

  fn run_task(
    self,
    input: I,
    service: &HandGestureService<P, G>,
    output: O,
  ) -> Result<(), Self::Error> {
    info!("开始任务...");
    let signal = interrupt_signal()?;

    service.initialize_detector()?;

    let mut frame_index = 0;
    let mut total_events = 0;
    for frame in input {
      let now = std::time::Instant::now();
      let count = process_frame(frame_index, &frame, service, &output)?;
      info!(
        "第 {} 帧识别完成，{} 个事件，耗时: {:.2?}",
        frame_index,
        count,
        now.elapsed()
      );
      total_events += count;
      frame_index += 1;
      if self.frame_number.map(|n| frame_index >= n).unwrap_or(false) {
        info!("达到指定帧数 {}, 退出任务循环", frame_index);
        break;
      }
      if interrupted(signal) {
        warn!("中断信号接收，退出任务循环");
        break;
      }
    }

    info!("任务完成，共 {} 帧，{} 个事件", frame_index, total_events);
    Ok(())
  }
}
