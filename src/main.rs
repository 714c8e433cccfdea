// 该文件是 Shoushi （手势） 项目的一部分。
// src/main.rs - 项目主程序
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

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use url::Url;

use shoushi::{
  FromUrl,
  output::OutputWrapper,
  replay::{Recording, ReplayFingerpose, ReplayHandPoseDetection},
  service::{HandGestureService, ServiceConfig},
  task::{ContinuousTask, OneShotTask, Task},
};

/// Shoushi 项目参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 录制的手部关键点数据，例如 replay:///path/to/recording.json
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,

  /// 事件输出，log:// 或 jsonl:///path/to/events.jsonl
  #[arg(long, value_name = "OUTPUT", default_value = "log://")]
  pub output: Url,

  /// MediaPipe Hands 资源版本
  #[arg(long, value_name = "VERSION", default_value = "0.4.1646424915")]
  pub hands_version: String,

  /// 手势置信度阈值（0 - 10）
  #[arg(long, value_name = "THRESHOLD", default_value = "9.0")]
  pub min_confidence: f32,

  /// 只处理第一帧
  #[arg(long)]
  pub once: bool,

  /// 最大处理帧数（0 表示无限制）
  #[arg(long, default_value = "0", value_name = "COUNT")]
  pub max_frames: usize,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("输入来源: {}", args.input);
  info!("输出路径: {}", args.output);
  info!("MediaPipe Hands 版本: {}", args.hands_version);

  let recording = Arc::new(Recording::from_url(&args.input)?);
  let frames = recording.frame_indices();
  let config = ServiceConfig::new(
    ReplayHandPoseDetection::new(recording.clone()),
    ReplayFingerpose::new(recording),
    args.hands_version,
  );
  let service = HandGestureService::new(config)?.with_min_confidence(args.min_confidence);
  let output = OutputWrapper::from_url(&args.output)?;

  if args.once {
    return OneShotTask.run_task(frames, &service, output);
  }

  let frame_number = (args.max_frames > 0).then_some(args.max_frames);
  ContinuousTask::default()
    .with_frame_number(frame_number)
    .run_task(frames, &service, output)
}
