// 该文件是 Shoushi （手势） 项目的一部分。
// src/output/log_output.rs - 日志输出
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

use std::convert::Infallible;

use tracing::info;

use crate::{FromUrlWithScheme, classifier::DetectedEvent, output::Render};

/// 将手势事件写入日志
#[derive(Debug, Default)]
pub struct LogOutput;

impl FromUrlWithScheme for LogOutput {
  const SCHEME: &'static str = "log";
}

impl crate::FromUrl for LogOutput {
  type Error = Infallible;

  fn from_url(_url: &url::Url) -> Result<Self, Self::Error> {
    Ok(LogOutput)
  }
}

impl Render<usize, Vec<DetectedEvent>> for LogOutput {
  type Error = Infallible;

  fn render_result(&self, frame: &usize, result: &Vec<DetectedEvent>) -> Result<(), Self::Error> {
    for event in result {
      info!(
        "第 {} 帧: {} ({:.1}, {:.1})",
        frame, event.event, event.x, event.y
      );
    }
    Ok(())
  }
}
