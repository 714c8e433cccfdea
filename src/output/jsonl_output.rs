// 该文件是 Shoushi （手势） 项目的一部分。
// src/output/jsonl_output.rs - JSON Lines 事件记录输出
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

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Mutex;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::{FromUrl, FromUrlWithScheme, classifier::DetectedEvent, output::Render};

#[derive(Error, Debug)]
pub enum JsonLinesOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("序列化错误: {0}")]
  JsonError(#[from] serde_json::Error),
  #[error("输出文件锁已损坏")]
  Poisoned,
}

#[derive(Serialize)]
struct EventRecord<'a> {
  timestamp: String,
  frame: usize,
  #[serde(flatten)]
  event: &'a DetectedEvent,
}

/// 每个手势事件写为一行 JSON
pub struct JsonLinesOutput {
  path: PathBuf,
  writer: Mutex<BufWriter<File>>,
}

impl FromUrlWithScheme for JsonLinesOutput {
  const SCHEME: &'static str = "jsonl";
}

impl FromUrl for JsonLinesOutput {
  type Error = JsonLinesOutputError;

  fn from_url(uri: &url::Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(JsonLinesOutputError::SchemeMismatch);
    }

    let append = uri.query_pairs().any(|(k, _)| k == "append");
    let path = PathBuf::from(uri.path());
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
      std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
      .create(true)
      .write(true)
      .append(append)
      .truncate(!append)
      .open(&path)?;
    info!("事件输出文件: {}", path.display());

    Ok(JsonLinesOutput {
      path,
      writer: Mutex::new(BufWriter::new(file)),
    })
  }
}

impl JsonLinesOutput {
  pub fn path(&self) -> &PathBuf {
    &self.path
  }
}

impl Render<usize, Vec<DetectedEvent>> for JsonLinesOutput {
  type Error = JsonLinesOutputError;

  fn render_result(&self, frame: &usize, result: &Vec<DetectedEvent>) -> Result<(), Self::Error> {
    if result.is_empty() {
      return Ok(());
    }

    let timestamp = Utc::now().to_rfc3339();
    let mut writer = self
      .writer
      .lock()
      .map_err(|_| JsonLinesOutputError::Poisoned)?;
    for event in result {
      let record = EventRecord {
        timestamp: timestamp.clone(),
        frame: *frame,
        event,
      };
      serde_json::to_writer(&mut *writer, &record)?;
      writer.write_all(b"\n")?;
    }
    writer.flush()?;
    debug!("第 {} 帧写入 {} 条事件", frame, result.len());
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn writes_one_line_per_event() {
    let path = std::env::temp_dir().join(format!("shoushi-jsonl-{}.jsonl", std::process::id()));
    let url = url::Url::from_file_path(&path).unwrap();
    let url = url::Url::parse(&format!("jsonl://{}", url.path())).unwrap();
    let output = JsonLinesOutput::from_url(&url).unwrap();

    let events = vec![
      DetectedEvent {
        event: "rock".to_string(),
        x: 10.0,
        y: 20.0,
      },
      DetectedEvent {
        event: "paper".to_string(),
        x: 30.0,
        y: 40.0,
      },
    ];
    output.render_result(&3, &events).unwrap();
    output.render_result(&4, &Vec::new()).unwrap();

    let content = std::fs::read_to_string(output.path()).unwrap();
    let lines: Vec<serde_json::Value> = content
      .lines()
      .map(|line| serde_json::from_str(line).unwrap())
      .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["event"], "rock");
    assert_eq!(lines[0]["frame"], 3);
    assert_eq!(lines[1]["x"], 30.0);
    std::fs::remove_file(output.path()).unwrap();
  }
}
