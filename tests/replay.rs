// 该文件是 Shoushi （手势） 项目的一部分。
// tests/replay.rs - 回放端到端测试
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

#![cfg(all(feature = "replay", feature = "jsonl_output"))]

use std::sync::Arc;

use serde_json::{Value, json};
use url::Url;

use shoushi::{
  FromUrl,
  keypoint::HandLandmark,
  output::OutputWrapper,
  replay::{Recording, ReplayFingerpose, ReplayHandPoseDetection},
  service::{HandGestureService, ServiceConfig},
  task::{ContinuousTask, Task},
};

fn hand_json(offset: f32, gestures: Value, with_3d: bool) -> Value {
  let keypoints: Vec<Value> = HandLandmark::ALL
    .iter()
    .map(|landmark| {
      json!({
        "x": offset + landmark.index() as f32,
        "y": 100.0 + landmark.index() as f32,
        "name": landmark.name(),
      })
    })
    .collect();
  let keypoints_3d: Vec<Value> = HandLandmark::ALL
    .iter()
    .map(|landmark| {
      json!({
        "x": offset / 1000.0,
        "y": landmark.index() as f32 / 100.0,
        "z": 0.0,
        "name": landmark.name(),
      })
    })
    .collect();
  let mut hand = json!({
    "handedness": "Left",
    "score": 0.95,
    "keypoints": keypoints,
    "gestures": gestures,
  });
  if with_3d {
    hand["keypoints3D"] = Value::from(keypoints_3d);
  }
  hand
}

fn recording() -> Recording {
  let value = json!({
    "frames": [
      {
        "flipped": true,
        "hands": [
          hand_json(10.0, json!([{"name": "rock", "score": 9.4}, {"name": "paper", "score": 9.8}]), true),
          hand_json(20.0, json!([{"name": "victory", "score": 9.9}]), false),
        ]
      },
      {
        "flipped": true,
        "hands": [
          hand_json(30.0, json!([{"name": "thumbs_up", "score": 8.0}]), true),
        ]
      },
      {
        "flipped": true,
        "hands": [
          hand_json(40.0, json!([{"name": "scissors", "score": 9.5}, {"name": "victory", "score": 9.5}]), true),
          hand_json(50.0, json!([{"name": "rock", "score": 10.0}]), true),
        ]
      }
    ]
  });
  Recording::from_json_str(&value.to_string()).unwrap()
}

fn service(
  recording: Arc<Recording>,
) -> HandGestureService<ReplayHandPoseDetection, shoushi::replay::ReplayEstimator> {
  HandGestureService::new(ServiceConfig::new(
    ReplayHandPoseDetection::new(recording.clone()),
    ReplayFingerpose::new(recording),
    "0.4.1646424915",
  ))
  .unwrap()
}

#[test]
fn replay_frames_produce_expected_events() {
  let recording = Arc::new(recording());
  let service = service(recording.clone());
  service.initialize_detector().unwrap();

  let mut per_frame = Vec::new();
  for frame in recording.frame_indices() {
    let hands = service.estimate_hands(&frame).unwrap();
    let events: Vec<_> = service
      .detect_gestures(&hands)
      .collect::<Result<_, _>>()
      .unwrap();
    per_frame.push(events);
  }

  assert_eq!(per_frame[0].len(), 1);
  assert_eq!(per_frame[0][0].event, "paper");
  assert_eq!((per_frame[0][0].x, per_frame[0][0].y), (18.0, 108.0));
  assert!(per_frame[1].is_empty());
  let names: Vec<&str> = per_frame[2].iter().map(|e| e.event.as_str()).collect();
  assert_eq!(names, vec!["scissors", "rock"]);
}

#[test]
fn continuous_task_writes_json_lines() {
  let recording = Arc::new(recording());
  let service = service(recording.clone());

  let path = std::env::temp_dir().join(format!("shoushi-replay-{}.jsonl", std::process::id()));
  let url = Url::parse(&format!("jsonl://{}", path.display())).unwrap();
  let output = OutputWrapper::from_url(&url).unwrap();

  ContinuousTask::default()
    .with_frame_number(Some(2))
    .run_task(recording.frame_indices(), &service, output)
    .unwrap();

  let content = std::fs::read_to_string(&path).unwrap();
  let lines: Vec<Value> = content
    .lines()
    .map(|line| serde_json::from_str(line).unwrap())
    .collect();
  assert_eq!(lines.len(), 1);
  assert_eq!(lines[0]["event"], "paper");
  assert_eq!(lines[0]["frame"], 0);
  std::fs::remove_file(&path).unwrap();
}
