// 该文件是 Shoushi （手势） 项目的一部分。
// src/replay.rs - 录制数据回放
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

//! 录制文件格式：
//!
//! ```json
//! {
//!   "frames": [
//!     {
//!       "width": 640.0,
//!       "flipped": false,
//!       "hands": [
//!         { "keypoints": [...], "keypoints3D": [...], "gestures": [{ "name": "rock", "score": 9.5 }] }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! `gestures` 为录制时估计库给出的候选手势，回放时按三维关键点查找，
//! 三维关键点重复时以先出现的一组为准。

use std::collections::HashSet;
use std::ops::Range;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  detector::{DetectorConfig, EstimationConfig, HandDetector, HandPoseDetection, SupportedModel},
  gesture::{
    GestureDescription, GestureEstimation, GestureEstimator, GestureLibrary, GesturePrediction,
  },
  keypoint::HandPrediction,
};

#[derive(Error, Debug)]
pub enum ReplayError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("录制文件解析错误: {0}")]
  JsonError(#[from] serde_json::Error),
  #[error("帧序号越界: {0}")]
  FrameOutOfRange(usize),
  #[error("不支持的检测器配置: {0}")]
  UnsupportedConfig(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedHand {
  #[serde(flatten)]
  pub prediction: HandPrediction,
  #[serde(default)]
  pub gestures: Vec<GesturePrediction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedFrame {
  #[serde(default)]
  pub width: Option<f32>,
  /// 录制时二维坐标是否已经镜像
  #[serde(default)]
  pub flipped: bool,
  pub hands: Vec<RecordedHand>,
}

impl RecordedFrame {
  fn predictions(&self, config: &EstimationConfig) -> Vec<HandPrediction> {
    let mirror = match (config.flip_horizontal != self.flipped, self.width) {
      (true, Some(width)) => Some(width),
      (true, None) => {
        debug!("录制帧缺少宽度，跳过镜像");
        None
      }
      (false, _) => None,
    };

    self
      .hands
      .iter()
      .map(|hand| {
        let mut prediction = hand.prediction.clone();
        if let Some(width) = mirror {
          for keypoint in prediction.keypoints.iter_mut() {
            keypoint.x = width - keypoint.x;
          }
        }
        prediction
      })
      .collect()
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recording {
  pub frames: Vec<RecordedFrame>,
}

impl Recording {
  pub fn from_json_str(json: &str) -> Result<Self, ReplayError> {
    Ok(serde_json::from_str(json)?)
  }

  pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ReplayError> {
    let path = path.as_ref();
    info!("加载录制文件: {}", path.display());
    let data = std::fs::read_to_string(path)?;
    let recording = Self::from_json_str(&data)?;
    debug!("录制帧数: {}", recording.frames.len());
    Ok(recording)
  }

  pub fn len(&self) -> usize {
    self.frames.len()
  }

  pub fn is_empty(&self) -> bool {
    self.frames.is_empty()
  }

  /// 回放时的帧序列，每帧以序号表示
  pub fn frame_indices(&self) -> Range<usize> {
    0..self.frames.len()
  }
}

impl FromUrlWithScheme for Recording {
  const SCHEME: &'static str = "replay";
}

impl FromUrl for Recording {
  type Error = ReplayError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(ReplayError::SchemeMismatch);
    }
    Self::load(url.path())
  }
}

/// 以录制数据充当手部姿态检测库
pub struct ReplayHandPoseDetection {
  recording: Arc<Recording>,
}

impl ReplayHandPoseDetection {
  pub fn new(recording: Arc<Recording>) -> Self {
    ReplayHandPoseDetection { recording }
  }
}

pub struct ReplayDetector {
  recording: Arc<Recording>,
  max_hands: usize,
}

impl HandPoseDetection for ReplayHandPoseDetection {
  type Detector = ReplayDetector;
  type Error = ReplayError;

  fn create_detector(
    &self,
    model: SupportedModel,
    config: &DetectorConfig,
  ) -> Result<ReplayDetector, ReplayError> {
    if config.max_hands == 0 {
      return Err(ReplayError::UnsupportedConfig(format!(
        "{:?}: max_hands 必须大于 0",
        model
      )));
    }
    info!(
      "回放检测器: {:?}, 最多 {} 只手, 共 {} 帧",
      model,
      config.max_hands,
      self.recording.len()
    );
    Ok(ReplayDetector {
      recording: self.recording.clone(),
      max_hands: config.max_hands as usize,
    })
  }
}

impl HandDetector for ReplayDetector {
  type Frame = usize;
  type Error = ReplayError;

  fn estimate_hands(
    &self,
    frame: &usize,
    config: &EstimationConfig,
  ) -> Result<Vec<HandPrediction>, ReplayError> {
    let recorded = self
      .recording
      .frames
      .get(*frame)
      .ok_or(ReplayError::FrameOutOfRange(*frame))?;
    let mut hands = recorded.predictions(config);
    if hands.len() > self.max_hands {
      warn!(
        "第 {} 帧录制了 {} 只手，仅保留 {} 只",
        frame,
        hands.len(),
        self.max_hands
      );
      hands.truncate(self.max_hands);
    }
    Ok(hands)
  }
}

/// 以录制的候选手势充当手势估计库
pub struct ReplayFingerpose {
  recording: Arc<Recording>,
}

impl ReplayFingerpose {
  pub fn new(recording: Arc<Recording>) -> Self {
    ReplayFingerpose { recording }
  }
}

/// 按三维关键点查找录制的候选手势
///
/// 估计时只能看到关键点，不知道帧序号；三维关键点完全相同的多只手共用先录制的一组候选。
pub struct ReplayEstimator {
  entries: Vec<ReplayEntry>,
}

type ReplayEntry = (Vec<[f32; 3]>, Vec<GesturePrediction>);

impl GestureLibrary for ReplayFingerpose {
  type Estimator = ReplayEstimator;
  type Error = ReplayError;

  fn gesture_estimator(
    &self,
    known_gestures: &[GestureDescription],
  ) -> Result<ReplayEstimator, ReplayError> {
    let known: HashSet<&str> = known_gestures.iter().map(GestureDescription::name).collect();

    let entries = self
      .recording
      .frames
      .iter()
      .flat_map(|frame| frame.hands.iter())
      .filter_map(|hand| {
        let keypoints_3d = hand.prediction.keypoints_3d.as_ref()?;
        let landmarks: Vec<[f32; 3]> = keypoints_3d.iter().map(|k| k.to_landmark()).collect();
        let gestures: Vec<GesturePrediction> = hand
          .gestures
          .iter()
          .filter(|gesture| {
            let is_known = known.contains(gesture.name.as_str());
            if !is_known {
              warn!("录制中包含未知手势: {}", gesture.name);
            }
            is_known
          })
          .cloned()
          .collect();
        Some((landmarks, gestures))
      })
      .fold(Vec::<ReplayEntry>::new(), |mut entries, (landmarks, gestures)| {
        match entries.iter().find(|(recorded, _)| *recorded == landmarks) {
          Some((_, recorded)) if *recorded != gestures => {
            warn!("录制中存在相同的三维关键点但候选手势不同，保留先出现的一组");
          }
          Some(_) => {}
          None => entries.push((landmarks, gestures)),
        }
        entries
      });

    debug!("回放估计器载入 {} 组候选", entries.len());
    Ok(ReplayEstimator { entries })
  }
}

impl GestureEstimator for ReplayEstimator {
  type Error = ReplayError;

  fn estimate(
    &self,
    landmarks: &[[f32; 3]],
    min_confidence: f32,
  ) -> Result<GestureEstimation, ReplayError> {
    let gestures = self
      .entries
      .iter()
      .find(|(recorded, _)| recorded.as_slice() == landmarks)
      .map(|(_, gestures)| {
        gestures
          .iter()
          .filter(|gesture| gesture.score >= min_confidence)
          .cloned()
          .collect()
      })
      .unwrap_or_default();

    Ok(GestureEstimation {
      pose_data: Vec::new(),
      gestures,
    })
  }
}
