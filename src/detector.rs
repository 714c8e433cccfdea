// 该文件是 Shoushi （手势） 项目的一部分。
// src/detector.rs - 手部关键点检测器适配
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

use once_cell::sync::OnceCell;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info};
use url::Url;

use crate::keypoint::HandPrediction;

const MEDIAPIPE_HANDS_CDN: &str = "https://cdn.jsdelivr.net/npm/@mediapipe/hands";
const DETECTOR_MAX_HANDS: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SupportedModel {
  MediaPipeHands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Runtime {
  Mediapipe,
  Tfjs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelType {
  Lite,
  Full,
}

/// 检测器构造参数
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectorConfig {
  pub runtime: Runtime,
  pub solution_path: Option<Url>,
  pub model_type: ModelType,
  pub max_hands: u32,
}

impl DetectorConfig {
  /// 使用 CDN 上指定版本的 MediaPipe Hands 资源
  pub fn mediapipe_hands(version: &str) -> Result<Self, url::ParseError> {
    let solution_path = Url::parse(&format!("{}@{}", MEDIAPIPE_HANDS_CDN, version))?;
    Ok(DetectorConfig {
      runtime: Runtime::Mediapipe,
      solution_path: Some(solution_path),
      model_type: ModelType::Lite,
      max_hands: DETECTOR_MAX_HANDS,
    })
  }
}

/// 单帧推理参数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimationConfig {
  pub flip_horizontal: bool,
  pub static_image_mode: bool,
}

/// 已构造的手部检测器
pub trait HandDetector {
  type Frame: ?Sized;
  type Error: std::error::Error + Send + Sync + 'static;

  fn estimate_hands(
    &self,
    frame: &Self::Frame,
    config: &EstimationConfig,
  ) -> Result<Vec<HandPrediction>, Self::Error>;
}

/// 手部姿态检测库，负责构造检测器
pub trait HandPoseDetection {
  type Detector: HandDetector;
  type Error: std::error::Error + Send + Sync + 'static;

  fn create_detector(
    &self,
    model: SupportedModel,
    config: &DetectorConfig,
  ) -> Result<Self::Detector, Self::Error>;
}

pub type DetectorFrame<L> = <<L as HandPoseDetection>::Detector as HandDetector>::Frame;

#[derive(Error, Debug)]
pub enum LandmarkSourceError<C, E> {
  #[error("检测器尚未初始化")]
  NotInitialized,
  #[error("模型资源路径错误: {0}")]
  SolutionPath(#[from] url::ParseError),
  #[error("创建检测器失败: {0}")]
  CreateDetector(C),
  #[error("手部关键点推理失败: {0}")]
  Estimate(E),
}

pub type SourceError<L> = LandmarkSourceError<
  <L as HandPoseDetection>::Error,
  <<L as HandPoseDetection>::Detector as HandDetector>::Error,
>;

/// 懒加载并缓存检测器的关键点来源
pub struct LandmarkSource<L: HandPoseDetection> {
  library: L,
  hands_version: String,
  detector: OnceCell<L::Detector>,
}

impl<L: HandPoseDetection> LandmarkSource<L> {
  pub fn new(library: L, hands_version: impl Into<String>) -> Self {
    LandmarkSource {
      library,
      hands_version: hands_version.into(),
      detector: OnceCell::new(),
    }
  }

  pub fn hands_version(&self) -> &str {
    &self.hands_version
  }

  pub fn is_initialized(&self) -> bool {
    self.detector.get().is_some()
  }

  /// 返回已缓存的检测器；首次调用时构造检测器
  ///
  /// 构造失败时不缓存，下一次调用会重新尝试。
  pub fn initialize_detector(&self) -> Result<&L::Detector, SourceError<L>> {
    self.detector.get_or_try_init(|| {
      let config = DetectorConfig::mediapipe_hands(&self.hands_version)?;
      info!(
        "创建手部检测器: {:?}, 资源路径: {:?}",
        config.model_type, config.solution_path
      );
      let detector = self
        .library
        .create_detector(SupportedModel::MediaPipeHands, &config)
        .map_err(|e| {
          error!("创建检测器失败: {}", e);
          SourceError::<L>::CreateDetector(e)
        })?;
      info!("手部检测器创建完成");
      Ok(detector)
    })
  }

  /// 对单帧图像进行手部关键点推理，输入画面按镜像处理
  pub fn estimate_hands(
    &self,
    frame: &DetectorFrame<L>,
  ) -> Result<Vec<HandPrediction>, SourceError<L>> {
    let detector = self
      .detector
      .get()
      .ok_or(SourceError::<L>::NotInitialized)?;
    let config = EstimationConfig {
      flip_horizontal: true,
      static_image_mode: false,
    };
    let hands = detector
      .estimate_hands(frame, &config)
      .map_err(SourceError::<L>::Estimate)?;
    debug!("检测到 {} 只手", hands.len());
    Ok(hands)
  }
}

#[cfg(test)]
pub(crate) mod tests {
  use super::*;
  use std::sync::Mutex;
  use std::sync::atomic::{AtomicUsize, Ordering};

  #[derive(Error, Debug)]
  #[error("mock failure")]
  pub struct MockError;

  pub struct MockDetector {
    pub id: usize,
    pub hands: Vec<HandPrediction>,
    pub seen: Mutex<Vec<EstimationConfig>>,
  }

  impl HandDetector for MockDetector {
    type Frame = u32;
    type Error = MockError;

    fn estimate_hands(
      &self,
      _frame: &u32,
      config: &EstimationConfig,
    ) -> Result<Vec<HandPrediction>, MockError> {
      self.seen.lock().unwrap().push(*config);
      Ok(self.hands.clone())
    }
  }

  #[derive(Default)]
  pub struct MockLibrary {
    pub created: AtomicUsize,
    pub fail: bool,
    pub configs: Mutex<Vec<DetectorConfig>>,
    pub hands: Vec<HandPrediction>,
  }

  impl HandPoseDetection for MockLibrary {
    type Detector = MockDetector;
    type Error = MockError;

    fn create_detector(
      &self,
      model: SupportedModel,
      config: &DetectorConfig,
    ) -> Result<MockDetector, MockError> {
      assert_eq!(model, SupportedModel::MediaPipeHands);
      if self.fail {
        return Err(MockError);
      }
      self.configs.lock().unwrap().push(config.clone());
      let id = self.created.fetch_add(1, Ordering::SeqCst);
      Ok(MockDetector {
        id,
        hands: self.hands.clone(),
        seen: Mutex::new(Vec::new()),
      })
    }
  }

  #[test]
  fn initialize_twice_returns_cached_detector() {
    let source = LandmarkSource::new(MockLibrary::default(), "0.4.1646424915");
    let first = source.initialize_detector().unwrap() as *const MockDetector;
    let second = source.initialize_detector().unwrap() as *const MockDetector;
    assert_eq!(first, second);
    assert_eq!(source.library.created.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn detector_config_is_fixed() {
    let source = LandmarkSource::new(MockLibrary::default(), "0.4.1646424915");
    source.initialize_detector().unwrap();
    let configs = source.library.configs.lock().unwrap();
    let config = &configs[0];
    assert_eq!(config.runtime, Runtime::Mediapipe);
    assert_eq!(config.model_type, ModelType::Lite);
    assert_eq!(config.max_hands, 2);
    assert_eq!(
      config.solution_path.as_ref().map(Url::as_str),
      Some("https://cdn.jsdelivr.net/npm/@mediapipe/hands@0.4.1646424915")
    );
  }

  #[test]
  fn estimate_before_initialize_fails() {
    let source = LandmarkSource::new(MockLibrary::default(), "0.4");
    assert!(matches!(
      source.estimate_hands(&0),
      Err(LandmarkSourceError::NotInitialized)
    ));
  }

  #[test]
  fn estimate_flips_input() {
    let source = LandmarkSource::new(MockLibrary::default(), "0.4");
    let detector = source.initialize_detector().unwrap();
    assert_eq!(detector.id, 0);
    source.estimate_hands(&7).unwrap();
    let seen = detector.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].flip_horizontal);
  }

  #[test]
  fn failed_construction_is_not_cached() {
    let library = MockLibrary {
      fail: true,
      ..Default::default()
    };
    let source = LandmarkSource::new(library, "0.4");
    assert!(matches!(
      source.initialize_detector(),
      Err(LandmarkSourceError::CreateDetector(MockError))
    ));
    assert!(!source.is_initialized());
  }
}
