// 该文件是 Lianjian （脸检） 项目的一部分。
// src/model/face_detection.rs - 人脸检测器
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

use std::path::PathBuf;

use image::RgbImage;
use thiserror::Error;
use tracing::{debug, error, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::{ChannelOrder, FrameError, NchwFrame},
  model::{
    ClampMode, DetectResult, InferenceEngine, MalformedOutputError, Model, ModelLoadError,
    Postprocessor,
  },
  utils::{query_value, url_to_path},
};

pub const DEFAULT_INPUT_WIDTH: u32 = 672;
pub const DEFAULT_INPUT_HEIGHT: u32 = 384;
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.5;

#[derive(Error, Debug)]
pub enum FaceDetectionError {
  #[error("配置错误: {0}")]
  Config(String),
  #[error("模型加载错误: {0}")]
  Load(#[from] ModelLoadError),
  #[error("推理错误: {0}")]
  Inference(Box<dyn std::error::Error + Send + Sync>),
  #[error("模型输出格式错误: {0}")]
  MalformedOutput(#[from] MalformedOutputError),
}

impl From<FrameError> for FaceDetectionError {
  fn from(err: FrameError) -> Self {
    FaceDetectionError::Config(err.to_string())
  }
}

/// 人脸检测器：推理引擎 + 后处理
pub struct FaceDetector<E> {
  engine: E,
  postprocessor: Postprocessor,
  input_width: u32,
  input_height: u32,
  channel_order: ChannelOrder,
}

impl<E: InferenceEngine> FaceDetector<E> {
  /// 对原图做缩放与通道重排，得到模型输入
  pub fn preprocess(&self, image: &RgbImage) -> NchwFrame {
    NchwFrame::from_image(
      image,
      self.input_width,
      self.input_height,
      self.channel_order,
    )
  }

  /// 执行一次前向推理，返回原始输出张量
  pub fn forward(&self, image: &RgbImage) -> Result<Vec<f32>, FaceDetectionError> {
    let frame = self.preprocess(image);
    self
      .engine
      .forward(&frame)
      .map_err(|e| FaceDetectionError::Inference(Box::new(e)))
  }
}

impl<E: InferenceEngine> Model for FaceDetector<E> {
  type Input = RgbImage;
  type Output = DetectResult;
  type Error = FaceDetectionError;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    let raw = self.forward(input)?;
    debug!("原始输出张量长度: {}", raw.len());

    let result = self
      .postprocessor
      .postprocess(&raw, input.width(), input.height())
      .inspect_err(|e| error!("模型输出无法解析: {}", e))?;

    for item in result.iter() {
      debug!(
        "人脸 {:.2}% at ({}, {}) - ({}, {})",
        item.confidence * 100.0,
        item.rect.x_min,
        item.rect.y_min,
        item.rect.x_max,
        item.rect.y_max
      );
    }

    Ok(result)
  }
}

/// 检测器配置
#[derive(Debug, Clone)]
pub struct FaceDetectorBuilder {
  topology: PathBuf,
  weights: PathBuf,
  input_width: u32,
  input_height: u32,
  channel_order: ChannelOrder,
  threshold: f32,
  clamp: ClampMode,
}

impl FromUrlWithScheme for FaceDetectorBuilder {
  const SCHEME: &'static str = "onnx";
}

impl FromUrl for FaceDetectorBuilder {
  type Error = FaceDetectionError;

  /// `onnx:<topology>?weights=<weights>&width=672&height=384&channels=bgr`
  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(
        ModelLoadError::PathError(format!("模型路径必须使用 {} 方案", Self::SCHEME)).into(),
      );
    }

    let topology = url_to_path(url).map_err(|e| ModelLoadError::PathError(e.to_string()))?;
    let weights = query_value(url, "weights")
      .map(PathBuf::from)
      .ok_or_else(|| ModelLoadError::PathError("缺少 weights 参数".to_string()))?;

    let mut builder = FaceDetectorBuilder::new(topology, weights);
    if let Some(width) = query_value(url, "width") {
      builder.input_width = parse_dimension("width", &width)?;
    }
    if let Some(height) = query_value(url, "height") {
      builder.input_height = parse_dimension("height", &height)?;
    }
    if let Some(channels) = query_value(url, "channels") {
      builder.channel_order = channels.parse()?;
    }

    Ok(builder)
  }
}

fn parse_dimension(name: &str, value: &str) -> Result<u32, FaceDetectionError> {
  value
    .parse()
    .map_err(|_| FaceDetectionError::Config(format!("{} 参数无效: {}", name, value)))
}

impl FaceDetectorBuilder {
  pub fn new(topology: impl Into<PathBuf>, weights: impl Into<PathBuf>) -> Self {
    Self {
      topology: topology.into(),
      weights: weights.into(),
      input_width: DEFAULT_INPUT_WIDTH,
      input_height: DEFAULT_INPUT_HEIGHT,
      channel_order: ChannelOrder::default(),
      threshold: DEFAULT_CONFIDENCE_THRESHOLD,
      clamp: ClampMode::default(),
    }
  }

  pub fn input_size(mut self, width: u32, height: u32) -> Self {
    self.input_width = width;
    self.input_height = height;
    self
  }

  pub fn channel_order(mut self, order: ChannelOrder) -> Self {
    self.channel_order = order;
    self
  }

  pub fn threshold(mut self, threshold: f32) -> Self {
    self.threshold = threshold;
    self
  }

  pub fn clamp(mut self, clamp: ClampMode) -> Self {
    self.clamp = clamp;
    self
  }

  pub fn topology(&self) -> &PathBuf {
    &self.topology
  }

  pub fn weights(&self) -> &PathBuf {
    &self.weights
  }

  fn validate(&self) -> Result<(), FaceDetectionError> {
    if !(0.0..=1.0).contains(&self.threshold) {
      error!("置信度阈值 {} 超出 [0, 1]", self.threshold);
      return Err(FaceDetectionError::Config(format!(
        "置信度阈值必须在 [0, 1] 内, 实际为 {}",
        self.threshold
      )));
    }
    if self.input_width == 0 || self.input_height == 0 {
      return Err(FaceDetectionError::Config(format!(
        "模型输入尺寸无效: {}x{}",
        self.input_width, self.input_height
      )));
    }
    Ok(())
  }

  /// 使用调用方提供的推理引擎构建检测器
  pub fn build_with<E: InferenceEngine>(
    self,
    engine: E,
  ) -> Result<FaceDetector<E>, FaceDetectionError> {
    self.validate()?;
    debug!(
      "检测器配置: 输入 {}x{}, 通道 {:?}, 阈值 {}, 越界处理 {:?}",
      self.input_width, self.input_height, self.channel_order, self.threshold, self.clamp
    );

    Ok(FaceDetector {
      engine,
      postprocessor: Postprocessor::new(self.threshold, self.clamp),
      input_width: self.input_width,
      input_height: self.input_height,
      channel_order: self.channel_order,
    })
  }

  #[cfg(feature = "engine_tract")]
  pub fn build(self) -> Result<FaceDetector<crate::model::TractEngine>, FaceDetectionError> {
    self.validate()?;
    let engine = crate::model::TractEngine::load(
      &self.topology,
      &self.weights,
      self.input_width,
      self.input_height,
    )?;
    info!("人脸检测模型就绪");
    self.build_with(engine)
  }
}
