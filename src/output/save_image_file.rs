// 该文件是 Lianjian （脸检） 项目的一部分。
// src/output/save_image_file.rs - 保存图像文件
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

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, TimeZone};
use image::RgbImage;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  model::DetectResult,
  output::{Render, draw::Draw},
  utils::{query_value, url_to_path},
};

const DEFAULT_PREFIX: &str = "test";
// 文件名中不使用冒号，保持字典序即时间序
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

/// 生成 `<prefix><YYYY-MM-DD-HH-MM-SS>.png`
pub fn timestamped_file_name<Tz: TimeZone>(prefix: &str, time: &DateTime<Tz>) -> String
where
  Tz::Offset: std::fmt::Display,
{
  format!("{}{}.png", prefix, time.format(TIMESTAMP_FORMAT))
}

#[derive(Error, Debug)]
pub enum SaveImageFileError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("图像错误: {0}")]
  ImageError(#[from] image::ImageError),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("URI 路径无效: {0}")]
  InvalidPath(#[from] std::string::FromUtf8Error),
}

/// 将绘制结果保存到目录下，文件名带本地时间戳
#[derive(Debug, Clone)]
pub struct SaveImageFileOutput {
  directory: PathBuf,
  prefix: String,
  draw: Draw,
}

impl FromUrlWithScheme for SaveImageFileOutput {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for SaveImageFileOutput {
  type Error = SaveImageFileError;

  /// `folder:<directory>?prefix=test`
  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(SaveImageFileError::SchemeMismatch(format!(
        "期望保存方式 '{}', 实际保存方式 '{}'",
        Self::SCHEME,
        uri.scheme()
      )));
    }

    let mut output = SaveImageFileOutput::new(url_to_path(uri)?);
    if let Some(prefix) = query_value(uri, "prefix") {
      output.prefix = prefix;
    }
    Ok(output)
  }
}

impl SaveImageFileOutput {
  pub fn new(directory: impl Into<PathBuf>) -> Self {
    Self {
      directory: directory.into(),
      prefix: DEFAULT_PREFIX.to_string(),
      draw: Draw::default(),
    }
  }

  pub fn directory(&self) -> &Path {
    &self.directory
  }

  fn save_image(&self, image: &RgbImage) -> Result<PathBuf, SaveImageFileError> {
    if !self.directory.as_os_str().is_empty() {
      std::fs::create_dir_all(&self.directory)?;
    }

    let path = self
      .directory
      .join(timestamped_file_name(&self.prefix, &Local::now()));
    image.save(&path)?;

    info!("保存图像到文件: {}", path.display());
    Ok(path)
  }

  /// 绘制检测框并写盘，返回输出文件路径
  pub fn save_annotated(
    &self,
    frame: &RgbImage,
    result: &DetectResult,
  ) -> Result<PathBuf, SaveImageFileError> {
    debug!("绘制 {} 个检测框", result.len());
    let image = self.draw.draw_detection(frame, result);
    self.save_image(&image)
  }
}

impl Render<RgbImage, DetectResult> for SaveImageFileOutput {
  type Error = SaveImageFileError;

  fn render_result(&self, frame: &RgbImage, result: &DetectResult) -> Result<(), Self::Error> {
    self.save_annotated(frame, result).map(|_| ())
  }
}
