// 该文件是 Lianjian （脸检） 项目的一部分。
// src/input/read_image_file.rs - 图像文件输入
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

use image::{ImageReader, RgbImage};
use thiserror::Error;
use tracing::{debug, error, info};
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, utils::url_to_path};

#[derive(Error, Debug)]
pub enum ImageFileInputError {
  #[error("URI 方案不匹配: 期望 '{expected}', 实际 '{found}'")]
  SchemaMismatch {
    expected: &'static str,
    found: String,
  },
  #[error("URI 路径无效: {0}")]
  InvalidPath(#[from] std::string::FromUtf8Error),
  #[error("找不到图像文件 {path}: {source}")]
  NotFound {
    path: PathBuf,
    source: std::io::Error,
  },
  #[error("图像解码错误: {0}")]
  ImageLoadError(#[from] image::ImageError),
}

/// 单张图像输入，迭代一次后耗尽
#[derive(Debug)]
pub struct ImageFileInput {
  image: Option<RgbImage>,
}

impl FromUrlWithScheme for ImageFileInput {
  const SCHEME: &'static str = "image";
}

impl FromUrl for ImageFileInput {
  type Error = ImageFileInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI 方案不匹配: 期望 '{}', 实际 '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(ImageFileInputError::SchemaMismatch {
        expected: Self::SCHEME,
        found: url.scheme().to_string(),
      });
    }

    Self::open(url_to_path(url)?)
  }
}

impl ImageFileInput {
  pub fn open(path: impl AsRef<Path>) -> Result<Self, ImageFileInputError> {
    let path = path.as_ref();
    info!("读取图像文件: {}", path.display());

    let reader = ImageReader::open(path)
      .and_then(|reader| reader.with_guessed_format())
      .map_err(|source| {
        error!("无法打开图像文件 {}: {}", path.display(), source);
        ImageFileInputError::NotFound {
          path: path.to_path_buf(),
          source,
        }
      })?;
    let image = reader.decode()?.to_rgb8();
    debug!("图像尺寸: {}x{}", image.width(), image.height());

    Ok(Self::from_image(image))
  }

  pub fn from_image(image: RgbImage) -> Self {
    Self { image: Some(image) }
  }
}

impl Iterator for ImageFileInput {
  type Item = RgbImage;

  fn next(&mut self) -> Option<Self::Item> {
    self.image.take()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn missing_file_is_not_found() {
    let url = Url::parse("image:///definitely/not/here/face-1.jpg").unwrap();
    let err = ImageFileInput::from_url(&url).unwrap_err();
    assert!(matches!(err, ImageFileInputError::NotFound { .. }));
  }

  #[test]
  fn wrong_scheme_is_rejected() {
    let url = Url::parse("folder:.").unwrap();
    let err = ImageFileInput::from_url(&url).unwrap_err();
    assert!(matches!(
      err,
      ImageFileInputError::SchemaMismatch {
        expected: "image",
        ..
      }
    ));
  }

  #[test]
  fn yields_image_once() {
    let mut input = ImageFileInput::from_image(RgbImage::new(2, 2));
    assert!(input.next().is_some());
    assert!(input.next().is_none());
  }

  #[test]
  fn reads_png_from_disk() {
    let dir = std::env::temp_dir().join(format!("lianjian-input-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("face.png");
    RgbImage::from_pixel(3, 2, image::Rgb([1, 2, 3]))
      .save(&path)
      .unwrap();

    let mut input = ImageFileInput::open(&path).unwrap();
    let image = input.next().unwrap();
    assert_eq!(image.dimensions(), (3, 2));
    assert_eq!(image.get_pixel(0, 0).0, [1, 2, 3]);

    std::fs::remove_dir_all(&dir).unwrap();
  }
}
