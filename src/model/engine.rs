// 该文件是 Lianjian （脸检） 项目的一部分。
// src/model/engine.rs - 推理引擎
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

use thiserror::Error;
use tracing::error;

use crate::frame::NchwFrame;

#[derive(Error, Debug)]
pub enum ModelLoadError {
  #[error("无法读取模型文件 {path}: {source}")]
  Missing {
    path: PathBuf,
    source: std::io::Error,
  },
  #[error("权重文件与拓扑不匹配: {0}")]
  Mismatch(String),
  #[error("模型无效: {0}")]
  Invalid(String),
  #[error("模型路径错误: {0}")]
  PathError(String),
}

/// 前向推理接口：输入预处理后的帧，返回平铺的原始输出张量
pub trait InferenceEngine {
  type Error: std::error::Error + Send + Sync + 'static;

  fn forward(&self, frame: &NchwFrame) -> Result<Vec<f32>, Self::Error>;
}

impl<E: InferenceEngine + ?Sized> InferenceEngine for Box<E> {
  type Error = E::Error;

  fn forward(&self, frame: &NchwFrame) -> Result<Vec<f32>, Self::Error> {
    (**self).forward(frame)
  }
}

/// 检查模型文件存在且可读
pub(crate) fn ensure_readable(path: &Path) -> Result<(), ModelLoadError> {
  std::fs::File::open(path)
    .and_then(|file| file.metadata())
    .and_then(|meta| {
      if meta.is_file() {
        Ok(())
      } else {
        Err(std::io::Error::new(
          std::io::ErrorKind::InvalidInput,
          "不是普通文件",
        ))
      }
    })
    .map_err(|source| {
      error!("无法读取模型文件 {}: {}", path.display(), source);
      ModelLoadError::Missing {
        path: path.to_path_buf(),
        source,
      }
    })
}

#[cfg(feature = "engine_tract")]
mod tract;
#[cfg(feature = "engine_tract")]
pub use self::tract::TractEngine;
