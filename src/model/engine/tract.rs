// 该文件是 Lianjian （脸检） 项目的一部分。
// src/model/engine/tract.rs - tract ONNX 推理引擎
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
use tract_onnx::prelude::*;
use tracing::{debug, error, info, warn};

use super::{InferenceEngine, ModelLoadError, ensure_readable};
use crate::frame::NchwFrame;

type TractPlan = RunnableModel<TypedFact, Box<dyn TypedOp>, TypedModel>;

#[derive(Error, Debug)]
pub enum TractEngineError {
  #[error("输入帧尺寸 {got_w}x{got_h} 与模型 {want_w}x{want_h} 不一致")]
  ShapeMismatch {
    got_w: usize,
    got_h: usize,
    want_w: usize,
    want_h: usize,
  },
  #[error("推理失败: {0}")]
  Inference(String),
}

/// ONNX 拓扑 + 外部权重文件
///
/// 拓扑中的初始化张量通过 `external_data` 引用权重文件，
/// 权重文件需位于拓扑解析外部数据的目录中。
pub struct TractEngine {
  plan: TractPlan,
  input_width: usize,
  input_height: usize,
}

impl TractEngine {
  pub fn load(
    topology: impl AsRef<Path>,
    weights: impl AsRef<Path>,
    input_width: u32,
    input_height: u32,
  ) -> Result<Self, ModelLoadError> {
    let topology = topology.as_ref();
    let weights = weights.as_ref();

    info!("加载模型拓扑: {}", topology.display());
    ensure_readable(topology)?;
    info!("加载模型权重: {}", weights.display());
    ensure_readable(weights)?;

    check_weights_reference(topology, weights)?;

    let (w, h) = (input_width as usize, input_height as usize);
    let model = tract_onnx::onnx()
      .model_for_path(topology)
      .map_err(build_failed)?;

    let inputs = model.input_outlets().map_err(build_failed)?.len();
    if inputs != 1 {
      error!("模型输入数量为 {}, 期望 1", inputs);
      return Err(ModelLoadError::Invalid(format!(
        "模型输入数量应为 1, 实际为 {}",
        inputs
      )));
    }

    let plan = model
      .with_input_fact(0, InferenceFact::dt_shape(u8::datum_type(), tvec!(1, 3, h, w)))
      .and_then(|model| model.into_optimized())
      .and_then(|model| model.into_runnable())
      .map_err(build_failed)?;
    info!("模型加载完成, 输入尺寸 {}x{}", w, h);

    Ok(Self {
      plan,
      input_width: w,
      input_height: h,
    })
  }
}

fn check_weights_reference(topology: &Path, weights: &Path) -> Result<(), ModelLoadError> {
  let proto = tract_onnx::onnx()
    .proto_model_for_path(topology)
    .map_err(|e| ModelLoadError::Invalid(format!("{:#}", e)))?;

  let locations: Vec<String> = proto
    .graph
    .iter()
    .flat_map(|graph| graph.initializer.iter())
    .flat_map(|tensor| tensor.external_data.iter())
    .filter(|entry| entry.key == "location")
    .map(|entry| entry.value.clone())
    .collect();

  if locations.is_empty() {
    warn!(
      "拓扑 {} 未引用外部权重，权重文件 {} 不会被使用",
      topology.display(),
      weights.display()
    );
    return Ok(());
  }

  let base = topology.parent().unwrap_or_else(|| Path::new(""));
  let expected = canonical(weights)?;
  for location in &locations {
    let referenced = base.join(location);
    let resolved = referenced.canonicalize().map_err(|_| {
      error!("拓扑引用的权重 {} 不存在", referenced.display());
      ModelLoadError::Mismatch(format!(
        "拓扑引用 {}, 但文件不存在; 实际给定 {}",
        referenced.display(),
        expected.display()
      ))
    })?;
    if resolved != expected {
      error!(
        "拓扑引用的权重 {} 与给定的权重 {} 不一致",
        resolved.display(),
        expected.display()
      );
      return Err(ModelLoadError::Mismatch(format!(
        "拓扑引用 {}, 实际给定 {}",
        resolved.display(),
        expected.display()
      )));
    }
  }

  debug!("拓扑引用外部权重 {} 处", locations.len());
  Ok(())
}

fn build_failed(e: TractError) -> ModelLoadError {
  error!("模型构建失败: {:#}", e);
  ModelLoadError::Invalid(format!("{:#}", e))
}

fn canonical(path: &Path) -> Result<PathBuf, ModelLoadError> {
  path.canonicalize().map_err(|source| ModelLoadError::Missing {
    path: path.to_path_buf(),
    source,
  })
}

impl InferenceEngine for TractEngine {
  type Error = TractEngineError;

  fn forward(&self, frame: &NchwFrame) -> Result<Vec<f32>, Self::Error> {
    if frame.width() != self.input_width || frame.height() != self.input_height {
      return Err(TractEngineError::ShapeMismatch {
        got_w: frame.width(),
        got_h: frame.height(),
        want_w: self.input_width,
        want_h: self.input_height,
      });
    }

    let shape = [1, frame.channels(), frame.height(), frame.width()];
    let input = Tensor::from_shape::<u8>(&shape, frame.as_nchw())
      .map_err(|e| TractEngineError::Inference(format!("{:#}", e)))?;

    debug!("执行模型推理");
    let outputs = self
      .plan
      .run(tvec!(input.into()))
      .map_err(|e| TractEngineError::Inference(format!("{:#}", e)))?;

    let output = outputs
      .first()
      .ok_or_else(|| TractEngineError::Inference("模型没有输出".to_string()))?;
    debug!("模型输出形状: {:?}", output.shape());

    let data = output
      .as_slice::<f32>()
      .map_err(|e| TractEngineError::Inference(format!("{:#}", e)))?;
    Ok(data.to_vec())
  }
}

#[cfg(test)]
mod tests {
  use prost::Message;
  use tract_onnx::pb::{
    GraphProto, ModelProto, OperatorSetIdProto, StringStringEntryProto, TensorProto,
    tensor_proto::{DataLocation, DataType},
  };

  use super::*;

  fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("lianjian-tract-{}-{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
  }

  /// 只有一个外部初始化张量、没有输入的图
  fn write_external_graph(topology: &Path, location: &str) {
    let weight = TensorProto {
      name: "w".to_string(),
      dims: vec![4],
      data_type: DataType::Float as i32,
      data_location: Some(DataLocation::External as i32),
      external_data: vec![StringStringEntryProto {
        key: "location".to_string(),
        value: location.to_string(),
      }],
      ..Default::default()
    };
    let proto = ModelProto {
      ir_version: 7,
      opset_import: vec![OperatorSetIdProto {
        domain: String::new(),
        version: 13,
      }],
      graph: Some(GraphProto {
        name: "faces".to_string(),
        initializer: vec![weight],
        ..Default::default()
      }),
      ..Default::default()
    };
    std::fs::write(topology, proto.encode_to_vec()).unwrap();
  }

  #[test]
  fn missing_topology_fails_before_parsing() {
    let err = TractEngine::load("/no/such/model.onnx", "/no/such/model.bin", 672, 384)
      .err()
      .unwrap();
    assert!(matches!(err, ModelLoadError::Missing { .. }));
  }

  #[test]
  fn garbage_topology_is_invalid() {
    let dir = scratch_dir("garbage");
    let topology = dir.join("model.onnx");
    let weights = dir.join("model.bin");
    std::fs::write(&topology, b"this is not a protobuf graph").unwrap();
    std::fs::write(&weights, [0u8; 16]).unwrap();

    let err = TractEngine::load(&topology, &weights, 672, 384).err().unwrap();
    assert!(matches!(err, ModelLoadError::Invalid(_)));

    std::fs::remove_dir_all(&dir).unwrap();
  }

  #[test]
  fn graph_without_input_is_invalid() {
    let dir = scratch_dir("no-input");
    let topology = dir.join("model.onnx");
    let weights = dir.join("model.bin");
    write_external_graph(&topology, "model.bin");
    std::fs::write(&weights, [0u8; 16]).unwrap();

    let err = TractEngine::load(&topology, &weights, 672, 384).err().unwrap();
    match err {
      ModelLoadError::Invalid(message) => assert!(message.contains("实际为 0"), "{}", message),
      other => panic!("unexpected error: {:?}", other),
    }

    std::fs::remove_dir_all(&dir).unwrap();
  }

  #[test]
  fn weights_not_referenced_by_topology_mismatch() {
    let dir = scratch_dir("mismatch");
    let topology = dir.join("model.onnx");
    let weights = dir.join("model.bin");
    write_external_graph(&topology, "other.bin");
    std::fs::write(dir.join("other.bin"), [0u8; 16]).unwrap();
    std::fs::write(&weights, [0u8; 16]).unwrap();

    let err = TractEngine::load(&topology, &weights, 672, 384).err().unwrap();
    match err {
      ModelLoadError::Mismatch(message) => {
        assert!(message.contains("other.bin"), "{}", message);
        assert!(message.contains("model.bin"), "{}", message);
      }
      other => panic!("unexpected error: {:?}", other),
    }

    std::fs::remove_dir_all(&dir).unwrap();
  }

  #[test]
  fn dangling_weights_reference_is_mismatch() {
    let dir = scratch_dir("dangling");
    let topology = dir.join("model.onnx");
    let weights = dir.join("model.bin");
    write_external_graph(&topology, "gone.bin");
    std::fs::write(&weights, [0u8; 16]).unwrap();

    let err = TractEngine::load(&topology, &weights, 672, 384).err().unwrap();
    match err {
      ModelLoadError::Mismatch(message) => {
        assert!(message.contains("gone.bin"), "{}", message);
        assert!(message.contains("不存在"), "{}", message);
        assert!(message.contains("model.bin"), "{}", message);
      }
      other => panic!("unexpected error: {:?}", other),
    }

    std::fs::remove_dir_all(&dir).unwrap();
  }
}
