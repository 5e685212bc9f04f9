// 该文件是 Lianjian （脸检） 项目的一部分。
// src/utils.rs - 辅助函数
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

use url::Url;

/// 将 URL 路径部分解码为文件系统路径
///
/// `image:face-1.jpg` 得到相对路径 `face-1.jpg`，
/// `image:///tmp/a%20b.jpg` 得到绝对路径 `/tmp/a b.jpg`。
pub fn url_to_path(url: &Url) -> Result<PathBuf, std::string::FromUtf8Error> {
  let decoded = urlencoding::decode(url.path())?;
  Ok(PathBuf::from(decoded.into_owned()))
}

/// 读取查询参数，同名参数取第一个
pub fn query_value(url: &Url, key: &str) -> Option<String> {
  url
    .query_pairs()
    .find(|(k, _)| k == key)
    .map(|(_, v)| v.into_owned())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn relative_path_is_kept() {
    let url = Url::parse("image:face-1.jpg").unwrap();
    assert_eq!(url_to_path(&url).unwrap(), PathBuf::from("face-1.jpg"));
  }

  #[test]
  fn absolute_path_is_percent_decoded() {
    let url = Url::parse("image:///tmp/a%20b.jpg").unwrap();
    assert_eq!(url_to_path(&url).unwrap(), PathBuf::from("/tmp/a b.jpg"));
  }

  #[test]
  fn query_value_picks_first() {
    let url = Url::parse("onnx:m.onnx?weights=a.bin&weights=b.bin").unwrap();
    assert_eq!(query_value(&url, "weights").as_deref(), Some("a.bin"));
    assert_eq!(query_value(&url, "width"), None);
  }
}
