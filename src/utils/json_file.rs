//! JSON 状态文件读写
//!
//! 读取时容忍文件缺失或损坏；写入时先写临时文件再原子重命名，
//! 保证磁盘上永远是完整的 JSON 文档。

use crate::error::FileError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;
use tracing::{debug, warn};

/// 读取 JSON 文件，缺失或损坏时返回默认值
pub async fn read_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("状态文件不存在，使用空数据: {}", path.display());
            return T::default();
        }
        Err(e) => {
            warn!("⚠️ 读取状态文件失败 {}: {}，使用空数据", path.display(), e);
            return T::default();
        }
    };

    match serde_json::from_str(&content) {
        Ok(value) => value,
        Err(e) => {
            warn!("⚠️ 状态文件已损坏 {}: {}，使用空数据", path.display(), e);
            T::default()
        }
    }
}

/// 原子写入 JSON 文件（整体覆盖）
pub async fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), FileError> {
    let path_str = path.display().to_string();

    let json = serde_json::to_string_pretty(value).map_err(|source| FileError::SerializeFailed {
        path: path_str.clone(),
        source,
    })?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|source| FileError::WriteFailed {
                path: path_str.clone(),
                source,
            })?;
    }

    let mut temp_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    fs::write(&temp_path, json)
        .await
        .map_err(|source| FileError::WriteFailed {
            path: temp_path.display().to_string(),
            source,
        })?;

    fs::rename(&temp_path, path)
        .await
        .map_err(|source| FileError::WriteFailed {
            path: path_str.clone(),
            source,
        })?;

    debug!("已保存状态文件: {}", path_str);
    Ok(())
}
