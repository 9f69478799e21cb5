use crate::error::{AppError, AppResult, ConfigError};
use crate::models::AccessCredential;
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;

/// 按行读取文本文件，忽略空行和 `#` 开头的注释
pub async fn load_lines(path: &Path) -> AppResult<Vec<String>> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;

    Ok(parse_lines(&content))
}

fn parse_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// 加载账号 token 列表
///
/// 文件不存在或没有任何 token 都属于致命的配置错误。
pub async fn load_credentials(path: &str) -> AppResult<Vec<AccessCredential>> {
    let lines = match load_lines(Path::new(path)).await {
        Ok(lines) => lines,
        Err(AppError::File(e)) => {
            tracing::error!("读取 token 文件失败: {}", e);
            Vec::new()
        }
        Err(e) => return Err(e),
    };

    if lines.is_empty() {
        return Err(ConfigError::NoCredentials {
            path: path.to_string(),
        }
        .into());
    }

    Ok(lines.into_iter().map(AccessCredential::new).collect())
}

/// 加载代理列表
///
/// 文件不存在或为空时返回空列表，所有账号直连。
pub async fn load_proxy_specs(path: &str) -> Vec<String> {
    match fs::read_to_string(path).await {
        Ok(content) => {
            let proxies = parse_lines(&content);
            if proxies.is_empty() {
                tracing::warn!("⚠️ {} 中没有代理，将不使用代理运行", path);
            } else {
                tracing::info!("🌐 从 {} 加载了 {} 个代理", path, proxies.len());
            }
            proxies
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::warn!("⚠️ 代理文件 {} 不存在，将不使用代理运行", path);
            Vec::new()
        }
        Err(e) => {
            tracing::warn!("⚠️ 读取代理文件 {} 失败: {}，将不使用代理运行", path, e);
            Vec::new()
        }
    }
}
