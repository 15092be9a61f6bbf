use std::path::Path;

use tokio::fs;
use tracing::info;

use crate::error::SchemaError;
use crate::models::schema::ExtractionSchema;

/// 从 TOML 文件加载字段定义并校验
///
/// 文件格式：
/// ```toml
/// name = "extract_data"
/// required = ["title"]
///
/// [[fields]]
/// name = "title"
/// type = "string"
/// description = "Document title"
/// ```
pub async fn load_schema_file(schema_file_path: &Path) -> Result<ExtractionSchema, SchemaError> {
    let content = fs::read_to_string(schema_file_path)
        .await
        .map_err(|source| SchemaError::ReadFailed {
            path: schema_file_path.to_path_buf(),
            source,
        })?;

    let schema: ExtractionSchema = toml::from_str(&content).map_err(|source| SchemaError::ParseFailed {
        path: schema_file_path.to_path_buf(),
        source,
    })?;

    schema.validate()?;
    Ok(schema)
}

/// 加载字段定义：指定了文件则读取文件，否则使用内置字段
pub async fn load_schema(schema_file_path: Option<&Path>) -> Result<ExtractionSchema, SchemaError> {
    match schema_file_path {
        Some(path) => {
            info!("📐 正在加载字段定义: {}", path.display());
            let schema = load_schema_file(path).await?;
            info!("成功加载 {} 个字段", schema.fields.len());
            Ok(schema)
        }
        None => {
            let schema = ExtractionSchema::default();
            schema.validate()?;
            Ok(schema)
        }
    }
}
