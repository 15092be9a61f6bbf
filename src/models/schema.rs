//! 提取字段定义
//!
//! 字段定义是整个运行期共享的配置：字段顺序决定 CSV 列顺序，
//! 同时用来生成发给服务的 JSON Schema 并校验服务返回的结构化数据。

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value as JsonValue};

use crate::error::{ExtractError, SchemaError};

/// 报告中固定的首列
pub const FILENAME_COLUMN: &str = "filename";
/// 报告中固定的末列
pub const ERROR_COLUMN: &str = "error";
/// 页数字段名
pub const PAGE_COUNT_FIELD: &str = "page_count";

/// 字段值类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    String,
    Integer,
    StringArray,
}

impl FieldType {
    fn describe(self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Integer => "integer",
            FieldType::StringArray => "array<string>",
        }
    }

    fn json_schema(self, description: &str) -> JsonValue {
        match self {
            FieldType::String => json!({ "type": "string", "description": description }),
            FieldType::Integer => json!({ "type": "integer", "description": description }),
            FieldType::StringArray => json!({
                "type": "array",
                "items": { "type": "string" },
                "description": description,
            }),
        }
    }
}

/// 单个字段定义
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub description: String,
}

impl FieldDef {
    pub fn new(name: &str, field_type: FieldType, description: &str) -> Self {
        Self {
            name: name.to_string(),
            field_type,
            description: description.to_string(),
        }
    }
}

/// 从结构化响应中解析出的字段值
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    List(Vec<String>),
}

impl FieldValue {
    /// 渲染为 CSV 单元格内容
    pub fn to_cell(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Integer(n) => n.to_string(),
            FieldValue::List(items) => items.join("; "),
        }
    }

    fn is_blank(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::Integer(_) => false,
            FieldValue::List(items) => items.iter().all(|s| s.trim().is_empty()),
        }
    }
}

/// 提取字段定义
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionSchema {
    /// 发给服务的 schema 名称
    #[serde(default = "default_schema_name")]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub fields: Vec<FieldDef>,
    #[serde(default)]
    pub required: Vec<String>,
}

fn default_schema_name() -> String {
    "extract_data".to_string()
}

impl Default for ExtractionSchema {
    fn default() -> Self {
        Self {
            name: default_schema_name(),
            description: "Extract structured data from PDF documents".to_string(),
            fields: vec![
                FieldDef::new("title", FieldType::String, "Document title"),
                FieldDef::new("author", FieldType::String, "Document author"),
                FieldDef::new("date", FieldType::String, "Publication date (YYYY-MM-DD)"),
                FieldDef::new("keywords", FieldType::StringArray, "Key topics and keywords"),
                FieldDef::new("summary", FieldType::String, "Brief document summary"),
                FieldDef::new(PAGE_COUNT_FIELD, FieldType::Integer, "Number of pages"),
            ],
            required: vec!["title".to_string(), "author".to_string(), "summary".to_string()],
        }
    }
}

impl ExtractionSchema {
    /// 校验字段定义本身是否合法
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.fields.is_empty() {
            return Err(SchemaError::NoFields);
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if field.name == FILENAME_COLUMN || field.name == ERROR_COLUMN {
                return Err(SchemaError::ReservedField(field.name.clone()));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(SchemaError::DuplicateField(field.name.clone()));
            }
        }

        if let Some(unknown) = self.required.iter().find(|r| !seen.contains(r.as_str())) {
            return Err(SchemaError::UnknownRequired(unknown.clone()));
        }

        Ok(())
    }

    /// 字段名（按声明顺序）
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|r| r == name)
    }

    /// CSV 表头：filename + 字段 + error
    pub fn header(&self) -> Vec<String> {
        std::iter::once(FILENAME_COLUMN)
            .chain(self.field_names())
            .chain(std::iter::once(ERROR_COLUMN))
            .map(str::to_string)
            .collect()
    }

    /// 生成 JSON Schema（用于结构化输出约束）
    pub fn to_json_schema(&self) -> JsonValue {
        let properties: Map<String, JsonValue> = self
            .fields
            .iter()
            .map(|f| (f.name.clone(), f.field_type.json_schema(&f.description)))
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": self.required,
        })
    }

    /// 将服务返回的 JSON 文本解析并校验为字段值
    ///
    /// 值的 JSON 类型必须与字段类型一致，不做字符串与数字之间的转换。
    /// 必填字段缺失、为 null 或为空白时报错；一个字段都没有时同样报错；多余的键忽略。
    pub fn conform(&self, text: &str) -> Result<BTreeMap<String, FieldValue>, ExtractError> {
        let payload: JsonValue = serde_json::from_str(strip_code_fence(text))
            .map_err(|e| ExtractError::MalformedPayload(e.to_string()))?;

        let object = payload
            .as_object()
            .ok_or_else(|| ExtractError::MalformedPayload(format!("期望 JSON 对象，实际为 {}", type_name(&payload))))?;

        let mut values = BTreeMap::new();
        for field in &self.fields {
            let value = match object.get(&field.name) {
                None | Some(JsonValue::Null) => None,
                Some(raw) => Some(convert(field, raw)?),
            };

            match value {
                Some(v) if !v.is_blank() => {
                    values.insert(field.name.clone(), v);
                }
                _ if self.is_required(&field.name) => {
                    return Err(ExtractError::MissingRequired(field.name.clone()));
                }
                _ => {}
            }
        }

        if values.is_empty() {
            return Err(ExtractError::MalformedPayload("响应中没有任何字段值".to_string()));
        }

        Ok(values)
    }
}

fn convert(field: &FieldDef, raw: &JsonValue) -> Result<FieldValue, ExtractError> {
    let wrong_type = || ExtractError::WrongType {
        field: field.name.clone(),
        expected: field.field_type.describe(),
    };

    match (field.field_type, raw) {
        (FieldType::String, JsonValue::String(s)) => Ok(FieldValue::Text(s.trim().to_string())),
        (FieldType::Integer, JsonValue::Number(n)) => integer_value(n).map(FieldValue::Integer).ok_or_else(wrong_type),
        (FieldType::StringArray, JsonValue::Array(items)) => items
            .iter()
            .map(|item| item.as_str().map(|s| s.trim().to_string()).ok_or_else(wrong_type))
            .collect::<Result<Vec<_>, _>>()
            .map(FieldValue::List),
        _ => Err(wrong_type()),
    }
}

/// JSON 数字转为 i64：接受 `12.0` 这类整数值，超出 i64 范围的拒绝
fn integer_value(n: &serde_json::Number) -> Option<i64> {
    // i64::MAX as f64 向上取整为 2^63，因此上界用开区间
    const LOWER: f64 = i64::MIN as f64;
    const UPPER: f64 = i64::MAX as f64;

    n.as_i64().or_else(|| {
        n.as_f64()
            .filter(|f| f.fract() == 0.0 && *f >= LOWER && *f < UPPER)
            .map(|f| f as i64)
    })
}

/// 去掉模型偶尔包裹的 ```json 代码块
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "bool",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schema_is_valid() {
        let schema = ExtractionSchema::default();
        schema.validate().unwrap();
        assert_eq!(
            schema.header(),
            vec!["filename", "title", "author", "date", "keywords", "summary", "page_count", "error"]
        );
    }

    #[test]
    fn test_json_schema_shape() {
        let schema = ExtractionSchema::default().to_json_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["keywords"]["type"], "array");
        assert_eq!(schema["properties"]["keywords"]["items"]["type"], "string");
        assert_eq!(schema["properties"]["page_count"]["type"], "integer");
        assert_eq!(schema["required"], json!(["title", "author", "summary"]));
    }

    #[test]
    fn test_validate_rejects_reserved_and_duplicates() {
        let mut schema = ExtractionSchema::default();
        schema.fields.push(FieldDef::new("error", FieldType::String, ""));
        assert!(matches!(schema.validate(), Err(SchemaError::ReservedField(_))));

        let mut schema = ExtractionSchema::default();
        schema.fields.push(FieldDef::new("title", FieldType::String, ""));
        assert!(matches!(schema.validate(), Err(SchemaError::DuplicateField(_))));

        let mut schema = ExtractionSchema::default();
        schema.required.push("isbn".to_string());
        assert!(matches!(schema.validate(), Err(SchemaError::UnknownRequired(_))));
    }

    #[test]
    fn test_conform_full_response() {
        let schema = ExtractionSchema::default();
        let values = schema
            .conform(
                r#"{"title":"Rust in Action","author":"T. McNamara","date":"2021-08-10",
                    "keywords":["rust","systems"],"summary":"A book.","page_count":456,"extra":1}"#,
            )
            .unwrap();

        assert_eq!(values["title"], FieldValue::Text("Rust in Action".into()));
        assert_eq!(values["keywords"].to_cell(), "rust; systems");
        assert_eq!(values["page_count"], FieldValue::Integer(456));
        assert!(!values.contains_key("extra"));
    }

    #[test]
    fn test_conform_optional_fields_absent() {
        let schema = ExtractionSchema::default();
        let values = schema
            .conform(r#"{"title":"T","author":"A","summary":"S","date":null}"#)
            .unwrap();
        assert_eq!(values.len(), 3);
        assert!(!values.contains_key("date"));
    }

    #[test]
    fn test_conform_missing_required() {
        let schema = ExtractionSchema::default();
        let err = schema.conform(r#"{"title":"T","summary":"S"}"#).unwrap_err();
        assert!(matches!(err, ExtractError::MissingRequired(ref f) if f == "author"));

        let err = schema.conform(r#"{"title":"T","author":"  ","summary":"S"}"#).unwrap_err();
        assert!(matches!(err, ExtractError::MissingRequired(ref f) if f == "author"));
    }

    #[test]
    fn test_conform_malformed() {
        let schema = ExtractionSchema::default();
        assert!(matches!(schema.conform("not json"), Err(ExtractError::MalformedPayload(_))));
        assert!(matches!(schema.conform("[1,2]"), Err(ExtractError::MalformedPayload(_))));
    }

    #[test]
    fn test_conform_wrong_type() {
        let schema = ExtractionSchema::default();
        let err = schema
            .conform(r#"{"title":"T","author":"A","summary":"S","page_count":"many"}"#)
            .unwrap_err();
        assert!(matches!(err, ExtractError::WrongType { ref field, .. } if field == "page_count"));
    }

    #[test]
    fn test_conform_strips_code_fence() {
        let schema = ExtractionSchema::default();
        let values = schema
            .conform("```json\n{\"title\":\"T\",\"author\":\"A\",\"summary\":\"S\",\"page_count\":12.0}\n```")
            .unwrap();
        assert_eq!(values["page_count"], FieldValue::Integer(12));
    }

    #[test]
    fn test_conform_rejects_mistyped_values() {
        let schema = ExtractionSchema::default();

        let err = schema
            .conform(r#"{"title":123,"author":"A","summary":"S"}"#)
            .unwrap_err();
        assert!(matches!(err, ExtractError::WrongType { ref field, .. } if field == "title"));

        let err = schema
            .conform(r#"{"title":"T","author":true,"summary":"S"}"#)
            .unwrap_err();
        assert!(matches!(err, ExtractError::WrongType { ref field, .. } if field == "author"));

        let err = schema
            .conform(r#"{"title":"T","author":"A","summary":"S","page_count":"7"}"#)
            .unwrap_err();
        assert!(matches!(err, ExtractError::WrongType { ref field, .. } if field == "page_count"));

        let err = schema
            .conform(r#"{"title":"T","author":"A","summary":"S","keywords":"solo"}"#)
            .unwrap_err();
        assert!(matches!(err, ExtractError::WrongType { ref field, .. } if field == "keywords"));

        let err = schema
            .conform(r#"{"title":"T","author":"A","summary":"S","page_count":3.5}"#)
            .unwrap_err();
        assert!(matches!(err, ExtractError::WrongType { ref field, .. } if field == "page_count"));
    }

    #[test]
    fn test_conform_rejects_out_of_range_integers() {
        let schema = ExtractionSchema::default();
        for raw in ["1e300", "-1e300", "18446744073709551615", "9223372036854775808.0"] {
            let text = format!(r#"{{"title":"T","author":"A","summary":"S","page_count":{raw}}}"#);
            let err = schema.conform(&text).unwrap_err();
            assert!(
                matches!(err, ExtractError::WrongType { ref field, .. } if field == "page_count"),
                "{raw} should be rejected"
            );
        }

        let values = schema
            .conform(r#"{"title":"T","author":"A","summary":"S","page_count":9223372036854775807}"#)
            .unwrap();
        assert_eq!(values["page_count"], FieldValue::Integer(i64::MAX));
    }

    #[test]
    fn test_conform_rejects_empty_reply_without_required_fields() {
        let schema = ExtractionSchema {
            required: Vec::new(),
            ..ExtractionSchema::default()
        };

        let err = schema.conform("{}").unwrap_err();
        assert!(matches!(err, ExtractError::MalformedPayload(_)));

        let err = schema.conform(r#"{"title":" ","keywords":[]}"#).unwrap_err();
        assert!(matches!(err, ExtractError::MalformedPayload(_)));

        let values = schema.conform(r#"{"date":"2024-01-31"}"#).unwrap();
        assert_eq!(values.len(), 1);
    }
}
