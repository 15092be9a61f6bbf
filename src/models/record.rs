use std::collections::BTreeMap;

use super::schema::{ExtractionSchema, FieldValue, PAGE_COUNT_FIELD};

/// 单个文档的提取结果
///
/// 成功记录只有字段值，失败记录只有错误信息，二者不会同时存在。
/// 创建后不再修改。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionResult {
    filename: String,
    fields: BTreeMap<String, FieldValue>,
    page_count: Option<i64>,
    error: Option<String>,
}

impl ExtractionResult {
    /// 成功记录
    pub fn success(filename: impl Into<String>, fields: BTreeMap<String, FieldValue>) -> Self {
        let page_count = match fields.get(PAGE_COUNT_FIELD) {
            Some(FieldValue::Integer(n)) => Some(*n),
            _ => None,
        };
        Self {
            filename: filename.into(),
            fields,
            page_count,
            error: None,
        }
    }

    /// 失败记录（所有数据字段留空）
    pub fn failure(filename: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            fields: BTreeMap::new(),
            page_count: None,
            error: Some(error.into()),
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn page_count(&self) -> Option<i64> {
        self.page_count
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// 按表头顺序渲染一行，缺失值为空字符串
    pub fn to_row(&self, schema: &ExtractionSchema) -> Vec<String> {
        let mut row = Vec::with_capacity(schema.fields.len() + 2);
        row.push(self.filename.clone());
        row.extend(
            schema
                .field_names()
                .map(|name| self.fields.get(name).map(FieldValue::to_cell).unwrap_or_default()),
        );
        row.push(self.error.clone().unwrap_or_default());
        row
    }
}

/// 一次运行的全部结果，按发现顺序排列
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    records: Vec<ExtractionResult>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一条记录（每个文档只追加一次）
    pub fn push(&mut self, record: ExtractionResult) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[ExtractionResult] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn success_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_success()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.len() - self.success_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_row() {
        let schema = ExtractionSchema::default();
        let fields = schema
            .conform(r#"{"title":"T","author":"A","summary":"S","page_count":7}"#)
            .unwrap();
        let record = ExtractionResult::success("a.pdf", fields);

        assert!(record.is_success());
        assert_eq!(record.page_count(), Some(7));
        assert_eq!(record.to_row(&schema), vec!["a.pdf", "T", "A", "", "", "S", "7", ""]);
    }

    #[test]
    fn test_failure_row_is_blank() {
        let schema = ExtractionSchema::default();
        let record = ExtractionResult::failure("b.pdf", "timeout");

        assert!(!record.is_success());
        assert_eq!(record.page_count(), None);
        assert!(record.field("title").is_none());
        assert_eq!(record.to_row(&schema), vec!["b.pdf", "", "", "", "", "", "", "timeout"]);
    }

    #[test]
    fn test_batch_counts() {
        let mut batch = Batch::new();
        batch.push(ExtractionResult::failure("a.pdf", "boom"));
        batch.push(ExtractionResult::success("b.pdf", BTreeMap::new()));
        batch.push(ExtractionResult::failure("a.pdf", "boom"));

        assert_eq!(batch.len(), 3);
        assert_eq!(batch.success_count(), 1);
        assert_eq!(batch.failed_count(), 2);
        assert_eq!(batch.records()[1].filename(), "b.pdf");
    }
}
