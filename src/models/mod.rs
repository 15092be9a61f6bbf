pub mod loaders;
pub mod record;
pub mod schema;

pub use loaders::load_schema;
pub use record::{Batch, ExtractionResult};
pub use schema::{ExtractionSchema, FieldDef, FieldType, FieldValue};
