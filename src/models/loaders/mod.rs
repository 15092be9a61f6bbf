pub mod schema_loader;

pub use schema_loader::{load_schema, load_schema_file};
