pub mod analysis;
pub mod document_source;
pub mod extraction;
pub mod report_writer;

pub use analysis::{AnalysisService, FileHandle, StructuredRequest};
pub use document_source::list_pdf_files;
pub use extraction::ExtractionClient;
pub use report_writer::ReportWriter;
