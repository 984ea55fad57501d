//! File-level processing steps.

pub mod conversion;
pub mod metadata;
pub mod prompt;

// Re-export key types for convenience
pub use conversion::{convert_directory, convert_raw_file, BatchSummary, ConversionError};
pub use metadata::{
    build_metadata, extract_date, generate_metadata, validate_directories, DateExtraction,
    Metadata, MetadataError,
};
pub use prompt::{prompt_create_output_dir, prompt_date_fallback, prompt_metadata_config, Prompter};
