//! LabelMe to YOLOv5 dataset converter
//!
//! Splits a flat directory of LabelMe JSON files (with embedded image data)
//! into train/valid/test sets, writes one YOLO label file and one JPEG per
//! record, and appends a `data.yaml` manifest.

pub mod config;
pub mod conversion;
pub mod dataset;
pub mod error;
pub mod io;
pub mod types;
pub mod utils;
pub mod yolo_dataset;

// Re-export commonly used types and functions
pub use config::{Args, ManifestValDir, SplitCheck};
pub use error::{ConfigError, ConvertError};
pub use io::{create_dataset_yaml, list_annotation_files, setup_output_directories};
pub use types::{
    BoundingBox, DatasetReport, ImageAnnotation, LabelSet, OutputDirs, Shape, SourceDisposal,
    Split, SplitData, SplitReport,
};
pub use yolo_dataset::process_dataset;
