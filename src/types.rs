use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::ConvertError;

/// Extension of the LabelMe annotation files picked up by the pipeline
pub const ANNOTATION_EXTENSION: &str = "json";

// The Shape struct representing annotated shapes
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Shape {
    pub label: String,
    pub points: Vec<(f64, f64)>,
    #[serde(default)]
    pub group_id: Option<i64>,
    #[serde(default)]
    pub shape_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

// The ImageAnnotation struct representing one LabelMe record
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ImageAnnotation {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub flags: Option<HashMap<String, bool>>,
    pub shapes: Vec<Shape>,
    #[serde(default)]
    pub image_path: Option<String>,
    pub image_data: String,
    #[serde(default)]
    pub image_height: Option<u32>,
    #[serde(default)]
    pub image_width: Option<u32>,
}

/// A YOLO box: center and extent, normalized by the image size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x_center: f64,
    pub y_center: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    /// Render as `label cx cy w h\n`. Whole values keep their `.0` (`1.0`, not `1`).
    pub fn to_yolo_line(&self, label: &str) -> String {
        format!(
            "{} {:?} {:?} {:?} {:?}\n",
            label, self.x_center, self.y_center, self.width, self.height
        )
    }
}

/// Distinct labels in first-seen order. The position of a label is its class index.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LabelSet {
    labels: Vec<String>,
    index: HashMap<String, usize>,
}

impl LabelSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `label` if unseen and return its class index either way.
    pub fn insert(&mut self, label: &str) -> usize {
        if let Some(&id) = self.index.get(label) {
            return id;
        }
        let id = self.labels.len();
        self.labels.push(label.to_string());
        self.index.insert(label.to_string(), id);
        id
    }

    /// Append the labels of `other` that are not already present, keeping their order.
    pub fn merge(&mut self, other: &LabelSet) {
        for label in other.iter() {
            self.insert(label);
        }
    }

    pub fn contains(&self, label: &str) -> bool {
        self.index.contains_key(label)
    }

    pub fn class_id(&self, label: &str) -> Option<usize> {
        self.index.get(label).copied()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.labels
    }
}

impl<S: AsRef<str>> FromIterator<S> for LabelSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = LabelSet::new();
        for label in iter {
            set.insert(label.as_ref());
        }
        set
    }
}

/// The three dataset partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Split {
    Validation,
    Test,
    Train,
}

impl Split {
    /// Order in which the splits are converted, which also fixes label discovery order.
    pub const PROCESSING_ORDER: [Split; 3] = [Split::Validation, Split::Test, Split::Train];

    pub fn dir_name(&self) -> &'static str {
        match self {
            Split::Validation => "valid",
            Split::Test => "test",
            Split::Train => "train",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Split::Validation => "Valid",
            Split::Test => "Test",
            Split::Train => "Train",
        }
    }
}

// Paths of one split's directories
#[derive(Debug, Clone)]
pub struct SplitDirs {
    pub split: Split,
    pub labels_dir: PathBuf,
    pub images_dir: PathBuf,
}

// Struct to hold the paths to the output directories for valid/test/train splits
#[derive(Debug, Clone)]
pub struct OutputDirs {
    pub valid: SplitDirs,
    pub test: SplitDirs,
    pub train: SplitDirs,
    pub archive_dir: Option<PathBuf>,
}

impl OutputDirs {
    pub fn split(&self, split: Split) -> &SplitDirs {
        match split {
            Split::Validation => &self.valid,
            Split::Test => &self.test,
            Split::Train => &self.train,
        }
    }
}

// Struct to hold the annotation files assigned to each split
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplitData {
    pub val_files: Vec<PathBuf>,
    pub test_files: Vec<PathBuf>,
    pub train_files: Vec<PathBuf>,
}

impl SplitData {
    pub fn files(&self, split: Split) -> &[PathBuf] {
        match split {
            Split::Validation => &self.val_files,
            Split::Test => &self.test_files,
            Split::Train => &self.train_files,
        }
    }

    pub fn len(&self) -> usize {
        self.val_files.len() + self.test_files.len() + self.train_files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// What happens to a source JSON file once it has been converted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceDisposal {
    Delete,
    Archive(PathBuf),
}

/// A successfully converted record.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertedRecord {
    pub name: String,
    /// Shape labels in file order, duplicates included
    pub labels: Vec<String>,
    pub label_path: PathBuf,
    pub image_path: PathBuf,
}

// Result of converting one annotation file
#[derive(Debug)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub result: Result<ConvertedRecord, ConvertError>,
}

// Everything one Converter call produced
#[derive(Debug)]
pub struct SplitReport {
    pub split: Split,
    pub outcomes: Vec<FileOutcome>,
    pub labels: LabelSet,
    pub stats: ProcessingStats,
}

impl SplitReport {
    pub fn failures(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes.iter().filter(|outcome| outcome.result.is_err())
    }
}

// Result of a whole pipeline run
#[derive(Debug)]
pub struct DatasetReport {
    pub splits: Vec<SplitReport>,
    pub labels: LabelSet,
    pub stats: ProcessingStats,
}

impl DatasetReport {
    pub fn split(&self, split: Split) -> Option<&SplitReport> {
        self.splits.iter().find(|report| report.split == split)
    }
}

// Struct to hold processing statistics
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProcessingStats {
    pub total_files_processed: usize,
    pub successful_conversions: usize,
    pub failed_conversions: usize,
    pub boxes_written: usize,
}

impl ProcessingStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_total(&mut self) {
        self.total_files_processed += 1;
    }

    pub fn increment_successful(&mut self, boxes: usize) {
        self.successful_conversions += 1;
        self.boxes_written += boxes;
    }

    pub fn increment_failed(&mut self) {
        self.failed_conversions += 1;
    }

    pub fn absorb(&mut self, other: &ProcessingStats) {
        self.total_files_processed += other.total_files_processed;
        self.successful_conversions += other.successful_conversions;
        self.failed_conversions += other.failed_conversions;
        self.boxes_written += other.boxes_written;
    }

    pub fn print_summary(&self) {
        log::info!("=== Processing Summary ===");
        log::info!("Total files processed: {}", self.total_files_processed);
        log::info!("Successful conversions: {}", self.successful_conversions);
        log::info!("Bounding boxes written: {}", self.boxes_written);
        log::info!("Failed conversions: {}", self.failed_conversions);

        if self.failed_conversions > 0 {
            log::warn!(
                "{} annotation file(s) were left in their split's labels directory",
                self.failed_conversions
            );
        }
    }
}
