use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::error::ConvertError;
use crate::types::ImageAnnotation;

/// Read and parse a single LabelMe JSON file, streaming from a buffered reader
/// instead of loading the whole file into a string first.
pub fn read_and_parse_json(path: &Path) -> Result<ImageAnnotation, ConvertError> {
    let file = fs::File::open(path)?;
    let annotation = serde_json::from_reader(BufReader::new(file))?;
    Ok(annotation)
}

/// Decode a base64 payload, ignoring any ASCII whitespace (line-wrapped exports).
pub fn decode_image_data(image_data: &str) -> Result<Vec<u8>, ConvertError> {
    let compact: String = image_data
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    Ok(base64::decode(compact)?)
}

/// Create a progress bar with the given length and label
pub fn create_progress_bar(len: u64, label: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    let style = ProgressStyle::default_bar()
        .template(&format!(
            "{{spinner:.green}} [{}] [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} ({{eta}})",
            label
        ))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb
}

/// Create a directory and its parents, leaving existing content untouched
pub fn create_output_directory(path: &Path) -> std::io::Result<PathBuf> {
    if path.is_dir() {
        log::debug!("Directory {:?} already exists, keeping it", path);
    }
    fs::create_dir_all(path)?;
    Ok(path.to_path_buf())
}

/// Sanitized file stem of an annotation path, used to name the outputs
pub fn record_name(path: &Path) -> Result<String, ConvertError> {
    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| ConvertError::InvalidFileName(path.to_path_buf()))?;
    let name = sanitize_filename::sanitize(stem);
    if name.is_empty() {
        return Err(ConvertError::InvalidFileName(path.to_path_buf()));
    }
    Ok(name)
}
