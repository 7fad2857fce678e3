use image::ImageFormat;
use indicatif::ProgressBar;
use log::{debug, error};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::ConvertError;
use crate::io::{list_annotation_files, move_file};
use crate::types::{
    BoundingBox, ConvertedRecord, FileOutcome, LabelSet, ProcessingStats, Shape, SourceDisposal,
    SplitDirs, SplitReport,
};
use crate::utils::{decode_image_data, read_and_parse_json, record_name};

/// Convert every annotation file in a split's labels directory.
/// A file that fails is logged and left in place; the rest of the split still runs.
pub fn convert_split_directory(
    split_dirs: &SplitDirs,
    disposal: &SourceDisposal,
    pb: &ProgressBar,
) -> std::io::Result<SplitReport> {
    let files = list_annotation_files(&split_dirs.labels_dir)?;
    pb.set_length(files.len() as u64);

    let mut labels = LabelSet::new();
    let mut stats = ProcessingStats::new();
    let mut outcomes = Vec::with_capacity(files.len());

    for json_path in files {
        stats.increment_total();
        let result = process_annotation(&json_path, split_dirs, disposal);
        match &result {
            Ok(record) => {
                for label in &record.labels {
                    labels.insert(label);
                }
                stats.increment_successful(record.labels.len());
            }
            Err(e) => {
                error!(
                    "Failed to process annotation {}: {}",
                    json_path.display(),
                    e
                );
                stats.increment_failed();
            }
        }
        outcomes.push(FileOutcome {
            path: json_path,
            result,
        });
        pb.inc(1);
    }

    Ok(SplitReport {
        split: split_dirs.split,
        outcomes,
        labels,
        stats,
    })
}

/// Convert a single annotation file: write the label file and the JPEG, then
/// delete or archive the source
pub fn process_annotation(
    json_path: &Path,
    split_dirs: &SplitDirs,
    disposal: &SourceDisposal,
) -> Result<ConvertedRecord, ConvertError> {
    let name = record_name(json_path)?;
    let annotation = read_and_parse_json(json_path)?;

    let image_bytes = decode_image_data(&annotation.image_data)?;
    debug!("{}: embedded image, {} bytes", name, image_bytes.len());
    let image = image::load_from_memory(&image_bytes)?;
    let (image_width, image_height) = (image.width(), image.height());
    if image_width == 0 || image_height == 0 {
        return Err(ConvertError::EmptyImage);
    }

    // Every shape is checked before anything is written
    let yolo_data = convert_to_yolo_format(&annotation.shapes, image_width, image_height)?;

    let label_path = split_dirs.labels_dir.join(format!("{}.txt", name));
    let mut writer = BufWriter::new(File::create(&label_path)?);
    writer.write_all(yolo_data.as_bytes())?;
    writer.flush()?;

    let image_path = split_dirs.images_dir.join(format!("{}.jpg", name));
    image
        .to_rgb8()
        .save_with_format(&image_path, ImageFormat::Jpeg)?;

    match disposal {
        SourceDisposal::Delete => fs::remove_file(json_path)?,
        SourceDisposal::Archive(archive_dir) => {
            move_file(json_path, archive_dir)?;
        }
    }

    Ok(ConvertedRecord {
        name,
        labels: annotation
            .shapes
            .iter()
            .map(|shape| shape.label.clone())
            .collect(),
        label_path,
        image_path,
    })
}

/// Convert the shapes of one record to YOLO lines, one per shape
pub fn convert_to_yolo_format(
    shapes: &[Shape],
    image_width: u32,
    image_height: u32,
) -> Result<String, ConvertError> {
    let mut yolo_data = String::with_capacity(shapes.len() * 64);
    for shape in shapes {
        let bbox = calculate_bounding_box(shape, image_width, image_height)?;
        yolo_data.push_str(&bbox.to_yolo_line(&shape.label));
    }
    Ok(yolo_data)
}

/// Calculate the normalized box spanned by a two-point shape
pub fn calculate_bounding_box(
    shape: &Shape,
    image_width: u32,
    image_height: u32,
) -> Result<BoundingBox, ConvertError> {
    let [(x1, y1), (x2, y2)] = shape.points.as_slice() else {
        return Err(ConvertError::UnsupportedShape {
            label: shape.label.clone(),
            got: shape.points.len(),
        });
    };

    let width = image_width as f64;
    let height = image_height as f64;

    Ok(BoundingBox {
        x_center: (x1 + x2) / 2.0 / width,
        y_center: (y1 + y2) / 2.0 / height,
        width: (x2 - x1).abs() / width,
        height: (y2 - y1).abs() / height,
    })
}
