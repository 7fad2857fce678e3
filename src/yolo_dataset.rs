use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::Path;

use crate::config::Args;
use crate::conversion::convert_split_directory;
use crate::dataset::{move_split_files, split_annotation_files};
use crate::io::{create_dataset_yaml, list_annotation_files, setup_output_directories};
use crate::types::{DatasetReport, LabelSet, ProcessingStats, SourceDisposal, Split};
use crate::utils::create_progress_bar;

/// Main dataset processing pipeline: provision directories, split the JSON
/// files, convert each split and append the manifest
pub fn process_dataset(args: &Args) -> Result<DatasetReport, Box<dyn std::error::Error>> {
    let dirname = Path::new(&args.labelme_dir);

    let output_dirs = setup_output_directories(dirname, !args.delete_json)?;
    let disposal = match &output_dirs.archive_dir {
        Some(archive_dir) => SourceDisposal::Archive(archive_dir.clone()),
        None => SourceDisposal::Delete,
    };

    let files = list_annotation_files(dirname)?;
    info!("Found {} annotation files.", files.len());

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let split_data = split_annotation_files(files, args.val_split, args.test_split, &mut rng);
    let moved = move_split_files(&split_data, &output_dirs)?;
    info!("Moved {} annotation files into split directories.", moved.len());

    let mut labels = LabelSet::new();
    let mut stats = ProcessingStats::new();
    let mut splits = Vec::with_capacity(Split::PROCESSING_ORDER.len());

    for split in Split::PROCESSING_ORDER {
        let pb = create_progress_bar(0, split.label());
        let report = convert_split_directory(output_dirs.split(split), &disposal, &pb)?;
        pb.finish_with_message(format!("{} processing complete", split.label()));

        labels.merge(&report.labels);
        stats.absorb(&report.stats);
        splits.push(report);
    }

    info!("Creating data.yaml file...");
    if let Err(e) = create_dataset_yaml(dirname, &labels, args.manifest_val_dir) {
        return Err(format!("Failed to create data.yaml: {}", e).into());
    }

    stats.print_summary();
    info!("Conversion process completed with {} classes.", labels.len());

    Ok(DatasetReport {
        splits,
        labels,
        stats,
    })
}
