use log::{debug, info};
use rand::seq::SliceRandom;
use rand::Rng;
use std::path::PathBuf;

use crate::io::move_file;
use crate::types::{OutputDirs, Split, SplitData};

/// Shuffle the annotation files and split them into validation, test and
/// training sets. Validation gets the first `floor(n * val_size)` files, test
/// the next `floor(n * test_size)`, training the rest.
pub fn split_annotation_files<R: Rng + ?Sized>(
    mut files: Vec<PathBuf>,
    val_size: f64,
    test_size: f64,
    rng: &mut R,
) -> SplitData {
    files.shuffle(rng);

    let total = files.len();
    let val_count = ((total as f64 * val_size).floor() as usize).min(total);
    let test_count = ((total as f64 * test_size).floor() as usize).min(total - val_count);

    let train_files = files.split_off(val_count + test_count);
    let test_files = files.split_off(val_count);
    let val_files = files;

    SplitData {
        val_files,
        test_files,
        train_files,
    }
}

/// Move every file into its split's labels directory and return the new paths
pub fn move_split_files(
    split_data: &SplitData,
    output_dirs: &OutputDirs,
) -> std::io::Result<SplitData> {
    let mut moved = SplitData::default();

    for split in Split::PROCESSING_ORDER {
        let labels_dir = &output_dirs.split(split).labels_dir;
        let files = split_data
            .files(split)
            .iter()
            .map(|path| {
                debug!("Moving {} to {}", path.display(), labels_dir.display());
                move_file(path, labels_dir)
            })
            .collect::<std::io::Result<Vec<_>>>()?;

        info!("{} split: {} files", split.label(), files.len());
        match split {
            Split::Validation => moved.val_files = files,
            Split::Test => moved.test_files = files,
            Split::Train => moved.train_files = files,
        }
    }

    Ok(moved)
}
