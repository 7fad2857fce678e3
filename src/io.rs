use glob::{glob, Pattern};
use log::{info, warn};
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::ManifestValDir;
use crate::types::{LabelSet, OutputDirs, Split, SplitDirs, ANNOTATION_EXTENSION};
use crate::utils::create_output_directory;

/// Name of the folder holding converted JSON files when they are kept
pub const ARCHIVE_DIR_NAME: &str = "labelme_json";

/// Name of the manifest written at the dataset root
pub const MANIFEST_FILE_NAME: &str = "data.yaml";

/// Set up the valid/test/train directory structure under the dataset root.
/// Existing directories and files are left as they are.
pub fn setup_output_directories(dirname: &Path, archive: bool) -> std::io::Result<OutputDirs> {
    let split_dirs = |split: Split| -> std::io::Result<SplitDirs> {
        let split_dir = dirname.join(split.dir_name());
        Ok(SplitDirs {
            split,
            labels_dir: create_output_directory(&split_dir.join("labels"))?,
            images_dir: create_output_directory(&split_dir.join("images"))?,
        })
    };

    let test = split_dirs(Split::Test)?;
    let train = split_dirs(Split::Train)?;
    let valid = split_dirs(Split::Validation)?;

    let archive_dir = if archive {
        Some(create_output_directory(&dirname.join(ARCHIVE_DIR_NAME))?)
    } else {
        None
    };

    Ok(OutputDirs {
        valid,
        test,
        train,
        archive_dir,
    })
}

/// List the annotation files that sit directly in `dir`, sorted by path
pub fn list_annotation_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let pattern = format!(
        "{}/*.{}",
        Pattern::escape(&dir.to_string_lossy()),
        ANNOTATION_EXTENSION
    );
    let entries = glob(&pattern)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .filter(|path| path.is_file())
        .collect();
    files.sort();
    Ok(files)
}

/// Move `path` into `dest_dir`, keeping its file name. Returns the new path.
pub fn move_file(path: &Path, dest_dir: &Path) -> std::io::Result<PathBuf> {
    let file_name = path.file_name().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("{} has no file name", path.display()),
        )
    })?;
    let dest = dest_dir.join(file_name);
    if dest.exists() {
        warn!("Overwriting existing file {}", dest.display());
    }
    fs::rename(path, &dest)?;
    Ok(dest)
}

/// Append the class list and split image paths to `{dirname}/data.yaml`.
/// Running it twice appends a second block.
pub fn create_dataset_yaml(
    dirname: &Path,
    labels: &LabelSet,
    val_dir: ManifestValDir,
) -> std::io::Result<()> {
    let dataset_yaml_path = dirname.join(MANIFEST_FILE_NAME);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&dataset_yaml_path)?;
    let mut dataset_yaml = BufWriter::new(file);

    let root = dirname.display();
    let mut yaml_content = String::from("names:\n");
    for label in labels.iter() {
        yaml_content.push_str(&format!("- '{}'\n", label));
    }
    yaml_content.push_str(&format!("nc: {}\n", labels.len()));
    yaml_content.push_str(&format!("test: {}/test/images\n", root));
    yaml_content.push_str(&format!("train: {}/train/images\n", root));
    yaml_content.push_str(&format!("val: {}/{}/images\n", root, val_dir.dir_name()));

    if val_dir == ManifestValDir::Val {
        warn!(
            "{} lists val: {}/val/images but validation images are in {}/valid/images; \
             pass --manifest_val_dir valid to point at the split directory",
            MANIFEST_FILE_NAME, root, root
        );
    }

    dataset_yaml.write_all(yaml_content.as_bytes())?;
    dataset_yaml.flush()?;
    info!("Wrote {} with {} classes", dataset_yaml_path.display(), labels.len());
    Ok(())
}
