use clap::{ArgAction, Parser, ValueEnum};
use std::path::Path;

use crate::error::ConfigError;

/// Slack allowed when checking that the split ratios add up to one.
const SPLIT_SUM_EPSILON: f64 = 1e-9;

/// Command-line arguments for converting a LabelMe dataset to YOLOv5 format.
#[derive(Parser, Debug, Clone)]
#[command(version, long_about = None)]
pub struct Args {
    /// Root directory holding the LabelMe JSON files
    #[arg(short = 'd', long = "labelme_dir")]
    pub labelme_dir: String,

    /// Delete the source JSON files after conversion ('y') or archive them into labelme_json/ ('n')
    #[arg(
        long = "delete_json",
        action = ArgAction::Set,
        default_value = "n",
        value_parser = parse_yes_no
    )]
    pub delete_json: bool,

    /// Proportion of the dataset to use for validation
    #[arg(long = "val_split", default_value_t = 0.1)]
    pub val_split: f64,

    /// Proportion of the dataset to use for testing
    #[arg(long = "test_split", default_value_t = 0.1)]
    pub test_split: f64,

    /// How val_split + test_split is checked before the run
    #[arg(long = "split_check", value_enum, default_value = "exact")]
    pub split_check: SplitCheck,

    /// Seed for the shuffle; splits are not reproducible without it
    #[arg(long = "seed")]
    pub seed: Option<u64>,

    /// Directory name written on the `val:` line of data.yaml
    #[arg(long = "manifest_val_dir", value_enum, default_value = "val")]
    pub manifest_val_dir: ManifestValDir,
}

// Rule applied to the sum of the two split ratios
#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum SplitCheck {
    /// val_split + test_split must equal 1.0
    Exact,
    /// val_split + test_split must not exceed 1.0, the rest goes to training
    AtMost,
}

// Directory used for the `val:` entry of the manifest
#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum ManifestValDir {
    /// `{root}/val/images`, which does not match the `valid/` split directory
    Val,
    /// `{root}/valid/images`
    Valid,
}

impl ManifestValDir {
    pub fn dir_name(&self) -> &'static str {
        match self {
            ManifestValDir::Val => "val",
            ManifestValDir::Valid => "valid",
        }
    }
}

impl Args {
    /// Pre-flight checks: split ranges, the split sum rule and the root directory.
    /// Nothing on disk is modified before these pass.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [("val_split", self.val_split), ("test_split", self.test_split)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::SplitOutOfRange { name, value });
            }
        }

        let sum = self.val_split + self.test_split;
        match self.split_check {
            SplitCheck::Exact if (sum - 1.0).abs() > SPLIT_SUM_EPSILON => {
                return Err(ConfigError::SplitSumNotOne {
                    val: self.val_split,
                    test: self.test_split,
                });
            }
            SplitCheck::AtMost if sum > 1.0 + SPLIT_SUM_EPSILON => {
                return Err(ConfigError::SplitSumExceedsOne {
                    val: self.val_split,
                    test: self.test_split,
                });
            }
            _ => {}
        }

        if !Path::new(&self.labelme_dir).exists() {
            return Err(ConfigError::MissingRoot(self.labelme_dir.clone().into()));
        }
        Ok(())
    }
}

// Accept 'y' / 'n' answers, case-insensitive
pub fn parse_yes_no(s: &str) -> Result<bool, String> {
    match s.to_ascii_lowercase().as_str() {
        "y" | "yes" => Ok(true),
        "n" | "no" => Ok(false),
        _ => Err(format!("expected 'y' or 'n', got '{}'", s)),
    }
}
