use image::{DynamicImage, ImageFormat, Rgb, RgbImage, RgbaImage};
use labelme2yolov5::conversion::{convert_split_directory, process_annotation};
use labelme2yolov5::{
    process_dataset, setup_output_directories, Args, ConvertError, ManifestValDir,
    SourceDisposal, Split, SplitCheck,
};
use indicatif::ProgressBar;
use serde_json::json;
use std::fs;
use std::io::Cursor;
use std::path::Path;

fn encoded_png(width: u32, height: u32) -> String {
    let img = RgbImage::from_pixel(width, height, Rgb([200, 30, 30]));
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, ImageFormat::Png)
        .unwrap();
    base64::encode(buf.into_inner())
}

fn write_record(dir: &Path, name: &str, shapes: serde_json::Value, image_data: &str) {
    let record = json!({
        "version": "5.2.1",
        "flags": {},
        "shapes": shapes,
        "imagePath": format!("{}.jpg", name),
        "imageData": image_data,
        "imageHeight": 200,
        "imageWidth": 100,
    });
    fs::write(dir.join(format!("{}.json", name)), record.to_string()).unwrap();
}

fn box_shape(label: &str, points: [[f64; 2]; 2]) -> serde_json::Value {
    json!({
        "label": label,
        "points": points,
        "group_id": null,
        "shape_type": "rectangle",
        "flags": {},
    })
}

fn pipeline_args(dir: &Path, delete_json: bool) -> Args {
    Args {
        labelme_dir: dir.to_string_lossy().into_owned(),
        delete_json,
        val_split: 0.5,
        test_split: 0.5,
        split_check: SplitCheck::Exact,
        seed: Some(42),
        manifest_val_dir: ManifestValDir::Valid,
    }
}

#[test]
fn test_process_annotation_writes_label_and_image() {
    let temp_dir = tempfile::tempdir().unwrap();
    let output_dirs = setup_output_directories(temp_dir.path(), true).unwrap();
    let split_dirs = output_dirs.split(Split::Train);
    let archive_dir = output_dirs.archive_dir.clone().unwrap();

    write_record(
        &split_dirs.labels_dir,
        "frame_01",
        json!([box_shape("label", [[0.0, 0.0], [10.0, 20.0]])]),
        &encoded_png(100, 200),
    );

    let record = process_annotation(
        &split_dirs.labels_dir.join("frame_01.json"),
        split_dirs,
        &SourceDisposal::Archive(archive_dir.clone()),
    )
    .unwrap();

    assert_eq!(record.name, "frame_01");
    assert_eq!(record.labels, vec!["label".to_string()]);
    assert_eq!(
        fs::read_to_string(&record.label_path).unwrap(),
        "label 0.05 0.05 0.1 0.1\n"
    );

    let saved = image::open(&record.image_path).unwrap();
    assert_eq!((saved.width(), saved.height()), (100, 200));
    assert_eq!(
        image::ImageFormat::from_path(&record.image_path).unwrap(),
        ImageFormat::Jpeg
    );

    assert!(!split_dirs.labels_dir.join("frame_01.json").exists());
    assert!(archive_dir.join("frame_01.json").exists());
}

#[test]
fn test_process_annotation_converts_rgba_to_jpeg_and_deletes_source() {
    let temp_dir = tempfile::tempdir().unwrap();
    let output_dirs = setup_output_directories(temp_dir.path(), false).unwrap();
    let split_dirs = output_dirs.split(Split::Test);

    let rgba = RgbaImage::from_pixel(8, 4, image::Rgba([10, 20, 30, 128]));
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(rgba)
        .write_to(&mut buf, ImageFormat::Png)
        .unwrap();
    write_record(
        &split_dirs.labels_dir,
        "alpha",
        json!([]),
        &base64::encode(buf.into_inner()),
    );

    let json_path = split_dirs.labels_dir.join("alpha.json");
    let record = process_annotation(&json_path, split_dirs, &SourceDisposal::Delete).unwrap();

    assert!(record.labels.is_empty());
    assert_eq!(fs::read_to_string(&record.label_path).unwrap(), "");
    assert!(record.image_path.exists());
    assert!(!json_path.exists());
}

#[test]
fn test_unsupported_shape_leaves_source_in_place() {
    let temp_dir = tempfile::tempdir().unwrap();
    let output_dirs = setup_output_directories(temp_dir.path(), false).unwrap();
    let split_dirs = output_dirs.split(Split::Validation);

    write_record(
        &split_dirs.labels_dir,
        "poly",
        json!([{
            "label": "poly",
            "points": [[0.0, 0.0], [5.0, 0.0], [5.0, 5.0]],
            "shape_type": "polygon",
        }]),
        &encoded_png(10, 10),
    );

    let json_path = split_dirs.labels_dir.join("poly.json");
    let result = process_annotation(&json_path, split_dirs, &SourceDisposal::Delete);

    assert!(matches!(
        result,
        Err(ConvertError::UnsupportedShape { got: 3, .. })
    ));
    assert!(json_path.exists());
    assert!(!split_dirs.labels_dir.join("poly.txt").exists());
    assert!(!split_dirs.images_dir.join("poly.jpg").exists());
}

#[test]
fn test_convert_split_directory_skips_malformed_record() {
    let temp_dir = tempfile::tempdir().unwrap();
    let output_dirs = setup_output_directories(temp_dir.path(), false).unwrap();
    let split_dirs = output_dirs.split(Split::Train);
    let image_data = encoded_png(100, 200);

    write_record(
        &split_dirs.labels_dir,
        "a",
        json!([
            box_shape("car", [[0.0, 0.0], [10.0, 20.0]]),
            box_shape("person", [[5.0, 5.0], [15.0, 25.0]]),
        ]),
        &image_data,
    );
    write_record(
        &split_dirs.labels_dir,
        "b",
        json!([
            box_shape("bike", [[0.0, 0.0], [10.0, 20.0]]),
            box_shape("car", [[1.0, 1.0], [2.0, 2.0]]),
        ]),
        &image_data,
    );
    fs::write(
        split_dirs.labels_dir.join("c.json"),
        json!({ "shapes": [box_shape("truck", [[0.0, 0.0], [1.0, 1.0]])] }).to_string(),
    )
    .unwrap();

    let report =
        convert_split_directory(split_dirs, &SourceDisposal::Delete, &ProgressBar::hidden())
            .unwrap();

    assert_eq!(report.outcomes.len(), 3);
    assert_eq!(report.stats.successful_conversions, 2);
    assert_eq!(report.stats.failed_conversions, 1);
    assert_eq!(report.stats.boxes_written, 4);
    assert_eq!(report.labels.as_slice(), ["car", "person", "bike"]);

    let failures: Vec<_> = report.failures().collect();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].path.ends_with("c.json"));
    assert!(matches!(failures[0].result, Err(ConvertError::Json(_))));
    assert!(split_dirs.labels_dir.join("c.json").exists());
}

#[test]
fn test_process_dataset_end_to_end() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path();
    let image_data = encoded_png(100, 200);

    for i in 0..5 {
        write_record(
            root,
            &format!("img_{}", i),
            json!([box_shape(
                if i % 2 == 0 { "even" } else { "odd" },
                [[0.0, 0.0], [10.0, 20.0]]
            )]),
            &image_data,
        );
    }
    fs::write(
        root.join("broken.json"),
        json!({ "shapes": [] }).to_string(),
    )
    .unwrap();
    fs::write(root.join("notes.txt"), "not an annotation").unwrap();

    let report = process_dataset(&pipeline_args(root, false)).unwrap();

    assert_eq!(report.stats.total_files_processed, 6);
    assert_eq!(report.stats.successful_conversions, 5);
    assert_eq!(report.stats.failed_conversions, 1);
    assert_eq!(report.labels.len(), 2);
    assert!(report.labels.contains("even") && report.labels.contains("odd"));

    // 6 files at 0.5 / 0.5: 3 validation, 3 test, none for training
    assert_eq!(report.split(Split::Validation).unwrap().outcomes.len(), 3);
    assert_eq!(report.split(Split::Test).unwrap().outcomes.len(), 3);
    assert_eq!(report.split(Split::Train).unwrap().outcomes.len(), 0);

    let jpgs: usize = ["valid", "test", "train"]
        .iter()
        .map(|split| fs::read_dir(root.join(split).join("images")).unwrap().count())
        .sum();
    assert_eq!(jpgs, 5);

    assert_eq!(fs::read_dir(root.join("labelme_json")).unwrap().count(), 5);
    assert!(root.join("notes.txt").exists());
    for entry in fs::read_dir(root).unwrap() {
        let path = entry.unwrap().path();
        assert_ne!(path.extension().and_then(|e| e.to_str()), Some("json"));
    }

    let yaml_content = fs::read_to_string(root.join("data.yaml")).unwrap();
    assert!(yaml_content.starts_with("names:\n"));
    assert!(yaml_content.contains("nc: 2\n"));
    assert!(yaml_content.contains(&format!("val: {}/valid/images\n", root.display())));
}

#[test]
fn test_process_dataset_with_no_files() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path();

    let report = process_dataset(&pipeline_args(root, true)).unwrap();

    assert_eq!(report.stats.total_files_processed, 0);
    assert!(report.labels.is_empty());
    assert!(!root.join("labelme_json").exists());
    assert_eq!(
        fs::read_to_string(root.join("data.yaml")).unwrap(),
        format!(
            "names:\nnc: 0\ntest: {r}/test/images\ntrain: {r}/train/images\nval: {r}/valid/images\n",
            r = root.display()
        )
    );
}

#[test]
fn test_process_dataset_merges_labels_in_split_order() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path();
    let image_data = encoded_png(100, 200);

    // Each record owns a label named after itself, plus one label shared by all
    for i in 0..8 {
        let name = format!("rec_{}", i);
        write_record(
            root,
            &name,
            json!([
                box_shape(&name, [[0.0, 0.0], [10.0, 20.0]]),
                box_shape("shared", [[1.0, 1.0], [5.0, 5.0]]),
            ]),
            &image_data,
        );
    }

    let mut args = pipeline_args(root, true);
    args.val_split = 0.25;
    args.test_split = 0.5;
    args.split_check = SplitCheck::AtMost;
    let report = process_dataset(&args).unwrap();

    let mut expected: Vec<String> = Vec::new();
    for (split, count) in [("valid", 2), ("test", 4), ("train", 2)] {
        let mut names: Vec<String> = fs::read_dir(root.join(split).join("images"))
            .unwrap()
            .map(|entry| {
                entry
                    .unwrap()
                    .path()
                    .file_stem()
                    .unwrap()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect();
        names.sort();
        assert_eq!(names.len(), count, "{} split size", split);

        for name in names {
            expected.push(name);
            if expected.len() == 1 {
                expected.push("shared".to_string());
            }
        }
    }

    assert_eq!(report.labels.as_slice(), expected.as_slice());
    assert_eq!(report.labels.len(), 9);
    assert_eq!(report.labels.class_id("shared"), Some(1));

    let yaml_content = fs::read_to_string(root.join("data.yaml")).unwrap();
    let names_block: String = expected.iter().map(|l| format!("- '{}'\n", l)).collect();
    assert!(yaml_content.starts_with(&format!("names:\n{}nc: 9\n", names_block)));
}
