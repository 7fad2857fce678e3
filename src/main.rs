use clap::Parser;

use log::{error, info};

use labelme2yolov5::{process_dataset, Args};

fn main() {
    // Initialize the logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stdout)
        .init();
    let args = Args::parse();

    if let Err(e) = args.validate() {
        error!("{}", e);
        return;
    }

    info!("Starting the conversion process...");

    if let Err(e) = process_dataset(&args) {
        error!("Failed to process dataset: {}", e);
    }
}
