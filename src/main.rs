use log::{error, info};
use serde_json::json;
use std::env;
use std::process::ExitCode;
use std::sync::Arc;

use nutrition_vision::{server, AppConfig, FoodAnalyzer};

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let pipeline = match FoodAnalyzer::builder().from_config(&config).build() {
        Ok(pipeline) => Arc::new(pipeline),
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    // With an image URL argument, analyze once and print the result
    if let Some(image_url) = env::args().nth(1) {
        return match pipeline.run(json!({ "image_url": image_url })).await {
            Ok(analysis) => print_json(&analysis, ExitCode::SUCCESS),
            Err(e) => print_json(&e.to_response(), ExitCode::FAILURE),
        };
    }

    info!("Starting Calorie Estimation API...");
    match server::serve(pipeline, &config.bind_address()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Server error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T, code: ExitCode) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(text) => {
            println!("{}", text);
            code
        }
        Err(e) => {
            error!("Failed to serialize output: {}", e);
            ExitCode::FAILURE
        }
    }
}
