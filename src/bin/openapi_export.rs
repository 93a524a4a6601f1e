use std::{fs, path::PathBuf};

use iron_catalog::openapi::ApiDoc;
use utoipa::OpenApi;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let openapi = ApiDoc::openapi();
    let json = serde_json::to_string_pretty(&openapi)?;

    let output_dir = PathBuf::from(std::env::args().nth(1).unwrap_or_else(|| "openapi".into()));
    fs::create_dir_all(&output_dir)?;

    let output_path = output_dir.join("iron-catalog.json");
    fs::write(&output_path, json)?;

    println!("OpenAPI spec written to {}", output_path.display());
    Ok(())
}
