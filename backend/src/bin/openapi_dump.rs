//! Print the OpenAPI document as pretty JSON on stdout.
//!
//! # Examples
//! ```sh
//! cargo run --manifest-path backend/Cargo.toml --bin openapi-dump > openapi.json
//! ```

use std::io::{self, Write};

use backend::doc::ApiDoc;
use color_eyre::eyre::{Context, Result};
use utoipa::OpenApi;

fn main() -> Result<()> {
    color_eyre::install()?;
    let document = ApiDoc::openapi()
        .to_pretty_json()
        .wrap_err("serialise OpenAPI document")?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{document}").wrap_err("write OpenAPI document")?;
    Ok(())
}
