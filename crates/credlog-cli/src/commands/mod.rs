pub mod forms;
pub mod institutions;
pub mod messages;
pub mod submissions;
pub mod submit;

use anyhow::{Context, Result};
use serde::Serialize;

/// Print any serializable value as pretty JSON on stdout
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{out}");
    Ok(())
}
