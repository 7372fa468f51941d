//! `chainmaker init` command — write a default chain configuration.

use std::fs;
use std::path::Path;

use crate::config::generate_default_config;
use crate::error::Error;

/// Execute the `init` command.
///
/// Writes the default chain configuration template to `output`, creating
/// parent directories as needed. An existing file is kept unless `force`
/// is `true`.
///
/// # Errors
///
/// Returns an error if the file already exists (without `--force`) or if
/// writing fails.
#[allow(clippy::print_stderr)]
pub fn run(output: &Path, force: bool) -> Result<(), Error> {
    if output.exists() && !force {
        return Err(Error::config(format!(
            "'{}' already exists, use --force to overwrite",
            output.display()
        )));
    }

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            Error::config_with(format!("failed to create '{}'", parent.display()), e)
        })?;
    }
    fs::write(output, generate_default_config())
        .map_err(|e| Error::config_with(format!("failed to write '{}'", output.display()), e))?;

    eprintln!("Chain config written to {}", output.display());
    eprintln!("Set CHAIN_MNEMONIC, then run: chainmaker make -c {}", output.display());
    Ok(())
}
