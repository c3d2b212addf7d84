use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use course_platform::helpers::read_files;
use course_platform::ValidationState;

pub fn check(files_path: PathBuf, solution_path: PathBuf) -> Result<()> {
    let files = read_files(&files_path)
        .with_context(|| format!("reading files from {}", files_path.display()))?;
    let solution = read_files(&solution_path)
        .with_context(|| format!("reading solution from {}", solution_path.display()))?;

    let mut validation = ValidationState::default();

    if validation.validate(&files, &solution) {
        println!("All {} file(s) match the solution", files.len());
        return Ok(());
    }

    for file in &validation.incorrect_files {
        println!("{} ({}) does not match", file.file_name, file.language);
    }

    bail!(
        "{} of {} file(s) do not match the solution",
        validation.incorrect_files.len(),
        files.len()
    )
}
