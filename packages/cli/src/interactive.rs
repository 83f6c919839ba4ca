//! Interactive prompts for running the analysis without memorizing flags.

use std::path::PathBuf;

use dialoguer::{Confirm, Input, Select};
use police_residency_cli_utils::MultiProgress;
use police_residency_pipeline::report::ReportFormat;

/// Top-level actions offered by the menu.
enum Action {
    Analyze,
    Link,
}

impl Action {
    const ALL: &[Self] = &[Self::Analyze, Self::Link];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Analyze => "Run the full analysis",
            Self::Link => "Link datasets and write tables only",
        }
    }
}

/// Prompts for the run settings and executes the chosen action.
///
/// # Errors
///
/// Returns an error if a prompt fails or the selected run fails.
pub fn run(multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    println!("Police Residency Analysis");
    println!();

    let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();
    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    let defaults = crate::load_config(None, None)?;
    let data_dir: String = Input::new()
        .with_prompt("Data directory")
        .default(
            defaults
                .data_dir
                .unwrap_or_default()
                .display()
                .to_string(),
        )
        .interact_text()?;
    let data_dir = PathBuf::from(data_dir);

    match Action::ALL[idx] {
        Action::Analyze => {
            let mut config = crate::load_config(None, Some(&data_dir))?;

            config.analysis.permutation_reps = Input::new()
                .with_prompt("Permutations per test")
                .default(config.analysis.permutation_reps)
                .interact_text()?;

            let formats = [ReportFormat::Text, ReportFormat::Json];
            let format_labels: Vec<&str> = formats.iter().map(AsRef::as_ref).collect();
            let format = formats[Select::new()
                .with_prompt("Report format")
                .items(&format_labels)
                .default(0)
                .interact()?];

            let output_dir = if Confirm::new()
                .with_prompt("Write the analytic tables as CSV?")
                .default(false)
                .interact()?
            {
                Some(prompt_output_dir()?)
            } else {
                None
            };

            crate::run_analysis(multi, &config, output_dir.as_deref(), format)?;
        }
        Action::Link => {
            let config = crate::load_config(None, Some(&data_dir))?;
            let output_dir = prompt_output_dir()?;
            crate::run_linkage(multi, &config, &output_dir)?;
        }
    }

    Ok(())
}

fn prompt_output_dir() -> Result<PathBuf, dialoguer::Error> {
    let dir: String = Input::new()
        .with_prompt("Output directory")
        .default("output".to_string())
        .interact_text()?;
    Ok(PathBuf::from(dir))
}
