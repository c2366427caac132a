//! Menu-driven session: calculate, reset, and inspect surfaces.

use std::time::Instant;

use dialoguer::{Input, Select};
use nitrate_map_cli_utils::{IndicatifProgress, MultiProgress};
use nitrate_map_pipeline::{Session, config::ParameterRange};
use nitrate_map_pipeline_models::SurfaceSnapshot;

enum Action {
    Calculate,
    Reset,
    Summary,
    Quit,
}

impl Action {
    const ALL: &[Self] = &[Self::Calculate, Self::Reset, Self::Summary, Self::Quit];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Calculate => "Calculate surface",
            Self::Reset => "Reset",
            Self::Summary => "Show summary",
            Self::Quit => "Quit",
        }
    }
}

/// Runs the menu until the user quits.
///
/// # Errors
///
/// Returns an error if a prompt fails (e.g. the terminal is closed).
pub fn run(session: &mut Session, multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    println!("Nitrate / Cancer Rate Surface");
    println!();
    print_summary(&session.snapshot());

    let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();

    loop {
        println!();
        let idx = Select::new()
            .with_prompt(format!("[{}] What would you like to do?", session.state()))
            .items(&labels)
            .default(0)
            .interact()?;

        match Action::ALL[idx] {
            Action::Calculate => calculate(session, multi)?,
            Action::Reset => {
                session.reset();
                println!("Surface cleared.");
            }
            Action::Summary => print_summary(&session.snapshot()),
            Action::Quit => break,
        }
    }

    Ok(())
}

fn calculate(session: &mut Session, multi: &MultiProgress) -> Result<(), dialoguer::Error> {
    let ranges = session.config().parameters.clone();
    let previous = session.surface().map(|s| s.params);

    let distance_decay = prompt_number(
        "Distance decay coefficient",
        &ranges.distance_decay,
        previous.map_or(ranges.distance_decay.min, |p| p.distance_decay),
    )?;
    let cell_size = prompt_number(
        "Hexagon size (km)",
        &ranges.cell_size_km,
        previous.map_or(ranges.cell_size_km.min, |p| p.cell_size_km),
    )?;

    let params = match session.validate(distance_decay, cell_size) {
        Ok(params) => params,
        Err(e) => {
            println!("{e}");
            return Ok(());
        }
    };

    if session.is_current(params) {
        println!("The surface is already up to date for these parameters.");
        return Ok(());
    }

    session.set_progress(IndicatifProgress::stages_bar(multi, "Calculating"));
    let start = Instant::now();
    match session.run(params) {
        Ok(surface) => println!(
            "Calculated {} cells in {:.1?}",
            surface.grid.len(),
            start.elapsed()
        ),
        Err(e) => {
            let report = e.report();
            println!("{}: {}", report.kind, report.message);
            return Ok(());
        }
    }

    print_summary(&session.snapshot());
    Ok(())
}

fn prompt_number(
    label: &str,
    range: &ParameterRange,
    default: f64,
) -> Result<f64, dialoguer::Error> {
    Input::<f64>::new()
        .with_prompt(format!("{label} [{} - {}]", range.min, range.max))
        .default(default)
        .interact_text()
}

fn print_summary(snapshot: &SurfaceSnapshot) {
    println!("State: {}", snapshot.state);
    if let Some(params) = snapshot.params {
        println!(
            "Parameters: distance decay {}, hexagon size {} km",
            params.distance_decay, params.cell_size_km
        );
    }

    println!("Class breaks:");
    for entry in &snapshot.breaks {
        let breaks: Vec<String> = entry
            .breaks
            .breaks
            .iter()
            .map(|b| format!("{b:.4}"))
            .collect();
        println!(
            "  {:<14} {:<18} {}",
            entry.layer.as_ref(),
            entry.breaks.attribute,
            breaks.join(", ")
        );
    }

    if let Some(regression) = &snapshot.regression {
        println!("Regression: {}", regression.equation);
        println!(
            "  r2 {:.4}, residual std dev {:.4}, {} cells fitted, {} without {}",
            regression.r_squared,
            regression.residual_std_dev,
            regression.sample_count,
            regression.missing_cells,
            regression.dependent
        );
    }
}
