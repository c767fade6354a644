use clap::Subcommand;
use breathwork_core::{CatalogError, ExerciseStore, MemoryCatalog};

#[derive(Subcommand)]
pub enum ExercisesAction {
    /// List the built-in exercises
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print one exercise as JSON
    Show {
        /// Exercise ID (e.g. "4-7-8")
        id: String,
    },
}

pub fn run(action: ExercisesAction) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = MemoryCatalog::seeded();
    match action {
        ExercisesAction::List { json } => {
            let exercises = catalog.list_exercises();
            if json {
                println!("{}", serde_json::to_string_pretty(&exercises)?);
            } else {
                for ex in &exercises {
                    let s = &ex.steps;
                    let bpm = ex.to_pattern()?.breaths_per_minute();
                    println!(
                        "{:<14} {:<18} {}-{}-{}-{}  {:>4.1} bpm  {}",
                        ex.id, ex.name, s.inhale, s.hold1, s.exhale, s.hold2, bpm, ex.description
                    );
                }
            }
        }
        ExercisesAction::Show { id } => {
            let exercise = catalog
                .get_exercise(&id)
                .ok_or(CatalogError::NotFound(id))?;
            println!("{}", serde_json::to_string_pretty(&exercise)?);
        }
    }
    Ok(())
}
