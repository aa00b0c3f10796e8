use std::path::PathBuf;

use clap::{ArgAction, Args};
use story_skeleton::{SimulationConfig, World, save_skeleton};
use tracing::info;

#[derive(Args, Debug)]
pub struct BuildArgs {
    /// JSON file with seed, grid_size, characters, iterations, show_labels
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// PRNG seed (defaults to the current time in microseconds)
    #[arg(long)]
    pub seed: Option<u64>,
    /// Grid side length
    #[arg(long, allow_negative_numbers = true)]
    pub grid_size: Option<i64>,
    /// Number of characters
    #[arg(long, allow_negative_numbers = true)]
    pub characters: Option<i64>,
    /// Number of turns
    #[arg(long, allow_negative_numbers = true)]
    pub iterations: Option<i64>,
    /// Write events as keyed objects instead of positional arrays
    #[arg(long, action = ArgAction::SetTrue)]
    pub show_labels: bool,
    /// Write the document here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl BuildArgs {
    /// File values first, then command-line overrides.
    fn resolve(&self) -> Result<SimulationConfig, String> {
        let mut config = match &self.config {
            Some(path) => SimulationConfig::load(path).map_err(|e| e.to_string())?,
            None => SimulationConfig::default(),
        };
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(grid_size) = self.grid_size {
            config.grid_size = grid_size;
        }
        if let Some(characters) = self.characters {
            config.agent_count = characters;
        }
        if let Some(iterations) = self.iterations {
            config.iterations = iterations;
        }
        config.show_labels |= self.show_labels;
        Ok(config)
    }
}

pub(super) fn run_build(args: BuildArgs) -> Result<(), String> {
    let config = args.resolve()?;
    let params = config.validate().map_err(|e| e.to_string())?;
    eprintln!("Seed: {}", params.seed());

    let mut world = World::build(params).map_err(|e| e.to_string())?;
    let summary = world.run().map_err(|e| e.to_string())?;
    let skeleton = world
        .skeleton(config.show_labels)
        .map_err(|e| e.to_string())?;

    match &args.output {
        Some(path) => {
            save_skeleton(path, &skeleton)
                .map_err(|e| format!("write {}: {}", path.display(), e))?;
            info!(path = %path.display(), "skeleton written");
            eprintln!(
                "Wrote {} events over {} turns to {}",
                summary.events,
                summary.turns_completed,
                path.display()
            );
        }
        None => {
            let json = skeleton.to_json().map_err(|e| e.to_string())?;
            println!("{}", json);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use story_skeleton::load_skeleton;

    fn args() -> BuildArgs {
        BuildArgs {
            config: None,
            seed: Some(3),
            grid_size: Some(2),
            characters: Some(3),
            iterations: Some(4),
            show_labels: false,
            output: None,
        }
    }

    #[test]
    fn flags_override_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "seed": 1, "grid_size": 9, "characters": 8, "iterations": 7, "show_labels": true }}"#
        )
        .unwrap();

        let config = BuildArgs {
            config: Some(file.path().to_path_buf()),
            grid_size: None,
            ..args()
        }
        .resolve()
        .unwrap();

        assert_eq!(config.seed, Some(3));
        assert_eq!(config.grid_size, 9);
        assert_eq!(config.agent_count, 3);
        assert_eq!(config.iterations, 4);
        assert!(config.show_labels);
    }

    #[test]
    fn writes_document_to_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("skeleton.json");
        run_build(BuildArgs {
            output: Some(path.clone()),
            ..args()
        })
        .unwrap();

        let skeleton = load_skeleton(&path).unwrap();
        assert_eq!(skeleton.meta.seed, 3);
        assert_eq!(skeleton.global.len(), 12);
        assert_eq!(skeleton.characters, vec!["c0", "c1", "c2"]);
    }

    #[test]
    fn rejects_invalid_grid() {
        let err = run_build(BuildArgs {
            grid_size: Some(0),
            ..args()
        })
        .unwrap_err();
        assert!(err.contains("grid size"), "{}", err);
    }
}
