use std::path::Path;

use story_skeleton::{ActionStatsStore, ConfigError, Grid, load_skeleton};

pub(super) fn run_stats(path: &Path) -> Result<(), String> {
    let skeleton = load_skeleton(path).map_err(|e| e.to_string())?;
    let store = ActionStatsStore::from_skeleton(&skeleton);

    println!(
        "Seed {} | grid {}x{} | {} characters | {} turns | {} events",
        skeleton.meta.seed,
        skeleton.meta.grid_size,
        skeleton.meta.grid_size,
        skeleton.meta.character_size,
        skeleton.meta.iterations,
        skeleton.global.len()
    );
    if store.per_character.is_empty() {
        println!("No characters recorded.");
        return Ok(());
    }

    println!("Action summary per character:");
    for entry in &store.per_character {
        let stats = &entry.stats;
        println!(
            " - {} | noop={} move={} confront={} chase={} resolve={} places={}",
            entry.name,
            stats.noop_count,
            stats.move_count,
            stats.confront_count,
            stats.chase_count,
            stats.resolve_count,
            stats.places_visited.len()
        );
    }
    println!("Story arcs opened: {}", store.story_arcs);
    Ok(())
}

pub(super) fn run_places(grid_size: i64) -> Result<(), String> {
    let size = usize::try_from(grid_size)
        .ok()
        .filter(|s| *s > 0)
        .ok_or_else(|| ConfigError::GridSize(grid_size).to_string())?;
    for position in Grid::new(size).places() {
        println!("{}", position);
    }
    Ok(())
}
