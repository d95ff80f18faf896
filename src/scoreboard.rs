/*!
This module handles the data the game keeps across rounds: player settings
and the per-mode high-score tables, bundled into one JSON savefile in the
platform's standard config folder.

Storage failures never reach engine state; both `load` and `store` surface
plain [`io::Result`]s that a frontend is free to log and swallow.
*/

use std::{
    collections::BTreeMap,
    fs::File,
    io::{self, Read, Write},
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::GameMode;

/// How the projected landing position of the active piece is drawn.
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash, Default, Debug)]
#[derive(Serialize, Deserialize)]
pub enum GhostStyle {
    /// No ghost piece.
    Off,
    /// The ghost piece is drawn as translucent solid blocks.
    #[default]
    Solid,
    /// Only the outline of the ghost piece is drawn.
    Outline,
}

/// Player-adjustable settings, persisted across rounds.
#[derive(PartialEq, Clone, Debug, Serialize, Deserialize)]
pub struct Settings {
    /// Playback volume for audio cues, in `0.0 ..= 1.0`.
    pub volume: f64,
    /// How the ghost piece is drawn, if at all.
    pub ghost_style: GhostStyle,
}

/// One recorded result on a mode's high-score table.
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ScoreEntry {
    /// The recorded value: points, or elapsed milliseconds for sprint rounds.
    pub value: u64,
    /// When the round ended.
    pub datetime: DateTime<Utc>,
}

/// The per-mode high-score tables, each kept best-first and capped.
#[derive(PartialEq, Clone, Default, Debug, Serialize, Deserialize)]
pub struct Scoreboard {
    /// Recorded entries by game mode.
    pub entries: BTreeMap<GameMode, Vec<ScoreEntry>>,
}

impl Scoreboard {
    /// How many entries each mode's table holds at most.
    pub const MAX_ENTRIES: usize = 5;

    /// Records a finished round's value on `mode`'s table, keeping the table
    /// sorted best-first (lowest-first for time-based modes) and capped at
    /// [`Scoreboard::MAX_ENTRIES`].
    pub fn record(&mut self, mode: GameMode, value: u64, datetime: DateTime<Utc>) {
        let table = self.entries.entry(mode).or_default();
        table.push(ScoreEntry { value, datetime });
        if mode.lower_is_better() {
            table.sort_by_key(|entry| entry.value);
        } else {
            table.sort_by_key(|entry| std::cmp::Reverse(entry.value));
        }
        table.truncate(Self::MAX_ENTRIES);
    }

    /// The best recorded entry for `mode`, if any.
    pub fn best(&self, mode: GameMode) -> Option<&ScoreEntry> {
        self.entries.get(&mode).and_then(|table| table.first())
    }
}

/// All data persisted across rounds: settings plus scoreboards.
#[derive(PartialEq, Clone, Debug, Serialize, Deserialize)]
pub struct SaveFile {
    /// Player-adjustable settings.
    pub settings: Settings,
    /// The per-mode high-score tables.
    pub scoreboard: Scoreboard,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            volume: 0.5,
            ghost_style: GhostStyle::default(),
        }
    }
}

impl Default for SaveFile {
    fn default() -> Self {
        Self {
            settings: Settings::default(),
            scoreboard: Scoreboard::default(),
        }
    }
}

impl SaveFile {
    /// File name of the savefile within the config folder.
    pub const SAVEFILE_NAME: &'static str = ".quadfall_savefile.json";

    /// The default location of the savefile: the platform's standard config
    /// folder, falling back to the working directory.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::SAVEFILE_NAME)
    }

    /// Loads a savefile from `path`.
    pub fn load(path: impl AsRef<Path>) -> io::Result<Self> {
        let mut file = File::open(path)?;
        let mut save_str = String::new();
        file.read_to_string(&mut save_str)?;
        let save_state = serde_json::from_str(&save_str)?;
        Ok(save_state)
    }

    /// Stores the savefile to `path`.
    pub fn store(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let save_str = serde_json::to_string(self)?;
        let mut file = File::create(path)?;

        let n_written = file.write(save_str.as_bytes())?;

        // Attempt at additionally handling the case when save_str could not be written entirely.
        if n_written < save_str.len() {
            Err(io::Error::other(
                "attempt to write to file consumed `n < save_str.len()` bytes",
            ))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn point_tables_rank_highest_first_and_cap() {
        let mut scoreboard = Scoreboard::default();
        for (i, value) in [300, 100, 700, 200, 500, 600, 400].iter().enumerate() {
            scoreboard.record(GameMode::Classic, *value, at(i as i64));
        }
        let table = &scoreboard.entries[&GameMode::Classic];
        let values: Vec<_> = table.iter().map(|entry| entry.value).collect();
        assert_eq!(values, vec![700, 600, 500, 400, 300]);
        assert_eq!(scoreboard.best(GameMode::Classic).unwrap().value, 700);
    }

    #[test]
    fn sprint_table_ranks_lowest_time_first() {
        let mut scoreboard = Scoreboard::default();
        scoreboard.record(GameMode::Sprint, 95_000, at(0));
        scoreboard.record(GameMode::Sprint, 87_500, at(1));
        scoreboard.record(GameMode::Sprint, 120_000, at(2));
        let values: Vec<_> = scoreboard.entries[&GameMode::Sprint]
            .iter()
            .map(|entry| entry.value)
            .collect();
        assert_eq!(values, vec![87_500, 95_000, 120_000]);
    }

    #[test]
    fn savefile_roundtrips_through_disk() {
        let mut save = SaveFile::default();
        save.settings.volume = 0.25;
        save.settings.ghost_style = GhostStyle::Outline;
        save.scoreboard.record(GameMode::Timed, 12_345, at(10));

        let path = std::env::temp_dir().join(".quadfall_savefile_test.json");
        save.store(&path).unwrap();
        let loaded = SaveFile::load(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded, save);
    }

    #[test]
    fn loading_a_missing_savefile_errors_cleanly() {
        let path = std::env::temp_dir().join(".quadfall_savefile_does_not_exist.json");
        assert!(SaveFile::load(path).is_err());
    }
}
