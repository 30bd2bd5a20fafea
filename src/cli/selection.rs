//! `adpilot selection` commands
//!
//! Named selection sets map a short name to a list of profile ids, so runs
//! against a recurring cohort do not need the ids spelled out every time.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Subcommand;

use crate::config::AppConfig;

#[derive(Debug, Subcommand)]
pub enum SelectionCommand {
    /// Save (or replace) a named selection set.
    Save {
        name: String,
        /// Profile ids, comma separated.
        #[arg(long, value_delimiter = ',', required = true)]
        profiles: Vec<String>,
    },
    /// Show one selection set, or all of them.
    Show { name: Option<String> },
    /// Delete a selection set.
    Remove { name: String },
}

/// File-backed store of selection sets.
pub struct SelectionStore {
    path: PathBuf,
}

impl SelectionStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn open(config: &AppConfig) -> Self {
        Self::new(config.selections_path())
    }

    pub fn load(&self) -> anyhow::Result<BTreeMap<String, Vec<String>>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse {}", self.path.display()))
    }

    pub fn save(&self, sets: &BTreeMap<String, Vec<String>>) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let raw = serde_json::to_string_pretty(sets)?;
        std::fs::write(&self.path, raw)
            .with_context(|| format!("failed to write {}", self.path.display()))
    }

    /// Resolve a set name to its profile ids.
    pub fn resolve(&self, name: &str) -> anyhow::Result<Vec<String>> {
        let sets = self.load()?;
        match sets.get(name) {
            Some(profiles) => Ok(profiles.clone()),
            None => bail!("no selection set named '{name}'"),
        }
    }
}

pub fn execute(command: SelectionCommand, config: &AppConfig) -> anyhow::Result<i32> {
    let store = SelectionStore::open(config);
    match command {
        SelectionCommand::Save { name, profiles } => {
            let mut sets = store.load()?;
            sets.insert(name.clone(), profiles);
            store.save(&sets)?;
            println!("saved selection '{name}'");
        }
        SelectionCommand::Show { name } => {
            let sets = store.load()?;
            match name {
                Some(name) => match sets.get(&name) {
                    Some(profiles) => println!("{name}: {}", profiles.join(", ")),
                    None => bail!("no selection set named '{name}'"),
                },
                None => {
                    if sets.is_empty() {
                        println!("no selection sets saved");
                    }
                    for (name, profiles) in &sets {
                        println!("{name}: {}", profiles.join(", "));
                    }
                }
            }
        }
        SelectionCommand::Remove { name } => {
            let mut sets = store.load()?;
            if sets.remove(&name).is_none() {
                bail!("no selection set named '{name}'");
            }
            store.save(&sets)?;
            println!("removed selection '{name}'");
        }
    }
    Ok(0)
}
