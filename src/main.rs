#[macro_use]
extern crate prettytable;

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use directories::ProjectDirs;
use log::{debug, info};
use structopt::StructOpt;
use uuid::Uuid;

mod allocation;
mod cli;
mod error;
mod interface;
mod model;
mod planner;
mod store;

use cli::{Command::*, CommandLineArgs};
use planner::{AddOptions, Planner};
use store::{Backend, MemoryStore, SqliteStore};

const OWNER_FILE: &str = "owner";

/// The directory holding the journal and the owner id, created if missing.
fn data_dir() -> anyhow::Result<PathBuf> {
    let dirs = ProjectDirs::from("com", "gozque", "timebox")
        .ok_or(anyhow!("Failed to find a home directory."))?;
    let root_dir = dirs.data_dir();
    if !root_dir.exists() {
        fs::create_dir_all(root_dir).context("Failed to create data directory.")?;
    }
    Ok(PathBuf::from(root_dir))
}

/// Read the owner id stored on this machine, generating and saving a new
/// one the first time.
fn stored_owner(dir: &Path) -> anyhow::Result<String> {
    let path = dir.join(OWNER_FILE);
    if path.exists() {
        let owner = fs::read_to_string(&path).context("Failed to read owner file.")?;
        let owner = owner.trim();
        if !owner.is_empty() {
            return Ok(owner.to_string());
        }
    }

    let owner = format!("user_{}", &Uuid::new_v4().to_simple().to_string()[..8]);
    fs::write(&path, &owner).context("Failed to write owner file.")?;
    info!("generated owner id {}", owner);
    Ok(owner)
}

/// Collect titles from the arguments, or from standard input when there
/// are none. A transcript is split into sentences, anything else into lines.
fn read_titles(titles: Vec<String>, transcript: bool) -> anyhow::Result<Vec<String>> {
    let text = if titles.is_empty() {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read tasks from standard input.")?;
        buffer
    } else if transcript {
        titles.join(" ")
    } else {
        titles.join("\n")
    };

    if transcript {
        Ok(allocation::split_sentences(&text))
    } else {
        Ok(allocation::split_lines(&text))
    }
}

fn setup_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn run<B: Backend>(mut planner: Planner<B>, owner: &str, action: cli::Command) -> anyhow::Result<()> {
    match action {
        Add {
            titles,
            time,
            list,
            transcript,
        } => {
            let titles = read_titles(titles, transcript)?;
            let options = AddOptions {
                time,
                list_type: list,
            };
            interface::add(&mut planner, owner, &titles, options)
        }
        Time { id, time } => interface::retime(&mut planner, owner, id, time),
        Move { id, list } => interface::move_task(&mut planner, owner, id, list),
        Rm { id } => interface::remove_task(&mut planner, id),
        Clear => interface::clear(&mut planner, owner),
        List { json } => interface::list(&mut planner, owner, json),
        Limit { limit, json } => interface::limit(&mut planner, owner, limit, json),
    }
}

fn main() -> anyhow::Result<()> {
    // Get the command-line arguments.
    let CommandLineArgs {
        action,
        journal_file,
        owner,
        memory,
        verbose,
    } = CommandLineArgs::from_args();

    setup_logging(verbose);

    // Resolve the owner.
    let owner = match owner {
        Some(owner) => owner.trim().to_string(),
        None => stored_owner(&data_dir()?)?,
    };
    if owner.is_empty() {
        return Err(anyhow!("Owner id must not be empty."));
    }
    debug!("planning as {}", owner);

    // Perform the action.
    if memory {
        return run(Planner::new(MemoryStore::new()), &owner, action);
    }

    let journal_file = match journal_file {
        Some(path) => path,
        None => data_dir()?.join("db.sqlite"),
    };
    let store = SqliteStore::open(&journal_file)
        .with_context(|| format!("Failed to open journal {}.", journal_file.display()))?;
    run(Planner::new(store), &owner, action)
}
