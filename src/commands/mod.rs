//! CLI command implementations over [`ModManager`].

use anyhow::{Result, bail};
use log::debug;
use std::path::PathBuf;

use crate::application::{ModEvent, ModManager, Outcome};
use crate::inventory::ModEntry;
use crate::layout::artifact_name;
use crate::runtime::Runtime;

pub mod config;
mod paths;

use config::Config;

/// Open the manager for the work directory selected on the command line.
#[tracing::instrument(skip(runtime, root, api_url))]
pub fn open<R: Runtime + 'static>(
    runtime: R,
    root: Option<PathBuf>,
    api_url: Option<String>,
) -> Result<ModManager<R>> {
    Config::new(runtime, root, api_url)?.into_manager()
}

pub async fn create_instance<R: Runtime + 'static>(
    manager: &ModManager<R>,
    name: &str,
    game_version: &str,
) -> Result<()> {
    if manager.create_instance(name, game_version)? {
        println!("Created instance {} ({})", name, game_version);
    } else {
        println!("Instance {} already exists.", name);
    }
    manager.flush().await
}

pub fn list_instances<R: Runtime + 'static>(manager: &ModManager<R>) -> Result<()> {
    let names = manager.instances();
    if names.is_empty() {
        println!("No instances.");
        return Ok(());
    }
    for name in names {
        let instance = manager.instance(&name)?;
        println!("{} {} ({} mods)", name, instance.game_version, instance.mods.len());
    }
    Ok(())
}

/// Install a mod, resolved against the instance's game version unless one is given.
#[tracing::instrument(skip(manager))]
pub async fn add<R: Runtime + 'static>(
    manager: &ModManager<R>,
    instance: &str,
    platform: &str,
    slug: &str,
    game_version: Option<&str>,
) -> Result<()> {
    let game_version = match game_version {
        Some(v) => v.to_string(),
        None => manager.instance(instance)?.game_version,
    };
    let event = manager.add_mod(instance, platform, slug, &game_version).await?;
    finish(manager, vec![event]).await
}

pub async fn remove<R: Runtime + 'static>(
    manager: &ModManager<R>,
    instance: &str,
    slug: &str,
) -> Result<()> {
    let event = manager.remove_mod(instance, slug).await?;
    finish(manager, vec![event]).await
}

pub async fn set_active<R: Runtime + 'static>(
    manager: &ModManager<R>,
    instance: &str,
    slug: &str,
    active: bool,
) -> Result<()> {
    let event = manager.set_mod_active(instance, slug, active).await?;
    finish(manager, vec![event]).await
}

pub fn list<R: Runtime + 'static>(manager: &ModManager<R>, instance: &str) -> Result<()> {
    let mods = manager.list_installed_mods(instance)?;
    if mods.is_empty() {
        println!("No mods installed in {}.", instance);
        return Ok(());
    }
    for entry in &mods {
        println!("{}", describe(entry));
    }
    Ok(())
}

pub async fn check<R: Runtime + 'static>(manager: &ModManager<R>, instance: &str) -> Result<()> {
    let updates = manager.check_for_updates(instance).await?;
    if updates.is_empty() {
        println!("All mods in {} are up to date.", instance);
        return Ok(());
    }
    for entry in &updates {
        println!("{} (installed {})", entry.slug, entry.file.id);
    }
    Ok(())
}

/// Update `slugs`, or every mod with a newer revision when none are given.
pub async fn update<R: Runtime + 'static>(
    manager: &ModManager<R>,
    instance: &str,
    slugs: Vec<String>,
) -> Result<()> {
    let slugs = if slugs.is_empty() {
        manager
            .check_for_updates(instance)
            .await?
            .into_iter()
            .map(|m| m.slug)
            .collect()
    } else {
        slugs
    };
    if slugs.is_empty() {
        println!("All mods in {} are up to date.", instance);
        return Ok(());
    }

    debug!("Updating {:?} in {}", slugs, instance);
    let events = manager.update_mods(instance, slugs).await?;
    finish(manager, events).await
}

pub fn compat<R: Runtime + 'static>(manager: &ModManager<R>, platform: &str, name: &str) {
    println!("{}: {}", name, manager.compatibility(platform, name));
}

fn describe(entry: &ModEntry) -> String {
    let state = if entry.active { "enabled" } else { "disabled" };
    format!(
        "{} {} {} {} {}",
        entry.slug,
        entry.platform,
        entry.file.id,
        state,
        artifact_name(&entry.file.filename, entry.active)
    )
}

/// Print the events, save, and fail if any operation failed.
async fn finish<R: Runtime + 'static>(manager: &ModManager<R>, events: Vec<ModEvent>) -> Result<()> {
    for event in &events {
        println!("{}", event);
    }
    manager.flush().await?;

    let failed = events
        .iter()
        .filter(|e| matches!(e.outcome, Outcome::Failed(_)))
        .count();
    if failed > 0 {
        bail!("{} operation(s) failed", failed);
    }
    Ok(())
}
