//! Descriptor composition tool
//!
//! Loads entity descriptor files in parallel, validates them and
//! instantiates each one into a scene registry against a directory of
//! resources.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use scene_compose::prelude::*;
use scene_compose::foundation::logging;

mod cli;
use cli::CliArgs;

fn main() -> Result<()> {
    let args = CliArgs::parse()?;

    let mut config = match &args.config {
        Some(path) => ComposeConfig::load_from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ComposeConfig::default(),
    };
    if let Some(level) = &args.log_level {
        config.log_level = level.clone();
    }
    if let Some(root) = &args.resource_root {
        config.resource_root = root.clone();
    }
    config.validate().context("invalid configuration")?;

    logging::init_with_level(&config.log_level);
    log::info!("Starting compose with {} descriptor(s)", args.files.len());

    let failures = run(&config, &args)?;
    if failures > 0 {
        bail!("{failures} of {} descriptor(s) failed", args.files.len());
    }

    log::info!("All descriptors composed successfully");
    Ok(())
}

/// Returns the number of descriptors that failed
fn run(config: &ComposeConfig, args: &CliArgs) -> Result<usize> {
    let placement = config.placement_transform().context("invalid placement")?;
    let substitutions = config.merged_substitutions(&args.substitutions);
    let deserializer = Deserializer::new(SchemaRegistry::builtin()).with_rotation_epsilon(config.rotation_epsilon);

    let loaded = load_all(&deserializer, &args.files);
    let mut failures = 0;
    let mut descriptors = Vec::with_capacity(loaded.len());
    for (path, result) in loaded {
        match result {
            Ok(descriptor) => {
                log::debug!("{} -> entity '{}'", path.display(), descriptor.id);
                descriptors.push(descriptor);
            }
            Err(err) => {
                log::warn!("{}: {}", path.display(), err);
                failures += 1;
            }
        }
    }

    if args.validate_only {
        log::info!("Validated {} descriptor(s)", descriptors.len());
        return Ok(failures);
    }

    let store = DirectoryResourceStore::new(&config.resource_root);
    let mut registry = EntityRegistry::new();
    for descriptor in &descriptors {
        if let Err(err) = registry.spawn(descriptor, &substitutions, &store, &placement) {
            log::warn!("entity '{}' rejected: {}", descriptor.id, err);
            failures += 1;
        }
    }

    for (_, entity) in registry.iter() {
        log::info!(
            "{}: {} component(s), {} embedded object(s)",
            entity.id,
            entity.components.len(),
            entity.objects.len()
        );
    }
    log::info!(
        "Composed {} entities, {} resource(s) resolved from {}",
        registry.len(),
        store.cached(),
        store.root().display()
    );

    Ok(failures)
}

/// Parse every file on its own thread, keeping input order
fn load_all(deserializer: &Deserializer<'_>, files: &[PathBuf]) -> Vec<(PathBuf, Result<EntityDescriptor, DescriptorError>)> {
    std::thread::scope(|scope| {
        let handles: Vec<_> = files
            .iter()
            .map(|path| (path, scope.spawn(move || deserializer.load_file(path))))
            .collect();

        handles
            .into_iter()
            .map(|(path, handle)| {
                let result = handle.join().unwrap_or_else(|_| {
                    Err(DescriptorError::Io {
                        path: path.clone(),
                        source: std::io::Error::new(std::io::ErrorKind::Other, "loader thread panicked"),
                    })
                });
                (path.clone(), result)
            })
            .collect()
    })
}
