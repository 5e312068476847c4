//! Cache command handler

use tracing::info;

use crate::cache::CacheDir;
use crate::cli::{OutputFormat, ProjectArgs};
use crate::commands::CommandContext;
use crate::error::{EngineError, Result};

/// Delete the on-disk cache of a project
pub fn run_clear_cache(args: &ProjectArgs, ctx: &CommandContext) -> Result<String> {
    if !args.project.is_dir() {
        return Err(EngineError::InvalidProjectRoot {
            path: args.project.display().to_string(),
        });
    }
    let cache = CacheDir::for_repo(&args.project)?;
    let existed = cache.root.exists();
    let size = cache.size();
    cache.clear()?;
    info!("Cleared cache at {}", cache.root.display());

    let output = match ctx.format {
        OutputFormat::Json => serde_json::to_string_pretty(&serde_json::json!({
            "cache_dir": cache.root.display().to_string(),
            "cleared": existed,
            "bytes_freed": size,
        }))?,
        OutputFormat::Text if existed => {
            format!("Cleared cache at {} ({} bytes)", cache.root.display(), size)
        }
        OutputFormat::Text => format!("No cache at {}", cache.root.display()),
    };
    Ok(output)
}
