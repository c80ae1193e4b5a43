//! `file`: file metadata.

use ember_runtime::CapabilityModule;
use std::fs;
use std::path::Path;
use std::time::UNIX_EPOCH;

pub fn module() -> CapabilityModule {
    CapabilityModule::namespace("file")
        .function("mod", |_, path: String| {
            let modified = fs::metadata(&path)
                .and_then(|meta| meta.modified())
                .map_err(|e| mlua::Error::runtime(format!("file: cannot stat {path}: {e}")))?;
            let seconds = modified
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs() as i64)
                .unwrap_or(0);
            Ok(seconds)
        })
        .function("exists", |_, path: String| Ok(Path::new(&path).exists()))
}
