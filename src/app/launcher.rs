/*!
 * Application Launcher
 * Manifest discovery, entry point execution, and event loop draining
 */

use crate::core::{LoaderError, LoaderResult, MANIFEST_FILE};
use crate::loader::{HostEnvironment, HostStreams, Loader, LoaderConfigBuilder};
use crate::manifest::{parser, ApplicationManifest};
use crate::permissions::PermissionRegistry;
use crate::sandbox::Value;
use crate::vfs::PathUtility;
use std::path::{Path, PathBuf};
use tracing::{error, info, instrument};

/// How to launch one application
pub struct LaunchOptions {
    /// Manifest file, a directory holding one, or a file next to one
    pub manifest: PathBuf,
    /// Trailing arguments exposed as `Context.argv`
    pub args: Vec<String>,
    pub config: LoaderConfigBuilder,
}

impl LaunchOptions {
    pub fn new<P: Into<PathBuf>>(manifest: P) -> Self {
        Self {
            manifest: manifest.into(),
            args: Vec::new(),
            config: LoaderConfigBuilder::from_env(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_config(mut self, config: LoaderConfigBuilder) -> Self {
        self.config = config;
        self
    }
}

/// Result of a completed launch
pub struct LaunchOutcome {
    pub manifest: ApplicationManifest,
    pub entry_point: PathBuf,
    /// Export value of the entry unit
    pub exports: Value,
    /// Timer callbacks run after the entry returned
    pub tasks_run: usize,
    pub loader: Loader,
}

/// Find the application manifest for a user-supplied path
pub fn locate_manifest(path: &Path) -> LoaderResult<PathBuf> {
    let candidate = if path.is_dir() {
        path.join(MANIFEST_FILE)
    } else if path.file_name().map(|name| name == MANIFEST_FILE).unwrap_or(false) {
        path.to_path_buf()
    } else {
        path.parent()
            .map(|dir| dir.join(MANIFEST_FILE))
            .unwrap_or_else(|| PathBuf::from(MANIFEST_FILE))
    };

    if candidate.is_file() {
        Ok(candidate)
    } else {
        error!(path = %path.display(), "No application manifest found");
        Err(LoaderError::ManifestNotFound {
            library: path.display().to_string(),
            path: candidate,
        })
    }
}

/// Run an application's entry point, then drain its timers
#[instrument(skip_all, fields(manifest = %options.manifest.display()))]
pub fn launch(options: LaunchOptions, streams: HostStreams) -> LoaderResult<LaunchOutcome> {
    let manifest_path = locate_manifest(&options.manifest)?;
    let manifest: ApplicationManifest = parser::load(&manifest_path, "application")?;

    let paths = PathUtility::home();
    let app_dir = paths.up(&manifest_path);
    let entry = manifest
        .entry_point
        .as_deref()
        .filter(|entry| !entry.trim().is_empty())
        .ok_or_else(|| {
            error!(manifest = %manifest_path.display(), "Application has no entryPoint");
            LoaderError::MissingEntryPoint {
                library: manifest.display_name.clone(),
                reason: "manifest has no 'entryPoint'".into(),
            }
        })?;
    let entry_point = paths.clean(app_dir.join(entry));
    if !entry_point.is_file() {
        error!(entry = %entry_point.display(), "Application entry point does not exist");
        return Err(LoaderError::MissingEntryPoint {
            library: manifest.display_name.clone(),
            reason: format!("{} does not exist", entry_point.display()),
        });
    }

    let permissions = PermissionRegistry::new().summarize(&manifest);
    for requested in &permissions.requested {
        info!(
            application = %permissions.application,
            permission = requested.kind.name(),
            "Requests permission: {}",
            requested.description
        );
    }

    let mut config = options.config;
    if !config.has_app_id() {
        config = config.with_app_id(manifest.display_name.clone());
    }
    let host = HostEnvironment::capture()
        .with_root(app_dir)
        .with_argv(options.args);
    let loader = Loader::builder(config.build())
        .with_host(host)
        .with_streams(streams)
        .build();

    info!(
        application = %manifest.display_name,
        entry = %entry_point.display(),
        "Launching application"
    );
    let exports = loader.run_entry(&entry_point)?;
    let tasks_run = loader.run_event_loop()?;
    info!(tasks_run, "Application finished");

    Ok(LaunchOutcome {
        manifest,
        entry_point,
        exports,
        tasks_run,
        loader,
    })
}
