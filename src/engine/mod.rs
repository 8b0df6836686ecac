//! engine
//!
//! The refresh run: select targets, fan out fetches, aggregate outcomes,
//! apply changes, decide whether to write.
//!
//! # Lifecycle
//!
//! 1. **Select**: an explicit package must exist in the file; otherwise
//!    every known package is a target.
//! 2. **Fetch**: every target's sub-fetches are spawned before any is
//!    awaited, so the slowest lookup bounds the run, not the sum.
//! 3. **Aggregate**: one outcome per package. A failed sub-fetch is logged
//!    and does not stop its siblings, but fails its package; a failed
//!    package does not stop other packages.
//! 4. **Apply**: runs only when every package succeeded. Mutates the
//!    document sequentially, one audit line per rewritten entry.
//! 5. **Persist**: the file is written only when some value changed, so a
//!    second run against unchanged upstreams writes nothing.
//!
//! # Atomicity
//!
//! Any package failure fails the whole run before the document is touched.
//! Partial upstream data is never persisted: the file either reflects a
//! fully successful refresh or is left exactly as it was.

use std::path::PathBuf;

use thiserror::Error;
use tokio::task::JoinHandle;

use crate::recipes::Adapter;
use crate::store::{Document, KeyValues, StoreError};
use crate::ui::output;
use crate::ui::Verbosity;

/// Errors that abort a refresh run.
#[derive(Debug, Error)]
pub enum RunError {
    /// Store access failed (missing file, section, or key).
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The explicitly requested package is not in the metadata file.
    #[error("unknown package: {0}")]
    UnknownPackage(String),

    /// One or more packages failed to fetch; nothing was written.
    #[error("refresh failed for {}: {}", plural(.failed.len()), .failed.join(", "))]
    Aggregate {
        /// Names of the packages whose fetches failed
        failed: Vec<String>,
    },

    /// A spawned fetch task panicked or was cancelled.
    #[error("fetch task for '{package}' did not complete: {message}")]
    Join {
        /// Package whose task was lost
        package: String,
        /// Join error description
        message: String,
    },
}

fn plural(n: usize) -> String {
    if n == 1 {
        "1 package".to_string()
    } else {
        format!("{n} packages")
    }
}

/// What a finished run did to the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// At least one value changed; the file was rewritten.
    Updated,
    /// Every value was current; the file was not touched.
    UpToDate,
}

/// Options for one refresh run.
#[derive(Debug, Clone)]
pub struct Options {
    /// Path of the metadata file
    pub file: PathBuf,
    /// Explicit package to refresh, or None for all
    pub package: Option<String>,
    /// Output verbosity
    pub verbosity: Verbosity,
}

/// Merged sub-fetch results for one package. Failures are logged as they
/// are observed, so the error side carries nothing.
struct PackageOutcome {
    name: String,
    result: Result<KeyValues, ()>,
}

/// Run a refresh against the metadata file.
pub async fn run(adapter: &dyn Adapter, opts: &Options) -> Result<Outcome, RunError> {
    let verbosity = opts.verbosity;
    let mut document = Document::load(&opts.file)?;

    let targets = select_targets(&document, opts.package.as_deref())?;
    output::debug(format!("refreshing {} target(s)", targets.len()), verbosity);

    let pending = spawn_fetches(adapter, &document, &targets, verbosity)?;
    let outcomes = aggregate(pending, verbosity).await?;

    let failed: Vec<String> = outcomes
        .iter()
        .filter(|o| o.result.is_err())
        .map(|o| o.name.clone())
        .collect();
    if !failed.is_empty() {
        return Err(RunError::Aggregate { failed });
    }

    let mut changed = false;
    for outcome in &outcomes {
        let values = outcome.result.as_ref().expect("failures returned above");
        if values.is_empty() {
            continue;
        }
        let rewrites = document.update(&outcome.name, values)?;
        for rewrite in &rewrites {
            output::print(
                format!("{}: {} -> {}", outcome.name, rewrite.old_line, rewrite.new_line),
                verbosity,
            );
        }
        changed |= !rewrites.is_empty();
    }

    if changed {
        document.save(&opts.file)?;
        Ok(Outcome::Updated)
    } else {
        Ok(Outcome::UpToDate)
    }
}

/// Resolve the target list: one validated package, or all of them.
fn select_targets(document: &Document, package: Option<&str>) -> Result<Vec<String>, RunError> {
    match package {
        Some(name) => {
            if !document.contains(name) {
                return Err(RunError::UnknownPackage(name.to_string()));
            }
            Ok(vec![name.to_string()])
        }
        None => Ok(document.package_names()),
    }
}

type SubfetchHandle = JoinHandle<Result<KeyValues, crate::fetch::FetchError>>;

/// Spawn every sub-fetch of every target before awaiting any of them.
fn spawn_fetches(
    adapter: &dyn Adapter,
    document: &Document,
    targets: &[String],
    verbosity: Verbosity,
) -> Result<Vec<(String, Vec<SubfetchHandle>)>, RunError> {
    let mut pending = Vec::with_capacity(targets.len());
    for name in targets {
        let view = document.view(name)?;
        let handles = match adapter.subfetches(&view) {
            Some(subfetches) => {
                output::debug(
                    format!("{name}: {} sub-fetch(es) scheduled", subfetches.len()),
                    verbosity,
                );
                subfetches.into_iter().map(tokio::spawn).collect()
            }
            None => {
                output::warn(format!("no fetch recipe for package '{name}'"), verbosity);
                Vec::new()
            }
        };
        pending.push((name.clone(), handles));
    }
    Ok(pending)
}

/// Await every package's sub-fetches and fold each into one outcome.
///
/// Handles are awaited and merged in recipe order, so key collisions
/// between a package's sub-fetches are last-write-wins in the order the
/// recipe lists its sources, regardless of which future finished first.
/// Overwrites are logged at debug level.
async fn aggregate(
    pending: Vec<(String, Vec<SubfetchHandle>)>,
    verbosity: Verbosity,
) -> Result<Vec<PackageOutcome>, RunError> {
    let mut outcomes = Vec::with_capacity(pending.len());
    for (name, handles) in pending {
        let mut merged = KeyValues::new();
        let mut failed = false;
        for handle in handles {
            let result = handle.await.map_err(|e| RunError::Join {
                package: name.clone(),
                message: e.to_string(),
            })?;
            match result {
                Ok(values) => {
                    for (key, value) in values {
                        if merged.insert(key.clone(), value).is_some() {
                            output::debug(
                                format!("{name}: key '{key}' overwritten by a later sub-fetch"),
                                verbosity,
                            );
                        }
                    }
                }
                Err(e) => {
                    output::error(format!("{name}: {e}"));
                    failed = true;
                }
            }
        }
        outcomes.push(PackageOutcome {
            name,
            result: if failed { Err(()) } else { Ok(merged) },
        });
    }
    Ok(outcomes)
}
