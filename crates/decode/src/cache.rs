//! Process-wide descriptor cache.
//!
//! Descriptors are keyed by `(record TypeId, Options)`. Each key owns an
//! [`Entry`] whose `OnceLock` makes concurrent first use build a descriptor
//! at most once; the map lock is only held to find or insert the entry.
//! Whether nested descriptors have been built is tracked on the entry, so
//! descriptors themselves never change after they are built.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use crate::error::ConfigError;
use crate::field::Seen;
use crate::options::Options;
use crate::plan::{build_field_plans, Descriptor};
use crate::schema::{record_name, Record};

type CacheKey = (TypeId, Options);

type Built = Result<Arc<dyn Any + Send + Sync>, ConfigError>;

#[derive(Default)]
struct Entry {
    built: OnceLock<Built>,
    /// Every record reachable from this one has a descriptor.
    prepared: AtomicBool,
}

static CACHE: OnceLock<RwLock<HashMap<CacheKey, Arc<Entry>>>> = OnceLock::new();

fn cache() -> &'static RwLock<HashMap<CacheKey, Arc<Entry>>> {
    CACHE.get_or_init(|| RwLock::new(HashMap::new()))
}

fn entry<R: Record>(options: &Options) -> Arc<Entry> {
    let key = (TypeId::of::<R>(), *options);
    // Fast path: the entry usually exists already
    {
        let map = cache().read().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = map.get(&key) {
            return entry.clone();
        }
    }
    let mut map = cache().write().unwrap_or_else(PoisonError::into_inner);
    map.entry(key).or_default().clone()
}

/// The cached descriptor of `R`, built on first use.
///
/// Only `R`'s own field plans are built here; nested record types are left
/// to [`descriptor`].
pub(crate) fn cached<R: Record>(options: &Options) -> Result<Arc<Descriptor<R>>, ConfigError> {
    built::<R>(&entry::<R>(options), options)
}

fn built<R: Record>(entry: &Entry, options: &Options) -> Result<Arc<Descriptor<R>>, ConfigError> {
    let built = entry.built.get_or_init(|| {
        build_field_plans::<R>(options).map(|d| Arc::new(d) as Arc<dyn Any + Send + Sync>)
    });
    match built {
        Ok(any) => any.clone().downcast::<Descriptor<R>>().map_err(|_| {
            ConfigError::CacheTypeMismatch {
                record: record_name::<R>().to_string(),
            }
        }),
        Err(e) => Err(e.clone()),
    }
}

/// Build the descriptors of `R` and of every record reachable from it.
/// Types in `seen` are skipped, which terminates recursive types.
pub(crate) fn prepare<R: Record>(options: &Options, seen: &mut Seen) -> Result<(), ConfigError> {
    if !seen.insert(TypeId::of::<R>()) {
        return Ok(());
    }
    let descriptor = cached::<R>(options)?;
    for plan in descriptor.plans() {
        plan.access().prepare(options, seen)?;
    }
    Ok(())
}

/// The descriptor of `R` under `options`, with every nested record
/// descriptor already built.
///
/// Configuration errors anywhere in the record graph are returned on the
/// first call and on every later call with the same options.
pub fn descriptor<R: Record>(options: &Options) -> Result<Arc<Descriptor<R>>, ConfigError> {
    let entry = entry::<R>(options);
    let descriptor = built::<R>(&entry, options)?;
    if !entry.prepared.load(Ordering::Acquire) {
        prepare::<R>(options, &mut Seen::new())?;
        entry.prepared.store(true, Ordering::Release);
    }
    Ok(descriptor)
}
