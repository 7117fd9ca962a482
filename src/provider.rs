//! # Component Providers
//!
//! Construction collaborator for handlers and behaviors. A [`Provider`] wraps
//! either a ready instance or a factory plus a [`Lifetime`] policy, and hands
//! out shared instances on request.
//!
//! ## Lifetimes
//!
//! - **Transient**: the factory runs for every dispatch
//! - **Scoped**: one instance per [`Scope`]
//! - **Singleton**: one instance per provider, built on first use
//!
//! Direct instances are always shared regardless of lifetime.

use crate::error::ConstructionError;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

static NEXT_PROVIDER_ID: AtomicU64 = AtomicU64::new(1);

/// Instance lifetime policy applied by a factory-backed provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifetime {
    #[default]
    Transient,
    Scoped,
    Singleton,
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lifetime::Transient => write!(f, "transient"),
            Lifetime::Scoped => write!(f, "scoped"),
            Lifetime::Singleton => write!(f, "singleton"),
        }
    }
}

/// Stable identity of a concrete handler or behavior type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComponentId {
    pub type_id: TypeId,
    pub name: &'static str,
}

impl ComponentId {
    pub fn of<T: Any>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

type Factory<T> = Arc<dyn Fn() -> anyhow::Result<Arc<T>> + Send + Sync>;

enum Source<T: ?Sized> {
    Instance(Arc<T>),
    Factory {
        build: Factory<T>,
        singleton: Mutex<Option<Arc<T>>>,
    },
}

/// Hands out instances of `T` according to a lifetime policy.
pub struct Provider<T: ?Sized + Send + Sync + 'static> {
    id: u64,
    component: ComponentId,
    lifetime: Lifetime,
    source: Source<T>,
}

impl<T: ?Sized + Send + Sync + 'static> Provider<T> {
    /// Share one ready-made instance for every dispatch.
    pub fn instance(component: ComponentId, instance: Arc<T>) -> Self {
        Self {
            id: NEXT_PROVIDER_ID.fetch_add(1, Ordering::Relaxed),
            component,
            lifetime: Lifetime::Singleton,
            source: Source::Instance(instance),
        }
    }

    /// Build instances on demand according to `lifetime`.
    pub fn factory<F>(component: ComponentId, lifetime: Lifetime, build: F) -> Self
    where
        F: Fn() -> anyhow::Result<Arc<T>> + Send + Sync + 'static,
    {
        Self {
            id: NEXT_PROVIDER_ID.fetch_add(1, Ordering::Relaxed),
            component,
            lifetime,
            source: Source::Factory {
                build: Arc::new(build),
                singleton: Mutex::new(None),
            },
        }
    }

    pub fn component(&self) -> ComponentId {
        self.component
    }

    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    /// Produce an instance for a dispatch running in `scope`.
    pub fn resolve(&self, scope: &Scope) -> Result<Arc<T>, ConstructionError> {
        match &self.source {
            Source::Instance(instance) => Ok(Arc::clone(instance)),
            Source::Factory { build, singleton } => match self.lifetime {
                Lifetime::Transient => self.construct(build),
                Lifetime::Singleton => {
                    let mut cached = singleton.lock();
                    if let Some(instance) = cached.as_ref() {
                        return Ok(Arc::clone(instance));
                    }
                    let instance = self.construct(build)?;
                    *cached = Some(Arc::clone(&instance));
                    Ok(instance)
                }
                Lifetime::Scoped => {
                    if let Some(instance) = scope.get::<T>(self.id) {
                        return Ok(instance);
                    }
                    // Built outside the shard lock so factories may resolve other components.
                    let instance = self.construct(build)?;
                    Ok(scope.get_or_insert(self.id, instance))
                }
            },
        }
    }

    fn construct(&self, build: &Factory<T>) -> Result<Arc<T>, ConstructionError> {
        debug!(
            component = self.component.name,
            lifetime = %self.lifetime,
            "Constructing component"
        );
        build().map_err(|source| ConstructionError {
            component: self.component.name,
            source,
        })
    }
}

impl<T: ?Sized + Send + Sync + 'static> fmt::Debug for Provider<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("id", &self.id)
            .field("component", &self.component.name)
            .field("lifetime", &self.lifetime)
            .finish()
    }
}

/// Instance cache backing [`Lifetime::Scoped`] providers.
pub struct Scope {
    id: Uuid,
    instances: DashMap<u64, Arc<dyn Any + Send + Sync>>,
}

impl Scope {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            instances: DashMap::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Number of scoped instances built so far.
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    fn get<T: ?Sized + Send + Sync + 'static>(&self, provider_id: u64) -> Option<Arc<T>> {
        self.instances
            .get(&provider_id)
            .and_then(|entry| entry.value().downcast_ref::<Arc<T>>().cloned())
    }

    fn get_or_insert<T: ?Sized + Send + Sync + 'static>(
        &self,
        provider_id: u64,
        instance: Arc<T>,
    ) -> Arc<T> {
        let entry = self
            .instances
            .entry(provider_id)
            .or_insert_with(|| Arc::new(Arc::clone(&instance)) as Arc<dyn Any + Send + Sync>);
        entry
            .value()
            .downcast_ref::<Arc<T>>()
            .cloned()
            .unwrap_or(instance)
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("id", &self.id)
            .field("instances", &self.instances.len())
            .finish()
    }
}
