//! # Pipeline Registry
//!
//! Behavior tables: which middleware wraps which request type.
//!
//! Concrete behaviors are recorded against their request type directly.
//! Generic behaviors are recorded once and bound to every request type that
//! has a handler, both those known at registration and those registered
//! later, so the table is fully materialized before dispatch needs it.
//!
//! Every binding keeps the sequence number of the registration that created
//! it, which keeps chains in registration order regardless of which kind
//! of behavior came first. A given behavior type is bound at most once per
//! request type.

use super::{BehaviorTables, Registry};
use crate::logging::log_registry_operation;
use crate::messages::Request;
use crate::pipeline::{DynPipelineBehavior, GenericAdapter, GenericBehavior};
use crate::provider::{ComponentId, Provider, Scope};
use std::any::{type_name, Any, TypeId};
use std::sync::Arc;
use tracing::{debug, warn};

pub(crate) struct GenericRegistration {
    sequence: u64,
    component: ComponentId,
    provider: Arc<Provider<dyn GenericBehavior>>,
}

enum BehaviorSource<R: Request> {
    Concrete(Arc<Provider<DynPipelineBehavior<R>>>),
    Generic(Arc<Provider<dyn GenericBehavior>>),
}

struct BehaviorBinding<R: Request> {
    sequence: u64,
    component: ComponentId,
    source: BehaviorSource<R>,
}

impl<R: Request> Clone for BehaviorBinding<R> {
    fn clone(&self) -> Self {
        let source = match &self.source {
            BehaviorSource::Concrete(provider) => BehaviorSource::Concrete(Arc::clone(provider)),
            BehaviorSource::Generic(provider) => BehaviorSource::Generic(Arc::clone(provider)),
        };
        Self {
            sequence: self.sequence,
            component: self.component,
            source,
        }
    }
}

impl<R: Request> BehaviorBinding<R> {
    fn resolve(&self, scope: &Scope) -> Option<Arc<DynPipelineBehavior<R>>> {
        let resolved = match &self.source {
            BehaviorSource::Concrete(provider) => provider.resolve(scope),
            BehaviorSource::Generic(provider) => provider.resolve(scope).map(|behavior| {
                Arc::new(GenericAdapter::<R>::new(behavior, self.component.name))
                    as Arc<DynPipelineBehavior<R>>
            }),
        };

        match resolved {
            Ok(behavior) => Some(behavior),
            Err(error) => {
                warn!(
                    request_type = type_name::<R>(),
                    behavior = self.component.name,
                    error = %error,
                    "Behavior construction failed, skipping it for this dispatch"
                );
                None
            }
        }
    }
}

/// Behaviors bound to request type `R`, sorted by registration sequence.
struct BehaviorChain<R: Request> {
    bindings: Vec<BehaviorBinding<R>>,
}

impl<R: Request> Default for BehaviorChain<R> {
    fn default() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }
}

impl<R: Request> BehaviorChain<R> {
    fn contains(&self, component: &ComponentId) -> bool {
        self.bindings
            .iter()
            .any(|binding| binding.component.type_id == component.type_id)
    }

    /// Insert keeping registration order; returns false for a duplicate.
    fn bind(&mut self, binding: BehaviorBinding<R>) -> bool {
        if self.contains(&binding.component) {
            return false;
        }
        let position = self
            .bindings
            .partition_point(|existing| existing.sequence <= binding.sequence);
        self.bindings.insert(position, binding);
        true
    }
}

fn chain_mut<R: Request>(tables: &mut BehaviorTables) -> Option<&mut BehaviorChain<R>> {
    tables
        .entry(TypeId::of::<R>())
        .or_insert_with(|| Box::new(BehaviorChain::<R>::default()) as Box<dyn Any + Send + Sync>)
        .downcast_mut::<BehaviorChain<R>>()
}

/// Materialize `generic` for request type `R`.
pub(crate) fn bind_generic<R: Request>(tables: &mut BehaviorTables, generic: &GenericRegistration) {
    if let Some(chain) = chain_mut::<R>(tables) {
        let bound = chain.bind(BehaviorBinding {
            sequence: generic.sequence,
            component: generic.component,
            source: BehaviorSource::Generic(Arc::clone(&generic.provider)),
        });
        if bound {
            debug!(
                request_type = type_name::<R>(),
                behavior = generic.component.name,
                "Generic behavior bound"
            );
        }
    }
}

pub(crate) fn behavior_count<R: Request>(tables: &BehaviorTables) -> usize {
    tables
        .get(&TypeId::of::<R>())
        .and_then(|chain| chain.downcast_ref::<BehaviorChain<R>>())
        .map_or(0, |chain| chain.bindings.len())
}

impl Registry {
    /// Wrap request type `R` with a behavior.
    ///
    /// Returns false when the same behavior type is already bound to `R`.
    pub fn register_behavior<R: Request>(&self, provider: Provider<DynPipelineBehavior<R>>) -> bool {
        let component = provider.component();
        let sequence = self.next_sequence();

        let bound = {
            let mut tables = self.tables.write();
            match chain_mut::<R>(&mut tables.behaviors) {
                Some(chain) => chain.bind(BehaviorBinding {
                    sequence,
                    component,
                    source: BehaviorSource::Concrete(Arc::new(provider)),
                }),
                None => false,
            }
        };

        log_registry_operation(
            "register_behavior",
            type_name::<R>(),
            component.name,
            if bound { "registered" } else { "duplicate_ignored" },
        );
        bound
    }

    /// Wrap every request type with a handler, now and later, with a behavior.
    ///
    /// Returns false when the same behavior type is already registered.
    pub fn register_generic_behavior(&self, provider: Provider<dyn GenericBehavior>) -> bool {
        let component = provider.component();
        let sequence = self.next_sequence();

        let bound_to = {
            let mut tables = self.tables.write();
            if tables
                .generic_behaviors
                .iter()
                .any(|existing| existing.component.type_id == component.type_id)
            {
                None
            } else {
                let generic = GenericRegistration {
                    sequence,
                    component,
                    provider: Arc::new(provider),
                };
                let tables = &mut *tables;
                for registration in tables.requests.values() {
                    (registration.bind_generic)(&mut tables.behaviors, &generic);
                }
                tables.generic_behaviors.push(generic);
                Some(tables.requests.len())
            }
        };

        match bound_to {
            Some(request_types) => {
                debug!(
                    behavior = component.name,
                    request_types = request_types,
                    "Generic behavior registered"
                );
                log_registry_operation("register_generic_behavior", "*", component.name, "registered");
                true
            }
            None => {
                log_registry_operation(
                    "register_generic_behavior",
                    "*",
                    component.name,
                    "duplicate_ignored",
                );
                false
            }
        }
    }

    /// Behaviors bound to `R`, in registration order, constructed for `scope`.
    ///
    /// A behavior whose construction fails is left out rather than failing
    /// the dispatch.
    pub fn resolve_behaviors<R: Request>(&self, scope: &Scope) -> Vec<Arc<DynPipelineBehavior<R>>> {
        let bindings: Vec<BehaviorBinding<R>> = {
            let tables = self.tables.read();
            tables
                .behaviors
                .get(&TypeId::of::<R>())
                .and_then(|chain| chain.downcast_ref::<BehaviorChain<R>>())
                .map(|chain| chain.bindings.clone())
                .unwrap_or_default()
        };

        bindings
            .iter()
            .filter_map(|binding| binding.resolve(scope))
            .collect()
    }
}
