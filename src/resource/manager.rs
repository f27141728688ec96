use std::any::{Any, TypeId};
use std::cell::{Ref, RefCell, RefMut};
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use super::ResourceKey;

/// How long the manager keeps an entry alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourcePolicy {
    /// Kept until the store is cleared.
    Resident,
    /// Kept until [`ResourceManager::free`] finds it unreferenced.
    Manual,
    /// Held weakly; evicted as soon as the last [`Resource`] handle drops.
    ReferenceCounted,
}

/// Whether a later `set` under the same key may replace the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceDataState {
    Mutable,
    Final,
}

/// Shared handle to data stored in a [`ResourceManager`].
///
/// Handles to `Mutable` entries observe in-place replacement done through
/// [`ResourceManager::set`].
pub struct Resource<T> {
    key: ResourceKey,
    data: Rc<RefCell<T>>,
}

impl<T> Clone for Resource<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            data: Rc::clone(&self.data),
        }
    }
}

impl<T> Resource<T> {
    pub fn key(&self) -> &ResourceKey {
        &self.key
    }

    pub fn borrow(&self) -> Ref<'_, T> {
        self.data.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, T> {
        self.data.borrow_mut()
    }

    /// True when both handles point at the same stored instance.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.data, &b.data)
    }

    /// Strong references to the data, including the manager's own slot for
    /// resident and manual entries.
    pub fn handle_count(&self) -> usize {
        Rc::strong_count(&self.data)
    }
}

impl<T: fmt::Debug> fmt::Debug for Resource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("key", &self.key)
            .field("data", &self.data.borrow())
            .finish()
    }
}

enum Slot<T> {
    Strong(Rc<RefCell<T>>),
    Weak(Weak<RefCell<T>>),
}

impl<T> Slot<T> {
    fn for_policy(data: &Rc<RefCell<T>>, policy: ResourcePolicy) -> Self {
        match policy {
            ResourcePolicy::ReferenceCounted => Slot::Weak(Rc::downgrade(data)),
            ResourcePolicy::Resident | ResourcePolicy::Manual => Slot::Strong(Rc::clone(data)),
        }
    }
}

struct Entry<T> {
    slot: Slot<T>,
    state: ResourceDataState,
    policy: ResourcePolicy,
}

impl<T> Entry<T> {
    fn upgrade(&self) -> Option<Rc<RefCell<T>>> {
        match &self.slot {
            Slot::Strong(data) => Some(Rc::clone(data)),
            Slot::Weak(data) => data.upgrade(),
        }
    }

    fn is_live(&self) -> bool {
        match &self.slot {
            Slot::Strong(_) => true,
            Slot::Weak(data) => data.strong_count() > 0,
        }
    }
}

struct Store<T> {
    entries: HashMap<ResourceKey, Entry<T>>,
}

impl<T> Default for Store<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

/// Keyed, typed, reference-counted resource cache.
///
/// Cloning the manager clones the handle; all clones see the same stores.
/// The manager is confined to the rendering thread.
#[derive(Clone, Default)]
pub struct ResourceManager {
    stores: Rc<RefCell<HashMap<TypeId, Box<dyn Any>>>>,
}

impl ResourceManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_store<T: 'static, R>(&self, f: impl FnOnce(&mut Store<T>) -> R) -> R {
        let mut stores = self.stores.borrow_mut();
        let store = stores
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(Store::<T>::default()))
            .downcast_mut::<Store<T>>()
            .expect("resource store registered under a foreign TypeId");
        f(store)
    }

    /// Look up a live entry. Dead reference-counted entries are evicted on
    /// the way.
    pub fn get<T: 'static>(&self, key: &ResourceKey) -> Option<Resource<T>> {
        self.with_store::<T, _>(|store| {
            match store.entries.get(key).map(Entry::upgrade) {
                Some(Some(data)) => Some(Resource {
                    key: key.clone(),
                    data,
                }),
                Some(None) => {
                    store.entries.remove(key);
                    log::debug!("Evicted unreferenced resource '{}'", key);
                    None
                }
                None => None,
            }
        })
    }

    /// Store `value` under `key` and return a handle to it.
    ///
    /// A live `Mutable` entry is overwritten in place; a live `Final` entry
    /// is kept and `value` is discarded.
    pub fn set<T: 'static>(
        &self,
        key: impl Into<ResourceKey>,
        value: T,
        state: ResourceDataState,
        policy: ResourcePolicy,
    ) -> Resource<T> {
        let key = key.into();
        self.with_store::<T, _>(|store| {
            if let Some(entry) = store.entries.get_mut(&key) {
                if let Some(data) = entry.upgrade() {
                    if entry.state == ResourceDataState::Final {
                        log::warn!(
                            "Resource '{}' is final, keeping the existing data",
                            key
                        );
                        return Resource { key, data };
                    }
                    *data.borrow_mut() = value;
                    entry.slot = Slot::for_policy(&data, policy);
                    entry.state = state;
                    entry.policy = policy;
                    log::debug!("Replaced resource '{}' ({:?})", key, policy);
                    return Resource { key, data };
                }
            }

            let data = Rc::new(RefCell::new(value));
            store.entries.insert(
                key.clone(),
                Entry {
                    slot: Slot::for_policy(&data, policy),
                    state,
                    policy,
                },
            );
            log::debug!("Inserted resource '{}' ({:?}, {:?})", key, state, policy);
            Resource { key, data }
        })
    }

    pub fn contains<T: 'static>(&self, key: &ResourceKey) -> bool {
        self.with_store::<T, _>(|store| store.entries.get(key).is_some_and(Entry::is_live))
    }

    /// Number of live entries of type `T`.
    pub fn count<T: 'static>(&self) -> usize {
        self.with_store::<T, _>(|store| store.entries.values().filter(|e| e.is_live()).count())
    }

    /// Keys of live entries of type `T`, sorted.
    pub fn keys<T: 'static>(&self) -> Vec<ResourceKey> {
        self.with_store::<T, _>(|store| {
            let mut keys: Vec<ResourceKey> = store
                .entries
                .iter()
                .filter(|(_, e)| e.is_live())
                .map(|(k, _)| k.clone())
                .collect();
            keys.sort();
            keys
        })
    }

    /// Drop dead entries and `Manual` entries nobody else references.
    /// Returns the number of entries removed.
    pub fn free<T: 'static>(&self) -> usize {
        self.with_store::<T, _>(|store| {
            let before = store.entries.len();
            store.entries.retain(|key, entry| {
                let keep = match (&entry.slot, entry.policy) {
                    (Slot::Weak(data), _) => data.strong_count() > 0,
                    (Slot::Strong(data), ResourcePolicy::Manual) => Rc::strong_count(data) > 1,
                    (Slot::Strong(_), _) => true,
                };
                if !keep {
                    log::debug!("Freed resource '{}'", key);
                }
                keep
            });
            before - store.entries.len()
        })
    }

    /// Drop `resource` and, if it was the last handle to a reference-counted
    /// entry, remove that entry now instead of on the next lookup. Returns
    /// true when the entry was removed.
    pub fn release<T: 'static>(&self, resource: Resource<T>) -> bool {
        let Resource { key, data } = resource;
        drop(data);
        self.with_store::<T, _>(|store| {
            let dead = store.entries.get(&key).is_some_and(|entry| !entry.is_live());
            if dead {
                store.entries.remove(&key);
                log::debug!("Evicted unreferenced resource '{}'", key);
            }
            dead
        })
    }

    /// Forget every entry of type `T`. Outstanding handles keep their data.
    pub fn clear<T: 'static>(&self) {
        self.with_store::<T, _>(|store| store.entries.clear());
    }
}

impl fmt::Debug for ResourceManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceManager")
            .field("stores", &self.stores.borrow().len())
            .finish()
    }
}
