//! Typed, optionally expiring memory slots owned by a [`Brain`](crate::Brain).

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::{trace, warn};

use crate::error::{AiError, AiResult};

/// Simulation time in ticks.
pub type GameTime = u64;

/// Declares a memory slot holding values of type `T`.
///
/// Intended to be declared as a `const` and shared by sensors and behaviors.
pub struct MemoryModuleType<T> {
    name: &'static str,
    expirable: bool,
    _value: PhantomData<fn() -> T>,
}

impl<T> MemoryModuleType<T> {
    /// A slot whose entries never expire.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            expirable: false,
            _value: PhantomData,
        }
    }

    /// A slot whose entries may be written with a time to live.
    pub const fn expirable(name: &'static str) -> Self {
        Self {
            name,
            expirable: true,
            _value: PhantomData,
        }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }

    pub const fn can_expire(&self) -> bool {
        self.expirable
    }
}

impl<T: 'static> MemoryModuleType<T> {
    pub fn key(&self) -> MemoryKey {
        MemoryKey {
            name: self.name,
            type_id: TypeId::of::<T>(),
            expirable: self.expirable,
        }
    }
}

impl<T> Clone for MemoryModuleType<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for MemoryModuleType<T> {}

impl<T> fmt::Debug for MemoryModuleType<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryModuleType")
            .field("name", &self.name)
            .field("expirable", &self.expirable)
            .finish()
    }
}

/// Type-erased identity of a [`MemoryModuleType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemoryKey {
    name: &'static str,
    type_id: TypeId,
    expirable: bool,
}

impl MemoryKey {
    pub fn name(&self) -> &'static str {
        self.name
    }
}

struct Entry {
    value: Box<dyn Any + Send + Sync>,
    expires_at: Option<GameTime>,
}

impl Entry {
    fn is_live(&self, now: GameTime) -> bool {
        self.expires_at.map_or(true, |at| now < at)
    }
}

struct Slot {
    type_id: TypeId,
    entry: Option<Entry>,
}

/// What a [`MemoryCondition`] expects of a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryStatus {
    /// Registered and holding a live value.
    Present,
    /// Registered and empty (or expired).
    Absent,
    /// Registered, whatever the content.
    Registered,
}

/// Memory contents of one actor.
///
/// Only registered slots hold values; writes to unregistered slots are
/// dropped. An entry whose expiry time has been reached reads as absent and
/// is removed on the next mutable access or sweep.
#[derive(Default)]
pub struct MemoryStore {
    slots: HashMap<&'static str, Slot>,
    now: GameTime,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current game time as seen by this store.
    pub fn now(&self) -> GameTime {
        self.now
    }

    pub(crate) fn set_now(&mut self, now: GameTime) {
        self.now = now;
    }

    pub fn register<T: 'static>(&mut self, ty: &MemoryModuleType<T>) -> AiResult<()> {
        self.register_key(ty.key())
    }

    pub fn register_key(&mut self, key: MemoryKey) -> AiResult<()> {
        match self.slots.get(key.name) {
            Some(slot) if slot.type_id != key.type_id => Err(AiError::MemoryTypeConflict(key.name)),
            Some(_) => Ok(()),
            None => {
                self.slots.insert(
                    key.name,
                    Slot {
                        type_id: key.type_id,
                        entry: None,
                    },
                );
                Ok(())
            }
        }
    }

    pub fn is_registered<T: 'static>(&self, ty: &MemoryModuleType<T>) -> bool {
        self.slot(ty.key()).is_some()
    }

    pub fn has<T: 'static>(&self, ty: &MemoryModuleType<T>) -> bool {
        self.live_value(ty.key()).is_some()
    }

    pub fn get<T: 'static>(&self, ty: &MemoryModuleType<T>) -> Option<&T> {
        self.live_value(ty.key())?.downcast_ref()
    }

    pub fn get_mut<T: 'static>(&mut self, ty: &MemoryModuleType<T>) -> Option<&mut T> {
        let now = self.now;
        let entry = self.entry_mut(ty.key())?;
        if !entry.as_ref().is_some_and(|e| e.is_live(now)) {
            *entry = None;
            return None;
        }
        entry.as_mut()?.value.downcast_mut()
    }

    pub fn set<T: Send + Sync + 'static>(&mut self, ty: &MemoryModuleType<T>, value: T) {
        self.write(ty, value, None);
    }

    /// Store `value` so that it reads as present for `ttl` ticks from now.
    ///
    /// A permanent slot ignores the time to live.
    pub fn set_with_expiry<T: Send + Sync + 'static>(
        &mut self,
        ty: &MemoryModuleType<T>,
        value: T,
        ttl: u64,
    ) {
        if !ty.can_expire() {
            warn!(memory = ty.name(), "expiry ignored for permanent memory");
            self.write(ty, value, None);
            return;
        }
        self.write(ty, value, Some(self.now.saturating_add(ttl)));
    }

    pub fn set_optional<T: Send + Sync + 'static>(
        &mut self,
        ty: &MemoryModuleType<T>,
        value: Option<T>,
    ) {
        match value {
            Some(value) => self.set(ty, value),
            None => self.erase(ty),
        }
    }

    pub fn erase<T: 'static>(&mut self, ty: &MemoryModuleType<T>) {
        self.erase_key(ty.key());
    }

    pub fn erase_key(&mut self, key: MemoryKey) {
        if let Some(entry) = self.entry_mut(key) {
            *entry = None;
        }
    }

    /// Remove and return the live value.
    pub fn take<T: 'static>(&mut self, ty: &MemoryModuleType<T>) -> Option<T> {
        let now = self.now;
        let entry = self.entry_mut(ty.key())?.take()?;
        if !entry.is_live(now) {
            return None;
        }
        entry.value.downcast::<T>().ok().map(|value| *value)
    }

    /// Ticks left before the value expires; `None` if absent or permanent.
    pub fn time_until_expiry<T: 'static>(&self, ty: &MemoryModuleType<T>) -> Option<u64> {
        let entry = self.slot(ty.key())?.entry.as_ref()?;
        if !entry.is_live(self.now) {
            return None;
        }
        entry.expires_at.map(|at| at - self.now)
    }

    pub fn check(&self, key: MemoryKey, status: MemoryStatus) -> bool {
        let Some(slot) = self.slot(key) else {
            return false;
        };
        let present = slot.entry.as_ref().is_some_and(|e| e.is_live(self.now));
        match status {
            MemoryStatus::Present => present,
            MemoryStatus::Absent => !present,
            MemoryStatus::Registered => true,
        }
    }

    /// Drop every entry that has expired. Returns how many were dropped.
    pub fn forget_expired(&mut self) -> usize {
        let now = self.now;
        let mut forgotten = 0;
        for (name, slot) in self.slots.iter_mut() {
            if slot.entry.as_ref().is_some_and(|e| !e.is_live(now)) {
                trace!(memory = *name, "memory expired");
                slot.entry = None;
                forgotten += 1;
            }
        }
        forgotten
    }

    fn slot(&self, key: MemoryKey) -> Option<&Slot> {
        self.slots
            .get(key.name)
            .filter(|slot| slot.type_id == key.type_id)
    }

    fn entry_mut(&mut self, key: MemoryKey) -> Option<&mut Option<Entry>> {
        self.slots
            .get_mut(key.name)
            .filter(|slot| slot.type_id == key.type_id)
            .map(|slot| &mut slot.entry)
    }

    fn live_value(&self, key: MemoryKey) -> Option<&(dyn Any + Send + Sync)> {
        let entry = self.slot(key)?.entry.as_ref()?;
        entry.is_live(self.now).then(|| entry.value.as_ref())
    }

    fn write<T: Send + Sync + 'static>(
        &mut self,
        ty: &MemoryModuleType<T>,
        value: T,
        expires_at: Option<GameTime>,
    ) {
        match self.entry_mut(ty.key()) {
            Some(entry) => {
                *entry = Some(Entry {
                    value: Box::new(value),
                    expires_at,
                })
            }
            None => trace!(memory = ty.name(), "write to unregistered memory dropped"),
        }
    }
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut present: Vec<_> = self
            .slots
            .iter()
            .filter(|(_, slot)| slot.entry.as_ref().is_some_and(|e| e.is_live(self.now)))
            .map(|(name, _)| *name)
            .collect();
        present.sort_unstable();
        f.debug_struct("MemoryStore")
            .field("now", &self.now)
            .field("registered", &self.slots.len())
            .field("present", &present)
            .finish()
    }
}

type ValueTest = Arc<dyn Fn(&(dyn Any + Send + Sync)) -> bool + Send + Sync>;

#[derive(Clone)]
enum Test {
    Status(MemoryStatus),
    Value(ValueTest),
}

/// A requirement on one memory slot, used to gate behaviors and activities.
#[derive(Clone)]
pub struct MemoryCondition {
    key: MemoryKey,
    test: Test,
}

impl MemoryCondition {
    pub fn status<T: 'static>(ty: &MemoryModuleType<T>, status: MemoryStatus) -> Self {
        Self {
            key: ty.key(),
            test: Test::Status(status),
        }
    }

    pub fn present<T: 'static>(ty: &MemoryModuleType<T>) -> Self {
        Self::status(ty, MemoryStatus::Present)
    }

    pub fn absent<T: 'static>(ty: &MemoryModuleType<T>) -> Self {
        Self::status(ty, MemoryStatus::Absent)
    }

    pub fn registered<T: 'static>(ty: &MemoryModuleType<T>) -> Self {
        Self::status(ty, MemoryStatus::Registered)
    }

    /// Present and equal to `value`.
    pub fn equals<T: PartialEq + Send + Sync + 'static>(ty: &MemoryModuleType<T>, value: T) -> Self {
        Self::matches(ty, move |v: &T| *v == value)
    }

    /// Present and accepted by `pred`.
    pub fn matches<T: 'static>(
        ty: &MemoryModuleType<T>,
        pred: impl Fn(&T) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            key: ty.key(),
            test: Test::Value(Arc::new(move |value: &(dyn Any + Send + Sync)| {
                value.downcast_ref::<T>().is_some_and(|v| pred(v))
            })),
        }
    }

    pub fn key(&self) -> MemoryKey {
        self.key
    }

    pub fn is_met(&self, memory: &MemoryStore) -> bool {
        match &self.test {
            Test::Status(status) => memory.check(self.key, *status),
            Test::Value(test) => memory.live_value(self.key).is_some_and(|v| test(v)),
        }
    }

    pub fn all_met(conditions: &[MemoryCondition], memory: &MemoryStore) -> bool {
        conditions.iter().all(|c| c.is_met(memory))
    }
}

impl fmt::Debug for MemoryCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("MemoryCondition");
        s.field("memory", &self.key.name);
        match &self.test {
            Test::Status(status) => s.field("status", status),
            Test::Value(_) => s.field("status", &"matches"),
        };
        s.finish()
    }
}
