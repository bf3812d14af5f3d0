use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::{Fault, Handle};

struct Slots<V> {
    live: Vec<V>,
    faults: Vec<Fault>,
    generation: u64,
}

impl<V> Slots<V> {
    fn new() -> Self {
        Self {
            live: Vec::new(),
            faults: Vec::new(),
            generation: 0,
        }
    }
}

/// Per-instance table of host-owned values addressed by [`Handle`]s.
///
/// Live handles are allocated one past the current maximum (first is `0`),
/// fault handles one below the current minimum (first is `-1`). Nothing is
/// freed individually; [`Arena::reset`] drops both ranges at once.
///
/// The lock is held only for the duration of a single allocation or lookup.
/// Closures passed to [`Arena::with`] and [`Arena::with_mut`] run under the
/// lock and must not call back into the same arena.
pub struct Arena<V> {
    slots: Mutex<Slots<V>>,
}

impl<V> Default for Arena<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Arena<V> {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(Slots::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slots<V>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add(&self, value: V) -> Handle {
        let mut slots = self.lock();
        let Ok(raw) = i32::try_from(slots.live.len()) else {
            drop(slots);
            return self.add_fault(Fault::unknown("arena exhausted"));
        };
        slots.live.push(value);
        Handle::from_raw(raw)
    }

    pub fn add_fault(&self, fault: Fault) -> Handle {
        let mut slots = self.lock();
        // Saturates at i32::MIN + 1 rather than wrapping into the live range.
        let depth = i32::try_from(slots.faults.len() + 1).unwrap_or(i32::MAX);
        slots.faults.push(fault);
        Handle::from_raw(-depth)
    }

    /// Fault stored behind a negative handle, if any.
    pub fn fault(&self, handle: Handle) -> Option<Fault> {
        if !handle.is_fault() {
            return None;
        }
        let index = fault_index(handle)?;
        self.lock().faults.get(index).cloned()
    }

    pub fn with<R>(&self, handle: Handle, f: impl FnOnce(&V) -> R) -> Result<R, Fault> {
        let slots = self.lock();
        let value = lookup(&slots, handle)?;
        Ok(f(value))
    }

    pub fn with_mut<R>(&self, handle: Handle, f: impl FnOnce(&mut V) -> R) -> Result<R, Fault> {
        let mut slots = self.lock();
        lookup(&slots, handle)?;
        let index = handle.raw() as usize;
        Ok(f(&mut slots.live[index]))
    }

    pub fn contains(&self, handle: Handle) -> bool {
        let slots = self.lock();
        if handle.is_live() {
            (handle.raw() as usize) < slots.live.len()
        } else {
            fault_index(handle).is_some_and(|index| index < slots.faults.len())
        }
    }

    /// Drops every entry and starts a new generation. Returns the new
    /// generation number.
    pub fn reset(&self) -> u64 {
        let mut slots = self.lock();
        slots.live.clear();
        slots.faults.clear();
        slots.generation = slots.generation.wrapping_add(1);
        slots.generation
    }

    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    pub fn live_len(&self) -> usize {
        self.lock().live.len()
    }

    pub fn fault_len(&self) -> usize {
        self.lock().faults.len()
    }
}

impl<V: Clone> Arena<V> {
    pub fn get(&self, handle: Handle) -> Result<V, Fault> {
        self.with(handle, V::clone)
    }
}

fn fault_index(handle: Handle) -> Option<usize> {
    let depth = handle.raw().checked_neg()?;
    usize::try_from(depth - 1).ok()
}

fn lookup<V>(slots: &Slots<V>, handle: Handle) -> Result<&V, Fault> {
    if handle.is_fault() {
        let kind = fault_index(handle)
            .and_then(|index| slots.faults.get(index))
            .map(|fault| fault.kind.as_str())
            .unwrap_or("unknown fault");
        return Err(Fault::cast(format!(
            "handle {handle} is a fault ({kind}) and cannot be used as a value"
        )));
    }
    slots
        .live
        .get(handle.raw() as usize)
        .ok_or_else(|| Fault::missing(format!("no value for handle {handle}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FaultKind;
    use proptest::prelude::*;

    #[test]
    fn first_handles_are_zero_and_one() {
        let arena = Arena::new();
        let foo = arena.add("foo".to_string());
        let bar = arena.add("bar".to_string());
        assert_eq!(foo.raw(), 0);
        assert_eq!(bar.raw(), 1);
        assert_eq!(arena.get(foo).unwrap(), "foo");
        assert_eq!(arena.get(bar).unwrap(), "bar");
    }

    #[test]
    fn faults_count_down_from_minus_one() {
        let arena: Arena<String> = Arena::new();
        let first = arena.add_fault(Fault::transport("E1"));
        let second = arena.add_fault(Fault::document("E2"));
        assert_eq!(first.raw(), -1);
        assert_eq!(second.raw(), -2);
        assert_eq!(arena.fault(first).unwrap().message, "E1");
        assert_eq!(arena.fault(second).unwrap().kind, FaultKind::DocumentError);
    }

    #[test]
    fn fault_handle_is_not_a_value() {
        let arena: Arena<String> = Arena::new();
        let fault = arena.add_fault(Fault::unknown("boom"));
        let err = arena.get(fault).unwrap_err();
        assert_eq!(err.kind, FaultKind::CastError);
    }

    #[test]
    fn missing_live_handle_is_null_or_missing() {
        let arena: Arena<String> = Arena::new();
        let err = arena.get(Handle::from_raw(3)).unwrap_err();
        assert_eq!(err.kind, FaultKind::NullOrMissing);
        assert!(arena.fault(Handle::from_raw(3)).is_none());
    }

    #[test]
    fn ranges_do_not_collide() {
        let arena = Arena::new();
        let value = arena.add(1u8);
        let fault = arena.add_fault(Fault::unknown("x"));
        let next = arena.add(2u8);
        assert_ne!(value, fault);
        assert_eq!(next.raw(), 1);
        assert!(arena.contains(value));
        assert!(arena.contains(fault));
        assert!(!arena.contains(Handle::from_raw(-2)));
    }

    #[test]
    fn with_mut_updates_in_place() {
        let arena = Arena::new();
        let handle = arena.add(vec![1, 2]);
        arena.with_mut(handle, |items| items.push(3)).unwrap();
        assert_eq!(arena.get(handle).unwrap(), vec![1, 2, 3]);
        assert_eq!(arena.live_len(), 1);
    }

    #[test]
    fn reset_clears_and_bumps_generation() {
        let arena = Arena::new();
        let before = arena.generation();
        let handle = arena.add("stale");
        arena.add_fault(Fault::unknown("stale"));
        let after = arena.reset();
        assert_eq!(after, before + 1);
        assert_eq!(arena.generation(), after);
        assert_eq!(arena.live_len(), 0);
        assert_eq!(arena.fault_len(), 0);
        assert_eq!(arena.get(handle).unwrap_err().kind, FaultKind::NullOrMissing);
        assert_eq!(arena.add("fresh").raw(), 0);
    }

    proptest! {
        #[test]
        fn live_handles_strictly_increase(values in proptest::collection::vec(any::<i64>(), 1..64)) {
            let arena = Arena::new();
            let handles: Vec<Handle> = values.iter().map(|value| arena.add(*value)).collect();
            for pair in handles.windows(2) {
                prop_assert!(pair[0] < pair[1]);
            }
            for (handle, value) in handles.iter().zip(&values) {
                prop_assert_eq!(arena.get(*handle).unwrap(), *value);
                prop_assert_eq!(arena.get(*handle).unwrap(), *value);
            }
        }

        #[test]
        fn fault_handles_strictly_decrease(count in 1usize..64) {
            let arena: Arena<()> = Arena::new();
            let handles: Vec<Handle> = (0..count)
                .map(|i| arena.add_fault(Fault::unknown(format!("fault {i}"))))
                .collect();
            for pair in handles.windows(2) {
                prop_assert!(pair[0] > pair[1]);
            }
            prop_assert!(handles.iter().all(|handle| handle.is_fault()));
        }
    }
}
