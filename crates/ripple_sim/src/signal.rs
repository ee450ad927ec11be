//! Signal state, driver queues, and the commit protocol.
//!
//! Each [`Signal`] holds its committed value, the value before the most recent
//! commit (for change and edge detection), and the drivers enqueued during the
//! current delta cycle. Processes never write a committed value: they enqueue
//! a driver through [`SignalTable::drive`], and the scheduler's commit phase
//! applies it. When several drivers land on one signal in the same delta the
//! last one wins; there is no strength resolution.

use std::collections::BTreeSet;

use ripple_common::{Value, ValueError};
use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// Opaque ID for a signal registered with a simulation.
///
/// IDs are dense indices assigned in registration order and stay stable for
/// the lifetime of the owning simulation.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct SignalId(u32);

impl SignalId {
    /// Creates a `SignalId` from a raw index.
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw index.
    pub fn as_raw(self) -> u32 {
        self.0
    }
}

/// Edge kinds a single-bit signal can undergo.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Edge {
    /// 0 -> 1.
    Posedge,
    /// 1 -> 0.
    Negedge,
}

/// Checks whether a 1-bit signal went through `edge` between `prev` and `curr`.
pub fn check_edge(prev: Value, curr: Value, edge: Edge) -> Result<bool, ValueError> {
    if prev.width() != 1 || curr.width() != 1 {
        return Err(ValueError::NotSingleBit {
            width: prev.width().max(curr.width()),
        });
    }
    let (was, is) = (prev.to_bool(), curr.to_bool());
    Ok(match edge {
        Edge::Posedge => !was && is,
        Edge::Negedge => was && !is,
    })
}

/// A simulated net: committed value, previous value, and pending drivers.
#[derive(Clone, Debug)]
pub struct Signal {
    name: String,
    current: Value,
    previous: Value,
    drivers: Vec<Value>,
}

impl Signal {
    /// Creates a signal of the given width, initialized to zero.
    pub fn new(name: impl Into<String>, width: u32) -> Result<Self, ValueError> {
        let zero = Value::try_new(width, 0)?;
        Ok(Self {
            name: name.into(),
            current: zero,
            previous: zero,
            drivers: Vec::new(),
        })
    }

    /// Returns the diagnostic name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the bit width.
    pub fn width(&self) -> u32 {
        self.current.width()
    }

    /// Returns the committed value.
    pub fn value(&self) -> Value {
        self.current
    }

    /// Returns the value before the most recent commit.
    pub fn previous(&self) -> Value {
        self.previous
    }

    /// Returns true iff the most recent commit changed any bit.
    pub fn changed(&self) -> bool {
        (self.current.as_u64() ^ self.previous.as_u64()) != 0
    }

    /// Returns true on a 0 -> 1 transition of a 1-bit signal.
    pub fn pos_edge(&self) -> Result<bool, ValueError> {
        check_edge(self.previous, self.current, Edge::Posedge)
    }

    /// Returns true on a 1 -> 0 transition of a 1-bit signal.
    pub fn neg_edge(&self) -> Result<bool, ValueError> {
        check_edge(self.previous, self.current, Edge::Negedge)
    }

    /// Returns the drivers enqueued during the current delta, in enqueue order.
    pub fn pending_drivers(&self) -> &[Value] {
        &self.drivers
    }

    /// Overwrites both the committed and previous value; no change is reported.
    pub(crate) fn set_initial(&mut self, value: Value) {
        let v = value.resize(self.width());
        self.current = v;
        self.previous = v;
    }

    /// Enqueues a driver unless it equals the committed value.
    ///
    /// Returns whether the driver was enqueued.
    pub(crate) fn drive(&mut self, value: Value) -> bool {
        let v = value.resize(self.width());
        if v == self.current {
            return false;
        }
        self.drivers.push(v);
        true
    }

    /// Applies the last enqueued driver and discards the rest.
    ///
    /// Returns true if the committed value changed. A signal with no drivers is
    /// left untouched.
    pub(crate) fn commit(&mut self) -> bool {
        let Some(last) = self.drivers.last().copied() else {
            return false;
        };
        self.drivers.clear();
        self.previous = self.current;
        self.current = last;
        self.changed()
    }

    /// Marks the current value as seen, so `changed()` reports false.
    pub(crate) fn clear_changed(&mut self) {
        self.previous = self.current;
    }
}

/// The registry of all signals in a simulation plus the pending set.
#[derive(Debug, Default)]
pub struct SignalTable {
    signals: Vec<Signal>,
    pending: BTreeSet<SignalId>,
}

impl SignalTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a signal and returns its ID.
    pub fn alloc(&mut self, signal: Signal) -> SignalId {
        let id = SignalId(self.signals.len() as u32);
        self.signals.push(signal);
        id
    }

    /// Returns the signal with the given ID.
    pub fn get(&self, id: SignalId) -> Result<&Signal, SimError> {
        self.signals
            .get(id.0 as usize)
            .ok_or(SimError::UnknownSignal(id.0))
    }

    fn get_mut(&mut self, id: SignalId) -> Result<&mut Signal, SimError> {
        self.signals
            .get_mut(id.0 as usize)
            .ok_or(SimError::UnknownSignal(id.0))
    }

    /// Iterates over all signals in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (SignalId, &Signal)> {
        self.signals
            .iter()
            .enumerate()
            .map(|(i, s)| (SignalId(i as u32), s))
    }

    /// Returns the number of registered signals.
    pub fn len(&self) -> usize {
        self.signals.len()
    }

    /// Returns true if no signals are registered.
    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    /// Finds a signal by name.
    pub fn find(&self, name: &str) -> Option<SignalId> {
        self.iter().find(|(_, s)| s.name == name).map(|(id, _)| id)
    }

    /// Returns true if the signal has uncommitted drivers.
    pub fn is_pending(&self, id: SignalId) -> bool {
        self.pending.contains(&id)
    }

    /// Sets a signal's initial value without reporting a change.
    pub(crate) fn set_initial(&mut self, id: SignalId, value: Value) -> Result<(), SimError> {
        self.get_mut(id)?.set_initial(value);
        Ok(())
    }

    /// Requests a future value for a signal (non-blocking assignment).
    pub(crate) fn drive(&mut self, id: SignalId, value: Value) -> Result<(), SimError> {
        if self.get_mut(id)?.drive(value) {
            self.pending.insert(id);
        }
        Ok(())
    }

    /// Commits every pending signal and returns those whose value changed.
    ///
    /// The pending set is empty afterwards.
    pub(crate) fn commit(&mut self) -> Vec<SignalId> {
        let pending = std::mem::take(&mut self.pending);
        let mut changed = Vec::new();
        for id in pending {
            let sig = &mut self.signals[id.0 as usize];
            let drivers = sig.drivers.len();
            if sig.commit() {
                tracing::trace!(
                    signal = %sig.name,
                    drivers,
                    value = %sig.current,
                    "update signal"
                );
                changed.push(id);
            }
        }
        changed
    }

    /// Retires the change flags of signals whose change has been observed.
    pub(crate) fn clear_changed(&mut self, ids: &[SignalId]) {
        for id in ids {
            self.signals[id.0 as usize].clear_changed();
        }
    }
}
