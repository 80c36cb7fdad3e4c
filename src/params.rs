// src/params.rs

//! Observable parameter cells with replay-of-one semantics.
//!
//! Each tracked parameter is an independent [`Observable`]: it holds the
//! latest value, replays that value to every new subscriber immediately,
//! and notifies all subscribers synchronously, in registration order, on
//! every subsequent write. Cross-parameter cascades (pixel size driving
//! dimensions, dimensions driving engine rebuilds) are wiring owned by the
//! app coordinator, never behavior of the store itself.
//!
//! Everything here is single-threaded; sharing is `Rc`-based so that
//! components can hold their own handle to a cell without a global store.

use std::cell::{Cell as StdCell, RefCell};
use std::rc::Rc;

use log::trace;

use crate::engine::{GliderDirection, GridSize, SeedMode};

type Callback<T> = Box<dyn FnMut(&T)>;

struct Subscriber<T> {
    active: Rc<StdCell<bool>>,
    callback: Callback<T>,
}

struct Inner<T> {
    name: &'static str,
    value: RefCell<T>,
    subscribers: RefCell<Vec<Subscriber<T>>>,
}

/// A single observable state cell.
///
/// Cloning an `Observable` clones the handle, not the value: all clones
/// share the same cell and subscriber list.
pub struct Observable<T> {
    inner: Rc<Inner<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Observable {
            inner: Rc::clone(&self.inner),
        }
    }
}

/// Handle returned by [`Observable::subscribe`]. Cancelling stops further
/// notifications; the callback slot is swept on the next write. Dropping
/// the handle without cancelling leaves the subscription live, so owners
/// (the app coordinator) keep their handles and tear them down as a unit.
pub struct Subscription {
    active: Rc<StdCell<bool>>,
}

impl Subscription {
    pub fn cancel(&self) {
        self.active.set(false);
    }
}

impl<T: Clone + 'static> Observable<T> {
    pub fn new(name: &'static str, initial: T) -> Self {
        Observable {
            inner: Rc::new(Inner {
                name,
                value: RefCell::new(initial),
                subscribers: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Reads the latest value without subscribing.
    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Writes a new value and synchronously notifies every subscriber in
    /// registration order. Every write notifies; equality suppression,
    /// where wanted, belongs to the writer.
    pub fn set(&self, value: T) {
        trace!("param '{}' written", self.inner.name);
        *self.inner.value.borrow_mut() = value.clone();
        self.notify(&value);
    }

    /// Registers `callback` and immediately invokes it with the current
    /// value (replay-of-one), then on every subsequent write until the
    /// returned [`Subscription`] is cancelled.
    pub fn subscribe(&self, mut callback: impl FnMut(&T) + 'static) -> Subscription {
        callback(&self.get());
        let active = Rc::new(StdCell::new(true));
        self.inner.subscribers.borrow_mut().push(Subscriber {
            active: Rc::clone(&active),
            callback: Box::new(callback),
        });
        Subscription { active }
    }

    fn notify(&self, value: &T) {
        // Take the list out while running callbacks so a callback may
        // subscribe to this same cell without re-entering the RefCell;
        // anything registered mid-notification is merged back afterwards
        // and first hears about the *next* write (it already replayed the
        // current value on registration).
        let mut running = self.inner.subscribers.take();
        for sub in running.iter_mut() {
            if sub.active.get() {
                (sub.callback)(value);
            }
        }
        let mut slot = self.inner.subscribers.borrow_mut();
        let registered_during_notify = std::mem::take(&mut *slot);
        *slot = running;
        slot.extend(registered_during_notify);
        slot.retain(|sub| sub.active.get());
    }
}

/// The full set of parameters driving layout, rendering, and editing.
///
/// One instance lives for the whole controller lifetime; components hold
/// clones of the individual cells they care about.
pub struct ParameterStore {
    /// Edge length of one rendered cell, in surface pixels.
    pub pixel_size: Observable<u16>,
    /// Grid dimensions in cells. Written by the sizer only when the
    /// computed value actually differs.
    pub dimensions: Observable<GridSize>,
    pub seed_mode: Observable<SeedMode>,
    pub glider_direction: Observable<GliderDirection>,
    /// When set, pointer clicks place glider stamps instead of toggling
    /// single cells.
    pub glider_mode: Observable<bool>,
    /// Generations stepped since the last reseed or rebuild.
    pub generations: Observable<u64>,
}

impl ParameterStore {
    pub fn new(pixel_size: u16, seed_mode: SeedMode) -> Self {
        ParameterStore {
            pixel_size: Observable::new("pixel_size", pixel_size),
            dimensions: Observable::new("dimensions", GridSize::default()),
            seed_mode: Observable::new("seed_mode", seed_mode),
            glider_direction: Observable::new("glider_direction", GliderDirection::Nw),
            glider_mode: Observable::new("glider_mode", false),
            generations: Observable::new("generations", 0),
        }
    }
}
