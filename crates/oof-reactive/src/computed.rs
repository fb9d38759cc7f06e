#![forbid(unsafe_code)]

//! Cells derived from a fixed list of dependencies.
//!
//! # Design
//!
//! A computed cell is an ordinary [`Changeable`] with an update routine
//! attached. The routine subscribes to every dependency in declaration order,
//! runs once at construction, and re-runs on every dependency change with the
//! dependency values at that moment. Recomputation is eager: there is no dirty
//! flag and no memoization, so every change event produces one `set`.
//!
//! # Asynchronous computation
//!
//! [`Computed::new_async`] spawns the compute future on a caller-supplied
//! [`LocalSpawn`] executor and sets the cell when it resolves. Computations
//! are not cancelled. If a dependency changes while an earlier computation is
//! still pending, the two race:
//!
//! - [`AsyncPolicy::LastResolved`] (default) stores whichever result resolves
//!   last, even if it was computed from older inputs.
//! - [`AsyncPolicy::LatestTrigger`] tags each computation with a generation
//!   and discards results from computations that a later change superseded.
//!
//! Callers using `LastResolved` must not rely on ordering between overlapping
//! computations of the same cell.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::{Rc, Weak};

use futures::task::{LocalSpawn, LocalSpawnExt};

use crate::changeable::{Changeable, WeakChangeable};
use crate::deps::{Dependencies, Values};
use crate::emitter::Subscription;

/// What to do with an asynchronous result whose inputs are out of date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AsyncPolicy {
    /// Store every result as it resolves. Last one to resolve wins.
    #[default]
    LastResolved,
    /// Store a result only if no newer computation was triggered since.
    LatestTrigger,
}

/// Constructors for derived cells.
pub struct Computed;

impl Computed {
    /// Derive a cell from `deps` with `compute`, evaluated eagerly now and on
    /// every dependency change.
    pub fn new<T: Clone + 'static>(
        deps: Dependencies,
        compute: impl Fn(&Values) -> T + 'static,
    ) -> Changeable<T> {
        Self::build(deps, move |values| Some(compute(values)))
    }

    /// Derive a cell from one typed input. Skipped while the input is unset.
    pub fn map<A, T>(a: &Changeable<A>, f: impl Fn(&A) -> T + 'static) -> Changeable<T>
    where
        A: Clone + 'static,
        T: Clone + 'static,
    {
        Self::build(Dependencies::new().with(a), move |values| {
            Some(f(values.get::<A>(0).ok()?))
        })
    }

    /// Derive a cell from two typed inputs. Skipped while any input is unset.
    pub fn map2<A, B, T>(
        a: &Changeable<A>,
        b: &Changeable<B>,
        f: impl Fn(&A, &B) -> T + 'static,
    ) -> Changeable<T>
    where
        A: Clone + 'static,
        B: Clone + 'static,
        T: Clone + 'static,
    {
        Self::build(Dependencies::new().with(a).with(b), move |values| {
            Some(f(values.get::<A>(0).ok()?, values.get::<B>(1).ok()?))
        })
    }

    /// Derive a cell from three typed inputs. Skipped while any input is
    /// unset.
    pub fn map3<A, B, C, T>(
        a: &Changeable<A>,
        b: &Changeable<B>,
        c: &Changeable<C>,
        f: impl Fn(&A, &B, &C) -> T + 'static,
    ) -> Changeable<T>
    where
        A: Clone + 'static,
        B: Clone + 'static,
        C: Clone + 'static,
        T: Clone + 'static,
    {
        Self::build(Dependencies::new().with(a).with(b).with(c), move |values| {
            Some(f(
                values.get::<A>(0).ok()?,
                values.get::<B>(1).ok()?,
                values.get::<C>(2).ok()?,
            ))
        })
    }

    /// Derive a cell whose value is produced by a future.
    ///
    /// The cell stays unset until the first computation resolves. See the
    /// [module docs](self) for the race between overlapping computations.
    pub fn new_async<T, F, Fut>(
        deps: Dependencies,
        spawner: impl LocalSpawn + 'static,
        policy: AsyncPolicy,
        compute: F,
    ) -> Changeable<T>
    where
        T: Clone + 'static,
        F: Fn(Values) -> Fut + 'static,
        Fut: Future<Output = T> + 'static,
    {
        let cell = Changeable::unset();
        let state = Rc::new(AsyncState {
            deps,
            compute,
            spawner: Box::new(spawner),
            policy,
            generation: Cell::new(0),
            target: cell.downgrade(),
            inputs: RefCell::new(Vec::new()),
        });

        let weak = Rc::downgrade(&state);
        let inputs = state.deps.subscribe_each(move |_| AsyncState::refresh(&weak));
        *state.inputs.borrow_mut() = inputs;

        state.update();
        cell.attach(Box::new(state));
        cell
    }

    fn build<T: Clone + 'static>(
        deps: Dependencies,
        compute: impl Fn(&Values) -> Option<T> + 'static,
    ) -> Changeable<T> {
        let cell = Changeable::unset();
        let state = Rc::new(SyncState {
            deps,
            compute: Box::new(compute),
            target: cell.downgrade(),
            inputs: RefCell::new(Vec::new()),
        });

        let weak = Rc::downgrade(&state);
        let inputs = state.deps.subscribe_each(move |_| {
            if let Some(state) = weak.upgrade() {
                state.update();
            }
        });
        *state.inputs.borrow_mut() = inputs;

        state.update();
        cell.attach(Box::new(state));
        cell
    }
}

struct SyncState<T: 'static> {
    deps: Dependencies,
    compute: Box<dyn Fn(&Values) -> Option<T>>,
    target: WeakChangeable<T>,
    inputs: RefCell<Vec<Subscription>>,
}

impl<T: Clone + 'static> SyncState<T> {
    fn update(&self) {
        let values = self.deps.snapshot();
        let Some(next) = (self.compute)(&values) else {
            return;
        };
        if let Some(target) = self.target.upgrade() {
            target.set(next);
        }
    }
}

struct AsyncState<T: 'static, F> {
    deps: Dependencies,
    compute: F,
    spawner: Box<dyn LocalSpawn>,
    policy: AsyncPolicy,
    /// Bumped on every trigger; compared on resolution under
    /// [`AsyncPolicy::LatestTrigger`].
    generation: Cell<u64>,
    target: WeakChangeable<T>,
    inputs: RefCell<Vec<Subscription>>,
}

impl<T, F, Fut> AsyncState<T, F>
where
    T: Clone + 'static,
    F: Fn(Values) -> Fut + 'static,
    Fut: Future<Output = T> + 'static,
{
    fn refresh(weak: &Weak<Self>) {
        if let Some(state) = weak.upgrade() {
            state.update();
        }
    }

    fn update(self: &Rc<Self>) {
        let generation = self.generation.get() + 1;
        self.generation.set(generation);

        let pending = (self.compute)(self.deps.snapshot());
        let state = Rc::downgrade(self);
        let task = async move {
            let value = pending.await;
            let Some(state) = state.upgrade() else {
                return;
            };
            if state.policy == AsyncPolicy::LatestTrigger && state.generation.get() != generation {
                tracing::trace!(message = "computed.discard", generation);
                return;
            }
            if let Some(target) = state.target.upgrade() {
                target.set(value);
            }
        };

        if let Err(error) = self.spawner.spawn_local(task) {
            tracing::warn!(message = "computed.spawn_failed", %error, generation);
        }
    }
}
