#![forbid(unsafe_code)]

//! Components: a fixed list of dependencies bound to a render function.
//!
//! # Lifecycle
//!
//! ```text
//! mount ──► init ──► render (NewMount) ──► Mounted ──► render (DependencyChanged)* ──┐
//!                         │                   │                                       │
//!                         ▼                   ▼                                       ▼
//!                    Err returned          destroy() ──► Destroyed            Failed (on violation)
//! ```
//!
//! 1. [`ElHandle::mount`] resolves the targets, calls [`El::init`] exactly
//!    once and keeps the returned [`Dependencies`] for the component's
//!    lifetime.
//! 2. The first render runs before any subscription exists. A render that
//!    fails here is returned as `Err` and nothing is attached.
//! 3. Every dependency change triggers one render pass: the component
//!    renders once, the first target gets that node and every further target
//!    a deep clone, each reconciled against what it showed before.
//! 4. A pass that fails after mounting is logged, the component becomes
//!    [`Lifecycle::Failed`] and no further change-triggered render happens.
//!
//! # Teardown
//!
//! [`ElHandle::destroy`] runs [`El::destroy`] (clear timers, drop external
//! subscriptions) but keeps the dependency subscriptions, so the component
//! keeps rendering. [`ElHandle::unsubscribe`] releases those. Dropping the
//! last handle does both.
//!
//! # Failure Modes
//!
//! - Dependency subscriptions hold only a weak handle to the component. A
//!   component whose handles were all dropped stops rendering, even if its
//!   output is still in the document; use [`ElHandle::detach`] to keep it
//!   alive for the rest of the program.
//! - [`ElHandle::detach`] leaks the component: its state, its dependency
//!   subscriptions and whatever it holds (timers included) are never freed,
//!   and [`El::destroy`] can never run afterwards.
//! - When a render pass fails part way through, targets already updated keep
//!   their new node and later targets keep the old one. Nodes a failing
//!   `render` created before returning its error stay in the arena.
//! - Cascades are not coalesced: a component depending on two cells changed
//!   by one cascade renders twice.

use std::any::type_name;
use std::cell::{Cell, Ref, RefCell, RefMut};
use std::fmt;
use std::rc::{Rc, Weak};

use oof_dom::{Child, Document, Mountable, NodeId, Reconcile};
use oof_reactive::{Dependencies, Subscription, Values};
use web_time::Instant;

use crate::config::MountConfig;
use crate::error::{Contract, ElError};
use crate::target::MountTarget;

/// Why a render pass is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateReason {
    /// First render into a target.
    NewMount,
    /// The dependency at this index changed.
    DependencyChanged(usize),
    /// [`ElHandle::update`] was called.
    Manual,
}

/// A component.
pub trait El: 'static {
    /// Passed to [`init`](Self::init) once, at mount time.
    type Options;

    /// Set up state and declare the cells to re-render on.
    fn init(&mut self, options: Self::Options) -> Dependencies;

    /// Build a detached node from the current dependency values.
    fn render(&self, cx: &RenderCx<'_>) -> Result<NodeId, ElError>;

    /// Release external resources. Called at most once.
    fn destroy(&mut self) {}
}

/// What a render function can see.
pub struct RenderCx<'a> {
    doc: &'a Document,
    values: &'a Values,
    reason: UpdateReason,
    component: &'static str,
}

impl<'a> RenderCx<'a> {
    #[must_use]
    pub fn doc(&self) -> &'a Document {
        self.doc
    }

    /// Dependency values in declaration order.
    #[must_use]
    pub fn values(&self) -> &'a Values {
        self.values
    }

    #[must_use]
    pub fn reason(&self) -> UpdateReason {
        self.reason
    }

    /// The dependency at `index`, which must be set and of type `T`.
    pub fn get<T: 'static>(&self, index: usize) -> Result<&'a T, ElError> {
        self.values
            .get(index)
            .map_err(|error| ElError::contract(self.component, error))
    }

    /// The dependency at `index` as `T`, or `None` while unset.
    pub fn try_get<T: 'static>(&self, index: usize) -> Result<Option<&'a T>, ElError> {
        self.values
            .try_get(index)
            .map_err(|error| ElError::contract(self.component, error))
    }
}

/// Where a component is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Mounted,
    /// A change-triggered render broke a contract; rendering stopped.
    Failed,
    /// [`El::destroy`] ran.
    Destroyed,
}

#[derive(Debug, Clone, Copy)]
struct Mount {
    target: NodeId,
    /// What the target shows, `None` before the first render.
    node: Option<NodeId>,
}

struct Inner<C: El> {
    doc: Document,
    name: &'static str,
    component: RefCell<C>,
    deps: Dependencies,
    reconciler: Box<dyn Reconcile>,
    mounts: RefCell<Vec<Mount>>,
    lifecycle: Cell<Lifecycle>,
    destroyed: Cell<bool>,
    subscriptions: RefCell<Vec<Subscription>>,
    last_error: RefCell<Option<ElError>>,
}

impl<C: El> Inner<C> {
    fn render_node(&self, reason: UpdateReason) -> Result<NodeId, ElError> {
        let values = self.deps.snapshot();
        let cx = RenderCx {
            doc: &self.doc,
            values: &values,
            reason,
            component: self.name,
        };
        let node = self.component.borrow().render(&cx)?;
        self.check_rendered(node)?;
        Ok(node)
    }

    fn check_rendered(&self, node: NodeId) -> Result<(), ElError> {
        if !self.doc.is_live(node) {
            return Err(ElError::contract(self.name, Contract::StaleNode(node)));
        }
        if node == self.doc.body() {
            return Err(ElError::contract(self.name, Contract::DocumentRoot));
        }
        if self.doc.parent(node)?.is_some() {
            return Err(ElError::contract(self.name, Contract::AttachedNode(node)));
        }
        Ok(())
    }

    /// Render once and show the result in every mount, or only in mounts
    /// that show nothing yet.
    fn render_pass(&self, reason: UpdateReason, only_new: bool) -> Result<(), ElError> {
        self.render_pass_with(&*self.reconciler, reason, only_new)
    }

    fn render_pass_with(
        &self,
        reconciler: &dyn Reconcile,
        reason: UpdateReason,
        only_new: bool,
    ) -> Result<(), ElError> {
        let start = Instant::now();
        // Targets discarded by a parent's reconcile are dropped.
        self.mounts
            .borrow_mut()
            .retain(|mount| self.doc.is_live(mount.target));
        let mounts: Vec<Mount> = self
            .mounts
            .borrow()
            .iter()
            .filter(|mount| !only_new || mount.node.is_none())
            .copied()
            .collect();

        let span = tracing::debug_span!(
            "el.render",
            component = self.name,
            targets = mounts.len(),
            reason = ?reason,
            render_duration_us = tracing::field::Empty
        );
        let _guard = span.enter();

        let node = self.render_node(reason)?;
        if mounts.is_empty() {
            self.doc.discard(node)?;
            return Ok(());
        }

        // Clone before reconciling: patching frees the rendered node.
        let mut rendered = Vec::with_capacity(mounts.len());
        rendered.push(node);
        for _ in 1..mounts.len() {
            rendered.push(self.doc.deep_clone(node)?);
        }

        let mut rendered = rendered.into_iter();
        for mount in &mounts {
            let Some(new) = rendered.next() else {
                break;
            };
            let shown = match mount.node {
                Some(old) => reconciler.reconcile(&self.doc, mount.target, old, new),
                None => self.doc.append_child(mount.target, new).map(|()| new),
            };
            match shown {
                Ok(node) => self.record_shown(mount.target, node),
                Err(error) => {
                    // Targets already updated keep their record; unused
                    // clones are freed.
                    for unused in rendered {
                        self.doc.discard(unused)?;
                    }
                    if self.doc.is_live(new) && self.doc.parent(new)?.is_none() {
                        self.doc.discard(new)?;
                    }
                    return Err(error.into());
                }
            }
        }

        span.record("render_duration_us", start.elapsed().as_micros() as u64);
        Ok(())
    }

    /// Track `targets` not tracked yet. Returns how many were added.
    fn add_targets(&self, targets: Vec<NodeId>) -> usize {
        let mut mounts = self.mounts.borrow_mut();
        let before = mounts.len();
        for target in targets {
            if !mounts.iter().any(|mount| mount.target == target) {
                mounts.push(Mount { target, node: None });
            }
        }
        mounts.len() - before
    }

    fn record_shown(&self, target: NodeId, node: NodeId) {
        if let Some(mount) = self
            .mounts
            .borrow_mut()
            .iter_mut()
            .find(|mount| mount.target == target)
        {
            mount.node = Some(node);
        }
    }

    fn on_dependency_change(&self, index: usize) {
        if self.lifecycle.get() == Lifecycle::Failed {
            return;
        }
        if let Err(error) = self.render_pass(UpdateReason::DependencyChanged(index), false) {
            tracing::error!(
                message = "el.render_failed",
                component = self.name,
                dependency = index,
                %error
            );
            self.lifecycle.set(Lifecycle::Failed);
            *self.last_error.borrow_mut() = Some(error);
        }
    }

    fn run_destroy(&self) {
        if self.destroyed.replace(true) {
            return;
        }
        tracing::debug!(message = "el.destroy", component = self.name);
        self.component.borrow_mut().destroy();
        if self.lifecycle.get() == Lifecycle::Mounted {
            self.lifecycle.set(Lifecycle::Destroyed);
        }
    }
}

impl<C: El> Drop for Inner<C> {
    fn drop(&mut self) {
        if !self.destroyed.get() {
            self.run_destroy();
        }
    }
}

/// Shared handle to a mounted component.
///
/// Cloning creates a new handle to the **same** component.
pub struct ElHandle<C: El> {
    inner: Rc<Inner<C>>,
}

impl<C: El> Clone for ElHandle<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<C: El> fmt::Debug for ElHandle<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElHandle")
            .field("component", &self.inner.name)
            .field("lifecycle", &self.inner.lifecycle.get())
            .field("targets", &self.inner.mounts.borrow().len())
            .field("dependencies", &self.inner.deps.len())
            .finish()
    }
}

impl<C: El> ElHandle<C> {
    /// Mount `component` into `target` with the default [`MountConfig`].
    pub fn mount(
        doc: &Document,
        target: impl Into<MountTarget>,
        component: C,
        options: C::Options,
    ) -> Result<Self, ElError> {
        Self::mount_with(doc, target, component, options, MountConfig::default())
    }

    /// Mount `component` into `target`.
    ///
    /// On error nothing is attached and the component is destroyed.
    pub fn mount_with(
        doc: &Document,
        target: impl Into<MountTarget>,
        mut component: C,
        options: C::Options,
        config: MountConfig,
    ) -> Result<Self, ElError> {
        let name = short_type_name::<C>();
        let targets = target.into().resolve(doc)?;
        let span = tracing::debug_span!(
            "el.mount",
            component = name,
            targets = targets.len(),
            strategy = %config.strategy.resolve()
        );
        let _guard = span.enter();

        let deps = component.init(options);
        let inner = Rc::new(Inner {
            doc: doc.clone(),
            name,
            component: RefCell::new(component),
            deps,
            reconciler: config.strategy.reconciler(),
            mounts: RefCell::new(Vec::new()),
            lifecycle: Cell::new(Lifecycle::Mounted),
            destroyed: Cell::new(false),
            subscriptions: RefCell::new(Vec::new()),
            last_error: RefCell::new(None),
        });

        inner.add_targets(targets);
        inner.render_pass(UpdateReason::NewMount, false)?;

        let weak: Weak<Inner<C>> = Rc::downgrade(&inner);
        let subscriptions = inner.deps.subscribe_each(move |index| {
            if let Some(inner) = weak.upgrade() {
                inner.on_dependency_change(index);
            }
        });
        *inner.subscriptions.borrow_mut() = subscriptions;

        tracing::debug!(
            message = "el.mounted",
            component = name,
            dependencies = inner.deps.len()
        );
        Ok(Self { inner })
    }

    /// Mount into additional targets. Targets already mounted are skipped and
    /// existing targets are not re-rendered.
    pub fn mount_to(&self, target: impl Into<MountTarget>) -> Result<(), ElError> {
        let targets = target.into().resolve(&self.inner.doc)?;
        if self.inner.add_targets(targets) == 0 {
            return Ok(());
        }
        let result = self.inner.render_pass(UpdateReason::NewMount, true);
        if result.is_err() {
            // Nothing was attached for the new targets.
            self.inner
                .mounts
                .borrow_mut()
                .retain(|mount| mount.node.is_some());
        }
        result
    }

    /// Render every target now.
    ///
    /// Also retries a [`Failed`](Lifecycle::Failed) component; success
    /// makes it [`Mounted`](Lifecycle::Mounted) again.
    pub fn update(&self) -> Result<(), ElError> {
        match self.inner.render_pass(UpdateReason::Manual, false) {
            Ok(()) => {
                if self.inner.lifecycle.get() == Lifecycle::Failed {
                    self.inner.lifecycle.set(if self.inner.destroyed.get() {
                        Lifecycle::Destroyed
                    } else {
                        Lifecycle::Mounted
                    });
                    *self.inner.last_error.borrow_mut() = None;
                }
                Ok(())
            }
            Err(error) => {
                self.inner.lifecycle.set(Lifecycle::Failed);
                *self.inner.last_error.borrow_mut() = Some(error.clone());
                Err(error)
            }
        }
    }

    /// Run [`El::destroy`]. Idempotent. Dependency subscriptions stay.
    pub fn destroy(&self) {
        self.inner.run_destroy();
    }

    /// Stop re-rendering on dependency changes.
    pub fn unsubscribe(&self) {
        let subscriptions = std::mem::take(&mut *self.inner.subscriptions.borrow_mut());
        drop(subscriptions);
    }

    /// Whether dependency changes still trigger renders.
    #[must_use]
    pub fn is_subscribed(&self) -> bool {
        self.inner
            .subscriptions
            .borrow()
            .iter()
            .any(Subscription::is_active)
    }

    /// Keep the component alive for the rest of the program.
    ///
    /// This leaks the component, its dependency subscriptions and any timers
    /// it owns. [`El::destroy`] will never run.
    pub fn detach(self) {
        std::mem::forget(self);
    }

    #[must_use]
    pub fn lifecycle(&self) -> Lifecycle {
        self.inner.lifecycle.get()
    }

    /// The error that moved the component to [`Lifecycle::Failed`].
    #[must_use]
    pub fn last_error(&self) -> Option<ElError> {
        self.inner.last_error.borrow().clone()
    }

    #[must_use]
    pub fn document(&self) -> &Document {
        &self.inner.doc
    }

    /// Live mount targets in mount order.
    #[must_use]
    pub fn targets(&self) -> Vec<NodeId> {
        self.inner.mounts.borrow().iter().map(|mount| mount.target).collect()
    }

    /// The node currently shown in each target, in mount order.
    #[must_use]
    pub fn mounted_nodes(&self) -> Vec<NodeId> {
        self.inner
            .mounts
            .borrow()
            .iter()
            .filter_map(|mount| mount.node)
            .collect()
    }

    /// Borrow the component.
    pub fn with<R>(&self, f: impl FnOnce(&C) -> R) -> R {
        f(&self.inner.component.borrow())
    }

    /// Mutably borrow the component.
    ///
    /// # Panics
    ///
    /// Panics if `f` causes this component to render, for example by setting
    /// one of its dependencies.
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut C) -> R) -> R {
        f(&mut self.inner.component.borrow_mut())
    }

    /// Borrow the component for longer than a closure.
    #[must_use]
    pub fn borrow(&self) -> Ref<'_, C> {
        self.inner.component.borrow()
    }

    #[must_use]
    pub fn borrow_mut(&self) -> RefMut<'_, C> {
        self.inner.component.borrow_mut()
    }
}

impl<C: El> Mountable for ElHandle<C> {
    fn mount_into(&self, doc: &Document, target: NodeId) {
        let result = if doc.ptr_eq(&self.inner.doc) {
            self.mount_to(target)
        } else {
            Err(ElError::contract(self.inner.name, Contract::ForeignDocument))
        };
        if let Err(error) = result {
            tracing::error!(message = "el.mount_failed", component = self.inner.name, %error);
        }
    }
}

impl<C: El> From<ElHandle<C>> for Child {
    fn from(handle: ElHandle<C>) -> Self {
        Child::Mount(Rc::new(handle))
    }
}

impl<C: El> From<&ElHandle<C>> for Child {
    fn from(handle: &ElHandle<C>) -> Self {
        Child::Mount(Rc::new(handle.clone()))
    }
}

/// `my_app::widgets::Counter<T>` → `Counter`.
pub(crate) fn short_type_name<T: ?Sized>() -> &'static str {
    let full = type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
