//! Reactive primitives: signals, effects, and memos.
//!
//! This module provides the fine-grained reactivity that drives component
//! re-rendering.
//!
//! # Core Concepts
//!
//! - **Signal**: A reactive container that holds a value and notifies subscribers when it changes
//! - **Effect**: A side-effect that re-runs when its dependencies change
//! - **Memo**: A cached computed value that only recomputes when dependencies change
//!
//! An effect is subscribed to exactly the signals it read during its most
//! recent execution. Writes queue the subscribed effects; the queue is flushed
//! synchronously once no batch is open and no effect is executing, so an effect
//! never re-enters itself and a write made from inside an effect is picked up
//! after the current effect returns.
//!
//! # Example
//!
//! ```ignore
//! use sprig_core::reactive::*;
//!
//! let count = Signal::new(0);
//!
//! Effect::new(move || {
//!     println!("Count is: {}", count.get());
//! });
//!
//! count.set(1); // Prints: "Count is: 1"
//! ```

use std::cell::{Cell, RefCell};
use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::rc::{Rc, Weak};

/// Upper bound on effect executions in a single flush before the queue is
/// abandoned. Only reachable when effects keep writing their own dependencies.
const MAX_FLUSH_RUNS: usize = 100_000;

// ============================================================================
// Runtime Context
// ============================================================================

// Global runtime state for tracking reactive subscriptions.
//
// The runtime maintains:
// - A stack of observers (effects/memos currently being computed)
// - A queue of pending effects to run
// - Batching and execution depth
// - A stack of scopes collecting newly created effects
thread_local! {
    static RUNTIME: RefCell<Runtime> = RefCell::new(Runtime::new());
}

struct Runtime {
    /// Stack of currently executing observers
    observer_stack: Vec<ObserverId>,

    /// Effects that need to run, in notification order
    pending_effects: VecDeque<ObserverId>,

    /// Nesting depth of `batch` calls
    batch_depth: usize,

    /// Number of observers currently executing
    running: usize,

    /// Scopes collecting effects created inside `Scope::run`
    scope_stack: Vec<Rc<RefCell<Vec<ObserverId>>>>,

    /// Counter for generating unique IDs
    next_id: usize,
}

impl Runtime {
    fn new() -> Self {
        Self {
            observer_stack: Vec::new(),
            pending_effects: VecDeque::new(),
            batch_depth: 0,
            running: 0,
            scope_stack: Vec::new(),
            next_id: 0,
        }
    }

    fn next_id(&mut self) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn is_idle(&self) -> bool {
        self.batch_depth == 0 && self.running == 0
    }

    fn enqueue(&mut self, observer: ObserverId) {
        if !self.pending_effects.contains(&observer) {
            self.pending_effects.push_back(observer);
        }
    }
}

/// Unique identifier for an observer (effect or memo)
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
struct ObserverId(usize);

/// The set of observers subscribed to one reactive source.
type SubscriberSet = Rc<RefCell<HashSet<ObserverId>>>;

/// Subscribe the current observer (if any) to a source.
///
/// The source is also recorded on the observer so the subscription can be
/// dropped before the observer's next execution.
fn track_read(subscribers: &SubscriberSet) {
    let observer = RUNTIME.with(|rt| rt.borrow().observer_stack.last().copied());
    let Some(observer) = observer else {
        return;
    };

    if subscribers.borrow_mut().insert(observer) {
        if let Some(inner) = lookup_effect(observer) {
            inner.sources.borrow_mut().push(Rc::downgrade(subscribers));
        }
    }
}

/// Queue every effect downstream of a source, flushing if the runtime is idle.
///
/// Memos between the source and those effects are marked dirty right here,
/// so a queued effect never reads a stale memo value.
fn notify_subscribers(subscribers: &SubscriberSet) {
    let mut visited = HashSet::new();
    let mut queued = Vec::new();
    collect_stale(subscribers, &mut visited, &mut queued);
    queued.sort();

    let should_flush = RUNTIME.with(|rt| {
        let mut rt = rt.borrow_mut();
        for observer in queued {
            rt.enqueue(observer);
        }
        rt.is_idle()
    });

    if should_flush {
        flush_effects();
    }
}

/// Walk the subscribers of a source: memos are invalidated and followed,
/// effects are collected in creation order.
fn collect_stale(
    subscribers: &SubscriberSet,
    visited: &mut HashSet<ObserverId>,
    queued: &mut Vec<ObserverId>,
) {
    let mut observers: Vec<_> = subscribers.borrow().iter().copied().collect();
    // Creation order keeps parents ahead of the children they created
    observers.sort();

    for observer in observers {
        if !visited.insert(observer) {
            continue;
        }
        let invalidate = lookup_effect(observer)
            .and_then(|inner| inner.invalidate.as_ref().map(|invalidate| invalidate()));
        match invalidate {
            Some(Some(memo_subscribers)) => collect_stale(&memo_subscribers, visited, queued),
            Some(None) => {}
            None => queued.push(observer),
        }
    }
}

/// Marks an observer as executing for the lifetime of the guard.
struct ObserverGuard;

impl ObserverGuard {
    fn push(id: ObserverId) -> Self {
        RUNTIME.with(|rt| {
            let mut rt = rt.borrow_mut();
            rt.observer_stack.push(id);
            rt.running += 1;
        });
        ObserverGuard
    }
}

impl Drop for ObserverGuard {
    fn drop(&mut self) {
        RUNTIME.with(|rt| {
            let mut rt = rt.borrow_mut();
            rt.observer_stack.pop();
            rt.running -= 1;
        });
    }
}

// ============================================================================
// Signal
// ============================================================================

/// A reactive container that holds a value and notifies subscribers when it changes.
///
/// Signals are the foundational reactive primitive. Reading a signal inside an effect
/// automatically subscribes that effect to the signal. Setting a signal notifies
/// all subscribers to re-run.
///
/// # Example
///
/// ```ignore
/// let count = Signal::new(0);
///
/// // Read the value
/// let value = count.get();
///
/// // Update the value (triggers subscribers)
/// count.set(5);
///
/// // Update based on current value
/// count.update(|n| *n += 1);
/// ```
pub struct Signal<T> {
    inner: Rc<SignalInner<T>>,
}

struct SignalInner<T> {
    value: RefCell<T>,
    subscribers: SubscriberSet,
}

impl<T> Signal<T> {
    /// Create a new signal with the given initial value.
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(SignalInner {
                value: RefCell::new(value),
                subscribers: Rc::new(RefCell::new(HashSet::new())),
            }),
        }
    }

    /// Whether two handles point at the same signal.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Number of observers currently subscribed (for debugging).
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.borrow().len()
    }
}

impl<T: Clone> Signal<T> {
    /// Get the current value of the signal.
    ///
    /// If called inside an effect, this automatically subscribes the effect
    /// to this signal.
    pub fn get(&self) -> T {
        track_read(&self.inner.subscribers);
        self.inner.value.borrow().clone()
    }

    /// Get the current value without subscribing the current observer.
    pub fn get_untracked(&self) -> T {
        self.inner.value.borrow().clone()
    }
}

impl<T> Signal<T> {
    /// Get a reference to the current value without cloning.
    ///
    /// If called inside an effect, this automatically subscribes the effect
    /// to this signal.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        track_read(&self.inner.subscribers);
        f(&*self.inner.value.borrow())
    }

    /// Set the signal to a new value.
    ///
    /// This will notify all subscribers to re-run.
    pub fn set(&self, value: T) {
        *self.inner.value.borrow_mut() = value;
        notify_subscribers(&self.inner.subscribers);
    }

    /// Update the signal's value using a function.
    ///
    /// This will notify all subscribers to re-run.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        f(&mut *self.inner.value.borrow_mut());
        notify_subscribers(&self.inner.subscribers);
    }
}

impl<T: PartialEq> Signal<T> {
    /// Set the signal only if the new value differs from the current one.
    ///
    /// Returns `true` if subscribers were notified.
    pub fn set_if_changed(&self, value: T) -> bool {
        if *self.inner.value.borrow() == value {
            return false;
        }
        self.set(value);
        true
    }
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("value", &*self.inner.value.borrow())
            .finish()
    }
}

impl<T: fmt::Display> fmt::Display for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.inner.value.borrow(), f)
    }
}

// ============================================================================
// Effect
// ============================================================================

// Storage for all effects (needed because effects reference themselves)
thread_local! {
    static EFFECTS: RefCell<Vec<Option<Rc<EffectInner>>>> = const { RefCell::new(Vec::new()) };
}

/// A side-effect that re-runs when its dependencies change.
///
/// Effects automatically track which signals they read and re-run when
/// any of those signals change.
///
/// # Example
///
/// ```ignore
/// let count = Signal::new(0);
///
/// Effect::new(move || {
///     println!("Count is now: {}", count.get());
/// });
///
/// count.set(1); // Prints: "Count is now: 1"
/// count.set(2); // Prints: "Count is now: 2"
/// ```
pub struct Effect {
    id: ObserverId,
}

/// Marks a memo dirty and hands back its subscribers, if it is still alive.
type Invalidate = Box<dyn Fn() -> Option<SubscriberSet>>;

struct EffectInner {
    id: ObserverId,
    f: RefCell<Box<dyn FnMut()>>,
    /// Set for memos: they are invalidated synchronously instead of queued.
    invalidate: Option<Invalidate>,
    disposed: Cell<bool>,
    /// Subscriber sets this observer joined during its last execution.
    sources: RefCell<Vec<Weak<RefCell<HashSet<ObserverId>>>>>,
}

impl EffectInner {
    fn clear_sources(&self) {
        for source in self.sources.borrow_mut().drain(..) {
            if let Some(subscribers) = source.upgrade() {
                subscribers.borrow_mut().remove(&self.id);
            }
        }
    }
}

fn lookup_effect(id: ObserverId) -> Option<Rc<EffectInner>> {
    EFFECTS.with(|effects| effects.borrow().get(id.0).and_then(|e| e.clone()))
}

/// Allocate an ID, store the effect body and register it with the active scope.
fn register_effect(f: Box<dyn FnMut()>) -> ObserverId {
    register_observer(f, None)
}

fn register_observer(f: Box<dyn FnMut()>, invalidate: Option<Invalidate>) -> ObserverId {
    let id = RUNTIME.with(|rt| {
        let mut rt = rt.borrow_mut();
        let id = ObserverId(rt.next_id());
        if let Some(scope) = rt.scope_stack.last() {
            scope.borrow_mut().push(id);
        }
        id
    });

    let inner = Rc::new(EffectInner {
        id,
        f: RefCell::new(f),
        invalidate,
        disposed: Cell::new(false),
        sources: RefCell::new(Vec::new()),
    });

    EFFECTS.with(|effects| {
        let mut effects = effects.borrow_mut();
        let idx = id.0;
        if idx >= effects.len() {
            effects.resize(idx + 1, None);
        }
        effects[idx] = Some(inner);
    });

    id
}

// Uses `try_with` because memos can be dropped while thread-locals are
// being torn down at thread exit.
fn dispose_effect(id: ObserverId) {
    let removed = EFFECTS
        .try_with(|effects| {
            effects
                .try_borrow_mut()
                .ok()
                .and_then(|mut effects| effects.get_mut(id.0).and_then(|slot| slot.take()))
        })
        .ok()
        .flatten();

    if let Some(inner) = removed {
        inner.disposed.set(true);
        inner.clear_sources();
    }

    let _ = RUNTIME.try_with(|rt| {
        if let Ok(mut rt) = rt.try_borrow_mut() {
            rt.pending_effects.retain(|pending| *pending != id);
        }
    });
}

impl Effect {
    /// Create a new effect that runs immediately and re-runs when dependencies change.
    pub fn new<F: FnMut() + 'static>(f: F) -> Self {
        let id = register_effect(Box::new(f));

        // Run the effect immediately
        run_effect(id);
        flush_if_idle();

        Effect { id }
    }

    /// Create an effect that doesn't run immediately.
    pub fn new_deferred<F: FnMut() + 'static>(f: F) -> Self {
        Effect {
            id: register_effect(Box::new(f)),
        }
    }

    /// Manually trigger this effect to run.
    pub fn run(&self) {
        run_effect(self.id);
        flush_if_idle();
    }

    /// Dispose of this effect, preventing it from running again.
    pub fn dispose(&self) {
        dispose_effect(self.id);
    }

    /// Whether this effect has been disposed.
    pub fn is_disposed(&self) -> bool {
        lookup_effect(self.id).is_none_or(|inner| inner.disposed.get())
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect").field("id", &self.id.0).finish()
    }
}

/// Run a specific effect by ID
fn run_effect(id: ObserverId) {
    let Some(inner) = lookup_effect(id) else {
        return;
    };
    if inner.disposed.get() {
        return;
    }

    // Already executing further up the stack: run again once it returns
    let Ok(mut f) = inner.f.try_borrow_mut() else {
        RUNTIME.with(|rt| rt.borrow_mut().enqueue(id));
        return;
    };

    // Dependencies are re-collected on every run
    inner.clear_sources();

    let _guard = ObserverGuard::push(id);
    (f)();
}

fn flush_if_idle() {
    if RUNTIME.with(|rt| rt.borrow().is_idle()) {
        flush_effects();
    }
}

/// Flush all pending effects
fn flush_effects() {
    let mut runs = 0usize;
    loop {
        let effect_id = RUNTIME.with(|rt| rt.borrow_mut().pending_effects.pop_front());

        match effect_id {
            Some(id) => {
                runs += 1;
                if runs > MAX_FLUSH_RUNS {
                    tracing::error!(
                        "reactive flush exceeded {} effect runs; an effect is likely writing its own dependencies",
                        MAX_FLUSH_RUNS
                    );
                    RUNTIME.with(|rt| rt.borrow_mut().pending_effects.clear());
                    break;
                }
                run_effect(id);
            }
            None => break,
        }
    }
}

// ============================================================================
// Memo
// ============================================================================

/// A cached computed value that only recomputes when dependencies change.
///
/// Memos are lazily evaluated and cache their result until one of their
/// dependencies changes.
///
/// # Example
///
/// ```ignore
/// let count = Signal::new(2);
/// let doubled = Memo::new(move || count.get() * 2);
///
/// doubled.get(); // Returns 4
/// count.set(3);
/// doubled.get(); // Returns 6 (recomputed)
/// doubled.get(); // Returns 6 (cached)
/// ```
pub struct Memo<T> {
    inner: Rc<MemoInner<T>>,
}

struct MemoInner<T> {
    id: ObserverId,
    value: RefCell<Option<T>>,
    f: Box<dyn Fn() -> T>,
    dirty: Cell<bool>,
    subscribers: SubscriberSet,
}

impl<T> Drop for MemoInner<T> {
    fn drop(&mut self) {
        dispose_effect(self.id);
    }
}

impl<T: Clone + 'static> Memo<T> {
    /// Create a new memo with the given computation function.
    pub fn new<F: Fn() -> T + 'static>(f: F) -> Self {
        let inner = Rc::new_cyclic(|weak: &Weak<MemoInner<T>>| {
            // The memo observes its dependencies through a marker whose only
            // job is to be invalidated
            let weak = weak.clone();
            let invalidate: Invalidate = Box::new(move || {
                weak.upgrade().map(|memo| {
                    memo.dirty.set(true);
                    Rc::clone(&memo.subscribers)
                })
            });
            let id = register_observer(Box::new(|| {}), Some(invalidate));

            MemoInner {
                id,
                value: RefCell::new(None),
                f: Box::new(f),
                dirty: Cell::new(true),
                subscribers: Rc::new(RefCell::new(HashSet::new())),
            }
        });

        Self { inner }
    }

    /// Get the current value, recomputing if necessary.
    pub fn get(&self) -> T {
        // Subscribe current observer to this memo
        track_read(&self.inner.subscribers);

        if !self.inner.dirty.get() {
            if let Some(value) = self.inner.value.borrow().as_ref() {
                return value.clone();
            }
        }

        self.recompute()
    }

    fn recompute(&self) -> T {
        if let Some(marker) = lookup_effect(self.inner.id) {
            marker.clear_sources();
        }

        // Push memo as observer while computing
        let value = {
            let _guard = ObserverGuard::push(self.inner.id);
            (self.inner.f)()
        };

        *self.inner.value.borrow_mut() = Some(value.clone());
        self.inner.dirty.set(false);
        value
    }
}

impl<T> Memo<T> {
    /// Whether two handles point at the same memo.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T> Clone for Memo<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Memo<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memo")
            .field("value", &*self.inner.value.borrow())
            .field("dirty", &self.inner.dirty.get())
            .finish()
    }
}

// ============================================================================
// Batching
// ============================================================================

/// Batch multiple signal updates to avoid redundant effect runs.
///
/// Effects will only run once after the outermost batch completes, even if
/// multiple signals they depend on are updated.
///
/// # Example
///
/// ```ignore
/// let count = Signal::new(0);
/// let name = Signal::new("".to_string());
///
/// batch(|| {
///     count.set(1);
///     name.set("Alice".to_string());
///     // Effects only run once, after this batch
/// });
/// ```
pub fn batch<R>(f: impl FnOnce() -> R) -> R {
    struct BatchGuard;

    impl Drop for BatchGuard {
        fn drop(&mut self) {
            RUNTIME.with(|rt| rt.borrow_mut().batch_depth -= 1);
        }
    }

    let result = {
        RUNTIME.with(|rt| rt.borrow_mut().batch_depth += 1);
        let _guard = BatchGuard;
        f()
    };

    flush_if_idle();

    result
}

// ============================================================================
// Scope (for memory management)
// ============================================================================

/// A scope that manages the lifetime of reactive primitives.
///
/// Effects created while [`Scope::run`] executes belong to the scope. When the
/// scope is disposed (or dropped), all of them are disposed.
///
/// # Example
///
/// ```ignore
/// let scope = Scope::new();
///
/// scope.run(|| {
///     let signal = Signal::new(0);
///     Effect::new(|| { /* ... */ });
///     // the effect belongs to this scope
/// });
///
/// scope.dispose(); // Cleans up the effect
/// ```
pub struct Scope {
    effects: Rc<RefCell<Vec<ObserverId>>>,
}

impl Scope {
    /// Create a new scope.
    pub fn new() -> Self {
        Self {
            effects: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Run a function within this scope, capturing any effects created.
    pub fn run<R>(&self, f: impl FnOnce() -> R) -> R {
        struct ScopeGuard;

        impl Drop for ScopeGuard {
            fn drop(&mut self) {
                RUNTIME.with(|rt| {
                    rt.borrow_mut().scope_stack.pop();
                });
            }
        }

        RUNTIME.with(|rt| {
            rt.borrow_mut().scope_stack.push(Rc::clone(&self.effects));
        });
        let _guard = ScopeGuard;
        f()
    }

    /// Register an effect with this scope.
    pub fn add_effect(&self, effect: &Effect) {
        self.effects.borrow_mut().push(effect.id);
    }

    /// Number of effects owned by this scope.
    pub fn effect_count(&self) -> usize {
        self.effects.borrow().len()
    }

    /// Dispose of all effects in this scope.
    pub fn dispose(&self) {
        let effects: Vec<_> = self.effects.borrow_mut().drain(..).collect();
        for id in effects {
            dispose_effect(id);
        }
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        self.dispose();
    }
}

// ============================================================================
// Utility functions
// ============================================================================

/// Create a derived signal from a computation.
///
/// This is a convenience function that creates a memo and returns it
/// as a signal-like value.
pub fn derived<T: Clone + 'static>(f: impl Fn() -> T + 'static) -> Memo<T> {
    Memo::new(f)
}

/// Run a function without tracking any signal reads.
///
/// Useful for reading signals without creating subscriptions.
pub fn untracked<R>(f: impl FnOnce() -> R) -> R {
    struct Restore(Vec<ObserverId>);

    impl Drop for Restore {
        fn drop(&mut self) {
            let stack = std::mem::take(&mut self.0);
            RUNTIME.with(|rt| rt.borrow_mut().observer_stack = stack);
        }
    }

    // Hide every enclosing observer, not just the innermost one
    let observers = RUNTIME.with(|rt| std::mem::take(&mut rt.borrow_mut().observer_stack));
    let _restore = Restore(observers);

    f()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn signal_basic() {
        let signal = Signal::new(0);
        assert_eq!(signal.get(), 0);

        signal.set(5);
        assert_eq!(signal.get(), 5);

        signal.update(|n| *n += 1);
        assert_eq!(signal.get(), 6);
    }

    #[test]
    fn effect_tracks_signals() {
        let count = Signal::new(0);
        let run_count = Rc::new(Cell::new(0));

        let run_count_clone = Rc::clone(&run_count);
        let count_clone = count.clone();
        Effect::new(move || {
            let _ = count_clone.get();
            run_count_clone.set(run_count_clone.get() + 1);
        });

        // Effect runs immediately
        assert_eq!(run_count.get(), 1);

        // Effect runs when signal changes
        count.set(1);
        assert_eq!(run_count.get(), 2);

        count.set(2);
        assert_eq!(run_count.get(), 3);
    }

    #[test]
    fn set_if_changed_skips_equal_values() {
        let count = Signal::new(3);
        let run_count = Rc::new(Cell::new(0));

        let run_count_clone = Rc::clone(&run_count);
        let count_clone = count.clone();
        Effect::new(move || {
            let _ = count_clone.get();
            run_count_clone.set(run_count_clone.get() + 1);
        });

        assert!(!count.set_if_changed(3));
        assert_eq!(run_count.get(), 1);

        assert!(count.set_if_changed(4));
        assert_eq!(run_count.get(), 2);
    }

    #[test]
    fn effect_drops_stale_dependencies() {
        let use_a = Signal::new(true);
        let a = Signal::new(0);
        let b = Signal::new(0);
        let run_count = Rc::new(Cell::new(0));

        let (use_a_c, a_c, b_c, runs) = (use_a.clone(), a.clone(), b.clone(), run_count.clone());
        Effect::new(move || {
            runs.set(runs.get() + 1);
            if use_a_c.get() {
                let _ = a_c.get();
            } else {
                let _ = b_c.get();
            }
        });
        assert_eq!(run_count.get(), 1);

        use_a.set(false);
        assert_eq!(run_count.get(), 2);

        // `a` is no longer read, so writing it does nothing
        a.set(10);
        assert_eq!(run_count.get(), 2);
        assert_eq!(a.subscriber_count(), 0);

        b.set(1);
        assert_eq!(run_count.get(), 3);
    }

    #[test]
    fn write_inside_effect_runs_after_it() {
        let source = Signal::new(0);
        let mirror = Signal::new(0);
        let log = Rc::new(RefCell::new(Vec::new()));

        let (source_c, mirror_c) = (source.clone(), mirror.clone());
        Effect::new(move || {
            let value = source_c.get();
            mirror_c.set(value * 10);
        });

        let (mirror_c, log_c) = (mirror.clone(), log.clone());
        Effect::new(move || {
            log_c.borrow_mut().push(mirror_c.get());
        });

        source.set(2);
        assert_eq!(*log.borrow(), vec![0, 20]);
    }

    #[test]
    fn memo_caches_value() {
        let count = Signal::new(2);
        let compute_count = Rc::new(Cell::new(0));

        let compute_count_clone = Rc::clone(&compute_count);
        let count_clone = count.clone();
        let doubled = Memo::new(move || {
            compute_count_clone.set(compute_count_clone.get() + 1);
            count_clone.get() * 2
        });

        // First access computes
        assert_eq!(doubled.get(), 4);
        assert_eq!(compute_count.get(), 1);

        // Second access uses cache
        assert_eq!(doubled.get(), 4);
        assert_eq!(compute_count.get(), 1);

        // Update signal
        count.set(3);

        // Next access recomputes
        assert_eq!(doubled.get(), 6);
        assert_eq!(compute_count.get(), 2);
    }

    #[test]
    fn memo_change_reruns_dependent_effect() {
        let count = Signal::new(1);
        let count_clone = count.clone();
        let doubled = Memo::new(move || count_clone.get() * 2);
        let seen = Rc::new(RefCell::new(Vec::new()));

        let (doubled_c, seen_c) = (doubled.clone(), seen.clone());
        Effect::new(move || {
            seen_c.borrow_mut().push(doubled_c.get());
        });

        count.set(5);
        assert_eq!(*seen.borrow(), vec![2, 10]);
    }

    #[test]
    fn effect_created_before_memo_sees_fresh_value_once() {
        let count = Signal::new(1);
        let slot: Rc<RefCell<Option<Memo<i32>>>> = Rc::new(RefCell::new(None));
        let seen = Rc::new(RefCell::new(Vec::new()));

        let (count_c, slot_c, seen_c) = (count.clone(), slot.clone(), seen.clone());
        Effect::new(move || {
            let value = count_c.get();
            let scaled = slot_c.borrow().as_ref().map(Memo::get);
            seen_c.borrow_mut().push((value, scaled));
        });

        let count_c = count.clone();
        *slot.borrow_mut() = Some(Memo::new(move || count_c.get() * 10));

        // The effect starts reading the memo on this run
        count.set(2);
        assert_eq!(*seen.borrow(), vec![(1, None), (2, Some(20))]);

        seen.borrow_mut().clear();
        count.set(3);
        assert_eq!(*seen.borrow(), vec![(3, Some(30))]);
    }

    #[test]
    fn chained_memos_rerun_effect_once() {
        let count = Signal::new(1);
        let count_c = count.clone();
        let plus_one = Memo::new(move || count_c.get() + 1);
        let plus_one_c = plus_one.clone();
        let doubled = Memo::new(move || plus_one_c.get() * 2);
        let seen = Rc::new(RefCell::new(Vec::new()));

        let (count_c, doubled_c, seen_c) = (count.clone(), doubled.clone(), seen.clone());
        Effect::new(move || {
            seen_c.borrow_mut().push((count_c.get(), doubled_c.get()));
        });

        count.set(4);
        assert_eq!(*seen.borrow(), vec![(1, 4), (4, 10)]);
    }

    #[test]
    fn deferred_effect_waits_for_first_run() {
        let count = Signal::new(0);
        let run_count = Rc::new(Cell::new(0));

        let (count_c, run_count_c) = (count.clone(), run_count.clone());
        let effect = Effect::new_deferred(move || {
            count_c.get();
            run_count_c.set(run_count_c.get() + 1);
        });
        assert_eq!(run_count.get(), 0);

        // Not subscribed to anything yet
        count.set(1);
        assert_eq!(run_count.get(), 0);

        effect.run();
        assert_eq!(run_count.get(), 1);
        count.set(2);
        assert_eq!(run_count.get(), 2);
    }

    #[test]
    fn derived_tracks_its_source() {
        let count = Signal::new(1);
        let count_c = count.clone();
        let next = derived(move || count_c.get() + 1);

        assert_eq!(next.get(), 2);
        count.set(5);
        assert_eq!(next.get(), 6);
    }

    #[test]
    fn batch_prevents_multiple_runs() {
        let count = Signal::new(0);
        let run_count = Rc::new(Cell::new(0));

        let run_count_clone = Rc::clone(&run_count);
        let count_clone = count.clone();
        Effect::new(move || {
            let _ = count_clone.get();
            run_count_clone.set(run_count_clone.get() + 1);
        });

        // Effect runs immediately
        assert_eq!(run_count.get(), 1);

        // Batch multiple updates
        batch(|| {
            count.set(1);
            count.set(2);
            batch(|| count.set(3));
            // Inner batch does not flush
            assert_eq!(run_count.get(), 1);
        });

        // Effect only ran once more
        assert_eq!(run_count.get(), 2);
        assert_eq!(count.get(), 3);
    }

    #[test]
    fn untracked_prevents_subscription() {
        let count = Signal::new(0);
        let run_count = Rc::new(Cell::new(0));

        let run_count_clone = Rc::clone(&run_count);
        let count_clone = count.clone();
        Effect::new(move || {
            untracked(|| {
                let _ = count_clone.get();
            });
            run_count_clone.set(run_count_clone.get() + 1);
        });

        // Effect runs immediately
        assert_eq!(run_count.get(), 1);

        // Effect does NOT run when signal changes (untracked)
        count.set(1);
        assert_eq!(run_count.get(), 1);
    }

    #[test]
    fn untracked_inside_memo_hides_outer_effect() {
        let hidden = Signal::new(0);
        let run_count = Rc::new(Cell::new(0));

        let hidden_clone = hidden.clone();
        let memo = Memo::new(move || untracked(|| hidden_clone.get()));
        let run_count_clone = Rc::clone(&run_count);
        Effect::new(move || {
            memo.get();
            run_count_clone.set(run_count_clone.get() + 1);
        });

        hidden.set(1);
        assert_eq!(run_count.get(), 1);
    }

    #[test]
    fn scope_disposes_captured_effects() {
        let count = Signal::new(0);
        let run_count = Rc::new(Cell::new(0));
        let scope = Scope::new();

        let effect = scope.run(|| {
            let (count_c, runs) = (count.clone(), run_count.clone());
            Effect::new(move || {
                let _ = count_c.get();
                runs.set(runs.get() + 1);
            })
        });
        assert_eq!(scope.effect_count(), 1);

        count.set(1);
        assert_eq!(run_count.get(), 2);

        drop(scope);
        assert!(effect.is_disposed());

        count.set(2);
        assert_eq!(run_count.get(), 2);
        assert_eq!(count.subscriber_count(), 0);
    }
}
