// Copyright 2026 the Appear Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The observation context.
//!
//! A [`Registry`] owns at most one active detector. It creates one with
//! [`ObserverOptions::default`] the first time something is observed, or
//! explicitly with [`create`](Registry::create), and tears it down with
//! [`destroy`](Registry::destroy). Every detector it builds delivers
//! measurement batches into the registry's [`TransitionEngine`], which
//! dispatches notifications through the [`ElementHost`].
//!
//! There is no per-element `unobserve`: observation ends for every element at
//! once, on [`destroy`](Registry::destroy). [`forget`](Registry::forget) drops
//! the recorded state of an element that has left the document.
//!
//! # Wiring
//!
//! ```rust,ignore
//! let mut registry = Registry::new(factory, host);
//! registry.observe(ObserveTarget::Element(&element));
//! // ... the detector calls back with batches; handlers receive
//! // `appear` / `disappear` notifications ...
//! registry.destroy();
//! ```
//!
//! # Re-entrancy
//!
//! Each measurement is evaluated with the engine borrowed, then the
//! notification is dispatched with only a shared borrow of the host. A
//! handler may therefore observe further elements while a batch is being
//! delivered.

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::{Ref, RefCell};

use crate::detector::{BatchCallback, Detector, DetectorFactory, DetectorKind};
use crate::dispatch::Notification;
use crate::element::ElementState;
use crate::engine::TransitionEngine;
use crate::host::{ElementHost, fire_policy};
use crate::measurement::Measurement;
use crate::options::ObserverOptions;
use crate::trace::{
    BatchEvent, DetectorCreatedEvent, DetectorDestroyedEvent, NoopSink, ObserveEvent, TraceSink,
    Tracer,
};

/// Something that can be passed to [`Registry::observe`].
#[derive(Debug)]
pub enum ObserveTarget<'a, D, E> {
    /// A document; its root element is observed instead.
    Document(&'a D),
    /// An element.
    Element(&'a E),
}

/// Owns the detector, the transition engine, and the host for one set of
/// observed elements.
pub struct Registry<F, H>
where
    F: DetectorFactory,
    H: ElementHost<Element = F::Element>,
{
    factory: F,
    detector: Option<F::Detector>,
    generation: u32,
    engine: Rc<RefCell<TransitionEngine>>,
    host: Rc<RefCell<H>>,
    sink: Rc<RefCell<dyn TraceSink>>,
}

impl<F, H> core::fmt::Debug for Registry<F, H>
where
    F: DetectorFactory,
    H: ElementHost<Element = F::Element>,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Registry")
            .field("kind", &self.factory.kind())
            .field("has_detector", &self.detector.is_some())
            .field("generation", &self.generation)
            .field("tracked_elements", &self.engine.borrow().len())
            .finish_non_exhaustive()
    }
}

impl<F, H> Registry<F, H>
where
    F: DetectorFactory,
    F::Element: 'static,
    H: ElementHost<Element = F::Element> + 'static,
{
    /// Creates a registry with no detector and no trace sink.
    #[must_use]
    pub fn new(factory: F, host: H) -> Self {
        Self::with_sink(factory, host, Rc::new(RefCell::new(NoopSink)))
    }

    /// Creates a registry that reports to `sink`.
    ///
    /// Events only reach the sink when the `trace` feature is enabled.
    #[must_use]
    pub fn with_sink(factory: F, host: H, sink: Rc<RefCell<dyn TraceSink>>) -> Self {
        Self {
            factory,
            detector: None,
            generation: 0,
            engine: Rc::new(RefCell::new(TransitionEngine::new())),
            host: Rc::new(RefCell::new(host)),
            sink,
        }
    }

    /// Builds a new detector with `options`, replacing the current one.
    ///
    /// The previous detector is disconnected first, so batches from it can
    /// no longer arrive.
    pub fn create(&mut self, options: &ObserverOptions<F::Element>) {
        let replaced = self.disconnect_current();
        self.generation = self.generation.wrapping_add(1);
        let on_batch = self.batch_callback(self.generation);
        let detector = self.factory.create(on_batch, options);
        self.detector = Some(detector);

        let mut sink = self.sink.borrow_mut();
        Tracer::new(&mut *sink).detector_created(&DetectorCreatedEvent {
            generation: self.generation,
            kind: self.factory.kind(),
            threshold_count: u32::try_from(options.threshold.values().len()).unwrap_or(u32::MAX),
            replaced,
        });
    }

    /// Starts observing `target`, creating a default detector if needed.
    ///
    /// The detector is created before the target is resolved. A document is
    /// then replaced by its root element; a document without one is ignored.
    pub fn observe(&mut self, target: ObserveTarget<'_, H::Document, F::Element>) {
        if self.detector.is_none() {
            self.create(&ObserverOptions::default());
        }

        let root;
        let (element, document_substituted) = match target {
            ObserveTarget::Element(element) => (element, false),
            ObserveTarget::Document(document) => {
                root = self.host.borrow().document_element(document);
                match &root {
                    Some(element) => (element, true),
                    None => return,
                }
            }
        };

        if let Some(detector) = &mut self.detector {
            detector.observe(element);
            let mut sink = self.sink.borrow_mut();
            Tracer::new(&mut *sink).observe(&ObserveEvent {
                generation: self.generation,
                document_substituted,
            });
        }
    }

    /// Shorthand for observing an element.
    pub fn observe_element(&mut self, element: &F::Element) {
        self.observe(ObserveTarget::Element(element));
    }

    fn batch_callback(&self, generation: u32) -> BatchCallback<F::Element> {
        let engine = Rc::clone(&self.engine);
        let host = Rc::clone(&self.host);
        let sink = Rc::clone(&self.sink);
        Box::new(move |batch: &[Measurement<F::Element>]| {
            {
                let mut guard = sink.borrow_mut();
                Tracer::new(&mut *guard).batch(&BatchEvent {
                    generation,
                    len: u32::try_from(batch.len()).unwrap_or(u32::MAX),
                });
            }
            for m in batch {
                let (id, policy) = {
                    let mut host = host.borrow_mut();
                    let id = host.element_id(&m.target);
                    (id, fire_policy(&*host, &m.target))
                };
                let transition = {
                    let mut guard = sink.borrow_mut();
                    let mut tracer = Tracer::new(&mut *guard);
                    engine.borrow_mut().evaluate(
                        id,
                        m.y(),
                        m.intersection_ratio,
                        policy,
                        &mut tracer,
                    )
                };
                if let Some(t) = transition {
                    host.borrow().dispatch(&m.target, &Notification::from(t));
                }
            }
        })
    }
}

impl<F, H> Registry<F, H>
where
    F: DetectorFactory,
    H: ElementHost<Element = F::Element>,
{
    /// Disconnects and drops the detector. Does nothing if there is none.
    ///
    /// Element state in the engine is kept, so once-flags stay honoured if
    /// the same elements are observed again.
    pub fn destroy(&mut self) {
        self.disconnect_current();
    }

    /// Returns `true` while a detector exists.
    #[must_use]
    pub fn has_detector(&self) -> bool {
        self.detector.is_some()
    }

    /// The active detector, if any.
    #[must_use]
    pub fn detector(&self) -> Option<&F::Detector> {
        self.detector.as_ref()
    }

    /// Which detector implementation this registry builds.
    #[must_use]
    pub fn detector_kind(&self) -> DetectorKind {
        self.factory.kind()
    }

    /// How many detectors this registry has built so far.
    #[must_use]
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// The transition engine and its per-element state.
    ///
    /// # Panics
    ///
    /// Panics if called from inside a batch evaluation.
    #[must_use]
    pub fn engine(&self) -> Ref<'_, TransitionEngine> {
        self.engine.borrow()
    }

    /// The shared host.
    #[must_use]
    pub fn host(&self) -> &Rc<RefCell<H>> {
        &self.host
    }

    /// Drops the recorded state of `element` and releases its id.
    ///
    /// Meant for elements that have left the document. An element that is
    /// still observed starts over from fresh state on its next measurement.
    /// Returns the dropped state, if there was any.
    ///
    /// # Panics
    ///
    /// Panics if called from inside a batch evaluation.
    pub fn forget(&mut self, element: &F::Element) -> Option<ElementState> {
        let id = self.host.borrow().release(element)?;
        self.engine.borrow_mut().forget(id)
    }

    fn disconnect_current(&mut self) -> bool {
        let Some(mut detector) = self.detector.take() else {
            return false;
        };
        detector.disconnect();
        let mut sink = self.sink.borrow_mut();
        Tracer::new(&mut *sink).detector_destroyed(&DetectorDestroyedEvent {
            generation: self.generation,
        });
        true
    }
}

impl<F, H> Drop for Registry<F, H>
where
    F: DetectorFactory,
    H: ElementHost<Element = F::Element>,
{
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::Dispatch;
    use crate::element::ElementId;
    use crate::engine::{Direction, TransitionKind};
    use alloc::string::{String, ToString};
    use alloc::vec::Vec;
    use kurbo::Rect;

    #[derive(Default)]
    struct MockLog {
        created: u32,
        disconnected: u32,
        observed: Vec<u32>,
        callback: Option<BatchCallback<u32>>,
    }

    struct MockDetector {
        log: Rc<RefCell<MockLog>>,
    }

    impl Detector for MockDetector {
        type Element = u32;

        fn observe(&mut self, element: &u32) {
            self.log.borrow_mut().observed.push(*element);
        }

        fn disconnect(&mut self) {
            let mut log = self.log.borrow_mut();
            log.disconnected += 1;
            log.callback = None;
        }
    }

    struct MockFactory {
        log: Rc<RefCell<MockLog>>,
    }

    impl DetectorFactory for MockFactory {
        type Element = u32;
        type Detector = MockDetector;

        fn kind(&self) -> DetectorKind {
            DetectorKind::Native
        }

        fn create(
            &mut self,
            on_batch: BatchCallback<u32>,
            _options: &ObserverOptions<u32>,
        ) -> MockDetector {
            let mut log = self.log.borrow_mut();
            log.created += 1;
            log.callback = Some(on_batch);
            MockDetector {
                log: Rc::clone(&self.log),
            }
        }
    }

    struct MockDocument {
        root: Option<u32>,
    }

    #[derive(Default)]
    struct MockHost {
        delivered: Rc<RefCell<Vec<(u32, Notification)>>>,
        once: Rc<RefCell<Vec<u32>>>,
    }

    impl Dispatch for MockHost {
        type Element = u32;

        fn dispatch(&self, target: &u32, notification: &Notification) {
            self.delivered.borrow_mut().push((*target, *notification));
        }
    }

    impl ElementHost for MockHost {
        type Document = MockDocument;

        fn element_id(&mut self, element: &u32) -> ElementId {
            ElementId(*element)
        }

        fn release(&self, element: &u32) -> Option<ElementId> {
            Some(ElementId(*element))
        }

        fn attribute(&self, element: &u32, name: &str) -> Option<String> {
            (name == "isonce" && self.once.borrow().contains(element)).then(|| "true".to_string())
        }

        fn document_element(&self, document: &MockDocument) -> Option<u32> {
            document.root
        }
    }

    struct Fixture {
        registry: Registry<MockFactory, MockHost>,
        log: Rc<RefCell<MockLog>>,
        delivered: Rc<RefCell<Vec<(u32, Notification)>>>,
        once: Rc<RefCell<Vec<u32>>>,
    }

    fn fixture() -> Fixture {
        let log = Rc::new(RefCell::new(MockLog::default()));
        let host = MockHost::default();
        let delivered = Rc::clone(&host.delivered);
        let once = Rc::clone(&host.once);
        let registry = Registry::new(
            MockFactory {
                log: Rc::clone(&log),
            },
            host,
        );
        Fixture {
            registry,
            log,
            delivered,
            once,
        }
    }

    /// Plays the host scheduler: hands `batch` to the live detector's callback.
    fn deliver(log: &Rc<RefCell<MockLog>>, batch: &[Measurement<u32>]) {
        let mut callback = log
            .borrow_mut()
            .callback
            .take()
            .expect("no live detector");
        callback(batch);
        log.borrow_mut().callback.get_or_insert(callback);
    }

    fn sample(target: u32, y: f64, ratio: f64) -> Measurement<u32> {
        Measurement::new(target, Rect::new(0.0, y, 10.0, y + 10.0), ratio)
    }

    fn kinds(delivered: &Rc<RefCell<Vec<(u32, Notification)>>>) -> Vec<(u32, TransitionKind)> {
        delivered
            .borrow()
            .iter()
            .map(|(t, n)| (*t, n.kind))
            .collect()
    }

    #[test]
    fn observe_creates_default_detector_lazily() {
        let mut fx = fixture();
        assert!(!fx.registry.has_detector());
        fx.registry.observe_element(&7);
        assert!(fx.registry.has_detector());
        assert_eq!(fx.registry.generation(), 1);
        assert_eq!(fx.log.borrow().created, 1);
        assert_eq!(fx.log.borrow().observed, &[7]);

        fx.registry.observe_element(&8);
        assert_eq!(fx.log.borrow().created, 1);
        assert_eq!(fx.log.borrow().observed, &[7, 8]);
    }

    #[test]
    fn document_is_replaced_by_its_root_element() {
        let mut fx = fixture();
        fx.registry
            .observe(ObserveTarget::Document(&MockDocument { root: Some(1) }));
        assert_eq!(fx.log.borrow().observed, &[1]);
    }

    #[test]
    fn document_without_root_is_ignored() {
        let mut fx = fixture();
        fx.registry
            .observe(ObserveTarget::Document(&MockDocument { root: None }));
        assert!(fx.log.borrow().observed.is_empty());
        // The default detector exists even though nothing was observed.
        assert!(fx.registry.has_detector());
        assert_eq!(fx.log.borrow().created, 1);
    }

    #[test]
    fn destroy_is_idempotent() {
        let mut fx = fixture();
        fx.registry.destroy();
        assert!(!fx.registry.has_detector());

        fx.registry.observe_element(&1);
        fx.registry.destroy();
        fx.registry.destroy();
        assert!(!fx.registry.has_detector());
        assert_eq!(fx.log.borrow().disconnected, 1);
    }

    #[test]
    fn create_disconnects_the_previous_detector() {
        let mut fx = fixture();
        fx.registry.create(&ObserverOptions::default());
        fx.registry.create(&ObserverOptions::default());
        assert_eq!(fx.log.borrow().created, 2);
        assert_eq!(fx.log.borrow().disconnected, 1);
        assert_eq!(fx.registry.generation(), 2);
        assert!(fx.registry.has_detector());
    }

    #[test]
    fn batch_dispatches_transitions_in_order() {
        let mut fx = fixture();
        fx.registry.observe_element(&1);
        fx.registry.observe_element(&2);

        deliver(&fx.log, &[sample(1, 200.0, 0.5), sample(2, 900.0, 0.0)]);
        assert_eq!(kinds(&fx.delivered), &[(1, TransitionKind::Appear)]);
        assert_eq!(fx.delivered.borrow()[0].1.direction, Direction::Down);

        deliver(&fx.log, &[sample(2, 400.0, 0.3), sample(1, 250.0, 0.0)]);
        assert_eq!(
            kinds(&fx.delivered),
            &[
                (1, TransitionKind::Appear),
                (2, TransitionKind::Appear),
                (1, TransitionKind::Disappear),
            ]
        );
        // Element 1 moved down the viewport: 250 > 200.
        assert_eq!(fx.delivered.borrow()[2].1.direction, Direction::Up);

        let engine = fx.registry.engine();
        assert!(engine.state(ElementId(2)).unwrap().appeared());
        assert!(engine.state(ElementId(1)).unwrap().has_disappeared());
    }

    #[test]
    fn once_flag_is_read_fresh_for_every_measurement() {
        let mut fx = fixture();
        fx.registry.observe_element(&3);
        fx.once.borrow_mut().push(3);

        deliver(&fx.log, &[sample(3, 0.0, 0.5)]);
        deliver(&fx.log, &[sample(3, 0.0, 0.0)]);
        deliver(&fx.log, &[sample(3, 0.0, 0.5)]);
        assert_eq!(
            kinds(&fx.delivered),
            &[(3, TransitionKind::Appear), (3, TransitionKind::Disappear)]
        );

        fx.once.borrow_mut().clear();
        deliver(&fx.log, &[sample(3, 0.0, 0.5)]);
        assert_eq!(fx.delivered.borrow().len(), 3);
    }

    #[test]
    fn element_state_survives_destroy() {
        let mut fx = fixture();
        fx.once.borrow_mut().push(4);
        fx.registry.observe_element(&4);
        deliver(&fx.log, &[sample(4, 0.0, 0.5)]);

        fx.registry.destroy();
        fx.registry.observe_element(&4);
        assert_eq!(fx.registry.generation(), 2);

        // Still appeared from before the teardown.
        deliver(&fx.log, &[sample(4, 0.0, 0.5)]);
        deliver(&fx.log, &[sample(4, 0.0, 0.0)]);
        deliver(&fx.log, &[sample(4, 0.0, 0.5)]);
        assert_eq!(
            kinds(&fx.delivered),
            &[(4, TransitionKind::Appear), (4, TransitionKind::Disappear)]
        );
    }

    #[test]
    fn forget_drops_element_state() {
        let mut fx = fixture();
        fx.once.borrow_mut().push(5);
        fx.registry.observe_element(&5);
        fx.registry.observe_element(&6);
        deliver(&fx.log, &[sample(5, 0.0, 0.5), sample(6, 0.0, 0.5)]);
        assert_eq!(fx.registry.engine().len(), 2);

        let dropped = fx.registry.forget(&5).unwrap();
        assert!(dropped.has_appeared());
        assert_eq!(fx.registry.engine().len(), 1);
        assert!(fx.registry.engine().state(ElementId(5)).is_none());
        assert!(fx.registry.forget(&5).is_none());

        // Fresh state: the once element may appear again.
        deliver(&fx.log, &[sample(5, 0.0, 0.0), sample(5, 0.0, 0.5)]);
        assert_eq!(
            kinds(&fx.delivered),
            &[
                (5, TransitionKind::Appear),
                (6, TransitionKind::Appear),
                (5, TransitionKind::Appear),
            ]
        );
    }

    #[test]
    fn drop_disconnects() {
        let fx = fixture();
        let log = Rc::clone(&fx.log);
        let mut registry = fx.registry;
        registry.observe_element(&1);
        drop(registry);
        assert_eq!(log.borrow().disconnected, 1);
    }

    #[cfg(feature = "trace")]
    #[test]
    fn registry_reports_to_sink() {
        use crate::trace::TransitionEvent;

        #[derive(Default)]
        struct Sink {
            created: Vec<DetectorCreatedEvent>,
            observed: Vec<ObserveEvent>,
            batches: Vec<BatchEvent>,
            transitions: Vec<TransitionEvent>,
            destroyed: Vec<DetectorDestroyedEvent>,
        }
        impl TraceSink for Sink {
            fn on_detector_created(&mut self, e: &DetectorCreatedEvent) {
                self.created.push(*e);
            }
            fn on_observe(&mut self, e: &ObserveEvent) {
                self.observed.push(*e);
            }
            fn on_batch(&mut self, e: &BatchEvent) {
                self.batches.push(*e);
            }
            fn on_transition(&mut self, e: &TransitionEvent) {
                self.transitions.push(*e);
            }
            fn on_detector_destroyed(&mut self, e: &DetectorDestroyedEvent) {
                self.destroyed.push(*e);
            }
        }

        let log = Rc::new(RefCell::new(MockLog::default()));
        let sink = Rc::new(RefCell::new(Sink::default()));
        let mut registry = Registry::with_sink(
            MockFactory {
                log: Rc::clone(&log),
            },
            MockHost::default(),
            sink.clone(),
        );
        registry.observe(ObserveTarget::Document(&MockDocument { root: Some(9) }));
        deliver(&log, &[sample(9, 10.0, 1.0)]);
        registry.destroy();

        let sink = sink.borrow();
        assert_eq!(sink.created.len(), 1);
        assert_eq!(sink.created[0].threshold_count, 10);
        assert!(!sink.created[0].replaced);
        assert!(sink.observed[0].document_substituted);
        assert_eq!(
            sink.batches,
            &[BatchEvent {
                generation: 1,
                len: 1
            }]
        );
        assert_eq!(sink.transitions[0].element, ElementId(9));
        assert_eq!(sink.destroyed, &[DetectorDestroyedEvent { generation: 1 }]);
    }
}
