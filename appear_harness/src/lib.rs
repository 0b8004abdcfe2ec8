// Copyright 2026 the Appear Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deterministic simulated page for driving `appear_core` end to end.
//!
//! A [`Scene`] holds a viewport, a vertical scroll offset, and a flat list of
//! elements laid out in document coordinates. It hands out a [`SimFactory`]
//! and a [`SimHost`] for a [`Registry`], and replaces the browser's layout
//! scheduling with an explicit [`flush`](Scene::flush): nothing is measured
//! until the test asks for it.
//!
//! ```rust,ignore
//! let scene = Scene::new(Size::new(100.0, 100.0));
//! let card = scene.add_element(Rect::new(0.0, 150.0, 100.0, 200.0));
//! let mut registry = scene.registry();
//! registry.observe_element(&card);
//! scene.flush();
//! scene.scroll_to(100.0);
//! scene.flush();
//! assert_eq!(scene.take_deliveries().len(), 1);
//! ```

#![no_std]

extern crate alloc;

use alloc::rc::{Rc, Weak};
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;

use appear_core::detector::{BatchCallback, Detector, DetectorFactory, DetectorKind};
use appear_core::dispatch::{Dispatch, Notification};
use appear_core::element::ElementId;
use appear_core::fallback::{FallbackDetector, GeometrySource};
use appear_core::host::ElementHost;
use appear_core::options::ObserverOptions;
use appear_core::registry::Registry;
use kurbo::{Rect, Size, Vec2};

/// Handle to an element of a [`Scene`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SimNode(pub u32);

impl SimNode {
    /// The document's root element. Its bounds cover the viewport and every
    /// other element.
    pub const ROOT: Self = Self(0);
}

/// The scene's document. Its root element is [`SimNode::ROOT`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SimDocument;

/// A notification recorded by [`SimHost`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Delivery {
    /// The element the notification was dispatched to.
    pub target: SimNode,
    /// What was dispatched.
    pub notification: Notification,
}

/// A [`Registry`] wired to a [`Scene`].
pub type SimRegistry = Registry<SimFactory, SimHost>;

#[derive(Clone, Debug)]
struct NodeData {
    rect: Rect,
    attributes: Vec<(String, String)>,
    rendered: bool,
}

#[derive(Debug)]
struct Page {
    viewport: Size,
    scroll: Vec2,
    nodes: Vec<NodeData>,
}

impl Page {
    fn node(&self, node: SimNode) -> Option<&NodeData> {
        usize::try_from(node.0)
            .ok()
            .and_then(|index| self.nodes.get(index))
    }

    fn node_mut(&mut self, node: SimNode) -> Option<&mut NodeData> {
        usize::try_from(node.0)
            .ok()
            .and_then(|index| self.nodes.get_mut(index))
    }

    fn viewport_rect(&self) -> Rect {
        Rect::from_origin_size((0.0, 0.0), self.viewport)
    }

    /// Document-space bounds of the root element.
    fn document_rect(&self) -> Rect {
        self.nodes
            .iter()
            .skip(1)
            .fold(self.viewport_rect(), |acc, n| acc.union(n.rect))
    }

    /// Viewport-space bounds of a rendered element.
    fn client_rect(&self, node: SimNode) -> Option<Rect> {
        let data = self.node(node)?;
        if !data.rendered {
            return None;
        }
        let rect = if node == SimNode::ROOT {
            self.document_rect()
        } else {
            data.rect
        };
        Some(rect - self.scroll)
    }
}

/// Geometry as seen by one detector.
struct View<'a> {
    page: &'a Page,
    root: Option<SimNode>,
}

impl GeometrySource<SimNode> for View<'_> {
    fn root_bounds(&self) -> Rect {
        match self.root {
            Some(root) => self.page.client_rect(root).unwrap_or(Rect::ZERO),
            None => self.page.viewport_rect(),
        }
    }

    fn target_bounds(&self, target: &SimNode) -> Option<Rect> {
        self.page.client_rect(*target)
    }
}

struct Live {
    detector: RefCell<FallbackDetector<SimNode>>,
    on_batch: RefCell<BatchCallback<SimNode>>,
    root: Option<SimNode>,
}

type LiveList = Rc<RefCell<Vec<Weak<Live>>>>;

// ---------------------------------------------------------------------------
// Scene
// ---------------------------------------------------------------------------

/// A simulated page with an explicit layout flush.
#[derive(Debug)]
pub struct Scene {
    page: Rc<RefCell<Page>>,
    live: LiveList,
    log: Rc<RefCell<Vec<Delivery>>>,
}

impl Scene {
    /// Creates a page with the given viewport, scrolled to the top, holding
    /// only the root element.
    #[must_use]
    pub fn new(viewport: Size) -> Self {
        let root = NodeData {
            rect: Rect::from_origin_size((0.0, 0.0), viewport),
            attributes: Vec::new(),
            rendered: true,
        };
        Self {
            page: Rc::new(RefCell::new(Page {
                viewport,
                scroll: Vec2::ZERO,
                nodes: alloc::vec![root],
            })),
            live: Rc::new(RefCell::new(Vec::new())),
            log: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Adds an element at `rect`, in document coordinates.
    pub fn add_element(&self, rect: Rect) -> SimNode {
        let mut page = self.page.borrow_mut();
        let id = u32::try_from(page.nodes.len()).unwrap_or(u32::MAX);
        page.nodes.push(NodeData {
            rect,
            attributes: Vec::new(),
            rendered: true,
        });
        SimNode(id)
    }

    /// Moves an element to `rect`, in document coordinates.
    pub fn move_element(&self, node: SimNode, rect: Rect) {
        if let Some(data) = self.page.borrow_mut().node_mut(node) {
            data.rect = rect;
        }
    }

    /// Shows or hides an element. Hidden elements have no bounds.
    pub fn set_rendered(&self, node: SimNode, rendered: bool) {
        if let Some(data) = self.page.borrow_mut().node_mut(node) {
            data.rendered = rendered;
        }
    }

    /// Sets an attribute, replacing any previous value.
    pub fn set_attribute(&self, node: SimNode, name: &str, value: &str) {
        let mut page = self.page.borrow_mut();
        let Some(data) = page.node_mut(node) else {
            return;
        };
        match data.attributes.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value.into(),
            None => data.attributes.push((name.into(), value.into())),
        }
    }

    /// Removes an attribute.
    pub fn remove_attribute(&self, node: SimNode, name: &str) {
        if let Some(data) = self.page.borrow_mut().node_mut(node) {
            data.attributes.retain(|(n, _)| n != name);
        }
    }

    /// Scrolls so that document `y` is at the top of the viewport.
    pub fn scroll_to(&self, y: f64) {
        self.page.borrow_mut().scroll.y = y;
    }

    /// Scrolls by `dy`. Positive values scroll down.
    pub fn scroll_by(&self, dy: f64) {
        self.page.borrow_mut().scroll.y += dy;
    }

    /// Current vertical scroll offset.
    #[must_use]
    pub fn scroll_y(&self) -> f64 {
        self.page.borrow().scroll.y
    }

    /// The scene's document.
    #[must_use]
    pub fn document(&self) -> SimDocument {
        SimDocument
    }

    /// A factory whose detectors measure this scene.
    #[must_use]
    pub fn factory(&self) -> SimFactory {
        SimFactory {
            live: Rc::clone(&self.live),
        }
    }

    /// A host that reads this scene's attributes and records deliveries.
    #[must_use]
    pub fn host(&self) -> SimHost {
        SimHost {
            page: Rc::clone(&self.page),
            log: Rc::clone(&self.log),
        }
    }

    /// A registry with this scene's factory and host.
    #[must_use]
    pub fn registry(&self) -> SimRegistry {
        Registry::new(self.factory(), self.host())
    }

    /// Number of detectors that are still alive.
    #[must_use]
    pub fn live_detectors(&self) -> usize {
        let mut live = self.live.borrow_mut();
        live.retain(|w| w.strong_count() > 0);
        live.len()
    }

    /// Runs one layout pass: every live detector measures its targets and
    /// delivers a batch if anything is worth reporting.
    ///
    /// Returns the total number of measurements delivered.
    pub fn flush(&self) -> usize {
        let live: Vec<Rc<Live>> = {
            let mut live = self.live.borrow_mut();
            live.retain(|w| w.strong_count() > 0);
            live.iter().filter_map(Weak::upgrade).collect()
        };

        let mut delivered = 0;
        for detector in live {
            let batch = {
                let page = self.page.borrow();
                let view = View {
                    page: &page,
                    root: detector.root,
                };
                detector.detector.borrow_mut().check(&view)
            };
            if batch.is_empty() {
                continue;
            }
            delivered += batch.len();
            let mut on_batch = detector.on_batch.borrow_mut();
            (*on_batch)(&batch);
        }
        delivered
    }

    /// Notifications delivered so far.
    #[must_use]
    pub fn deliveries(&self) -> Vec<Delivery> {
        self.log.borrow().clone()
    }

    /// Drains the delivered notifications.
    pub fn take_deliveries(&self) -> Vec<Delivery> {
        core::mem::take(&mut *self.log.borrow_mut())
    }
}

// ---------------------------------------------------------------------------
// Factory and detector
// ---------------------------------------------------------------------------

/// Builds [`SimDetector`]s that measure a [`Scene`] on [`Scene::flush`].
#[derive(Debug)]
pub struct SimFactory {
    live: LiveList,
}

impl DetectorFactory for SimFactory {
    type Element = SimNode;
    type Detector = SimDetector;

    fn kind(&self) -> DetectorKind {
        DetectorKind::Fallback
    }

    fn create(
        &mut self,
        on_batch: BatchCallback<SimNode>,
        options: &ObserverOptions<SimNode>,
    ) -> SimDetector {
        let live = Rc::new(Live {
            detector: RefCell::new(FallbackDetector::new(options)),
            on_batch: RefCell::new(on_batch),
            root: options.root,
        });
        self.live.borrow_mut().push(Rc::downgrade(&live));
        SimDetector { live }
    }
}

/// A [`FallbackDetector`] registered with a [`Scene`].
///
/// Dropping it unregisters it from the scene.
pub struct SimDetector {
    live: Rc<Live>,
}

impl SimDetector {
    /// Number of observed targets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.live.detector.borrow().len()
    }

    /// Returns `true` if nothing is observed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live.detector.borrow().is_empty()
    }
}

impl core::fmt::Debug for SimDetector {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SimDetector")
            .field("targets", &self.len())
            .field("root", &self.live.root)
            .finish_non_exhaustive()
    }
}

impl Detector for SimDetector {
    type Element = SimNode;

    fn observe(&mut self, element: &SimNode) {
        self.live.detector.borrow_mut().observe(element);
    }

    fn disconnect(&mut self) {
        self.live.detector.borrow_mut().disconnect();
    }
}

// ---------------------------------------------------------------------------
// Host
// ---------------------------------------------------------------------------

/// Element host backed by a [`Scene`].
#[derive(Debug)]
pub struct SimHost {
    page: Rc<RefCell<Page>>,
    log: Rc<RefCell<Vec<Delivery>>>,
}

impl Dispatch for SimHost {
    type Element = SimNode;

    fn dispatch(&self, target: &SimNode, notification: &Notification) {
        self.log.borrow_mut().push(Delivery {
            target: *target,
            notification: *notification,
        });
    }
}

impl ElementHost for SimHost {
    type Document = SimDocument;

    fn element_id(&mut self, element: &SimNode) -> ElementId {
        ElementId(element.0)
    }

    fn release(&self, element: &SimNode) -> Option<ElementId> {
        Some(ElementId(element.0))
    }

    fn attribute(&self, element: &SimNode, name: &str) -> Option<String> {
        let page = self.page.borrow();
        page.node(*element)?
            .attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }

    fn document_element(&self, _document: &SimDocument) -> Option<SimNode> {
        Some(SimNode::ROOT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use appear_core::engine::{Direction, TransitionKind};
    use appear_core::registry::ObserveTarget;

    fn scene() -> Scene {
        Scene::new(Size::new(100.0, 100.0))
    }

    fn summary(deliveries: &[Delivery]) -> Vec<(SimNode, TransitionKind, Direction)> {
        deliveries
            .iter()
            .map(|d| (d.target, d.notification.kind, d.notification.direction))
            .collect()
    }

    #[test]
    fn scrolling_reveals_and_hides_with_direction() {
        let scene = scene();
        let card = scene.add_element(Rect::new(0.0, 150.0, 100.0, 200.0));
        let mut registry = scene.registry();
        registry.observe_element(&card);

        // Below the fold: reported, but nothing appears.
        assert_eq!(scene.flush(), 1);
        assert!(scene.deliveries().is_empty());

        scene.scroll_to(100.0);
        scene.flush();
        scene.scroll_to(300.0);
        scene.flush();
        scene.scroll_to(100.0);
        scene.flush();

        assert_eq!(
            summary(&scene.take_deliveries()),
            vec![
                (card, TransitionKind::Appear, Direction::Down),
                (card, TransitionKind::Disappear, Direction::Down),
                (card, TransitionKind::Appear, Direction::Up),
            ]
        );
    }

    #[test]
    fn once_element_fires_each_transition_once() {
        let scene = scene();
        let card = scene.add_element(Rect::new(0.0, 150.0, 100.0, 200.0));
        scene.set_attribute(card, "data-once", "true");
        let mut registry = scene.registry();
        registry.observe_element(&card);
        scene.flush();

        for y in [100.0, 300.0, 100.0, 300.0] {
            scene.scroll_to(y);
            scene.flush();
        }

        // Each transition type fires once: the first disappear still counts.
        assert_eq!(
            summary(&scene.deliveries()),
            vec![
                (card, TransitionKind::Appear, Direction::Down),
                (card, TransitionKind::Disappear, Direction::Down),
            ]
        );
        let id = ElementId(card.0);
        let state = registry.engine().state(id).copied().unwrap();
        assert!(!state.appeared());
        assert!(state.has_disappeared());
    }

    #[test]
    fn false_once_flag_repeats() {
        let scene = scene();
        let card = scene.add_element(Rect::new(0.0, 150.0, 100.0, 200.0));
        scene.set_attribute(card, "isonce", "false");
        let mut registry = scene.registry();
        registry.observe_element(&card);
        scene.flush();

        for y in [100.0, 300.0, 100.0] {
            scene.scroll_to(y);
            scene.flush();
        }
        assert_eq!(scene.deliveries().len(), 3);
    }

    #[test]
    fn once_flag_changes_take_effect_on_the_next_batch() {
        let scene = scene();
        let card = scene.add_element(Rect::new(0.0, 150.0, 100.0, 200.0));
        let mut registry = scene.registry();
        registry.observe_element(&card);
        scene.flush();

        scene.scroll_to(100.0);
        scene.flush();

        scene.set_attribute(card, "isonce", "true");
        scene.scroll_to(300.0);
        scene.flush();

        scene.remove_attribute(card, "isonce");
        scene.scroll_to(100.0);
        scene.flush();
        scene.scroll_to(300.0);
        scene.flush();

        assert_eq!(
            summary(&scene.deliveries()),
            vec![
                (card, TransitionKind::Appear, Direction::Down),
                (card, TransitionKind::Disappear, Direction::Down),
                (card, TransitionKind::Appear, Direction::Up),
                (card, TransitionKind::Disappear, Direction::Down),
            ]
        );
    }

    #[test]
    fn once_flag_added_after_both_transitions_suppresses_them() {
        let scene = scene();
        let card = scene.add_element(Rect::new(0.0, 150.0, 100.0, 200.0));
        let mut registry = scene.registry();
        registry.observe_element(&card);
        scene.flush();

        scene.scroll_to(100.0);
        scene.flush();
        scene.scroll_to(300.0);
        scene.flush();

        scene.set_attribute(card, "isonce", "true");
        scene.scroll_to(100.0);
        scene.flush();
        scene.scroll_to(300.0);
        scene.flush();

        assert_eq!(scene.deliveries().len(), 2);
    }

    #[test]
    fn gradual_scroll_yields_a_single_appear() {
        let scene = scene();
        let tall = scene.add_element(Rect::new(0.0, 150.0, 100.0, 350.0));
        let mut registry = scene.registry();
        registry.observe_element(&tall);

        let mut measured = scene.flush();
        for step in 1..=20 {
            scene.scroll_to(f64::from(step) * 10.0);
            measured += scene.flush();
        }

        assert!(measured >= 3, "expected several crossings, got {measured}");
        assert_eq!(
            summary(&scene.deliveries()),
            vec![(tall, TransitionKind::Appear, Direction::Down)]
        );
    }

    #[test]
    fn observing_the_document_observes_its_root() {
        let scene = scene();
        let mut registry = scene.registry();
        registry.observe(ObserveTarget::Document(&scene.document()));
        scene.flush();

        assert_eq!(
            summary(&scene.deliveries()),
            vec![(SimNode::ROOT, TransitionKind::Appear, Direction::Down)]
        );
    }

    #[test]
    fn destroy_stops_delivery() {
        let scene = scene();
        let card = scene.add_element(Rect::new(0.0, 150.0, 100.0, 200.0));
        let mut registry = scene.registry();
        registry.observe_element(&card);
        scene.flush();
        assert_eq!(scene.live_detectors(), 1);

        registry.destroy();
        assert_eq!(scene.live_detectors(), 0);
        scene.scroll_to(100.0);
        assert_eq!(scene.flush(), 0);
        assert!(scene.deliveries().is_empty());
    }

    #[test]
    fn recreating_replaces_the_measuring_detector() {
        let scene = scene();
        let card = scene.add_element(Rect::new(0.0, 150.0, 100.0, 200.0));
        let mut registry = scene.registry();
        registry.observe_element(&card);
        scene.flush();

        registry.create(&ObserverOptions::default());
        assert_eq!(scene.live_detectors(), 1);
        registry.observe_element(&card);
        scene.scroll_to(100.0);
        scene.flush();

        // One appear, not one per detector ever built.
        assert_eq!(scene.deliveries().len(), 1);
        assert_eq!(registry.generation(), 2);
    }

    #[test]
    fn root_margin_extends_the_viewport() {
        let scene = scene();
        let card = scene.add_element(Rect::new(0.0, 150.0, 100.0, 200.0));
        let mut registry = scene.registry();
        registry.create(&ObserverOptions::new(None, "60px 0px", [0.0, 0.5]).unwrap());
        registry.observe_element(&card);
        scene.flush();

        // 150..160 of 150..200 falls inside the grown root.
        assert_eq!(
            summary(&scene.deliveries()),
            vec![(card, TransitionKind::Appear, Direction::Down)]
        );
    }

    #[test]
    fn custom_root_element_bounds_detection() {
        let scene = scene();
        let pane = scene.add_element(Rect::new(0.0, 0.0, 100.0, 50.0));
        let card = scene.add_element(Rect::new(0.0, 60.0, 100.0, 80.0));
        let mut registry = scene.registry();
        registry.create(&ObserverOptions {
            root: Some(pane),
            ..ObserverOptions::default()
        });
        registry.observe_element(&card);
        scene.flush();
        assert!(scene.deliveries().is_empty());

        scene.move_element(card, Rect::new(0.0, 20.0, 100.0, 40.0));
        scene.flush();
        assert_eq!(
            summary(&scene.deliveries()),
            vec![(card, TransitionKind::Appear, Direction::Down)]
        );
    }

    #[test]
    fn hiding_an_element_makes_it_disappear() {
        let scene = scene();
        let card = scene.add_element(Rect::new(0.0, 10.0, 100.0, 60.0));
        let mut registry = scene.registry();
        registry.observe_element(&card);
        scene.flush();

        scene.set_rendered(card, false);
        scene.flush();

        assert_eq!(
            summary(&scene.deliveries()),
            vec![
                (card, TransitionKind::Appear, Direction::Down),
                (card, TransitionKind::Disappear, Direction::Down),
            ]
        );
    }

    #[test]
    fn reshown_element_appears_without_direction_bias() {
        let scene = scene();
        let card = scene.add_element(Rect::new(0.0, 10.0, 100.0, 60.0));
        let mut registry = scene.registry();
        registry.observe_element(&card);
        scene.flush();

        scene.set_rendered(card, false);
        scene.flush();
        scene.set_rendered(card, true);
        scene.flush();

        // The hidden sample sits at y = 0, which carries no position.
        assert_eq!(
            summary(&scene.deliveries()),
            vec![
                (card, TransitionKind::Appear, Direction::Down),
                (card, TransitionKind::Disappear, Direction::Down),
                (card, TransitionKind::Appear, Direction::Down),
            ]
        );
    }

    #[test]
    fn forgetting_a_removed_element_drops_its_state() {
        let scene = scene();
        let card = scene.add_element(Rect::new(0.0, 10.0, 100.0, 60.0));
        scene.set_attribute(card, "data-once", "true");
        let mut registry = scene.registry();
        registry.observe_element(&card);
        scene.flush();
        assert_eq!(registry.engine().len(), 1);

        scene.set_rendered(card, false);
        scene.flush();
        registry.destroy();
        assert!(registry.forget(&card).is_some());
        assert!(registry.engine().is_empty());

        // Re-inserted with fresh state, so the once element appears again.
        scene.set_rendered(card, true);
        registry.observe_element(&card);
        scene.flush();
        assert_eq!(scene.deliveries().len(), 3);
    }

    #[test]
    fn several_elements_are_tracked_independently() {
        let scene = scene();
        let a = scene.add_element(Rect::new(0.0, 20.0, 100.0, 40.0));
        let b = scene.add_element(Rect::new(0.0, 120.0, 100.0, 140.0));
        let mut registry = scene.registry();
        registry.observe_element(&a);
        registry.observe_element(&b);
        scene.flush();

        scene.scroll_to(60.0);
        scene.flush();

        assert_eq!(
            summary(&scene.deliveries()),
            vec![
                (a, TransitionKind::Appear, Direction::Down),
                (a, TransitionKind::Disappear, Direction::Down),
                (b, TransitionKind::Appear, Direction::Down),
            ]
        );
        assert_eq!(registry.engine().len(), 2);
    }
}
