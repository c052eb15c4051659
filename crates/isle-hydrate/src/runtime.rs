//! Lazy, visibility-driven island mounting.
//!
//! Every island element walks a small state machine:
//!
//! ```text
//! Connected --decode ok--> Armed --first intersection--> Mounting --> Mounted
//!     |                                                     |
//!     +--decode error--> Failed <--load/reconstruct/mount---+
//! ```
//!
//! Mounting happens at most once per element. Observation stops as soon as
//! mounting begins, or when the element leaves the document first. A failed
//! island keeps its server-rendered markup.
//!
//! Module loads are detached from the runtime: [`HydrationRuntime::load`]
//! returns a future that does not borrow it, so intersections for other
//! islands keep being delivered while a load is in flight.
//! [`HydrationRuntime::complete`] applies the result once it arrives.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::{join_all, BoxFuture, FutureExt};
use isle_core::IslandsConfig;
use isle_render::{decode_props, ResolvedProps};
use tracing::{debug, info, warn};

use crate::dom::{Dom, NodeId};
use crate::error::{HydrationError, HydrationResult};
use crate::reconstruct::{reconstruct, DecodeOptions, VTree};
use crate::registry::ElementRegistry;

/// Lifecycle state of one island element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IslandState {
    Connected,
    Armed,
    Mounting,
    Mounted,
    Failed,
}

impl IslandState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Mounted | Self::Failed)
    }

    fn can_advance_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Connected, Self::Armed)
                | (Self::Armed, Self::Mounting)
                | (Self::Mounting, Self::Mounted)
                | (Self::Connected, Self::Failed)
                | (Self::Mounting, Self::Failed)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::Armed => "armed",
            Self::Mounting => "mounting",
            Self::Mounted => "mounted",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for IslandState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runtime bookkeeping for one connected island element.
#[derive(Debug, Clone)]
pub struct HydrationRecord {
    pub element: NodeId,
    pub tag: String,
    /// Decoded initial props.
    pub props: ResolvedProps,
    pub mounted: bool,
    state: IslandState,
    history: Vec<IslandState>,
}

impl HydrationRecord {
    fn new(element: NodeId, tag: String) -> Self {
        Self {
            element,
            tag,
            props: ResolvedProps::new(),
            mounted: false,
            state: IslandState::Connected,
            history: vec![IslandState::Connected],
        }
    }

    pub fn state(&self) -> IslandState {
        self.state
    }

    /// Every state this record has been in, oldest first.
    pub fn history(&self) -> &[IslandState] {
        &self.history
    }

    fn advance(&mut self, next: IslandState) -> bool {
        if !self.state.can_advance_to(next) {
            return false;
        }
        self.state = next;
        self.history.push(next);
        if next == IslandState::Mounted {
            self.mounted = true;
        }
        true
    }
}

/// One visibility notification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntersectionEntry {
    pub target: NodeId,
    /// Visible fraction of the target, `0.0..=1.0`.
    pub intersection_ratio: f64,
}

impl IntersectionEntry {
    pub fn new(target: NodeId, intersection_ratio: f64) -> Self {
        Self {
            target,
            intersection_ratio,
        }
    }

    pub fn is_intersecting(&self, threshold: f64) -> bool {
        self.intersection_ratio > 0.0 && self.intersection_ratio >= threshold
    }
}

/// An island that entered `Mounting` and waits for its module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingMount {
    pub element: NodeId,
    pub tag: String,
}

/// Source of viewport visibility.
pub trait ViewportObserver: Send {
    fn observe(&mut self, target: NodeId, threshold: f64);
    fn unobserve(&mut self, target: NodeId);
}

/// A loaded island client module.
pub trait IslandModule: Send + Sync {
    /// Make `container` interactive. `tree` is the server markup decoded
    /// before the container was cleared.
    fn mount(&self, dom: &mut Dom, container: NodeId, tree: &VTree) -> HydrationResult<()>;
}

/// Lazily loads island client modules by tag.
#[async_trait]
pub trait ModuleLoader: Send + Sync {
    async fn load(&self, tag: &str) -> HydrationResult<Arc<dyn IslandModule>>;
}

/// Runtime settings.
#[derive(Debug, Clone, PartialEq)]
pub struct HydrationOptions {
    pub tag_prefix: String,
    pub props_attribute: String,
    /// Intersection ratio that triggers mounting.
    pub threshold: f64,
}

impl HydrationOptions {
    pub fn from_config(config: &IslandsConfig) -> Self {
        Self {
            tag_prefix: config.tag_prefix.clone(),
            props_attribute: config.props_attribute.clone(),
            threshold: config.threshold,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    fn decode_options(&self) -> DecodeOptions {
        DecodeOptions {
            tag_prefix: self.tag_prefix.clone(),
            props_attribute: self.props_attribute.clone(),
        }
    }
}

impl Default for HydrationOptions {
    fn default() -> Self {
        Self::from_config(&IslandsConfig::default())
    }
}

/// Drives island elements of one document from server markup to mounted.
pub struct HydrationRuntime<O, L> {
    dom: Dom,
    options: HydrationOptions,
    registry: ElementRegistry,
    observer: O,
    loader: Arc<L>,
    records: BTreeMap<NodeId, HydrationRecord>,
}

impl<O: ViewportObserver, L: ModuleLoader + 'static> HydrationRuntime<O, L> {
    pub fn new(dom: Dom, options: HydrationOptions, observer: O, loader: L) -> Self {
        Self {
            dom,
            options,
            registry: ElementRegistry::new(),
            observer,
            loader: Arc::new(loader),
            records: BTreeMap::new(),
        }
    }

    pub fn dom(&self) -> &Dom {
        &self.dom
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    pub fn registry(&self) -> &ElementRegistry {
        &self.registry
    }

    pub fn options(&self) -> &HydrationOptions {
        &self.options
    }

    pub fn record(&self, element: NodeId) -> Option<&HydrationRecord> {
        self.records.get(&element)
    }

    pub fn state(&self, element: NodeId) -> Option<IslandState> {
        self.records.get(&element).map(HydrationRecord::state)
    }

    pub fn records(&self) -> impl Iterator<Item = &HydrationRecord> {
        self.records.values()
    }

    /// Define an island tag and connect every element already carrying it.
    /// Returns `false` if the tag was defined before.
    pub fn define(&mut self, tag: &str) -> bool {
        if !self.registry.define(tag) {
            return false;
        }
        let tag = tag.to_ascii_lowercase();
        for element in self.dom.find_elements(|t| t == tag) {
            self.connected(element);
        }
        true
    }

    /// Define every island tag present in the document.
    pub fn define_all(&mut self) -> usize {
        let decode = self.options.decode_options();
        let mut seen = HashSet::new();
        let tags: Vec<String> = self
            .dom
            .find_elements(|t| decode.is_island_tag(t))
            .into_iter()
            .filter_map(|id| self.dom.tag(id).map(str::to_string))
            .filter(|tag| seen.insert(tag.clone()))
            .collect();

        let defined = tags.iter().filter(|tag| self.define(tag)).count();
        info!(islands = self.records.len(), tags = defined, "Island elements defined");
        defined
    }

    /// Connect an element of a defined tag: decode its props and start
    /// observing it. Connecting twice is a no-op.
    pub fn connected(&mut self, element: NodeId) -> Option<IslandState> {
        let tag = self.dom.tag(element)?.to_string();
        if !self.registry.is_defined(&tag) || !self.dom.is_connected(element) {
            return None;
        }
        if let Some(record) = self.records.get(&element) {
            return Some(record.state());
        }

        let mut record = HydrationRecord::new(element, tag.clone());
        let payload = self
            .dom
            .attr(element, &self.options.props_attribute)
            .unwrap_or("");
        match decode_props(payload) {
            Ok(props) => {
                record.props = props;
                self.observer.observe(element, self.options.threshold);
                record.advance(IslandState::Armed);
                debug!(tag = %tag, element = %element, "Island armed");
            }
            Err(source) => {
                let err = HydrationError::Decode { tag, source };
                warn!(element = %element, error = %err, "Island left static");
                record.advance(IslandState::Failed);
            }
        }

        let state = record.state();
        self.records.insert(element, record);
        Some(state)
    }

    /// Forget an element that left the document.
    pub fn disconnected(&mut self, element: NodeId) -> bool {
        let Some(record) = self.records.remove(&element) else {
            return false;
        };
        if record.state() == IslandState::Armed {
            self.observer.unobserve(element);
        }
        debug!(tag = %record.tag, element = %element, state = %record.state(), "Island disconnected");
        true
    }

    /// Remove an element from the document, disconnecting every island
    /// inside it.
    pub fn remove_element(&mut self, element: NodeId) {
        self.dom.detach(element);
        self.sweep();
    }

    fn sweep(&mut self) {
        let gone: Vec<NodeId> = self
            .records
            .keys()
            .copied()
            .filter(|id| !self.dom.is_connected(*id))
            .collect();
        for element in gone {
            self.disconnected(element);
        }
    }

    /// Handle an observer callback. Armed targets that became visible move
    /// to `Mounting` and stop being observed. Each returned mount is driven
    /// by [`HydrationRuntime::load`] and [`HydrationRuntime::complete`].
    pub fn handle_intersections(&mut self, entries: &[IntersectionEntry]) -> Vec<PendingMount> {
        let mut ready = Vec::new();
        for entry in entries {
            if !entry.is_intersecting(self.options.threshold) {
                continue;
            }
            let Some(record) = self.records.get_mut(&entry.target) else {
                continue;
            };
            if record.advance(IslandState::Mounting) {
                self.observer.unobserve(entry.target);
                ready.push(PendingMount {
                    element: entry.target,
                    tag: record.tag.clone(),
                });
            }
        }
        ready
    }

    /// Start loading the module of a pending mount. The future owns what it
    /// needs, so the runtime stays usable until it resolves.
    pub fn load(
        &self,
        pending: &PendingMount,
    ) -> BoxFuture<'static, HydrationResult<Arc<dyn IslandModule>>> {
        let loader = Arc::clone(&self.loader);
        let tag = pending.tag.clone();
        async move { loader.load(&tag).await }.boxed()
    }

    /// Apply a finished load to an island in `Mounting`. Results for
    /// elements that left the document or were never pending are dropped.
    pub fn complete(
        &mut self,
        element: NodeId,
        module: HydrationResult<Arc<dyn IslandModule>>,
    ) -> Option<IslandState> {
        let record = self.records.get(&element)?;
        if record.state() != IslandState::Mounting {
            debug!(element = %element, state = %record.state(), "Dropping stale module load");
            return Some(record.state());
        }
        let tag = record.tag.clone();

        let next = match module.and_then(|module| self.mount_one(element, module.as_ref())) {
            Ok(()) => {
                info!(tag = %tag, element = %element, "Island mounted");
                IslandState::Mounted
            }
            Err(err) => {
                warn!(element = %element, error = %err, "Island left static");
                IslandState::Failed
            }
        };
        if let Some(record) = self.records.get_mut(&element) {
            record.advance(next);
        }

        self.sweep();
        self.state(element)
    }

    /// Handle an observer callback, then load and mount every island it
    /// made ready. Loads run concurrently. Returns the number mounted.
    pub async fn on_intersection(&mut self, entries: &[IntersectionEntry]) -> usize {
        let ready = self.handle_intersections(entries);
        if ready.is_empty() {
            return 0;
        }

        let modules = join_all(ready.iter().map(|pending| self.load(pending))).await;
        let mut mounted = 0;
        for (pending, module) in ready.into_iter().zip(modules) {
            if self.complete(pending.element, module) == Some(IslandState::Mounted) {
                mounted += 1;
            }
        }
        mounted
    }

    fn mount_one(&mut self, element: NodeId, module: &dyn IslandModule) -> HydrationResult<()> {
        let props = self
            .records
            .get(&element)
            .map(|r| r.props.clone())
            .unwrap_or_default();
        let tree = reconstruct(&self.dom, element, props, &self.options.decode_options())?;

        let scripts: Vec<(NodeId, NodeId, usize)> = tree
            .scripts
            .iter()
            .filter_map(|s| Some((*s, self.dom.parent(*s)?, self.dom.index_in_parent(*s)?)))
            .collect();

        let original = self.dom.clear_children(element);
        for (script, _, _) in &scripts {
            self.dom.append_child(element, *script);
        }

        if let Err(err) = module.mount(&mut self.dom, element, &tree) {
            self.dom.clear_children(element);
            for child in original {
                self.dom.append_child(element, child);
            }
            for (script, parent, index) in scripts {
                self.dom.insert_child(parent, index, script);
            }
            return Err(err);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tokio::sync::Notify;

    #[derive(Default)]
    struct RecordingObserver {
        observed: Vec<(NodeId, f64)>,
        unobserved: Vec<NodeId>,
    }

    impl ViewportObserver for RecordingObserver {
        fn observe(&mut self, target: NodeId, threshold: f64) {
            self.observed.push((target, threshold));
        }

        fn unobserve(&mut self, target: NodeId) {
            self.unobserved.push(target);
        }
    }

    #[derive(Default)]
    struct TestLoader {
        modules: HashMap<String, Arc<dyn IslandModule>>,
        gates: HashMap<String, Arc<Notify>>,
        calls: Mutex<Vec<String>>,
    }

    impl TestLoader {
        fn with(mut self, tag: &str, module: impl IslandModule + 'static) -> Self {
            self.modules.insert(tag.to_string(), Arc::new(module));
            self
        }

        /// Loads of `tag` wait until the returned gate is notified.
        fn gated(mut self, tag: &str) -> (Self, Arc<Notify>) {
            let gate = Arc::new(Notify::new());
            self.gates.insert(tag.to_string(), Arc::clone(&gate));
            (self, gate)
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ModuleLoader for TestLoader {
        async fn load(&self, tag: &str) -> HydrationResult<Arc<dyn IslandModule>> {
            self.calls.lock().unwrap().push(tag.to_string());
            if let Some(gate) = self.gates.get(tag) {
                gate.notified().await;
            }
            tokio::task::yield_now().await;
            self.modules
                .get(tag)
                .cloned()
                .ok_or_else(|| HydrationError::Load {
                    tag: tag.to_string(),
                    message: "module not found".into(),
                })
        }
    }

    struct Counter;

    impl IslandModule for Counter {
        fn mount(&self, dom: &mut Dom, container: NodeId, tree: &VTree) -> HydrationResult<()> {
            let count = tree
                .props()
                .and_then(|p| p.get("count"))
                .and_then(|v| v.as_i64())
                .unwrap_or(0);
            let button = dom.create_element("button", &[("data-live", "true")]);
            let text = dom.create_text(&count.to_string());
            dom.append_child(button, text);
            dom.append_child(container, button);
            Ok(())
        }
    }

    struct Broken;

    impl IslandModule for Broken {
        fn mount(&self, dom: &mut Dom, container: NodeId, _tree: &VTree) -> HydrationResult<()> {
            let partial = dom.create_text("half");
            dom.append_child(container, partial);
            Err(HydrationError::Mount {
                tag: "island-broken-1".into(),
                message: "boom".into(),
            })
        }
    }

    const COUNTER: &str = "island-counter-1a2b3c4d";
    const OTHER: &str = "island-counter-5e6f7a8b";

    fn page(body: &str) -> String {
        format!("<html><body><main>{}</main></body></html>", body)
    }

    fn counter_html(tag: &str, props: &str, inner: &str) -> String {
        format!(r#"<{tag} data-props="{props}">{inner}</{tag}>"#)
    }

    fn runtime(html: &str, loader: TestLoader) -> HydrationRuntime<RecordingObserver, TestLoader> {
        let dom = Dom::parse(html).unwrap();
        let mut runtime = HydrationRuntime::new(
            dom,
            HydrationOptions::default(),
            RecordingObserver::default(),
            loader,
        );
        runtime.define_all();
        runtime
    }

    fn element(runtime: &HydrationRuntime<RecordingObserver, TestLoader>, tag: &str) -> NodeId {
        runtime.dom().find_elements(|t| t == tag)[0]
    }

    #[tokio::test]
    async fn test_never_intersecting_island_is_never_loaded() {
        let html = page(&counter_html(COUNTER, "{&quot;count&quot;:3}", "<button>3</button>"));
        let mut runtime = runtime(&html, TestLoader::default().with(COUNTER, Counter));
        let el = element(&runtime, COUNTER);

        assert_eq!(runtime.state(el), Some(IslandState::Armed));
        assert_eq!(runtime.observer().observed, vec![(el, 0.2)]);

        let mounted = runtime.on_intersection(&[]).await;
        assert_eq!(mounted, 0);
        assert!(runtime.loader().calls().is_empty());
        assert!(!runtime.record(el).unwrap().mounted);
    }

    #[tokio::test]
    async fn test_single_intersection_walks_full_lifecycle() {
        let html = page(&counter_html(COUNTER, "{&quot;count&quot;:3}", "<button>3</button>"));
        let mut runtime = runtime(&html, TestLoader::default().with(COUNTER, Counter));
        let el = element(&runtime, COUNTER);

        let mounted = runtime.on_intersection(&[IntersectionEntry::new(el, 0.5)]).await;
        assert_eq!(mounted, 1);

        let record = runtime.record(el).unwrap();
        assert!(record.mounted);
        assert_eq!(
            record.history(),
            &[
                IslandState::Connected,
                IslandState::Armed,
                IslandState::Mounting,
                IslandState::Mounted
            ]
        );
        assert_eq!(runtime.observer().unobserved, vec![el]);
        assert_eq!(
            runtime.dom().inner_html(el),
            r#"<button data-live="true">3</button>"#
        );

        // A second intersection never triggers another attempt.
        runtime.on_intersection(&[IntersectionEntry::new(el, 1.0)]).await;
        assert_eq!(runtime.loader().calls(), vec![COUNTER.to_string()]);
    }

    #[tokio::test]
    async fn test_below_threshold_stays_armed() {
        let html = page(&counter_html(COUNTER, "{}", "<button>0</button>"));
        let mut runtime = runtime(&html, TestLoader::default().with(COUNTER, Counter));
        let el = element(&runtime, COUNTER);

        runtime.on_intersection(&[IntersectionEntry::new(el, 0.1)]).await;
        runtime.on_intersection(&[IntersectionEntry::new(el, 0.0)]).await;
        assert_eq!(runtime.state(el), Some(IslandState::Armed));
        assert!(runtime.observer().unobserved.is_empty());
    }

    #[tokio::test]
    async fn test_decode_failure_leaves_markup_intact() {
        let html = page(&counter_html(COUNTER, "{oops", "<button>0</button>"));
        let mut runtime = runtime(&html, TestLoader::default().with(COUNTER, Counter));
        let el = element(&runtime, COUNTER);

        assert_eq!(runtime.state(el), Some(IslandState::Failed));
        assert!(runtime.observer().observed.is_empty());

        runtime.on_intersection(&[IntersectionEntry::new(el, 1.0)]).await;
        assert!(runtime.loader().calls().is_empty());
        assert_eq!(runtime.dom().inner_html(el), "<button>0</button>");
    }

    #[tokio::test]
    async fn test_missing_props_attribute_decodes_empty() {
        let html = page(&format!("<{COUNTER}><button>0</button></{COUNTER}>"));
        let runtime = runtime(&html, TestLoader::default());
        let el = element(&runtime, COUNTER);
        let record = runtime.record(el).unwrap();
        assert_eq!(record.state(), IslandState::Armed);
        assert!(record.props.is_empty());
    }

    #[tokio::test]
    async fn test_load_failure_isolated_to_one_island() {
        let html = page(&format!(
            "{}{}",
            counter_html(COUNTER, "{&quot;count&quot;:1}", "<button>1</button>"),
            counter_html(OTHER, "{&quot;count&quot;:2}", "<button>2</button>")
        ));
        let mut runtime = runtime(&html, TestLoader::default().with(OTHER, Counter));
        let a = element(&runtime, COUNTER);
        let b = element(&runtime, OTHER);

        let mounted = runtime
            .on_intersection(&[IntersectionEntry::new(a, 1.0), IntersectionEntry::new(b, 1.0)])
            .await;
        assert_eq!(mounted, 1);
        assert_eq!(runtime.loader().calls().len(), 2);

        assert_eq!(runtime.state(a), Some(IslandState::Failed));
        assert_eq!(runtime.dom().inner_html(a), "<button>1</button>");
        assert_eq!(runtime.state(b), Some(IslandState::Mounted));
    }

    #[tokio::test]
    async fn test_mount_failure_restores_markup() {
        let html = page(&counter_html(
            COUNTER,
            "{}",
            "<div><p>static</p><script>init()</script></div><span>x</span>",
        ));
        let mut runtime = runtime(&html, TestLoader::default().with(COUNTER, Broken));
        let el = element(&runtime, COUNTER);
        let before = runtime.dom().inner_html(el);

        runtime.on_intersection(&[IntersectionEntry::new(el, 1.0)]).await;
        assert_eq!(runtime.state(el), Some(IslandState::Failed));
        assert_eq!(runtime.dom().inner_html(el), before);
    }

    #[tokio::test]
    async fn test_disconnect_before_intersection_stops_observing() {
        let html = page(&counter_html(COUNTER, "{}", "<button>0</button>"));
        let mut runtime = runtime(&html, TestLoader::default().with(COUNTER, Counter));
        let el = element(&runtime, COUNTER);

        runtime.remove_element(el);
        assert!(runtime.record(el).is_none());
        assert_eq!(runtime.observer().unobserved, vec![el]);

        runtime.on_intersection(&[IntersectionEntry::new(el, 1.0)]).await;
        assert!(runtime.loader().calls().is_empty());
    }

    #[tokio::test]
    async fn test_scripts_relocated_after_clear() {
        let html = page(&counter_html(
            COUNTER,
            "{&quot;count&quot;:4}",
            "<div><script>window.a = 1</script><p>4</p></div>",
        ));
        let mut runtime = runtime(&html, TestLoader::default().with(COUNTER, Counter));
        let el = element(&runtime, COUNTER);

        runtime.on_intersection(&[IntersectionEntry::new(el, 1.0)]).await;
        assert_eq!(
            runtime.dom().inner_html(el),
            r#"<script>window.a = 1</script><button data-live="true">4</button>"#
        );
    }

    #[tokio::test]
    async fn test_define_is_idempotent() {
        let html = page(&counter_html(COUNTER, "{}", ""));
        let mut runtime = runtime(&html, TestLoader::default());
        assert!(!runtime.define(COUNTER));
        assert_eq!(runtime.define_all(), 0);
        assert_eq!(runtime.observer().observed.len(), 1);
        assert_eq!(runtime.registry().len(), 1);
    }

    #[tokio::test]
    async fn test_undefined_tag_is_not_connected() {
        let dom = Dom::parse(&page(&counter_html(COUNTER, "{}", ""))).unwrap();
        let mut runtime = HydrationRuntime::new(
            dom,
            HydrationOptions::default(),
            RecordingObserver::default(),
            TestLoader::default(),
        );
        let el = runtime.dom().find_elements(|t| t == COUNTER)[0];
        assert_eq!(runtime.connected(el), None);

        assert!(runtime.define(COUNTER));
        assert_eq!(runtime.state(el), Some(IslandState::Armed));
    }

    #[tokio::test]
    async fn test_nested_islands_cleaned_up_after_outer_mount() {
        let inner = counter_html(OTHER, "{&quot;count&quot;:9}", "<button>9</button>");
        let html = page(&counter_html(COUNTER, "{&quot;count&quot;:1}", &inner));
        let mut runtime = runtime(&html, TestLoader::default().with(COUNTER, Counter));
        let outer = element(&runtime, COUNTER);
        let nested = element(&runtime, OTHER);
        assert_eq!(runtime.state(nested), Some(IslandState::Armed));

        runtime.on_intersection(&[IntersectionEntry::new(outer, 1.0)]).await;
        assert_eq!(runtime.state(outer), Some(IslandState::Mounted));
        assert!(runtime.record(nested).is_none());
        assert!(runtime.observer().unobserved.contains(&nested));
    }

    #[tokio::test]
    async fn test_intersections_delivered_while_load_pending() {
        let html = page(&format!(
            "{}{}",
            counter_html(COUNTER, "{&quot;count&quot;:1}", "<button>1</button>"),
            counter_html(OTHER, "{&quot;count&quot;:2}", "<button>2</button>")
        ));
        let (loader, gate) = TestLoader::default()
            .with(COUNTER, Counter)
            .with(OTHER, Counter)
            .gated(COUNTER);
        let mut runtime = runtime(&html, loader);
        let a = element(&runtime, COUNTER);
        let b = element(&runtime, OTHER);

        let first = runtime.handle_intersections(&[IntersectionEntry::new(a, 1.0)]);
        assert_eq!(first, vec![PendingMount { element: a, tag: COUNTER.to_string() }]);
        let slow = tokio::spawn(runtime.load(&first[0]));
        tokio::task::yield_now().await;
        assert!(!slow.is_finished());

        let second = runtime.handle_intersections(&[IntersectionEntry::new(b, 1.0)]);
        assert_eq!(second.len(), 1);
        let module = runtime.load(&second[0]).await;
        assert_eq!(runtime.complete(b, module), Some(IslandState::Mounted));
        assert_eq!(runtime.state(a), Some(IslandState::Mounting));
        assert_eq!(runtime.observer().unobserved, vec![a, b]);

        gate.notify_one();
        let module = slow.await.unwrap();
        assert_eq!(runtime.complete(a, module), Some(IslandState::Mounted));
        assert_eq!(
            runtime.dom().inner_html(a),
            r#"<button data-live="true">1</button>"#
        );
    }

    #[tokio::test]
    async fn test_completion_after_disconnect_is_dropped() {
        let html = page(&counter_html(COUNTER, "{}", "<button>0</button>"));
        let (loader, gate) = TestLoader::default().with(COUNTER, Counter).gated(COUNTER);
        let mut runtime = runtime(&html, loader);
        let el = element(&runtime, COUNTER);

        let pending = runtime.handle_intersections(&[IntersectionEntry::new(el, 1.0)]);
        let load = runtime.load(&pending[0]);
        runtime.remove_element(el);

        gate.notify_one();
        assert_eq!(runtime.complete(el, load.await), None);
        assert_eq!(runtime.dom().inner_html(el), "<button>0</button>");
    }

    #[tokio::test]
    async fn test_broken_nested_payload_does_not_fail_outer() {
        let inner = counter_html(OTHER, "{oops", "<button>9</button>");
        let html = page(&counter_html(COUNTER, "{&quot;count&quot;:1}", &inner));
        let mut runtime = runtime(&html, TestLoader::default().with(COUNTER, Counter));
        let outer = element(&runtime, COUNTER);
        let nested = element(&runtime, OTHER);
        assert_eq!(runtime.state(nested), Some(IslandState::Failed));

        let mounted = runtime.on_intersection(&[IntersectionEntry::new(outer, 1.0)]).await;
        assert_eq!(mounted, 1);
        assert_eq!(runtime.state(outer), Some(IslandState::Mounted));
    }
}
