//! Drill-down orchestration
//!
//! [`DrillDownController`] composes the discrete stages of the pipeline —
//! cache/fetch (effectful), decode (pure), merge (pure), render (effectful)
//! — into the user-facing navigation operations: `drill_into`, `go_back`,
//! `reset`.
//!
//! # Transition Algorithm
//!
//! For `drill_into(code)`:
//!
//! 1. Compute the cache key for the current ancestor chain plus `code`.
//! 2. Resolve it through the region cache; a miss fetches boundaries and
//!    counts in parallel (fork-join), decodes, and merges.
//! 3. Render the merged set with level-appropriate styles and callbacks.
//! 4. Dim (not remove) the current layer to keep ancestor context.
//! 5. Commit the navigation state machine last.
//!
//! A failure at any point leaves the prior view and the state machine
//! exactly as they were. Zero boundaries is not a failure: nothing renders
//! and no transition commits.
//!
//! # Superseded Transitions
//!
//! Every transition captures a monotonically increasing generation number.
//! If another transition starts before the fetches resolve, the older
//! attempt observes the newer generation and discards its results instead
//! of rendering over the newer state.
//!
//! # Event Flow
//!
//! Feature callbacks are synchronous and forward to an event channel; the
//! embedding UI drains the channel and calls back into the controller. A
//! click on a parcel feature emits [`ControllerEvent::LeafClicked`] instead
//! of a drill request; detail views live entirely outside the state
//! machine.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::cache::{CacheStats, RegionCache};
use crate::config::DrillDownConfig;
use crate::decode::decode_batch;
use crate::merge::merge;
use crate::nav::{InvalidTransition, NavigationStateMachine};
use crate::region::{CacheKey, Level, NavigationEntry, Region, RegionCode};
use crate::render::{
    style_for, FeatureCallbacks, LayerRenderer, MapBackend, RenderError, RenderedLayerHandle,
};
use crate::source::{
    count_map, BoundarySource, CountSource, DetailRecord, DetailSource, FetchError,
};
use crate::telemetry::{NavMetrics, NavTelemetrySnapshot};

/// Errors that abort a navigation operation.
///
/// Invalid transitions are not here: they are no-op [`Outcome::Ignored`]
/// results, never failures.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DrillDownError {
    /// Boundary or count fetch failed; the prior view is untouched.
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// The rendering backend rejected an operation.
    #[error("render failed: {0}")]
    Render(#[from] RenderError),
}

/// Non-error result of a navigation operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The transition rendered and committed; this layer is now active.
    Rendered {
        handle: RenderedLayerHandle,
        features: usize,
    },
    /// The target region has no boundaries; nothing changed. The caller
    /// shows a "no data for this region" notice.
    EmptyRegion,
    /// A newer transition superseded this one; its results were discarded.
    Superseded,
    /// The requested transition is invalid from the current state; no-op.
    Ignored(InvalidTransition),
}

/// Events emitted by feature callbacks for the embedding UI to drain.
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    /// A non-parcel feature was clicked; the UI should call
    /// [`DrillDownController::drill_into`] with these values.
    DrillRequested { code: RegionCode, name: String },
    /// A parcel feature was clicked; the UI should open a detail view via
    /// [`DrillDownController::open_detail`].
    LeafClicked { code: RegionCode, name: String },
    /// The hovered feature changed (`None` on hover-exit).
    HoverChanged { code: Option<RegionCode> },
}

/// One frame of the controller's layer ledger.
#[derive(Debug, Clone, Copy)]
struct LevelLayer {
    level: Level,
    handle: RenderedLayerHandle,
    features: usize,
}

/// Why a rendered child layer was rolled back instead of committed.
enum CommitFailure {
    Superseded,
    Invalid(InvalidTransition),
    Render(RenderError),
}

/// Orchestrates fetch, decode, merge, render, and navigation state.
///
/// At most one non-dimmed layer exists per level at any time; the ledger of
/// retained handles makes `go_back` a pure restore with no refetch.
pub struct DrillDownController {
    cache: RegionCache,
    renderer: LayerRenderer,
    nav: Mutex<NavigationStateMachine>,
    layers: Mutex<Vec<LevelLayer>>,
    boundaries: Arc<dyn BoundarySource>,
    counts: Arc<dyn CountSource>,
    details: Arc<dyn DetailSource>,
    config: DrillDownConfig,
    generation: AtomicU64,
    metrics: Arc<NavMetrics>,
    events: mpsc::UnboundedSender<ControllerEvent>,
}

impl DrillDownController {
    /// Create a controller and the event channel the embedding UI drains.
    pub fn new(
        backend: Arc<dyn MapBackend>,
        boundaries: Arc<dyn BoundarySource>,
        counts: Arc<dyn CountSource>,
        details: Arc<dyn DetailSource>,
        config: DrillDownConfig,
    ) -> (Self, mpsc::UnboundedReceiver<ControllerEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let controller = Self {
            cache: RegionCache::new(config.cache_max_entries),
            renderer: LayerRenderer::new(backend, config.dim),
            nav: Mutex::new(NavigationStateMachine::new()),
            layers: Mutex::new(Vec::new()),
            boundaries,
            counts,
            details,
            config,
            generation: AtomicU64::new(0),
            metrics: Arc::new(NavMetrics::new()),
            events,
        };
        (controller, receiver)
    }

    /// Render the district root layer.
    ///
    /// Idempotent: calling again after a successful initialization returns
    /// the existing root layer.
    pub async fn initialize(&self) -> Result<Outcome, DrillDownError> {
        if let Some(root) = self.layers.lock().first().copied() {
            return Ok(Outcome::Rendered {
                handle: root.handle,
                features: root.features,
            });
        }

        let regions = self.load_regions(Level::District, Vec::new()).await?;
        if regions.is_empty() {
            self.metrics.drill_empty();
            return Ok(Outcome::EmptyRegion);
        }

        let handle = self.render_level(Level::District, &regions)?;

        // Re-check under the lock: a concurrent initialize may have won the
        // race while the fetch was in flight. The loser discards its layer.
        {
            let mut layers = self.layers.lock();
            if let Some(root) = layers.first().copied() {
                drop(layers);
                if let Err(e) = self.renderer.remove(handle) {
                    warn!(handle = %handle, error = %e, "Failed to remove duplicate root layer");
                }
                return Ok(Outcome::Rendered {
                    handle: root.handle,
                    features: root.features,
                });
            }
            layers.push(LevelLayer {
                level: Level::District,
                handle,
                features: regions.len(),
            });
        }

        info!(features = regions.len(), "District root layer rendered");
        Ok(Outcome::Rendered {
            handle,
            features: regions.len(),
        })
    }

    /// Drill into the child level of the region selected at the current
    /// level.
    ///
    /// See the module docs for the full algorithm. Returns
    /// [`Outcome::Ignored`] at the parcel level, [`Outcome::EmptyRegion`]
    /// when no boundaries decode, and [`Outcome::Superseded`] when a newer
    /// transition wins the race.
    pub async fn drill_into(&self, code: &str, name: &str) -> Result<Outcome, DrillDownError> {
        let code = RegionCode::new(code);
        let (current_level, mut chain) = {
            let nav = self.nav.lock();
            (nav.current_level(), nav.ancestor_codes())
        };

        let Some(target_level) = current_level.child() else {
            debug!(code = %code, "Drill below parcel level ignored");
            self.metrics.invalid_transition();
            return Ok(Outcome::Ignored(InvalidTransition::BelowParcel));
        };

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        chain.push(code.clone());

        let regions = match self.load_regions(target_level, chain).await {
            Ok(regions) => regions,
            Err(e) => {
                self.metrics.fetch_failed();
                warn!(code = %code, level = %target_level, error = %e, "Drill-down fetch failed");
                return Err(DrillDownError::Fetch(e));
            }
        };

        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(code = %code, "Drill-down superseded before render");
            self.metrics.drill_superseded();
            return Ok(Outcome::Superseded);
        }

        if regions.is_empty() {
            debug!(code = %code, level = %target_level, "No boundaries for region");
            self.metrics.drill_empty();
            return Ok(Outcome::EmptyRegion);
        }

        let handle = self.render_level(target_level, &regions)?;

        // Commit: dim the parent, record the layer, then move the state
        // machine last, only after every view mutation has succeeded. Any
        // failure rolls the new layer back so the prior view and navigation
        // state survive intact.
        let commit = {
            let mut layers = self.layers.lock();
            let mut nav = self.nav.lock();

            if self.generation.load(Ordering::SeqCst) != generation {
                Err(CommitFailure::Superseded)
            } else {
                let parent = layers.last().map(|l| l.handle);
                let dim_result = match parent {
                    Some(parent) => self.renderer.dim(parent),
                    None => Ok(()),
                };
                match dim_result {
                    Err(e) => Err(CommitFailure::Render(e)),
                    Ok(()) => {
                        let entry = NavigationEntry::new(current_level, code.clone(), name);
                        match nav.drill_into(entry) {
                            Ok(_) => {
                                layers.push(LevelLayer {
                                    level: target_level,
                                    handle,
                                    features: regions.len(),
                                });
                                Ok(())
                            }
                            Err(e) => {
                                if let Some(parent) = parent {
                                    if let Err(restore_err) = self.renderer.restore(parent) {
                                        warn!(handle = %parent, error = %restore_err, "Failed to restore parent after rejected transition");
                                    }
                                }
                                Err(CommitFailure::Invalid(e))
                            }
                        }
                    }
                }
            }
        };

        match commit {
            Ok(()) => {
                self.metrics.drill_committed();
                info!(code = %code, level = %target_level, features = regions.len(), "Drill-down committed");
                Ok(Outcome::Rendered {
                    handle,
                    features: regions.len(),
                })
            }
            Err(failure) => {
                // Roll the new layer back. Removal trouble is logged rather
                // than propagated so the original outcome is preserved.
                if let Err(e) = self.renderer.remove(handle) {
                    warn!(handle = %handle, error = %e, "Failed to remove discarded layer");
                }
                match failure {
                    CommitFailure::Superseded => {
                        self.metrics.drill_superseded();
                        Ok(Outcome::Superseded)
                    }
                    CommitFailure::Invalid(e) => {
                        self.metrics.invalid_transition();
                        Ok(Outcome::Ignored(e))
                    }
                    CommitFailure::Render(e) => Err(DrillDownError::Render(e)),
                }
            }
        }
    }

    /// Go back one level: remove the current layer, restore the parent from
    /// its retained handle, and pop the state machine.
    ///
    /// The parent is never refetched; restore is purely a restyle from
    /// memory.
    pub fn go_back(&self) -> Result<Outcome, DrillDownError> {
        let mut layers = self.layers.lock();
        let mut nav = self.nav.lock();

        if nav.current_level() == Level::District {
            debug!("Go back at district level ignored");
            self.metrics.invalid_transition();
            return Ok(Outcome::Ignored(InvalidTransition::AtRoot));
        }

        // Supersede any in-flight drill-down; the rejected no-op above
        // must not.
        self.generation.fetch_add(1, Ordering::SeqCst);

        let current = layers.last().copied();
        let parent = layers.len().checked_sub(2).and_then(|i| layers.get(i)).copied();

        if let Some(current) = current {
            self.renderer.remove(current.handle)?;
        }
        let restored = match parent {
            Some(parent) => {
                self.renderer.restore(parent.handle)?;
                Some(parent)
            }
            None => None,
        };

        layers.pop();
        nav.go_back().expect("checked non-root above");
        self.metrics.went_back();
        debug!(level = %nav.current_level(), "Go back committed");

        match restored {
            Some(parent) => Ok(Outcome::Rendered {
                handle: parent.handle,
                features: parent.features,
            }),
            None => Ok(Outcome::EmptyRegion),
        }
    }

    /// Jump back to the district root, removing every descendant layer.
    pub fn reset(&self) -> Result<Outcome, DrillDownError> {
        let mut layers = self.layers.lock();
        let mut nav = self.nav.lock();

        // A reset is valid from any state; it always supersedes an
        // in-flight drill-down.
        self.generation.fetch_add(1, Ordering::SeqCst);

        while layers.len() > 1 {
            let layer = layers.pop().expect("len checked");
            self.renderer.remove(layer.handle)?;
        }
        let root = match layers.first() {
            Some(root) => {
                self.renderer.restore(root.handle)?;
                *root
            }
            None => {
                nav.reset();
                return Ok(Outcome::EmptyRegion);
            }
        };

        nav.reset();
        self.metrics.reset();
        info!("Navigation reset to district root");
        Ok(Outcome::Rendered {
            handle: root.handle,
            features: root.features,
        })
    }

    /// Fetch the detail record for a parcel. Outside the state machine; the
    /// view that shows it is the embedding UI's concern.
    pub async fn open_detail(&self, code: &str) -> Result<DetailRecord, DrillDownError> {
        let code = RegionCode::new(code);
        let parents = self.nav.lock().ancestor_codes();
        self.details
            .fetch_leaf_detail(&parents, &code)
            .await
            .map_err(|e| {
                self.metrics.fetch_failed();
                DrillDownError::Fetch(e)
            })
    }

    /// Read-only breadcrumb for UI components.
    pub fn current_breadcrumb(&self) -> Vec<NavigationEntry> {
        self.nav.lock().breadcrumb()
    }

    /// The level currently displayed.
    pub fn current_level(&self) -> Level {
        self.nav.lock().current_level()
    }

    /// Toggle permanent labels on the active layer.
    pub fn set_labels_visible(&self, visible: bool) -> Result<(), DrillDownError> {
        if let Some(layer) = self.layers.lock().last() {
            self.renderer.set_labels_visible(layer.handle, visible)?;
        }
        Ok(())
    }

    /// Drop every cached region set. For user-forced dataset refreshes
    /// only; normal navigation never invalidates.
    pub fn refresh_dataset(&self) {
        self.cache.clear();
    }

    /// Point-in-time navigation telemetry.
    pub fn telemetry(&self) -> NavTelemetrySnapshot {
        self.metrics.snapshot()
    }

    /// Point-in-time cache statistics.
    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }

    /// Resolve one level's region set through the cache, fetching
    /// boundaries and counts in parallel on a miss.
    async fn load_regions(
        &self,
        level: Level,
        chain: Vec<RegionCode>,
    ) -> Result<Arc<Vec<Region>>, FetchError> {
        let key = CacheKey::new(level, chain.clone());
        let boundaries = Arc::clone(&self.boundaries);
        let counts = Arc::clone(&self.counts);

        self.cache
            .get_or_fetch(key, move || async move {
                let (raw_boundaries, raw_counts) = tokio::join!(
                    boundaries.fetch_boundaries(level, &chain),
                    counts.fetch_counts(level, &chain)
                );
                let raw_boundaries = raw_boundaries?;
                let raw_counts = raw_counts?;

                let decoded = decode_batch(level, &raw_boundaries);
                Ok(merge(decoded, &count_map(&raw_counts)))
            })
            .await
    }

    /// Render one level's regions with level-appropriate callbacks.
    fn render_level(
        &self,
        level: Level,
        regions: &Arc<Vec<Region>>,
    ) -> Result<RenderedLayerHandle, RenderError> {
        let palette = self.config.palette.clone();
        let thresholds = self.config.thresholds;
        self.renderer.render(
            Arc::clone(regions),
            move |region| style_for(region, &palette, &thresholds),
            self.feature_callbacks(level),
            self.config.labels_visible,
        )
    }

    /// Build the callback registration table for one layer.
    ///
    /// Clicks request a drill at non-terminal levels and a detail view at
    /// the parcel level; hovers report the highlighted feature.
    fn feature_callbacks(&self, level: Level) -> FeatureCallbacks {
        let click_events = self.events.clone();
        let hover_events = self.events.clone();
        let exit_events = self.events.clone();
        let terminal = level == Level::Parcel;

        FeatureCallbacks {
            on_click: Some(Arc::new(move |region: &Region| {
                let event = if terminal {
                    ControllerEvent::LeafClicked {
                        code: region.code.clone(),
                        name: region.name.clone(),
                    }
                } else {
                    ControllerEvent::DrillRequested {
                        code: region.code.clone(),
                        name: region.name.clone(),
                    }
                };
                let _ = click_events.send(event);
            })),
            on_hover: Some(Arc::new(move |region: &Region| {
                let _ = hover_events.send(ControllerEvent::HoverChanged {
                    code: Some(region.code.clone()),
                });
            })),
            on_hover_exit: Some(Arc::new(move |_: &Region| {
                let _ = exit_events.send(ControllerEvent::HoverChanged { code: None });
            })),
        }
    }

    /// Dispatch helpers so the embedding UI can forward raw map events.
    pub fn renderer(&self) -> &LayerRenderer {
        &self.renderer
    }

    /// Handle of the currently active (topmost) layer.
    pub fn active_layer(&self) -> Option<RenderedLayerHandle> {
        self.layers.lock().last().map(|l| l.handle)
    }
}
