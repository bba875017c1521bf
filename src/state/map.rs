//! Map screen state: the place collection, the selected place, the carousel
//! and the camera, kept consistent across searches, taps and swipes.
//!
//! The selection is an id. The carousel index is always derived from it
//! through the id→index map of the latest collection, so a search that
//! drops the selected place clears the selection instead of leaving the
//! carousel pointing at whatever now sits at the old index.
//!
//! Operations do not touch the platform. They return [`MapEffect`]s that
//! the shell executes (scroll the carousel, move the camera) and report
//! back through `carousel_settled`, `scroll_failed` and `retry_due`.

use std::collections::HashMap;
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::{MapConfig, PlacesConfig};
use crate::constants::{
    BOUNDS_SNAP_ANIMATION_MS, BOUNDS_SNAP_CENTER_EPS, BOUNDS_SNAP_DELTA_EPS, CAMERA_ANIMATION_MS, FIT_ALL_ANIMATION_MS,
};
use crate::geo::{constrain_fit_region, constrain_region, fit_points_region, Region};
use crate::id_gen::short;
use crate::place::Place;
use crate::places::{spawn_search, PlacesTransport, SearchOutcome};
use crate::AppResult;

use super::places_feed::{PlacesFeed, SearchTicket};

/// Where a selection came from. Marker and list selections also move the
/// camera; a callout tap is already centered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOrigin {
    Marker,
    List,
    Callout,
}

impl SelectOrigin {
    fn recenters(&self) -> bool {
        matches!(self, Self::Marker | Self::List)
    }
}

/// Instructions for the shell.
#[derive(Debug, Clone, PartialEq)]
pub enum MapEffect {
    ScrollCarouselTo { index: usize, animated: bool },
    AnimateCamera { region: Region, duration_ms: u64 },
    ShowCarousel,
    HideCarousel,
    /// Call `retry_due(index)` after `delay_ms`.
    RetryScroll { index: usize, delay_ms: u64 },
}

/// Programmatic carousel scroll: one retry, then give up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollState {
    #[default]
    Idle,
    Pending(usize),
    Retrying(usize),
    Settled(usize),
}

#[derive(Debug)]
pub struct SelectionCoordinator {
    config: MapConfig,
    places: Vec<Place>,
    index_by_id: HashMap<String, usize>,
    selected_id: Option<String>,
    active_index: Option<usize>,
    carousel_visible: bool,
    programmatic_until: Option<Instant>,
    marker_animation_until: Option<Instant>,
    region: Option<Region>,
    scroll: ScrollState,
}

impl SelectionCoordinator {
    pub fn new(config: MapConfig) -> Self {
        Self {
            config,
            places: Vec::new(),
            index_by_id: HashMap::new(),
            selected_id: None,
            active_index: None,
            carousel_visible: false,
            programmatic_until: None,
            marker_animation_until: None,
            region: None,
            scroll: ScrollState::Idle,
        }
    }

    // ── Accessors ──

    pub fn places(&self) -> &[Place] {
        &self.places
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected_id.as_deref()
    }

    pub fn selected_place(&self) -> Option<&Place> {
        self.active_index.and_then(|i| self.places.get(i))
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active_index
    }

    pub fn carousel_visible(&self) -> bool {
        self.carousel_visible
    }

    pub fn region(&self) -> Option<&Region> {
        self.region.as_ref()
    }

    pub fn scroll_state(&self) -> ScrollState {
        self.scroll
    }

    // ── Helpers ──

    fn in_programmatic_window(&self, now: Instant) -> bool {
        self.programmatic_until.is_some_and(|until| now < until)
    }

    fn in_marker_animation(&self, now: Instant) -> bool {
        self.marker_animation_until.is_some_and(|until| now < until)
    }

    /// Camera centered on `place`, zoomed in at least past the cluster threshold.
    fn camera_on(&self, place: &Place) -> Region {
        let delta = self
            .region
            .map(|r| r.latitude_delta.min(self.config.cluster_delta_threshold * 0.9))
            .unwrap_or(self.config.default_delta);
        constrain_region(&Region {
            latitude: place.lat,
            longitude: place.lng,
            latitude_delta: delta,
            longitude_delta: delta,
        })
    }

    fn clear_selection(&mut self) -> Vec<MapEffect> {
        let had_anything = self.selected_id.is_some() || self.carousel_visible;
        if let Some(prev) = self.selected_id.take() {
            tracing::debug!(prev = %short(&prev), "Selection cleared");
        }
        self.active_index = None;
        self.carousel_visible = false;
        self.scroll = ScrollState::Idle;
        self.programmatic_until = None;
        if had_anything {
            vec![MapEffect::HideCarousel]
        } else {
            Vec::new()
        }
    }

    // ── Operations ──

    /// Select by id. Re-selecting the current place does nothing; an id not
    /// in the current collection clears the selection.
    pub fn select(&mut self, id: &str, origin: SelectOrigin, now: Instant) -> Vec<MapEffect> {
        if self.selected_id.as_deref() == Some(id) {
            tracing::debug!(id = %short(id), "Selection unchanged");
            return Vec::new();
        }
        let Some(&index) = self.index_by_id.get(id) else {
            tracing::debug!(id = %short(id), "Selected place not in collection");
            return self.clear_selection();
        };

        tracing::debug!(
            prev = ?self.selected_id.as_deref().map(short),
            next = %short(id),
            index,
            origin = ?origin,
            "Selection update"
        );
        self.selected_id = Some(id.to_string());
        self.active_index = Some(index);
        self.programmatic_until = Some(now + Duration::from_millis(self.config.programmatic_scroll_window_ms));
        self.scroll = ScrollState::Pending(index);

        let mut effects = Vec::new();
        if !self.carousel_visible {
            self.carousel_visible = true;
            effects.push(MapEffect::ShowCarousel);
        }
        effects.push(MapEffect::ScrollCarouselTo { index, animated: true });
        if origin.recenters() {
            let region = self.camera_on(&self.places[index]);
            self.marker_animation_until = Some(now + Duration::from_millis(self.config.marker_animation_window_ms));
            effects.push(MapEffect::AnimateCamera {
                region,
                duration_ms: CAMERA_ANIMATION_MS,
            });
        }
        effects
    }

    /// The user swiped the carousel to `index`.
    pub fn carousel_settled(&mut self, index: usize, now: Instant) -> Vec<MapEffect> {
        if self.in_programmatic_window(now) || !self.carousel_visible || self.active_index == Some(index) {
            return Vec::new();
        }
        let Some(place) = self.places.get(index) else {
            return Vec::new();
        };
        let region = self.camera_on(place);
        tracing::debug!(id = %short(&place.id), index, "Selection follows carousel");
        self.selected_id = Some(place.id.clone());
        self.active_index = Some(index);
        self.scroll = ScrollState::Settled(index);
        vec![MapEffect::AnimateCamera {
            region,
            duration_ms: CAMERA_ANIMATION_MS,
        }]
    }

    /// Install a new collection and re-validate the selection against it.
    pub fn replace_places(&mut self, places: Vec<Place>) -> Vec<MapEffect> {
        self.index_by_id = places
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id.clone(), i))
            .collect();
        self.places = places;

        let Some(id) = self.selected_id.clone() else {
            return Vec::new();
        };
        match self.index_by_id.get(&id).copied() {
            None => {
                tracing::debug!(id = %short(&id), "Selected place dropped by search");
                self.clear_selection()
            }
            Some(index) if Some(index) != self.active_index => {
                self.active_index = Some(index);
                self.scroll = ScrollState::Pending(index);
                vec![MapEffect::ScrollCarouselTo { index, animated: false }]
            }
            Some(_) => Vec::new(),
        }
    }

    pub fn map_pressed(&mut self) -> Vec<MapEffect> {
        self.clear_selection()
    }

    /// Clear the selection and frame every marker.
    pub fn fit_all(&mut self) -> Vec<MapEffect> {
        let points: Vec<_> = self.places.iter().map(Place::coordinates).collect();
        let Some(fitted) = fit_points_region(&points) else {
            return Vec::new();
        };
        let mut effects = self.clear_selection();
        if effects.is_empty() {
            effects.push(MapEffect::HideCarousel);
        }
        effects.push(MapEffect::AnimateCamera {
            region: constrain_fit_region(&fitted),
            duration_ms: FIT_ALL_ANIMATION_MS,
        });
        effects
    }

    /// Record where the camera settled. Ignored while a marker animation is
    /// running. A camera that wandered out of the service area snaps back.
    pub fn region_changed(&mut self, region: Region, now: Instant) -> Vec<MapEffect> {
        if self.in_marker_animation(now) {
            return Vec::new();
        }
        let constrained = constrain_region(&region);
        if !self.region.is_some_and(|r| r.approx_eq(&constrained)) {
            self.region = Some(constrained);
        }

        let drifted = (region.latitude - constrained.latitude).abs() > BOUNDS_SNAP_CENTER_EPS
            || (region.longitude - constrained.longitude).abs() > BOUNDS_SNAP_CENTER_EPS
            || (region.latitude_delta - constrained.latitude_delta).abs() > BOUNDS_SNAP_DELTA_EPS
            || (region.longitude_delta - constrained.longitude_delta).abs() > BOUNDS_SNAP_DELTA_EPS;
        if drifted {
            vec![MapEffect::AnimateCamera {
                region: constrained,
                duration_ms: BOUNDS_SNAP_ANIMATION_MS,
            }]
        } else {
            Vec::new()
        }
    }

    // ── Scroll state machine ──

    pub fn scroll_succeeded(&mut self, index: usize) {
        if matches!(self.scroll, ScrollState::Pending(i) | ScrollState::Retrying(i) if i == index) {
            self.scroll = ScrollState::Settled(index);
        }
    }

    /// First failure schedules one retry; a second gives up silently.
    pub fn scroll_failed(&mut self, index: usize) -> Vec<MapEffect> {
        match self.scroll {
            ScrollState::Pending(i) if i == index => {
                self.scroll = ScrollState::Retrying(index);
                vec![MapEffect::RetryScroll {
                    index,
                    delay_ms: self.config.scroll_retry_delay_ms,
                }]
            }
            ScrollState::Retrying(i) if i == index => {
                tracing::debug!(index, "Carousel scroll failed twice, giving up");
                self.scroll = ScrollState::Idle;
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    /// The retry delay elapsed. Re-issue the scroll only if `index` is still
    /// the active one in the latest collection.
    pub fn retry_due(&mut self, index: usize, now: Instant) -> Vec<MapEffect> {
        if self.scroll != ScrollState::Retrying(index) {
            return Vec::new();
        }
        if self.active_index != Some(index) || index >= self.places.len() {
            self.scroll = ScrollState::Idle;
            return Vec::new();
        }
        self.programmatic_until = Some(now + Duration::from_millis(self.config.programmatic_scroll_window_ms));
        vec![MapEffect::ScrollCarouselTo { index, animated: false }]
    }
}

/// Places feed plus selection coordinator, owned by the map screen.
#[derive(Debug)]
pub struct MapStore {
    feed: PlacesFeed,
    coordinator: SelectionCoordinator,
    map_config: MapConfig,
}

impl MapStore {
    pub fn new(map_config: MapConfig) -> Self {
        Self {
            feed: PlacesFeed::new(),
            coordinator: SelectionCoordinator::new(map_config.clone()),
            map_config,
        }
    }

    pub fn feed(&self) -> &PlacesFeed {
        &self.feed
    }

    pub fn coordinator(&self) -> &SelectionCoordinator {
        &self.coordinator
    }

    pub fn coordinator_mut(&mut self) -> &mut SelectionCoordinator {
        &mut self.coordinator
    }

    /// Start a search for `region` on a worker thread, superseding any
    /// search in flight. Feed the receiver's value to `complete_search`.
    pub fn start_search(
        &mut self,
        transport: Arc<dyn PlacesTransport>,
        places_config: PlacesConfig,
        region: Region,
    ) -> (SearchTicket, Receiver<(u64, AppResult<SearchOutcome>)>) {
        let ticket = self.feed.begin();
        tracing::info!(request = ticket.id, lat = region.latitude, lng = region.longitude, "Places search started");
        let rx = spawn_search(
            transport,
            places_config,
            self.map_config.clone(),
            region,
            ticket.id,
            ticket.token.clone(),
        );
        (ticket, rx)
    }

    /// Apply a finished search. Stale results produce no effects.
    pub fn complete_search(&mut self, request_id: u64, result: AppResult<SearchOutcome>) -> Vec<MapEffect> {
        if self.feed.accept(request_id, result) {
            self.coordinator.replace_places(self.feed.places().to_vec())
        } else {
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancelToken;
    use crate::geo::Coordinates;
    use crate::places::{NearbyRequest, PlacesPage, SearchSource};
    use crate::test_helpers::{places_row, PlaceBuilder};

    fn coordinator_with(n: usize) -> SelectionCoordinator {
        let mut c = SelectionCoordinator::new(MapConfig::default());
        c.replace_places(places_row(n));
        c
    }

    fn after(now: Instant, ms: u64) -> Instant {
        now + Duration::from_millis(ms)
    }

    #[test]
    fn test_marker_select_shows_scrolls_and_recenters() {
        let mut c = coordinator_with(5);
        let now = Instant::now();
        let effects = c.select("p3", SelectOrigin::Marker, now);

        assert_eq!(effects[0], MapEffect::ShowCarousel);
        assert_eq!(effects[1], MapEffect::ScrollCarouselTo { index: 3, animated: true });
        assert!(matches!(effects[2], MapEffect::AnimateCamera { duration_ms: 500, .. }));
        assert_eq!(c.selected_id(), Some("p3"));
        assert_eq!(c.active_index(), Some(3));
        assert_eq!(c.scroll_state(), ScrollState::Pending(3));
    }

    #[test]
    fn test_callout_select_does_not_move_camera() {
        let mut c = coordinator_with(3);
        let effects = c.select("p1", SelectOrigin::Callout, Instant::now());
        assert!(!effects.iter().any(|e| matches!(e, MapEffect::AnimateCamera { .. })));
    }

    #[test]
    fn test_reselect_is_noop() {
        let mut c = coordinator_with(3);
        let now = Instant::now();
        c.select("p1", SelectOrigin::Marker, now);
        assert!(c.select("p1", SelectOrigin::List, after(now, 1_000)).is_empty());
        assert_eq!(c.active_index(), Some(1));
    }

    #[test]
    fn test_last_present_write_wins() {
        let mut c = coordinator_with(5);
        let now = Instant::now();
        c.select("p0", SelectOrigin::Marker, now);
        c.select("p4", SelectOrigin::List, now);
        c.select("p2", SelectOrigin::Callout, now);
        assert_eq!(c.selected_id(), Some("p2"));
        assert_eq!(c.active_index(), Some(2));

        // absent id clears
        let effects = c.select("gone", SelectOrigin::Marker, now);
        assert_eq!(effects, vec![MapEffect::HideCarousel]);
        assert_eq!(c.selected_id(), None);
        assert_eq!(c.active_index(), None);
        assert!(!c.carousel_visible());
    }

    #[test]
    fn test_search_omitting_selection_clears_it() {
        let mut c = coordinator_with(5);
        c.select("p2", SelectOrigin::Marker, Instant::now());

        let effects = c.replace_places(vec![
            PlaceBuilder::new("q0").build(),
            PlaceBuilder::new("q1").build(),
            PlaceBuilder::new("q2").build(),
        ]);
        assert_eq!(effects, vec![MapEffect::HideCarousel]);
        assert_eq!(c.selected_id(), None);
        assert!(c.selected_place().is_none());
        assert!(!c.carousel_visible());
        assert_eq!(c.scroll_state(), ScrollState::Idle);
    }

    #[test]
    fn test_search_moving_selection_follows_id() {
        let mut c = coordinator_with(5);
        c.select("p3", SelectOrigin::Marker, Instant::now());

        let mut moved = places_row(5);
        moved.rotate_left(2); // p3 now at index 1
        let effects = c.replace_places(moved);
        assert_eq!(effects, vec![MapEffect::ScrollCarouselTo { index: 1, animated: false }]);
        assert_eq!(c.selected_place().unwrap().id, "p3");
    }

    #[test]
    fn test_swipe_ignored_during_programmatic_window() {
        let mut c = coordinator_with(5);
        let now = Instant::now();
        c.select("p1", SelectOrigin::Marker, now);

        // the programmatic scroll passes over index 2 on its way
        assert!(c.carousel_settled(2, after(now, 100)).is_empty());
        assert_eq!(c.selected_id(), Some("p1"));

        let effects = c.carousel_settled(2, after(now, 700));
        assert!(matches!(effects[0], MapEffect::AnimateCamera { .. }));
        assert_eq!(c.selected_id(), Some("p2"));
        assert_eq!(c.active_index(), Some(2));
    }

    #[test]
    fn test_swipe_ignored_when_hidden_or_same_index() {
        let mut c = coordinator_with(5);
        assert!(c.carousel_settled(1, Instant::now()).is_empty());

        let now = Instant::now();
        c.select("p1", SelectOrigin::Callout, now);
        assert!(c.carousel_settled(1, after(now, 1_000)).is_empty());
        assert!(c.carousel_settled(99, after(now, 1_000)).is_empty());
    }

    #[test]
    fn test_map_press_and_fit_all_clear_selection() {
        let mut c = coordinator_with(4);
        c.select("p1", SelectOrigin::Marker, Instant::now());
        assert_eq!(c.map_pressed(), vec![MapEffect::HideCarousel]);
        assert!(c.map_pressed().is_empty());

        c.select("p2", SelectOrigin::Marker, Instant::now());
        let effects = c.fit_all();
        assert_eq!(effects[0], MapEffect::HideCarousel);
        match &effects[1] {
            MapEffect::AnimateCamera { region, duration_ms } => {
                assert_eq!(*duration_ms, 800);
                assert!(region.longitude > 126.97 && region.longitude < 126.974);
            }
            other => panic!("unexpected effect {:?}", other),
        }
        assert_eq!(c.selected_id(), None);

        let mut empty = SelectionCoordinator::new(MapConfig::default());
        assert!(empty.fit_all().is_empty());
    }

    #[test]
    fn test_region_changes_ignored_during_marker_animation() {
        let mut c = coordinator_with(3);
        let now = Instant::now();
        let seoul = Region::centered(Coordinates::new(37.5665, 126.9780), 0.02);
        assert!(c.region_changed(seoul, now).is_empty());
        assert!(c.region().unwrap().approx_eq(&seoul));

        c.select("p1", SelectOrigin::Marker, now);
        let elsewhere = Region::centered(Coordinates::new(37.50, 127.00), 0.02);
        c.region_changed(elsewhere, after(now, 100));
        assert!(c.region().unwrap().approx_eq(&seoul));

        c.region_changed(elsewhere, after(now, 800));
        assert!(c.region().unwrap().approx_eq(&elsewhere));
    }

    #[test]
    fn test_region_outside_bounds_snaps_back() {
        let mut c = coordinator_with(1);
        let tokyo = Region::centered(Coordinates::new(35.68, 139.69), 0.02);
        let effects = c.region_changed(tokyo, Instant::now());
        match &effects[..] {
            [MapEffect::AnimateCamera { region, duration_ms: 160 }] => {
                assert!(region.longitude <= 132.0);
            }
            other => panic!("unexpected effects {:?}", other),
        }
    }

    #[test]
    fn test_scroll_retries_once_then_gives_up() {
        let mut c = coordinator_with(5);
        let now = Instant::now();
        c.select("p4", SelectOrigin::Marker, now);

        assert_eq!(c.scroll_failed(4), vec![MapEffect::RetryScroll { index: 4, delay_ms: 100 }]);
        assert_eq!(c.scroll_state(), ScrollState::Retrying(4));
        assert_eq!(
            c.retry_due(4, after(now, 100)),
            vec![MapEffect::ScrollCarouselTo { index: 4, animated: false }]
        );
        assert!(c.scroll_failed(4).is_empty());
        assert_eq!(c.scroll_state(), ScrollState::Idle);
    }

    #[test]
    fn test_retry_revalidates_index() {
        let mut c = coordinator_with(5);
        let now = Instant::now();
        c.select("p4", SelectOrigin::Marker, now);
        c.scroll_failed(4);
        // selection moved on before the retry fired
        c.select("p0", SelectOrigin::Marker, now);
        assert!(c.retry_due(4, after(now, 100)).is_empty());

        c.scroll_succeeded(0);
        assert_eq!(c.scroll_state(), ScrollState::Settled(0));
    }

    struct FixedTransport {
        places: Vec<Place>,
    }

    impl PlacesTransport for FixedTransport {
        fn search_nearby(&self, _request: &NearbyRequest, _cancel: &CancelToken) -> AppResult<PlacesPage> {
            Ok(PlacesPage {
                places: self.places.clone(),
                next_page_token: None,
            })
        }
    }

    #[test]
    fn test_store_applies_only_latest_search() {
        let mut store = MapStore::new(MapConfig::default());
        let seoul = Region::centered(Coordinates::new(37.5665, 126.9780), 0.02);
        let transport: Arc<dyn PlacesTransport> = Arc::new(FixedTransport { places: places_row(4) });

        let (old, old_rx) = store.start_search(Arc::clone(&transport), PlacesConfig::default(), seoul);
        let (new, new_rx) = store.start_search(transport, PlacesConfig::default(), seoul);
        assert!(old.token.is_cancelled());

        let (old_id, old_result) = old_rx.recv().unwrap();
        assert_eq!(old_id, old.id);
        assert!(store.complete_search(old_id, old_result).is_empty());
        assert!(store.coordinator().places().is_empty());

        let (new_id, new_result) = new_rx.recv().unwrap();
        assert_eq!(new_id, new.id);
        store.complete_search(new_id, new_result);
        assert_eq!(store.coordinator().places().len(), 4);
        assert_eq!(store.feed().source(), Some(SearchSource::Live));
    }

    #[test]
    fn test_store_search_dropping_selection() {
        let mut store = MapStore::new(MapConfig::default());
        let t = store.feed.begin();
        store.complete_search(
            t.id,
            Ok(SearchOutcome {
                places: places_row(3),
                source: SearchSource::Live,
                error: None,
            }),
        );
        store.coordinator_mut().select("p0", SelectOrigin::Marker, Instant::now());

        let t = store.feed.begin();
        let effects = store.complete_search(
            t.id,
            Ok(SearchOutcome {
                places: vec![PlaceBuilder::new("other").build()],
                source: SearchSource::Live,
                error: None,
            }),
        );
        assert_eq!(effects, vec![MapEffect::HideCarousel]);
        assert_eq!(store.coordinator().selected_id(), None);
    }
}
