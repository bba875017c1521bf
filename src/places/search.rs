//! Viewport search: paging, de-duplication, post-processing, seed fallback.

use std::collections::HashSet;
use std::sync::mpsc;
use std::sync::Arc;

use crate::cancel::CancelToken;
use crate::config::{MapConfig, PlacesConfig};
use crate::geo::{distance_km, region_to_center_radius, Coordinates, Region};
use crate::place::Place;
use crate::AppResult;

use super::seed::seed_places;
use super::transport::{NearbyRequest, PlacesTransport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchSource {
    Live,
    Fallback,
}

/// Finalised places for the map plus where they came from.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub places: Vec<Place>,
    pub source: SearchSource,
    /// Why the live search failed, when `source` is `Fallback`.
    pub error: Option<String>,
}

/// Collect pages for one viewport until `max_results` or the last page.
///
/// The token is checked before every page and during the inter-page delay;
/// a cancelled search always ends in `AppError::Cancelled`.
pub fn fetch_places(
    transport: &dyn PlacesTransport,
    config: &PlacesConfig,
    region: &Region,
    cancel: &CancelToken,
) -> AppResult<Vec<Place>> {
    let (center, radius_m) = region_to_center_radius(region, config.min_radius_m, config.max_radius_m);
    tracing::info!(
        lat = center.latitude,
        lng = center.longitude,
        radius_m = radius_m,
        "Places search started"
    );

    let mut request = NearbyRequest::initial(center, radius_m, &config.included_types, config.page_size);
    let mut seen = HashSet::new();
    let mut places = Vec::new();
    let mut pages = 0u32;

    'paging: loop {
        cancel.check()?;
        let page = transport.search_nearby(&request, cancel)?;
        pages += 1;

        for place in page.places {
            if seen.insert(place.id.clone()) {
                places.push(place);
                if places.len() >= config.max_results {
                    break 'paging;
                }
            }
        }

        match page.next_page_token {
            Some(token) if !token.is_empty() => {
                cancel.sleep(config.page_delay())?;
                request = NearbyRequest::page(token);
            }
            _ => break,
        }
    }

    cancel.check()?;
    tracing::info!(pages = pages, count = places.len(), "Places search finished");
    Ok(places)
}

/// Map-screen post-processing: dedup by id (first wins), cap, keep places
/// within `max_radius_km` of `origin`, sort west to east with id tie-break.
pub fn finalize(places: Vec<Place>, origin: &Coordinates, cap: usize, max_radius_km: f64) -> Vec<Place> {
    let mut seen = HashSet::new();
    let mut out: Vec<Place> = places
        .into_iter()
        .filter(|p| seen.insert(p.id.clone()))
        .take(cap)
        .filter(|p| distance_km(origin, &p.coordinates()) <= max_radius_km)
        .collect();
    out.sort_by(|a, b| a.lng.total_cmp(&b.lng).then_with(|| a.id.cmp(&b.id)));
    out
}

/// Live search with seed fallback. Only cancellation is returned as an error.
pub fn search_or_fallback(
    transport: &dyn PlacesTransport,
    places_cfg: &PlacesConfig,
    map_cfg: &MapConfig,
    region: &Region,
    cancel: &CancelToken,
) -> AppResult<SearchOutcome> {
    let origin = region.center();
    match fetch_places(transport, places_cfg, region, cancel) {
        Ok(places) => Ok(SearchOutcome {
            places: finalize(places, &origin, map_cfg.display_cap, map_cfg.max_search_radius_km),
            source: SearchSource::Live,
            error: None,
        }),
        Err(e) if e.is_cancelled() => Err(e),
        Err(e) => {
            tracing::warn!(error = %e, "Places search failed, using seed places");
            Ok(SearchOutcome {
                places: finalize(seed_places(), &origin, map_cfg.display_cap, map_cfg.max_search_radius_km),
                source: SearchSource::Fallback,
                error: Some(e.to_string()),
            })
        }
    }
}

/// Run `search_or_fallback` on a worker thread. The receiver yields the
/// outcome tagged with `request_id` so the caller can drop stale results.
pub fn spawn_search(
    transport: Arc<dyn PlacesTransport>,
    places_cfg: PlacesConfig,
    map_cfg: MapConfig,
    region: Region,
    request_id: u64,
    cancel: CancelToken,
) -> mpsc::Receiver<(u64, AppResult<SearchOutcome>)> {
    let (tx, rx) = mpsc::channel();
    std::thread::Builder::new()
        .name("places-search".into())
        .spawn(move || {
            let result = search_or_fallback(transport.as_ref(), &places_cfg, &map_cfg, &region, &cancel);
            tx.send((request_id, result)).ok();
        })
        .map_err(|e| tracing::warn!(error = %e, "Failed to spawn places search"))
        .ok();
    rx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::places::transport::PlacesPage;
    use crate::test_helpers::PlaceBuilder;
    use crate::{AppError, AppResult};
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    /// Serves pre-built pages in order and records every request.
    struct ScriptedTransport {
        pages: Mutex<Vec<AppResult<PlacesPage>>>,
        requests: Mutex<Vec<NearbyRequest>>,
    }

    impl ScriptedTransport {
        fn new(pages: Vec<AppResult<PlacesPage>>) -> Self {
            Self { pages: Mutex::new(pages), requests: Mutex::new(Vec::new()) }
        }

        fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    impl PlacesTransport for ScriptedTransport {
        fn search_nearby(&self, request: &NearbyRequest, _cancel: &CancelToken) -> AppResult<PlacesPage> {
            self.requests.lock().unwrap().push(request.clone());
            let mut pages = self.pages.lock().unwrap();
            if pages.is_empty() {
                return Ok(PlacesPage::default());
            }
            pages.remove(0)
        }
    }

    fn fast_config() -> PlacesConfig {
        PlacesConfig { page_delay_ms: 1, ..PlacesConfig::default() }
    }

    fn seoul() -> Region {
        Region::centered(Coordinates::new(37.5665, 126.9780), 0.02)
    }

    /// `n` places spread on a small grid around Seoul city hall.
    fn grid(prefix: &str, n: usize) -> Vec<Place> {
        (0..n)
            .map(|i| {
                let lat = 37.5665 + (i % 15) as f64 * 0.002 - 0.014;
                let lng = 126.9780 + (i / 15) as f64 * 0.002 - 0.016;
                PlaceBuilder::new(&format!("{}{}", prefix, i)).at(lat, lng).build()
            })
            .collect()
    }

    fn page(places: Vec<Place>, token: Option<&str>) -> AppResult<PlacesPage> {
        Ok(PlacesPage { places, next_page_token: token.map(str::to_string) })
    }

    #[test]
    fn test_paging_follows_tokens_and_sends_only_token() {
        let transport = ScriptedTransport::new(vec![
            page(grid("a", 20), Some("t1")),
            page(grid("b", 20), Some("t2")),
            page(grid("c", 5), None),
        ]);
        let places = fetch_places(&transport, &fast_config(), &seoul(), &CancelToken::new()).unwrap();
        assert_eq!(places.len(), 45);
        let reqs = transport.requests.lock().unwrap();
        assert!(matches!(reqs[0], NearbyRequest::Initial(_)));
        assert_eq!(reqs[1], NearbyRequest::page("t1"));
        assert_eq!(reqs[2], NearbyRequest::page("t2"));
    }

    #[test]
    fn test_paging_stops_at_max_results() {
        let pages = (0..15).map(|i| page(grid(&format!("p{}-", i), 20), Some("more"))).collect();
        let transport = ScriptedTransport::new(pages);
        let places = fetch_places(&transport, &fast_config(), &seoul(), &CancelToken::new()).unwrap();
        assert_eq!(places.len(), 200);
        assert_eq!(transport.request_count(), 10);
    }

    #[test]
    fn test_duplicates_across_pages_are_dropped() {
        let transport = ScriptedTransport::new(vec![
            page(grid("a", 10), Some("t1")),
            page(grid("a", 10), None),
        ]);
        let places = fetch_places(&transport, &fast_config(), &seoul(), &CancelToken::new()).unwrap();
        assert_eq!(places.len(), 10);
    }

    #[test]
    fn test_cancel_during_page_delay_returns_cancelled() {
        let transport = ScriptedTransport::new(vec![page(grid("a", 20), Some("t1")), page(grid("b", 20), None)]);
        let cfg = PlacesConfig { page_delay_ms: 5_000, ..PlacesConfig::default() };
        let token = CancelToken::new();
        let other = token.clone();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(30));
            other.cancel();
        });
        let start = Instant::now();
        let res = fetch_places(&transport, &cfg, &seoul(), &token);
        assert!(matches!(res, Err(AppError::Cancelled)));
        assert!(start.elapsed() < Duration::from_secs(2));
        assert_eq!(transport.request_count(), 1);
    }

    #[test]
    fn test_cancelled_search_is_not_turned_into_fallback() {
        let transport = ScriptedTransport::new(vec![]);
        let token = CancelToken::new();
        token.cancel();
        let res = search_or_fallback(&transport, &fast_config(), &MapConfig::default(), &seoul(), &token);
        assert!(res.unwrap_err().is_cancelled());
        assert_eq!(transport.request_count(), 0);
    }

    #[test]
    fn test_250_places_at_10km_viewport() {
        // 0.18 deg of latitude is ~10 km of radius after clamping
        let region = Region::centered(Coordinates::new(37.5665, 126.9780), 0.18);
        let mut places = grid("near", 240);
        places.extend((0..10).map(|i| PlaceBuilder::new(&format!("far{}", i)).at(35.17, 129.07 + i as f64 * 0.001).build()));
        let transport = ScriptedTransport::new(vec![page(places, None)]);
        let cfg = PlacesConfig { max_results: 1_000, ..fast_config() };
        let map_cfg = MapConfig::default();

        let outcome = search_or_fallback(&transport, &cfg, &map_cfg, &region, &CancelToken::new()).unwrap();
        assert_eq!(outcome.source, SearchSource::Live);
        assert!(outcome.places.len() <= map_cfg.display_cap);
        assert_eq!(outcome.places.len(), 240);
        let origin = region.center();
        assert!(outcome.places.iter().all(|p| distance_km(&origin, &p.coordinates()) <= 10.0));
        assert!(outcome.places.windows(2).all(|w| w[0].lng <= w[1].lng));
    }

    #[test]
    fn test_finalize_caps_before_radius_filter() {
        let origin = Coordinates::new(37.5665, 126.9780);
        let places = grid("x", 50);
        let out = finalize(places, &origin, 30, 10.0);
        assert_eq!(out.len(), 30);
        let ties = vec![
            PlaceBuilder::new("b").at(37.5, 127.0).build(),
            PlaceBuilder::new("a").at(37.6, 127.0).build(),
        ];
        let out = finalize(ties, &Coordinates::new(37.55, 127.0), 300, 10.0);
        assert_eq!(out[0].id, "a");
    }

    #[test]
    fn test_error_falls_back_to_seeds_near_origin() {
        let transport = ScriptedTransport::new(vec![Err(AppError::Network("HTTP 503".into()))]);
        let outcome = search_or_fallback(&transport, &fast_config(), &MapConfig::default(), &seoul(), &CancelToken::new()).unwrap();
        assert_eq!(outcome.source, SearchSource::Fallback);
        assert!(outcome.error.as_deref().unwrap().contains("503"));
        assert!(!outcome.places.is_empty());
        // Busan seeds are outside the radius
        assert!(outcome.places.iter().all(|p| p.lat > 37.0));
        assert!(outcome.places.windows(2).all(|w| w[0].lng <= w[1].lng));
    }

    #[test]
    fn test_spawn_search_tags_request_id() {
        let transport: Arc<dyn PlacesTransport> = Arc::new(ScriptedTransport::new(vec![page(grid("a", 3), None)]));
        let rx = spawn_search(transport, fast_config(), MapConfig::default(), seoul(), 7, CancelToken::new());
        let (id, result) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(id, 7);
        assert_eq!(result.unwrap().places.len(), 3);
    }
}
