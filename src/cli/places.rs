use anyhow::{bail, Result};
use eating_meeting::cancel::CancelToken;
use eating_meeting::config::AppConfig;
use eating_meeting::geo::{Coordinates, Region};
use eating_meeting::places::seed::seed_places;
use eating_meeting::places::{finalize, search_or_fallback, GooglePlacesClient, SearchSource};

fn origin(lat: f64, lng: f64) -> Result<Coordinates> {
    let c = Coordinates::new(lat, lng);
    if !c.is_valid() {
        bail!("Invalid coordinates: {}, {}", lat, lng);
    }
    Ok(c)
}

/// `places --lat --lng [--delta]`: live search with seed fallback.
pub fn run_search(lat: f64, lng: f64, delta: Option<f64>) -> Result<()> {
    let config = AppConfig::load();
    let center = origin(lat, lng)?;
    let region = Region::centered(center, delta.unwrap_or(config.map.default_delta));

    if !config.places.has_api_key() {
        eprintln!("No places API key configured; expect seed places.");
    }
    let client = GooglePlacesClient::new(&config.places);
    let outcome = search_or_fallback(&client, &config.places, &config.map, &region, &CancelToken::new())?;

    match outcome.source {
        SearchSource::Live => println!("Live results"),
        SearchSource::Fallback => println!(
            "Seed results (live search failed: {})",
            outcome.error.as_deref().unwrap_or("unknown error")
        ),
    }
    println!();
    super::print_places(&outcome.places, &center);
    Ok(())
}

/// `seed-places [--lat --lng]`: the built-in list, filtered around a point
/// the same way the map screen would.
pub fn run_seeds(at: Option<(f64, f64)>) -> Result<()> {
    let config = AppConfig::load();
    let places = seed_places();
    match at {
        Some((lat, lng)) => {
            let center = origin(lat, lng)?;
            let places = finalize(places, &center, config.map.display_cap, config.map.max_search_radius_km);
            super::print_places(&places, &center);
        }
        None => {
            let first = places.first().map(|p| p.coordinates());
            super::print_places(&places, &first.unwrap_or(Coordinates::new(37.5665, 126.9780)));
        }
    }
    Ok(())
}
