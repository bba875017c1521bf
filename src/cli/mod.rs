pub mod config;
pub mod db;
pub mod places;

use eating_meeting::geo::{distance_km, format_distance, Coordinates};
use eating_meeting::place::Place;

/// One line per place: index, name, category, distance from `origin`, rating.
pub fn print_places(places: &[Place], origin: &Coordinates) {
    if places.is_empty() {
        println!("No places found.");
        return;
    }
    for (i, p) in places.iter().enumerate() {
        let rating = match (p.rating, p.user_ratings_total) {
            (Some(r), Some(n)) => format!("{:.1} ({})", r, n),
            (Some(r), None) => format!("{:.1}", r),
            _ => "-".to_string(),
        };
        println!(
            "{:>3}  {:<28} {:<12} {:<10} {:>10}  ({:.5}, {:.5})",
            i,
            eating_meeting::constants::truncate_safe(&p.name, 28),
            p.category_label().unwrap_or("-"),
            format_distance(distance_km(origin, &p.coordinates())),
            rating,
            p.lat,
            p.lng,
        );
    }
    println!();
    println!("{} place(s)", places.len());
}
