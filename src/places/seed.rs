//! Fixed place list shown when the live search is unavailable.

use crate::place::Place;

struct Seed {
    id: &'static str,
    name: &'static str,
    address: &'static str,
    category: &'static str,
    lat: f64,
    lng: f64,
}

const SEEDS: &[Seed] = &[
    Seed { id: "1", name: "을지면옥", address: "서울 중구 충무로14길 2-1", category: "한식", lat: 37.5662, lng: 126.9910 },
    Seed { id: "2", name: "광장시장 박가네 빈대떡", address: "서울 종로구 창경궁로 88", category: "한식", lat: 37.5701, lng: 126.9996 },
    Seed { id: "3", name: "명동교자 본점", address: "서울 중구 명동10길 29", category: "한식", lat: 37.5626, lng: 126.9856 },
    Seed { id: "4", name: "하동관 명동본점", address: "서울 중구 명동9길 12", category: "한식", lat: 37.5640, lng: 126.9839 },
    Seed { id: "5", name: "진주회관", address: "서울 중구 세종대로11길 26", category: "한식", lat: 37.5646, lng: 126.9757 },
    Seed { id: "6", name: "토속촌 삼계탕", address: "서울 종로구 자하문로5길 5", category: "한식", lat: 37.5779, lng: 126.9710 },
    Seed { id: "7", name: "테라로사 광화문점", address: "서울 종로구 종로3길 17", category: "카페", lat: 37.5708, lng: 126.9790 },
    Seed { id: "8", name: "우래옥", address: "서울 중구 창경궁로 62-29", category: "한식", lat: 37.5683, lng: 126.9986 },
    Seed { id: "9", name: "연남동 향미", address: "서울 마포구 동교로 262", category: "중식", lat: 37.5610, lng: 126.9241 },
    Seed { id: "10", name: "카페 어니언 성수", address: "서울 성동구 아차산로9길 8", category: "카페", lat: 37.5447, lng: 127.0582 },
    Seed { id: "11", name: "이태원 부자피자", address: "서울 용산구 보광로 59", category: "양식", lat: 37.5340, lng: 126.9946 },
    Seed { id: "12", name: "강남 스시효", address: "서울 강남구 도산대로 318", category: "일식", lat: 37.5236, lng: 127.0396 },
    Seed { id: "13", name: "해운대 할매국밥", address: "부산 해운대구 중동1로 17", category: "한식", lat: 35.1631, lng: 129.1635 },
    Seed { id: "14", name: "자갈치 꼼장어", address: "부산 중구 자갈치해안로 52", category: "한식", lat: 35.0967, lng: 129.0305 },
];

/// The seed list as map places. Ids are prefixed `mock-` so they never
/// collide with live place ids.
pub fn seed_places() -> Vec<Place> {
    SEEDS
        .iter()
        .map(|s| Place {
            id: format!("mock-{}", s.id),
            name: s.name.to_string(),
            address: Some(s.address.to_string()),
            rating: None,
            user_ratings_total: None,
            lat: s.lat,
            lng: s.lng,
            types: vec![s.category.to_string()],
            photo_uri: None,
            primary_type: Some("restaurant".to_string()),
            primary_type_display_name: Some(s.category.to_string()),
            icon_background_color: None,
            icon_uri: None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_seed_ids_unique_and_valid() {
        let places = seed_places();
        let ids: HashSet<_> = places.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids.len(), places.len());
        assert!(places.iter().all(|p| p.coordinates().is_valid()));
        assert!(places.iter().all(|p| p.id.starts_with("mock-")));
    }
}
