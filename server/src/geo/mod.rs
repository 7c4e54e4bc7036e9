//! Location resolution and distance search for anything [`Located`].

pub mod geocoder;

use serde::Serialize;

pub use geocoder::{DisabledGeocoder, GeocodedLocation, Geocoder, HttpGeocoder};

use crate::models::{Coordinates, Located};

/// A search result, with its distance when a distance filter was applied.
#[derive(Debug, Clone, Serialize)]
pub struct Ranked<T> {
    pub item: T,
    pub distance_miles: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DistanceSearch<T> {
    pub results: Vec<Ranked<T>>,
    /// The geocoder's name for the searched location, when it resolved.
    pub geocoded_location: Option<String>,
}

impl<T> DistanceSearch<T> {
    fn unfiltered(items: Vec<T>) -> Self {
        Self {
            results: items
                .into_iter()
                .map(|item| Ranked {
                    item,
                    distance_miles: None,
                })
                .collect(),
            geocoded_location: None,
        }
    }

    pub fn was_filtered(&self) -> bool {
        self.geocoded_location.is_some()
    }

    pub fn into_items(self) -> Vec<T> {
        self.results.into_iter().map(|r| r.item).collect()
    }
}

/// Recomputes the stored point from the location text. Called before every
/// save. Blank text leaves the point alone; a failed lookup clears it.
pub async fn resolve_location<T: Located>(geocoder: &dyn Geocoder, record: &mut T) {
    let query = record.location().trim().to_string();
    if query.is_empty() {
        return;
    }
    let point = geocoder.geocode(&query).await.map(|g| g.coordinates);
    record.set_coordinates(point);
}

/// Keeps the records within `radius_miles` of the geocoded `location`,
/// nearest first. When the location is blank or cannot be geocoded the
/// input comes back untouched, in its original order.
pub async fn search_by_distance<T: Located>(
    geocoder: &dyn Geocoder,
    items: Vec<T>,
    location: &str,
    radius_miles: f64,
) -> DistanceSearch<T> {
    let query = location.trim();
    if query.is_empty() {
        return DistanceSearch::unfiltered(items);
    }

    match geocoder.geocode(query).await {
        Some(resolved) => DistanceSearch {
            results: within_radius(items, &resolved.coordinates, radius_miles),
            geocoded_location: Some(resolved.address),
        },
        None => DistanceSearch::unfiltered(items),
    }
}

/// Records without a point never match.
pub fn within_radius<T: Located>(
    items: Vec<T>,
    origin: &Coordinates,
    radius_miles: f64,
) -> Vec<Ranked<T>> {
    let mut ranked: Vec<Ranked<T>> = items
        .into_iter()
        .filter_map(|item| {
            let distance = item.coordinates()?.distance_miles(origin);
            (distance <= radius_miles).then_some(Ranked {
                item,
                distance_miles: Some(distance),
            })
        })
        .collect();

    ranked.sort_by(|a, b| {
        let a = a.distance_miles.unwrap_or(f64::INFINITY);
        let b = b.distance_miles.unwrap_or(f64::INFINITY);
        a.total_cmp(&b)
    });
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone)]
    struct Place {
        name: &'static str,
        location: String,
        point: Option<Coordinates>,
    }

    impl Located for Place {
        fn location(&self) -> &str {
            &self.location
        }
        fn coordinates(&self) -> Option<Coordinates> {
            self.point
        }
        fn set_coordinates(&mut self, coordinates: Option<Coordinates>) {
            self.point = coordinates;
        }
    }

    fn place(name: &'static str, point: Option<(f64, f64)>) -> Place {
        Place {
            name,
            location: name.to_string(),
            point: point.map(|(lat, lon)| Coordinates::new(lat, lon)),
        }
    }

    /// Knows Washington only; counts lookups.
    #[derive(Default)]
    struct OneCity {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Geocoder for OneCity {
        async fn geocode(&self, query: &str) -> Option<GeocodedLocation> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            query.to_lowercase().contains("washington").then(|| GeocodedLocation {
                coordinates: Coordinates::new(38.8951, -77.0364),
                address: "Washington, DC, USA".to_string(),
            })
        }
    }

    fn sample() -> Vec<Place> {
        vec![
            place("New York", Some((40.7128, -74.0060))),
            place("Baltimore", Some((39.2904, -76.6122))),
            place("Nowhere", None),
            place("Arlington", Some((38.8816, -77.0910))),
        ]
    }

    #[tokio::test]
    async fn test_filters_and_orders_by_distance() {
        let geocoder = OneCity::default();
        let search = search_by_distance(&geocoder, sample(), "Washington DC", 50.0).await;

        let names: Vec<_> = search.results.iter().map(|r| r.item.name).collect();
        assert_eq!(names, vec!["Arlington", "Baltimore"]);
        assert_eq!(search.geocoded_location.as_deref(), Some("Washington, DC, USA"));
        assert!(search.results.iter().all(|r| r.distance_miles.unwrap() <= 50.0));
    }

    #[tokio::test]
    async fn test_unresolvable_location_returns_input_unchanged() {
        let geocoder = OneCity::default();
        let search = search_by_distance(&geocoder, sample(), "Atlantis", 10.0).await;

        assert!(!search.was_filtered());
        let names: Vec<_> = search.into_items().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["New York", "Baltimore", "Nowhere", "Arlington"]);
    }

    #[tokio::test]
    async fn test_blank_location_skips_geocoder() {
        let geocoder = OneCity::default();
        let search = search_by_distance(&geocoder, sample(), "   ", 10.0).await;
        assert_eq!(search.results.len(), 4);
        assert!(search.results.iter().all(|r| r.distance_miles.is_none()));
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_resolve_location_sets_and_clears_point() {
        let geocoder = OneCity::default();

        let mut p = place("Washington, DC", None);
        resolve_location(&geocoder, &mut p).await;
        assert_eq!(p.point, Some(Coordinates::new(38.8951, -77.0364)));

        p.location = "Atlantis".into();
        resolve_location(&geocoder, &mut p).await;
        assert!(p.point.is_none());
    }

    #[tokio::test]
    async fn test_resolve_location_ignores_blank_text() {
        let geocoder = OneCity::default();
        let mut p = place("", Some((1.0, 2.0)));
        p.location.clear();
        resolve_location(&geocoder, &mut p).await;
        assert_eq!(p.point, Some(Coordinates::new(1.0, 2.0)));
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 0);
    }
}
