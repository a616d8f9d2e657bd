use crate::entities::{Quote, Roster};

/// Prices the trip for every driver willing to take it, cheapest first.
/// Drivers with equal prices keep their roster order.
pub fn quote(roster: &Roster, distance_km: f64) -> Vec<Quote> {
    let mut quotes: Vec<Quote> = roster
        .drivers()
        .iter()
        .filter(|driver| driver.accepts(distance_km))
        .map(|driver| Quote {
            id: driver.id,
            name: driver.name.clone(),
            description: driver.description.clone(),
            vehicle: driver.vehicle.clone(),
            review: driver.review.clone(),
            price: driver.rate_per_km * distance_km,
        })
        .collect();

    quotes.sort_by(|a, b| a.price.total_cmp(&b.price));

    quotes
}

#[test]
fn no_driver_for_zero_distance() {
    assert!(quote(&Roster::default(), 0.0).is_empty());
}

#[test]
fn only_cheapest_driver_for_short_trip() {
    let quotes = quote(&Roster::default(), 1.0);

    assert_eq!(quotes.len(), 1);
    assert_eq!(quotes[0].id, 1);
    assert_eq!(quotes[0].price, 2.5);
}

#[test]
fn all_drivers_sorted_by_price() {
    let quotes = quote(&Roster::default(), 12.0);

    let ids: Vec<i64> = quotes.iter().map(|q| q.id).collect();
    let prices: Vec<f64> = quotes.iter().map(|q| q.price).collect();

    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(prices, vec![30.0, 60.0, 120.0]);
}

#[test]
fn quotes_are_sorted_and_eligible_for_any_distance() {
    let roster = Roster::default();

    for step in 0..400 {
        let distance = step as f64 * 0.05;
        let quotes = quote(&roster, distance);

        assert!(quotes.windows(2).all(|pair| pair[0].price <= pair[1].price));
        for q in &quotes {
            assert!(distance >= roster.find(q.id).unwrap().min_km);
        }
    }
}

#[test]
fn equal_prices_keep_roster_order() {
    use crate::entities::Driver;

    let template = Roster::default().drivers()[0].clone();
    let drivers = [30, 10, 20]
        .into_iter()
        .map(|id| Driver {
            id,
            ..template.clone()
        })
        .collect();
    let roster = Roster::new(drivers).unwrap();

    let ids: Vec<i64> = quote(&roster, 4.0).iter().map(|q| q.id).collect();

    assert_eq!(ids, vec![30, 10, 20]);
}
