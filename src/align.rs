use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::model::{AlignedPair, PricePoint};

/// Pair up the prices two series recorded at the same instant.
///
/// The result holds one pair per shared timestamp, oldest first. When a
/// series repeats a timestamp the last occurrence in series order wins.
pub fn align(a: &[PricePoint], b: &[PricePoint]) -> Vec<AlignedPair> {
    let left = index_by_timestamp(a);
    let right = index_by_timestamp(b);

    // Walk the smaller index and probe the larger one.
    if left.len() <= right.len() {
        left.iter()
            .filter_map(|(ts, price1)| {
                right.get(ts).map(|price2| AlignedPair {
                    price1: *price1,
                    price2: *price2,
                })
            })
            .collect()
    } else {
        right
            .iter()
            .filter_map(|(ts, price2)| {
                left.get(ts).map(|price1| AlignedPair {
                    price1: *price1,
                    price2: *price2,
                })
            })
            .collect()
    }
}

/// Split aligned pairs into the two price columns.
pub fn unzip(pairs: &[AlignedPair]) -> (Vec<f64>, Vec<f64>) {
    pairs.iter().map(|pair| (pair.price1, pair.price2)).unzip()
}

fn index_by_timestamp(points: &[PricePoint]) -> BTreeMap<DateTime<Utc>, f64> {
    let mut index = BTreeMap::new();
    for point in points {
        index.insert(point.timestamp, point.price);
    }
    index
}
