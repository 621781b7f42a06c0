use proptest::prelude::*;
use video_organizer::bucket::{Bucket, BucketTable};

fn default_table() -> BucketTable {
    BucketTable::default()
}

/// Strictly ascending positive bounds with distinct names.
fn arb_table() -> impl Strategy<Value = BucketTable> {
    prop::collection::vec(1u32..10_000, 1..10).prop_map(|steps| {
        let mut bound = 0.0;
        let buckets = steps
            .iter()
            .enumerate()
            .map(|(i, step)| {
                bound += f64::from(*step);
                Bucket::new(format!("bucket{}", i), bound)
            })
            .collect();
        BucketTable::new(buckets).unwrap()
    })
}

proptest! {
    #[test]
    fn classification_is_monotonic(a in 0.0f64..1e7, b in 0.0f64..1e7) {
        let table = default_table();
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(table.classify_index(lo) <= table.classify_index(hi));
    }

    #[test]
    fn classification_respects_bounds(table in arb_table(), d in 0.0f64..1e6) {
        let index = table.classify_index(d);
        let buckets = table.buckets();
        prop_assert!(d < buckets[index].max_duration_secs);
        if index > 0 {
            prop_assert!(d >= buckets[index - 1].max_duration_secs);
        }
    }

    #[test]
    fn every_duration_lands_in_a_named_bucket(table in arb_table(), d in 0.0f64..1e9) {
        let name = table.classify(d);
        prop_assert!(table.contains(name));
    }
}

#[test]
fn bounds_are_exclusive() {
    let table = default_table();
    let expected = [
        (0.0, "Micro"),
        (15.0, "Mini"),
        (59.9, "Mini"),
        (60.0, "Short"),
        (300.0, "Medium"),
        (900.0, "Long"),
        (1800.0, "Extended"),
        (3599.999, "Extended"),
        (3600.0, "Feature"),
        (7200.0, "Epic"),
        (f64::MAX, "Epic"),
    ];
    for (duration, bucket) in expected {
        assert_eq!(table.classify(duration), bucket, "duration {}", duration);
    }
}

#[test]
fn last_bucket_bound_is_ignored() {
    let table = BucketTable::new(vec![Bucket::new("Short", 10.0), Bucket::new("Rest", 5.0)])
        .unwrap();
    assert_eq!(table.classify(1e12), "Rest");
    assert_eq!(table.buckets()[1].max_duration_secs, f64::INFINITY);
}
