use proptest::prelude::*;

use tribunal::evidence::{CollectorId, Evidence, EvidenceMap};

fn arb_collector() -> impl Strategy<Value = CollectorId> {
    prop_oneof![Just(CollectorId::Repo), Just(CollectorId::Doc)]
}

fn arb_evidence() -> impl Strategy<Value = Evidence> {
    (
        "[a-z]{1,12}",
        any::<bool>(),
        "[a-z/.]{1,16}",
        "[a-z ]{1,24}",
        0.0f64..=1.0,
    )
        .prop_map(|(goal, found, location, rationale, confidence)| {
            Evidence::new(goal, found, location, rationale, confidence)
        })
}

fn arb_map() -> impl Strategy<Value = EvidenceMap> {
    prop::collection::vec((arb_collector(), arb_evidence()), 0..8).prop_map(|pairs| {
        let mut map = EvidenceMap::new();
        for (collector, evidence) in pairs {
            map.push(collector, evidence);
        }
        map
    })
}

proptest! {
    #[test]
    fn merge_is_commutative_up_to_canonical_form(a in arb_map(), b in arb_map()) {
        let mut ab = a.clone();
        ab.merge(&b);
        let mut ba = b.clone();
        ba.merge(&a);
        prop_assert_eq!(ab.canonical(), ba.canonical());
    }

    #[test]
    fn merge_is_associative_up_to_canonical_form(
        a in arb_map(),
        b in arb_map(),
        c in arb_map(),
    ) {
        let mut left = a.clone();
        left.merge(&b);
        left.merge(&c);

        let mut bc = b.clone();
        bc.merge(&c);
        let mut right = a.clone();
        right.merge(&bc);

        prop_assert_eq!(left.canonical(), right.canonical());
    }

    #[test]
    fn merge_preserves_every_entry(a in arb_map(), b in arb_map()) {
        let mut merged = a.clone();
        merged.merge(&b);
        prop_assert_eq!(merged.total(), a.total() + b.total());
    }
}
