//! Bundle producer tests: chain walking, packing, segment shape.

mod common;

use common::{ChainFixture, MockFace};
use ndn_bundle_common::certificate::Certificate;
use ndn_bundle_common::name::Name;
use ndn_bundle_common::tlv;
use ndn_bundle_security::bundle::BundleHelper;
use ndn_bundle_security::verify;
use std::collections::HashSet;

#[tokio::test]
async fn bundle_packs_whole_chain_into_one_segment() {
    let fixture = ChainFixture::new();
    let face = MockFace::serving(vec![
        fixture.leaf.cert_data(),
        fixture.sub.cert_data(),
        fixture.anchor.cert_data(),
    ]);

    let helper = BundleHelper::new(face);
    let mut state = helper.begin_bundle_creation(&fixture.leaf.key_name).await;
    assert_eq!(state.depth(), 3);

    let bundle_name = Name::from_string("/fixture/sub1/sub3/data/BUNDLE");
    let segments = helper.get_bundle(&bundle_name, &mut state).unwrap();
    assert_eq!(segments.len(), 1);

    // three wire-encoded certificates inside the single segment
    let mut content = segments[0].content().clone();
    let mut elements = 0;
    while !content.is_empty() {
        let element = tlv::split_element(&mut content).unwrap();
        Certificate::wire_decode(&element).unwrap();
        elements += 1;
    }
    assert_eq!(elements, 3);
}

#[tokio::test]
async fn produced_certificates_match_the_collected_chain() {
    let fixture = ChainFixture::new();
    let face = MockFace::serving(vec![
        fixture.leaf.cert_data(),
        fixture.sub.cert_data(),
        fixture.anchor.cert_data(),
    ]);

    let helper = BundleHelper::new(face);
    let mut state = helper.begin_bundle_creation(&fixture.leaf.key_name).await;

    let chain_names: HashSet<Name> = state
        .certificate_chain()
        .iter()
        .map(|c| c.name().clone())
        .collect();

    let bundle_name = Name::from_string("/fixture/sub1/sub3/data/BUNDLE");
    let segments = helper.get_bundle(&bundle_name, &mut state).unwrap();

    let mut parsed_names = HashSet::new();
    for segment in segments {
        let mut content = segment.content().clone();
        while !content.is_empty() {
            let element = tlv::split_element(&mut content).unwrap();
            let cert = Certificate::wire_decode(&element).unwrap();
            parsed_names.insert(cert.name().clone());
        }
    }
    assert_eq!(parsed_names, chain_names);
}

#[tokio::test]
async fn segment_naming_and_signatures() {
    let fixture = ChainFixture::new();
    let face = MockFace::serving(vec![
        fixture.leaf.cert_data(),
        fixture.sub.cert_data(),
        fixture.anchor.cert_data(),
    ]);

    let helper = BundleHelper::new(face);
    let mut state = helper.begin_bundle_creation(&fixture.leaf.key_name).await;

    let bundle_name = Name::from_string("/fixture/sub1/sub3/data/BUNDLE");
    let segments = helper.get_bundle(&bundle_name, &mut state).unwrap();

    for (i, segment) in segments.iter().enumerate() {
        // ascending segment numbers under one versioned prefix
        let last = segment.name().get(-1).unwrap();
        assert_eq!(last.to_segment().unwrap(), i as u64);
        assert!(segment.name().get(-2).unwrap().is_version());
        assert!(bundle_name.is_prefix_of(segment.name()));

        // only the final segment is marked final
        let is_last = i == segments.len() - 1;
        match segment.final_block_id() {
            Some(final_block) => {
                assert!(is_last);
                assert_eq!(final_block, last);
            }
            None => assert!(!is_last),
        }

        // integrity signature
        verify::verify_digest_sha256(&segment.signed_portion(), segment.signature_value())
            .unwrap();
    }
}

#[tokio::test]
async fn depth_cap_bounds_the_chain() {
    let fixture = ChainFixture::new();
    let face = MockFace::serving(vec![
        fixture.leaf.cert_data(),
        fixture.sub.cert_data(),
        fixture.anchor.cert_data(),
    ]);

    let mut helper = BundleHelper::new(face);
    helper.set_max_bundle_size(2);
    assert_eq!(helper.max_bundle_size(), 2);

    let state = helper.begin_bundle_creation(&fixture.leaf.key_name).await;
    assert_eq!(state.depth(), 2);
}

#[tokio::test]
async fn unreachable_network_yields_empty_state() {
    let fixture = ChainFixture::new();
    let face = MockFace::serving(Vec::new()); // nacks everything

    let helper = BundleHelper::new(face.clone());
    let mut state = helper.begin_bundle_creation(&fixture.leaf.key_name).await;
    assert_eq!(state.depth(), 0);

    // the partial (here empty) chain is still publishable
    let segments = helper
        .get_bundle(&Name::from_string("/fixture/x/BUNDLE"), &mut state)
        .unwrap();
    assert_eq!(segments.len(), 1);
    assert!(segments[0].content().is_empty());
    assert!(segments[0].final_block_id().is_some());
}

#[tokio::test]
async fn refresh_never_duplicates_seen_certificates() {
    let fixture = ChainFixture::new();

    // first pass: only the leaf certificate is reachable
    let leaf_only = vec![fixture.leaf.cert_data()];
    let face = MockFace::serving(leaf_only);
    let helper = BundleHelper::new(face);
    let mut state = helper.begin_bundle_creation(&fixture.leaf.key_name).await;
    assert_eq!(state.depth(), 1);

    // the refresh re-walks from the signing key; the seen-set guard stops
    // it at names recorded on the first pass, so nothing is appended twice
    let full_face = MockFace::serving(vec![
        fixture.leaf.cert_data(),
        fixture.sub.cert_data(),
        fixture.anchor.cert_data(),
    ]);
    let helper = BundleHelper::new(full_face);
    helper.refresh_bundle(&mut state).await;
    assert_eq!(state.depth(), 1);
}

#[tokio::test]
async fn seen_set_is_monotonic() {
    let fixture = ChainFixture::new();
    let face = MockFace::serving(Vec::new());
    let helper = BundleHelper::new(face);
    let mut state = helper.begin_bundle_creation(&fixture.leaf.key_name).await;

    // begin_bundle_creation already recorded the signing key name
    assert!(state.has_seen_certificate_name(&fixture.leaf.key_name));
    assert!(state.has_seen_certificate_name(&fixture.leaf.key_name));

    let fresh = Name::from_string("/never/seen");
    assert!(!state.has_seen_certificate_name(&fresh));
    assert!(state.has_seen_certificate_name(&fresh));
}
