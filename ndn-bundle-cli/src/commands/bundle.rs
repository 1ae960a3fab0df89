//! Walk a certificate chain and publish the resulting bundle segments.

use anyhow::{Context, Result};
use log::info;
use ndn_bundle_common::certificate::Certificate;
use ndn_bundle_common::name::Name;
use ndn_bundle_common::tlv;
use ndn_bundle_face::{Face, UnixFace};
use ndn_bundle_security::bundle::BundleHelper;
use std::path::Path;
use std::sync::Arc;

pub async fn run(socket: &Path, key_name: &str, bundle_name: &str, max_size: usize) -> Result<()> {
    let face = Arc::new(UnixFace::new(socket));

    let mut helper = BundleHelper::new(Arc::clone(&face));
    helper.set_max_bundle_size(max_size);

    let signing_key = Name::from_string(key_name);
    info!("Walking certificate chain from {}", signing_key);
    let mut state = helper.begin_bundle_creation(&signing_key).await;
    println!("Collected {} certificate(s)", state.depth());

    let segments = helper
        .get_bundle(&Name::from_string(bundle_name), &mut state)
        .context("packing the bundle failed")?
        .to_vec();

    for segment in &segments {
        let mut content = segment.content().clone();
        let mut certs = Vec::new();
        while !content.is_empty() {
            let element = tlv::split_element(&mut content)?;
            certs.push(Certificate::wire_decode(&element)?);
        }
        println!(
            "{}  ({} bytes, {} certificate(s))",
            segment.name(),
            segment.content().len(),
            certs.len()
        );
        for cert in &certs {
            println!("    {}", cert.name());
        }
    }

    for segment in segments {
        face.put_data(segment)
            .await
            .context("publishing a segment failed")?;
    }
    info!("Bundle published");

    Ok(())
}
