//! Fetch a data packet and validate it against a trust anchor.

use anyhow::{Context, Result};
use log::info;
use ndn_bundle_common::certificate::Certificate;
use ndn_bundle_common::name::Name;
use ndn_bundle_common::packet::Interest;
use ndn_bundle_face::{Face, UnixFace};
use ndn_bundle_security::policy::TrustAnchorPolicy;
use ndn_bundle_security::validator::Validator;
use std::path::Path;
use std::sync::Arc;

pub async fn run(socket: &Path, name: &str, anchor_path: &Path) -> Result<()> {
    let anchor_wire = std::fs::read(anchor_path)
        .with_context(|| format!("reading anchor from {}", anchor_path.display()))?;
    let anchor = Certificate::wire_decode(&anchor_wire).context("decoding anchor certificate")?;
    info!("Trust anchor: {}", anchor.name());

    let face = Arc::new(UnixFace::new(socket));
    let validator = Validator::new(
        Arc::clone(&face),
        TrustAnchorPolicy::new(vec![anchor]),
    );

    let interest = Interest::new(Name::from_string(name));
    let data = face
        .express_interest(interest)
        .await
        .with_context(|| format!("no data for {}", name))?;
    info!("Fetched {}", data.name());

    match validator.validate_data(&data).await {
        Ok(()) => {
            println!("VALID    {}", data.name());
            let metrics = validator.metrics();
            println!(
                "         {} bundle interest(s), {} direct certificate interest(s)",
                metrics.bundle_interests_sent.value(),
                metrics.cert_interests_sent.value()
            );
            Ok(())
        }
        Err(e) => {
            println!("INVALID  {}  ({})", data.name(), e);
            std::process::exit(1);
        }
    }
}
