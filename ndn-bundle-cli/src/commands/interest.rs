//! Express a single Interest and print the answer.

use anyhow::{Context, Result};
use log::info;
use ndn_bundle_common::name::Name;
use ndn_bundle_common::packet::Interest;
use ndn_bundle_face::{Face, UnixFace};
use std::path::Path;

pub async fn run(socket: &Path, name: &str, lifetime: u64, fresh: bool) -> Result<()> {
    let face = UnixFace::new(socket);

    let mut interest = Interest::new(Name::from_string(name));
    interest.set_lifetime_ms(lifetime).set_must_be_fresh(fresh);

    info!("Expressing interest for {}", interest.name());
    let data = face
        .express_interest(interest)
        .await
        .with_context(|| format!("no data for {}", name))?;

    println!("Name:    {}", data.name());
    if let Some(freshness) = data.freshness_period_ms() {
        println!("Fresh:   {} ms", freshness);
    }
    if let Some(final_block) = data.final_block_id() {
        println!("Final:   {}", final_block);
    }
    println!("Size:    {} bytes", data.content().len());
    match std::str::from_utf8(data.content()) {
        Ok(text) => println!("Content: {}", text),
        Err(_) => println!("Content: ({} binary bytes)", data.content().len()),
    }

    Ok(())
}
