use std::collections::BTreeSet;

use crate::services::repliers::{ListingsResponse, RepliersClient, RepliersError};

/// Suffix variants appended to the user's subdivision term when probing the
/// upstream neighborhood field. MLS boards tag records with section/phase
/// qualifiers ("Circle C Ranch Ph A Sec 04") that users never type.
pub const PROBE_SUFFIXES: [&str; 6] = [" Ranch", " Estates", " Phase", " Sec", " Add", " Sub"];

/// Page size for discovery probes; big enough to see several sections of a
/// subdivision without paging.
const PROBE_PAGE_SIZE: u32 = 50;

/// Stop probing once this many distinct zips are known. More probes past
/// this point only re-discover the same zips.
const ZIP_EARLY_EXIT: usize = 2;

/// Outcome of subdivision discovery: the zip codes its listings sit in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubdivisionResolution {
    pub zips: Vec<String>,
}

impl SubdivisionResolution {
    pub fn is_empty(&self) -> bool {
        self.zips.is_empty()
    }
}

/// The literal term first, then each suffix variant, probe order.
pub fn probe_variants(term: &str) -> Vec<String> {
    let mut variants = Vec::with_capacity(PROBE_SUFFIXES.len() + 1);
    variants.push(term.to_string());
    for suffix in PROBE_SUFFIXES {
        variants.push(format!("{}{}", term, suffix));
    }
    variants
}

/// Resolve a colloquial subdivision name to the zip codes it spans.
///
/// The upstream API matches its neighborhood field exactly, so each variant
/// is probed one at a time (each probe's outcome decides whether the next is
/// needed) and any probe that matches contributes the zips of its listings.
/// Probe failures are non-fatal; a flaky probe just contributes nothing.
pub async fn resolve(client: &RepliersClient, term: &str) -> SubdivisionResolution {
    let mut zips: BTreeSet<String> = BTreeSet::new();

    for variant in probe_variants(term) {
        let params = vec![
            ("neighborhood".to_string(), variant.clone()),
            ("resultsPerPage".to_string(), PROBE_PAGE_SIZE.to_string()),
            ("pageNum".to_string(), "1".to_string()),
        ];

        match client.get_listings(&params).await {
            Ok(response) if response.count > 0 => {
                let before = zips.len();
                collect_zips(&response, &mut zips);
                tracing::debug!(
                    "Subdivision probe '{}' matched {} listings, {} new zips",
                    variant,
                    response.count,
                    zips.len() - before
                );
            }
            Ok(_) => {}
            Err(RepliersError::Unauthorized) => {
                // No later probe can succeed either.
                tracing::warn!("Subdivision probing aborted: unauthorized");
                break;
            }
            Err(e) => {
                tracing::warn!("Subdivision probe '{}' failed, continuing: {}", variant, e);
            }
        }

        if zips.len() >= ZIP_EARLY_EXIT {
            break;
        }
    }

    SubdivisionResolution {
        zips: zips.into_iter().collect(),
    }
}

fn collect_zips(response: &ListingsResponse, zips: &mut BTreeSet<String>) {
    for listing in &response.listings {
        if let Some(zip) = listing.address.zip.as_deref().map(str::trim) {
            if !zip.is_empty() {
                zips.insert(zip.to_string());
            }
        }
    }
}
