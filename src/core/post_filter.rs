use crate::models::{RawListing, SearchCriteria};

/// Description phrases that signal a downstairs primary bedroom when the
/// structured room list doesn't say.
const PRIMARY_ON_MAIN_PHRASES: [&str; 6] = [
    "primary on main",
    "primary bedroom on main",
    "master on main",
    "master down",
    "primary down",
    "owner's suite on main",
];

/// True when the criteria carry a filter the upstream API cannot express,
/// forcing a widened fetch and client-side pagination.
pub fn needs_post_filter(criteria: &SearchCriteria) -> bool {
    criteria.subdivision_term().is_some()
        || criteria.min_full_baths.is_some()
        || criteria.min_half_baths.is_some()
        || criteria.waterfront == Some(true)
        || criteria.has_hoa.is_some()
        || criteria.primary_on_main == Some(true)
}

/// Apply every client-side filter to one raw record.
///
/// Pool is absent here on purpose: it is narrowed upstream to "In Ground"
/// and never broadened client-side.
pub fn passes_filters(raw: &RawListing, criteria: &SearchCriteria) -> bool {
    if let Some(term) = criteria.subdivision_term() {
        if !matches_subdivision(raw, term) {
            return false;
        }
    }

    if let Some(min) = criteria.min_full_baths {
        if raw.full_baths() < min {
            return false;
        }
    }

    if let Some(min) = criteria.min_half_baths {
        if raw.half_baths() < min {
            return false;
        }
    }

    if criteria.waterfront == Some(true) && !raw.is_waterfront() {
        return false;
    }

    if let Some(wants_hoa) = criteria.has_hoa {
        if raw.has_hoa() != wants_hoa {
            return false;
        }
    }

    if criteria.primary_on_main == Some(true) && !primary_on_main(raw) {
        return false;
    }

    true
}

/// Contains-match against the record's neighborhood text, the semantics the
/// upstream exact-match field cannot express.
#[inline]
pub fn matches_subdivision(raw: &RawListing, term: &str) -> bool {
    raw.subdivision().to_lowercase().contains(&term.to_lowercase())
}

/// Heuristic: a structured room entry wins; otherwise fall back to phrase
/// matching against the listing description.
#[inline]
pub fn primary_on_main(raw: &RawListing) -> bool {
    let room_says_so = raw.rooms.iter().any(|room| {
        let level_is_main = room
            .level
            .as_deref()
            .map(|level| {
                let level = level.trim();
                level.eq_ignore_ascii_case("main")
                    || level.eq_ignore_ascii_case("first")
                    || level == "1"
            })
            .unwrap_or(false);

        let is_primary = room
            .room_type
            .as_deref()
            .map(|name| {
                let name = name.to_lowercase();
                name.contains("primary") || name.contains("master") || name.contains("owner")
            })
            .unwrap_or(false);

        level_is_main && is_primary
    });

    if room_says_so {
        return true;
    }

    raw.details
        .description
        .as_deref()
        .map(|description| {
            let description = description.to_lowercase();
            PRIMARY_ON_MAIN_PHRASES
                .iter()
                .any(|phrase| description.contains(phrase))
        })
        .unwrap_or(false)
}
