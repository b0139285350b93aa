//! Bulk-copy directives for the two staging tables.

use crate::config::{BulkSources, RoleCredential};
use crate::schema::catalog::{STAGING_EVENTS, STAGING_SONGS};
use crate::warehouse::{CopyDirective, JsonMapping};

/// Event logs use a JSONPaths document when one is configured, song files
/// always map by key name.
pub fn staging_copies(
    sources: &BulkSources,
    credential: Option<&RoleCredential>,
) -> [CopyDirective; 2] {
    let events_mapping = match &sources.log_jsonpath {
        Some(location) => JsonMapping::Paths(location.clone()),
        None => JsonMapping::Auto,
    };
    [
        CopyDirective {
            table: &STAGING_EVENTS,
            source: sources.log_data.clone(),
            mapping: events_mapping,
            credential: credential.cloned(),
            region: sources.region.clone(),
        },
        CopyDirective {
            table: &STAGING_SONGS,
            source: sources.song_data.clone(),
            mapping: JsonMapping::Auto,
            credential: credential.cloned(),
            region: sources.region.clone(),
        },
    ]
}
