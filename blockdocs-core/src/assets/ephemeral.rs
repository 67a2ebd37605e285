//! Ephemeral local references (`blob:<uuid>#<suffix>`)
//!
//! The suffix is either a bare type (`png`) for freshly inserted images or the
//! archive path (`3fa1c0de12345678.png`) for images materialized on open, so
//! the type is recoverable without fetching anything.

use crate::types::Block;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, OnceLock};
use uuid::Uuid;

/// Scheme prefix of ephemeral references
pub const EPHEMERAL_SCHEME: &str = "blob:";

/// Attribute the editing surface uses to tag an image with its ephemeral id
pub const EPHEMERAL_ID_ATTR: &str = "data-id";

/// A parsed ephemeral reference
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EphemeralRef {
    id: Uuid,
    suffix: String,
}

impl EphemeralRef {
    /// Parse `blob:<uuid>#<suffix>`
    pub fn parse(url: &str) -> Option<Self> {
        let rest = url.strip_prefix(EPHEMERAL_SCHEME)?;
        let (id, suffix) = rest.split_once('#')?;
        let id = Uuid::parse_str(id).ok()?;
        if suffix.is_empty() {
            return None;
        }
        Some(Self {
            id,
            suffix: suffix.to_string(),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// File extension carried by the suffix
    pub fn extension(&self) -> &str {
        self.suffix
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .unwrap_or(&self.suffix)
    }

    /// Archive path carried by the suffix, if it is one
    pub fn archive_path(&self) -> Option<&str> {
        self.suffix.contains('.').then_some(self.suffix.as_str())
    }

    /// Render the reference back into a URL
    pub fn url(&self) -> String {
        format!("{}{}#{}", EPHEMERAL_SCHEME, self.id, self.suffix)
    }
}

/// Registry of ephemeral references owned by the document store
///
/// Entries are released explicitly, when a sweep finds them unreachable from
/// every document and history record. A freshly registered reference is
/// pending until a sweep first sees it reachable; pending references are
/// never released.
#[derive(Debug, Default)]
pub struct EphemeralStore {
    entries: HashMap<Uuid, Arc<Vec<u8>>>,
    pending: HashSet<Uuid>,
}

impl EphemeralStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register bytes and return the reference that now owns them
    pub fn register(&mut self, data: Vec<u8>, suffix: &str) -> EphemeralRef {
        let reference = EphemeralRef {
            id: Uuid::new_v4(),
            suffix: suffix.trim_start_matches('.').to_string(),
        };
        self.entries.insert(reference.id, Arc::new(data));
        self.pending.insert(reference.id);
        reference
    }

    /// Bytes behind a `blob:` URL
    pub fn resolve(&self, url: &str) -> Option<Arc<Vec<u8>>> {
        let reference = EphemeralRef::parse(url)?;
        self.entries.get(&reference.id).map(Arc::clone)
    }

    /// Release every committed reference not in `live`
    ///
    /// Pending references found in `live` become committed.
    pub fn retain_live(&mut self, live: &HashSet<Uuid>) -> usize {
        self.pending.retain(|id| !live.contains(id));

        let before = self.entries.len();
        let pending = &self.pending;
        self.entries.retain(|id, _| live.contains(id) || pending.contains(id));
        before - self.entries.len()
    }

    /// Whether the reference has not been seen in content yet
    pub fn is_pending(&self, url: &str) -> bool {
        EphemeralRef::parse(url).is_some_and(|r| self.pending.contains(&r.id))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Collect the ephemeral ids referenced by image elements
pub fn collect_refs(blocks: &[Block], into: &mut HashSet<Uuid>) {
    for block in blocks {
        if let Some(reference) = block.attr("src").and_then(EphemeralRef::parse) {
            into.insert(reference.id);
        }
        collect_refs(block.children(), into);
    }
}

fn markup_ref() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"blob:([[:xdigit:]]{8}(?:-[[:xdigit:]]{4}){3}-[[:xdigit:]]{12})")
            .expect("static regex")
    })
}

/// Collect the ephemeral ids mentioned anywhere in serialized markup
pub fn collect_refs_in_markup(markup: &str, into: &mut HashSet<Uuid>) {
    for captures in markup_ref().captures_iter(markup) {
        if let Ok(id) = Uuid::parse_str(&captures[1]) {
            into.insert(id);
        }
    }
}
