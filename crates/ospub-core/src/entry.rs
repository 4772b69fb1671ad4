//! The working unit of a run: one `(kind, id)` pair with the source and
//! destination records loaded for it.

use crate::error::{PublishError, Result};
use crate::record::Record;
use crate::types::Kind;

// ---------------------------------------------------------------------------
// EntryRef
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct EntryRef {
    pub id: String,
    pub kind: Kind,
    /// `"<kind-digit>.<id>"` — lexicographic order over these keys is the
    /// topological execution order.
    pub sort_key: String,
    pub source: Option<Record>,
    pub dest: Option<Record>,
}

pub fn sort_key(kind: Kind, id: &str) -> String {
    format!("{}.{}", kind.digit(), id)
}

impl EntryRef {
    pub fn new(
        kind: Kind,
        id: String,
        source: Option<Record>,
        dest: Option<Record>,
    ) -> Result<Self> {
        if source.is_none() && dest.is_none() {
            return Err(PublishError::EmptyEntry(id));
        }
        if let (Some(s), Some(d)) = (&source, &dest) {
            if s.kind() != d.kind() {
                return Err(PublishError::TypeConflict {
                    id,
                    source_kind: s.kind().to_string(),
                    dest_kind: d.kind().to_string(),
                });
            }
        }
        let sort_key = sort_key(kind, &id);
        Ok(Self {
            id,
            kind,
            sort_key,
            source,
            dest,
        })
    }

    /// Whichever record is present; preferring the source when both are.
    pub fn any_record(&self) -> &Record {
        match (&self.source, &self.dest) {
            (Some(s), _) => s,
            (None, Some(d)) => d,
            // `new` rejects the empty pair.
            (None, None) => unreachable!("EntryRef with neither side"),
        }
    }
}

// ---------------------------------------------------------------------------
// Orderer
// ---------------------------------------------------------------------------

/// Stable ascending sort by sort key: classifications first, then segments,
/// tribes, environments, services; ids ordered within each kind.
pub fn sort_entries(entries: &mut [EntryRef]) {
    entries.sort_by(|a, b| a.sort_key.cmp(&b.sort_key));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::fixtures::{segment, service};

    #[test]
    fn empty_pair_rejected() {
        let err = EntryRef::new(Kind::Service, "svc-a".to_string(), None, None).unwrap_err();
        assert!(matches!(err, PublishError::EmptyEntry(_)));
    }

    #[test]
    fn kind_mismatch_rejected() {
        let err = EntryRef::new(
            Kind::Service,
            "x".to_string(),
            Some(service("x")),
            Some(segment("x", "X")),
        )
        .unwrap_err();
        assert!(matches!(err, PublishError::TypeConflict { .. }));
    }

    #[test]
    fn sort_key_leads_with_kind_digit() {
        let e = EntryRef::new(Kind::Service, "svc-a".to_string(), Some(service("svc-a")), None)
            .unwrap();
        assert_eq!(e.sort_key, "4.svc-a");
    }

    #[test]
    fn segments_sort_before_services() {
        let mut entries = vec![
            EntryRef::new(Kind::Service, "aaa".to_string(), Some(service("aaa")), None).unwrap(),
            EntryRef::new(
                Kind::Segment,
                "zzz".to_string(),
                Some(segment("zzz", "Z")),
                None,
            )
            .unwrap(),
        ];
        sort_entries(&mut entries);
        assert_eq!(entries[0].kind, Kind::Segment);
        assert_eq!(entries[1].kind, Kind::Service);
    }

    #[test]
    fn ids_sort_within_kind() {
        let mut entries = vec![
            EntryRef::new(Kind::Service, "b".to_string(), Some(service("b")), None).unwrap(),
            EntryRef::new(Kind::Service, "a".to_string(), Some(service("a")), None).unwrap(),
        ];
        sort_entries(&mut entries);
        let ids: Vec<&str> = entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
