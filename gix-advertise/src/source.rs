//! Seams towards the object store and the ref container.

use std::collections::{BTreeMap, HashMap, HashSet};

use bstr::{BStr, BString, ByteSlice};
use gix_hash::{oid, ObjectId};

/// A parsed object, as far as advertisement is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedObject {
    /// The id of the object itself.
    pub id: ObjectId,
    /// The kind of the object.
    pub kind: gix_object::Kind,
    /// The id of the immediate target object.
    ///
    /// `Some` iff `kind` is `Tag` and the tag body named a target.
    pub tag_target: Option<ObjectId>,
}

/// Read-only object resolution as the advertiser needs it.
///
/// Resolution never fails loudly: missing objects and I/O faults alike
/// surface as `None`, and the advertiser drops the affected line.
pub trait ObjectSource {
    /// Parse the object `id` refers to, or `None` if it cannot be obtained.
    fn parse_any(&mut self, id: &oid) -> Option<ResolvedObject>;

    /// Header-only parse used while unwrapping tag chains.
    ///
    /// `None` aborts the peeled-line emission and nothing else.
    fn parse_headers(&mut self, id: &oid) -> Option<ResolvedObject> {
        self.parse_any(id)
    }
}

/// The externally-owned per-object advertised bit.
///
/// The advertiser is granted the right to set it for the duration of a
/// session so that peers, and the advertiser itself, can test membership in
/// constant time afterwards.
pub trait AdvertisedMark {
    /// Mark `id` as advertised, returning `true` if it was newly marked.
    fn insert(&mut self, id: &oid) -> bool;
    /// Whether `id` carries the mark already.
    fn contains(&self, id: &oid) -> bool;
}

/// The auxiliary-set representation of the mark.
impl AdvertisedMark for HashSet<ObjectId> {
    fn insert(&mut self, id: &oid) -> bool {
        HashSet::insert(self, id.to_owned())
    }

    fn contains(&self, id: &oid) -> bool {
        HashSet::contains(self, &id.to_owned())
    }
}

/// A collection of refs to advertise.
///
/// Sources whose iteration order is already ascending by name are streamed in
/// that order; everything else is collected and sorted by full name in byte
/// order before emission.
pub trait RefSource {
    /// Whether iteration already yields names in ascending byte order.
    ///
    /// Only return `true` when that order is total and stable.
    fn already_sorted(&self) -> bool {
        false
    }

    /// Iterate all `(name, id)` pairs.
    fn iter_refs(&self) -> Box<dyn Iterator<Item = (&BStr, &oid)> + '_>;
}

impl RefSource for BTreeMap<BString, ObjectId> {
    fn already_sorted(&self) -> bool {
        true
    }

    fn iter_refs(&self) -> Box<dyn Iterator<Item = (&BStr, &oid)> + '_> {
        Box::new(self.iter().map(|(name, id)| (name.as_bstr(), id.as_ref())))
    }
}

impl RefSource for HashMap<BString, ObjectId> {
    fn iter_refs(&self) -> Box<dyn Iterator<Item = (&BStr, &oid)> + '_> {
        Box::new(self.iter().map(|(name, id)| (name.as_bstr(), id.as_ref())))
    }
}

impl RefSource for [(BString, ObjectId)] {
    fn iter_refs(&self) -> Box<dyn Iterator<Item = (&BStr, &oid)> + '_> {
        Box::new(self.iter().map(|(name, id)| (name.as_bstr(), id.as_ref())))
    }
}

impl RefSource for Vec<(BString, ObjectId)> {
    fn iter_refs(&self) -> Box<dyn Iterator<Item = (&BStr, &oid)> + '_> {
        self.as_slice().iter_refs()
    }
}
