//! The reference advertisement encoder.

use bstr::{BStr, BString, ByteSlice, ByteVec};
use gix_hash::{oid, ObjectId};
use gix_object::Kind;

use crate::{
    sink::LineSink,
    source::{AdvertisedMark, ObjectSource, RefSource, ResolvedObject},
    Error,
};

/// The pseudo ref name of synthetic lines from alternate object sources.
pub const DOT_HAVE: &str = ".have";

/// Encodes the opening reference advertisement of the smart protocols.
///
/// The encoder has a two-state lifecycle. While no line has been written,
/// capability tokens can be registered and tag dereferencing toggled; the
/// first successfully emitted line freezes that configuration and carries the
/// capability section after a NUL. There is no way back, and after [`end`]
/// every emission fails.
///
/// Line format, bit for bit:
///
/// ```text
/// <hex-id> SP <name> [NUL SP cap1 SP cap2 ... SP] LF
/// ```
///
/// The bracketed section appears on the first line only, and only when at
/// least one capability is registered.
///
/// [`end`]: Advertiser::end
pub struct Advertiser<'a, S> {
    sink: S,
    objects: &'a mut dyn ObjectSource,
    advertised: &'a mut dyn AdvertisedMark,
    capabilities: Vec<String>,
    deref_tags: bool,
    first: bool,
    closed: bool,
    line: BString,
}

impl<'a, S: LineSink> Advertiser<'a, S> {
    /// Bind the encoder to its sink, object resolver and advertised-mark for
    /// one session.
    ///
    /// The mark stays owned by the host; the advertiser merely sets it while
    /// the session lasts.
    pub fn new(
        sink: S,
        objects: &'a mut dyn ObjectSource,
        advertised: &'a mut dyn AdvertisedMark,
    ) -> Self {
        Self {
            sink,
            objects,
            advertised,
            capabilities: Vec::new(),
            deref_tags: false,
            first: true,
            closed: false,
            line: BString::default(),
        }
    }

    /// Configure whether each advertised tag is followed by a peeled
    /// companion line under `<name>^{}`.
    pub fn set_deref_tags(&mut self, deref: bool) -> Result<(), Error> {
        if !self.first {
            return Err(Error::AfterFirstLine);
        }
        self.deref_tags = deref;
        Ok(())
    }

    /// Register a capability token for the first line.
    ///
    /// Tokens keep their registration order and are silently deduplicated.
    pub fn advertise_capability(&mut self, name: impl Into<String>) -> Result<(), Error> {
        if !self.first {
            return Err(Error::AfterFirstLine);
        }
        let name = name.into();
        if !self.capabilities.iter().any(|cap| *cap == name) {
            self.capabilities.push(name);
        }
        Ok(())
    }

    /// Register a `name=value` capability token, as used for agent strings
    /// and symref hints.
    pub fn advertise_capability_value(&mut self, name: &str, value: &str) -> Result<(), Error> {
        self.advertise_capability(format!("{name}={value}"))
    }

    /// Advertise every resolvable ref in `refs`, ascending by name.
    ///
    /// Containers that are already sorted stream in their own order,
    /// everything else is sorted by full name in byte order first.
    /// Unresolvable refs are skipped without error.
    pub fn send(&mut self, refs: &dyn RefSource) -> Result<(), Error> {
        if refs.already_sorted() {
            for (name, id) in refs.iter_refs() {
                self.advertise_ref(name, id)?;
            }
        } else {
            let mut sorted: Vec<_> = refs.iter_refs().collect();
            sorted.sort_by(|lhs, rhs| lhs.0.cmp(rhs.0));
            for (name, id) in sorted {
                self.advertise_ref(name, id)?;
            }
        }
        Ok(())
    }

    /// Advertise `id` under the [`DOT_HAVE`] pseudo-name, once per session.
    ///
    /// Tags also advertise their immediate target, with the same
    /// deduplication. Ids that do not resolve are ignored.
    pub fn advertise_have(&mut self, id: &oid) -> Result<(), Error> {
        let Some(obj) = self.objects.parse_any(id) else {
            return Ok(());
        };
        self.advertise_any_once(obj.id.as_ref(), BStr::new(DOT_HAVE))?;
        if obj.kind == Kind::Tag {
            if let Some(target) = obj.tag_target {
                self.advertise_any_once(target.as_ref(), BStr::new(DOT_HAVE))?;
            }
        }
        Ok(())
    }

    /// Advertise a `.have` line for every id yielded by an alternate object
    /// source.
    pub fn include_additional_haves(
        &mut self,
        alternates: impl IntoIterator<Item = ObjectId>,
    ) -> Result<(), Error> {
        for id in alternates {
            self.advertise_have(id.as_ref())?;
        }
        Ok(())
    }

    /// Emit the capabilities-only line used when no ref produced output.
    ///
    /// The line carries the zero id of `hash` under the reserved name
    /// `capabilities^{}` so the peer still receives the capability section.
    pub fn advertise_capabilities_only(&mut self, hash: gix_hash::Kind) -> Result<(), Error> {
        let null = ObjectId::null(hash);
        self.advertise_id(null.as_ref(), BStr::new("capabilities^{}"))
    }

    /// Emit one advertisement line for `id` under `name`.
    ///
    /// This is the primitive behind every other emission. The first
    /// successful call flips the first-line flag and appends the capability
    /// section; the flag flips before the sink write, so a failing sink
    /// leaves the encoder in the emitting state.
    pub fn advertise_id(&mut self, id: &oid, name: &BStr) -> Result<(), Error> {
        if self.closed {
            return Err(Error::SinkClosed);
        }
        if name.find_byte(0).is_some() {
            return Err(Error::InvalidRefName {
                name: name.to_owned(),
            });
        }
        self.line.clear();
        self.line.push_str(id.to_hex().to_string());
        self.line.push_byte(b' ');
        self.line.push_str(name);
        if self.first {
            self.first = false;
            if !self.capabilities.is_empty() {
                self.line.push_byte(0);
                for cap in &self.capabilities {
                    self.line.push_byte(b' ');
                    self.line.push_str(cap);
                }
                self.line.push_byte(b' ');
            }
        }
        self.line.push_byte(b'\n');
        self.sink.write_line(self.line.as_bstr()).map_err(Error::from)
    }

    /// Whether no line has been emitted yet.
    pub fn is_empty(&self) -> bool {
        self.first
    }

    /// Terminate the stream.
    ///
    /// Legal in either state; afterwards every emission fails with
    /// [`Error::SinkClosed`].
    pub fn end(&mut self) -> Result<(), Error> {
        self.closed = true;
        self.sink.end().map_err(Error::from)
    }

    fn advertise_ref(&mut self, name: &BStr, id: &oid) -> Result<(), Error> {
        let Some(obj) = self.objects.parse_any(id) else {
            tracing::debug!(name = %name, id = %id, "skipping unresolvable ref");
            return Ok(());
        };
        self.advertise_any(&obj, name)?;
        if self.deref_tags && obj.kind == Kind::Tag {
            let mut peeled = name.to_owned();
            peeled.push_str("^{}");
            self.advertise_tag(&obj, peeled.as_bstr())?;
        }
        Ok(())
    }

    /// Chase a tag chain and emit the peeled companion line for the first
    /// non-tag object reached.
    ///
    /// Every intermediate target is marked advertised. A failed resolution
    /// anywhere in the chain omits the peeled line and nothing else.
    fn advertise_tag(&mut self, tag: &ResolvedObject, name: &BStr) -> Result<(), Error> {
        let mut obj = tag.clone();
        loop {
            let Some(target_id) = obj.tag_target else {
                return Ok(());
            };
            let Some(target) = self.objects.parse_headers(target_id.as_ref()) else {
                tracing::debug!(target = %target_id, "tag target unresolvable, omitting peeled line");
                return Ok(());
            };
            self.advertised.insert(target.id.as_ref());
            obj = target;
            if obj.kind != Kind::Tag {
                break;
            }
        }
        self.advertise_any(&obj, name)
    }

    fn advertise_any(&mut self, obj: &ResolvedObject, name: &BStr) -> Result<(), Error> {
        self.advertised.insert(obj.id.as_ref());
        self.advertise_id(obj.id.as_ref(), name)
    }

    fn advertise_any_once(&mut self, id: &oid, name: &BStr) -> Result<(), Error> {
        if self.advertised.contains(id) {
            return Ok(());
        }
        self.advertised.insert(id);
        self.advertise_id(id, name)
    }
}
