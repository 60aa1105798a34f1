//! Record field resolution: tags, flattening, key matching, and unused-key tracking.

use std::collections::VecDeque;

use facet_core::{Field, FieldAttribute, FieldFlags, Shape};

use crate::decoder::Session;
use crate::error::{DecodeError, FieldErrorKind};
use crate::kind::Target;
use crate::slot::Slot;
use crate::{FieldPath, Value};

/// What a field's tag attribute says about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct FieldTag {
    /// Source key override. `None` means the field's own name.
    pub(crate) name: Option<&'static str>,
    pub(crate) squash: bool,
}

impl FieldTag {
    /// Reads `#[facet(<tag_name> = "name,opt,...")]` off a field. `#[facet(flatten)]` also
    /// counts as `squash`.
    pub(crate) fn parse(field: &Field, tag_name: &str) -> FieldTag {
        let mut tag = FieldTag {
            name: None,
            squash: field.flags.contains(FieldFlags::FLATTEN),
        };

        for attr in field.attributes {
            let FieldAttribute::Arbitrary(raw) = attr else {
                continue;
            };
            let raw: &'static str = *raw;
            let Some((key, body)) = raw.split_once('=') else {
                continue;
            };
            if key.trim() != tag_name {
                continue;
            }

            let body = body.trim().trim_matches('"');
            let mut parts = body.split(',');
            if let Some(name) = parts.next().map(str::trim).filter(|name| !name.is_empty()) {
                tag.name = Some(name);
            }
            if parts.any(|opt| opt.trim() == "squash") {
                tag.squash = true;
            }
        }

        tag
    }
}

/// Unicode case-insensitive comparison.
pub(crate) fn equal_fold(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

/// One struct whose fields take part in a record decode: the record itself, or a flattened
/// field of an earlier scope.
struct Scope {
    fields: &'static [Field],
    /// Scope index and field index this scope is flattened into.
    parent: Option<(usize, usize)>,
    slots: Vec<Option<Slot>>,
}

/// A field that gets its value from a source key.
struct Candidate {
    scope: usize,
    index: usize,
    key: &'static str,
    shape: &'static Shape,
    settable: bool,
}

impl Session<'_> {
    /// Walks the record and its flattened fields breadth-first, collecting decodable fields.
    fn resolve_fields(
        &mut self,
        path: &FieldPath,
        fields: &'static [Field],
    ) -> (Vec<Scope>, Vec<Candidate>) {
        let mut scopes = vec![Scope {
            fields,
            parent: None,
            slots: Vec::new(),
        }];
        let mut candidates = Vec::new();
        let mut queue = VecDeque::from([0]);

        while let Some(current) = queue.pop_front() {
            let fields = scopes[current].fields;
            for (index, field) in fields.iter().enumerate() {
                let tag = FieldTag::parse(field, self.tag_name);
                let shape = field.shape();

                if tag.squash {
                    match Target::describe(shape) {
                        Target::Record(inner) => {
                            log::debug!("Flattening field '{}' into '{path}'", field.name);
                            scopes.push(Scope {
                                fields: inner,
                                parent: Some((current, index)),
                                slots: Vec::new(),
                            });
                            queue.push_back(scopes.len() - 1);
                        }
                        _ => self.fail(
                            &path.field(field.name),
                            FieldErrorKind::UnsupportedSquash { shape },
                        ),
                    }
                    continue;
                }

                candidates.push(Candidate {
                    scope: current,
                    index,
                    key: tag.name.unwrap_or(field.name),
                    shape,
                    settable: !field.attributes.contains(&FieldAttribute::Arbitrary("skip")),
                });
            }
        }

        for scope in &mut scopes {
            scope.slots = (0..scope.fields.len()).map(|_| None).collect();
        }
        (scopes, candidates)
    }

    pub(crate) fn decode_record(
        &mut self,
        path: &FieldPath,
        value: &Value,
        fields: &'static [Field],
    ) -> Result<Slot, DecodeError> {
        let Value::Mapping(mapping) = value else {
            self.fail(
                path,
                FieldErrorKind::ShapeMismatch {
                    expected: "a mapping",
                    got: format!("'{}'", value.value_type()),
                },
            );
            return Ok(Slot::Keep);
        };

        let mut entries = Vec::with_capacity(mapping.len());
        for (key, item) in mapping.iter() {
            let Some(key) = key.as_str() else {
                self.fail(
                    path,
                    FieldErrorKind::ShapeMismatch {
                        expected: "a mapping with string keys",
                        got: format!("'{}' keys", key.value_type()),
                    },
                );
                return Ok(Slot::Keep);
            };
            entries.push((key, item));
        }
        let mut consumed = vec![false; entries.len()];

        let (mut scopes, candidates) = self.resolve_fields(path, fields);

        for candidate in candidates {
            let unconsumed = |matches: &dyn Fn(&str) -> bool| {
                entries
                    .iter()
                    .enumerate()
                    .position(|(i, (key, _))| !consumed[i] && matches(*key))
            };
            let found = unconsumed(&|key| key == candidate.key)
                .or_else(|| unconsumed(&|key| equal_fold(key, candidate.key)));
            let Some(i) = found else {
                continue;
            };
            consumed[i] = true;

            if !candidate.settable {
                log::debug!("Key '{}' matched skipped field at '{path}'", entries[i].0);
                continue;
            }

            let slot = self.decode(&path.field(candidate.key), entries[i].1, candidate.shape)?;
            scopes[candidate.scope].slots[candidate.index] = Some(slot);
        }

        let unused: Vec<&str> = entries
            .iter()
            .zip(&consumed)
            .filter(|(_, used)| !**used)
            .map(|((key, _), _)| *key)
            .collect();

        if !unused.is_empty() {
            log::debug!("Unused keys at '{path}': {unused:?}");
            if self.error_unused {
                let mut sorted: Vec<String> = unused.iter().map(|k| (*k).to_owned()).collect();
                sorted.sort();
                self.fail(path, FieldErrorKind::UnusedKeys(sorted));
            }
            if let Some(metadata) = self.metadata.as_deref_mut() {
                metadata
                    .unused
                    .extend(unused.iter().map(|key| path.field(key).to_string()));
            }
        }

        // flattened scopes always follow their parent
        while scopes.len() > 1 {
            let Some(scope) = scopes.pop() else { break };
            if let Some((parent, index)) = scope.parent {
                scopes[parent].slots[index] = Some(Slot::Record {
                    fields: scope.fields,
                    slots: scope.slots,
                });
            }
        }
        let root = scopes.remove(0);

        Ok(Slot::Record {
            fields: root.fields,
            slots: root.slots,
        })
    }
}

#[cfg(test)]
mod tests {
    use facet::Facet;
    use facet_core::{Type, UserType};

    use super::*;

    #[derive(Facet, Default)]
    struct Tagged {
        #[facet(mapstructure = "listen_addr")]
        addr: String,
        #[facet(mapstructure = ",squash")]
        squashed: Inner,
        #[facet(flatten)]
        flattened: Inner,
        #[facet(other = "ignored")]
        plain: u8,
    }

    #[derive(Facet, Default)]
    struct Inner {
        x: u8,
    }

    fn fields() -> &'static [Field] {
        match &Tagged::SHAPE.ty {
            Type::User(UserType::Struct(st)) => st.fields,
            _ => unreachable!(),
        }
    }

    #[test]
    fn tags_are_read_from_the_configured_attribute() {
        let fields = fields();
        assert_eq!(
            FieldTag::parse(&fields[0], "mapstructure"),
            FieldTag {
                name: Some("listen_addr"),
                squash: false,
            }
        );
        assert_eq!(
            FieldTag::parse(&fields[1], "mapstructure"),
            FieldTag {
                name: None,
                squash: true,
            }
        );
        assert!(FieldTag::parse(&fields[2], "mapstructure").squash);
        assert_eq!(FieldTag::parse(&fields[3], "mapstructure"), FieldTag::default());
        assert_eq!(
            FieldTag::parse(&fields[3], "other").name,
            Some("ignored")
        );
        assert_eq!(FieldTag::parse(&fields[0], "other"), FieldTag::default());
    }

    #[test]
    fn fold_is_case_insensitive_and_unicode_aware() {
        assert!(equal_fold("VString", "vstring"));
        assert!(equal_fold("ÉTÉ", "été"));
        assert!(!equal_fold("name", "names"));
    }
}
