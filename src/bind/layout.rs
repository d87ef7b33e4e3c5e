use {
    super::{
        Context, Part,
        decode::Source,
        header::{FromHeaders, HeaderSchema},
    },
    crate::{BoxError, Meta},
    serde::de::DeserializeOwned,
    std::{collections::BTreeMap, sync::Arc},
    thiserror::Error,
};

/// A request struct whose fields are decoded from the parts of a request.
///
/// Implementations list their fields once, at registration time. Most
/// structs are declared with [`bind_request!`](crate::bind_request), which
/// writes this impl from the field names.
pub trait BindRequest: Default + Send + 'static {
    fn layout(layout: &mut Layout<Self>);
}

/// Handlers taking only the context bind no fields.
impl BindRequest for () {
    fn layout(_: &mut Layout<Self>) {}
}

/// Options parsed from an entry's `bind` tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BindOptions {
    /// Leave the buffered body readable after decoding it.
    pub reuse_body: bool,
    /// Keep the zero value instead of failing the request.
    pub ignore_error: bool,
}

/// A problem found while validating a request layout.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutIssue {
    #[error("field `{path}` is not one of Body, Query, Uri, Header, Meta, Context")]
    Unrecognized { path: String },

    #[error("field `{path}` names {part}; spell it `{part}`, `{}` or `{}`", .part.field_name(), .part.field_name().to_ascii_uppercase())]
    Miscased { path: String, part: Part },

    #[error("{part} is bound twice, by `{first}` and `{second}`")]
    Duplicate {
        part: Part,
        first: String,
        second: String,
    },

    #[error("unknown bind option `{option}` on `{path}`")]
    UnknownOption { path: String, option: String },

    #[error("bind option `{option}` does not apply to {part} field `{path}`")]
    OptionNotApplicable {
        path: String,
        option: String,
        part: Part,
    },

    #[error("header field `{path}`: {reason}")]
    Header { path: String, reason: String },
}

pub(crate) type Setter<R> =
    Arc<dyn Fn(&mut R, &mut Source, &BindOptions) -> Result<(), BoxError> + Send + Sync>;

pub(crate) struct Entry<R> {
    pub(crate) part: Part,
    pub(crate) path: String,
    pub(crate) options: BindOptions,
    pub(crate) setter: Setter<R>,
}

/// Registration-time builder of a request struct's fields.
///
/// Each method records one field and the part it is decoded from. Nested
/// request structs are flattened with [`Layout::embed`]. Problems are
/// collected rather than raised, and reported together by the binder.
pub struct Layout<R> {
    prefix: String,
    entries: Vec<Entry<R>>,
    issues: Vec<LayoutIssue>,
}

/// Returned by every [`Layout`] method to attach a `bind` tag.
pub struct EntryBuilder<'a, R> {
    layout: &'a mut Layout<R>,
    index: usize,
}

impl<R: 'static> Layout<R> {
    pub(crate) fn new() -> Self {
        Self::with_prefix(String::new())
    }

    fn with_prefix(prefix: String) -> Self {
        Layout {
            prefix,
            entries: Vec::new(),
            issues: Vec::new(),
        }
    }

    fn path(&self, name: &str) -> String {
        format!("{}{}", self.prefix, name)
    }

    /// JSON request body.
    pub fn body<V, F>(&mut self, accessor: F) -> EntryBuilder<'_, R>
    where
        V: DeserializeOwned + Send + 'static,
        F: Fn(&mut R) -> &mut V + Send + Sync + 'static,
    {
        let setter: Setter<R> = Arc::new(
            move |target: &mut R, source: &mut Source, options: &BindOptions| -> Result<(), BoxError> {
                let bytes = source.take_body(options.reuse_body)?;
                *accessor(target) = serde_json::from_slice::<V>(&bytes)?;
                Ok(())
            },
        );
        self.push(Part::Body, "body", setter)
    }

    /// URL query string.
    pub fn query<V, F>(&mut self, accessor: F) -> EntryBuilder<'_, R>
    where
        V: DeserializeOwned + Send + 'static,
        F: Fn(&mut R) -> &mut V + Send + Sync + 'static,
    {
        let setter: Setter<R> = Arc::new(
            move |target: &mut R, source: &mut Source, _: &BindOptions| -> Result<(), BoxError> {
                *accessor(target) = source.query::<V>()?;
                Ok(())
            },
        );
        self.push(Part::Query, "query", setter)
    }

    /// Path parameters of the matched route. The field must be a struct or
    /// a map.
    pub fn uri<V, F>(&mut self, accessor: F) -> EntryBuilder<'_, R>
    where
        V: DeserializeOwned + Send + 'static,
        F: Fn(&mut R) -> &mut V + Send + Sync + 'static,
    {
        let setter: Setter<R> = Arc::new(
            move |target: &mut R, source: &mut Source, _: &BindOptions| -> Result<(), BoxError> {
                *accessor(target) = source.path_params::<V>()?;
                Ok(())
            },
        );
        self.push(Part::Uri, "uri", setter)
    }

    /// Request headers, read through the header decoder.
    pub fn header<V, F>(&mut self, accessor: F) -> EntryBuilder<'_, R>
    where
        V: FromHeaders,
        F: Fn(&mut R) -> &mut V + Send + Sync + 'static,
    {
        let (schema, problems) = HeaderSchema::<V>::build();
        let path = self.path("header");
        self.issues.extend(problems.into_iter().map(|reason| LayoutIssue::Header {
            path: path.clone(),
            reason,
        }));

        let setter: Setter<R> = Arc::new(
            move |target: &mut R, source: &mut Source, _: &BindOptions| -> Result<(), BoxError> {
                *accessor(target) = schema.decode(source.headers())?;
                Ok(())
            },
        );
        self.push(Part::Header, "header", setter)
    }

    /// The metadata bag set by upstream middleware.
    pub fn meta<F>(&mut self, accessor: F) -> EntryBuilder<'_, R>
    where
        F: Fn(&mut R) -> &mut Meta + Send + Sync + 'static,
    {
        let setter: Setter<R> = Arc::new(
            move |target: &mut R, source: &mut Source, _: &BindOptions| -> Result<(), BoxError> {
                *accessor(target) = source.meta();
                Ok(())
            },
        );
        self.push(Part::Meta, "meta", setter)
    }

    /// A copy of the request [`Context`].
    pub fn context<F>(&mut self, accessor: F) -> EntryBuilder<'_, R>
    where
        F: Fn(&mut R) -> &mut Context + Send + Sync + 'static,
    {
        let setter: Setter<R> = Arc::new(
            move |target: &mut R, source: &mut Source, _: &BindOptions| -> Result<(), BoxError> {
                *accessor(target) = source.context();
                Ok(())
            },
        );
        self.push(Part::Context, "context", setter)
    }

    /// Flattens the fields of a nested request struct into this layout.
    /// Its paths are prefixed with `name.`.
    pub fn embed<E, F>(&mut self, name: &str, accessor: F) -> &mut Self
    where
        E: BindRequest,
        F: Fn(&mut R) -> &mut E + Send + Sync + 'static,
    {
        let mut inner = Layout::<E>::with_prefix(format!("{}{}.", self.prefix, name));
        E::layout(&mut inner);
        self.issues.append(&mut inner.issues);

        let accessor = Arc::new(accessor);
        for entry in inner.entries {
            let accessor = Arc::clone(&accessor);
            let setter = entry.setter;
            self.entries.push(Entry {
                part: entry.part,
                path: entry.path,
                options: entry.options,
                setter: Arc::new(
                    move |target: &mut R, source: &mut Source, options: &BindOptions| {
                        (*setter)((*accessor)(target), source, options)
                    },
                ),
            });
        }
        self
    }

    /// Records a field that maps to no part.
    pub fn unrecognized(&mut self, name: &str) -> &mut Self {
        let path = self.path(name);
        let issue = match Part::from_field_name(name) {
            Some(part) => LayoutIssue::Miscased { path, part },
            None => LayoutIssue::Unrecognized { path },
        };
        self.issues.push(issue);
        self
    }

    fn push(&mut self, part: Part, name: &str, setter: Setter<R>) -> EntryBuilder<'_, R> {
        let path = self.path(name);
        self.entries.push(Entry {
            part,
            path,
            options: BindOptions::default(),
            setter,
        });
        let index = self.entries.len() - 1;
        EntryBuilder {
            layout: self,
            index,
        }
    }

    /// Validates the collected fields and orders them by decode order.
    pub(crate) fn finish(mut self) -> Result<FieldLayout<R>, Vec<LayoutIssue>> {
        let mut seen: BTreeMap<Part, &str> = BTreeMap::new();
        let mut duplicates = Vec::new();
        for entry in &self.entries {
            if let Some(first) = seen.insert(entry.part, &entry.path) {
                duplicates.push(LayoutIssue::Duplicate {
                    part: entry.part,
                    first: first.to_string(),
                    second: entry.path.clone(),
                });
            }
        }
        self.issues.extend(duplicates);
        if !self.issues.is_empty() {
            return Err(self.issues);
        }

        self.entries.sort_by_key(|entry| entry.part);
        Ok(FieldLayout {
            entries: self.entries,
        })
    }
}

impl<R> EntryBuilder<'_, R> {
    /// Applies a comma-separated `bind` tag: `reuse_body`, `ignore_error`.
    pub fn tag(self, tag: &str) -> Self {
        let entry = &mut self.layout.entries[self.index];
        let (part, path) = (entry.part, entry.path.clone());
        for option in tag.split(',').map(str::trim).filter(|o| !o.is_empty()) {
            let applies = match option {
                "reuse_body" => part == Part::Body,
                "ignore_error" => part.can_fail(),
                _ => {
                    self.layout.issues.push(LayoutIssue::UnknownOption {
                        path: path.clone(),
                        option: option.to_string(),
                    });
                    continue;
                }
            };
            if !applies {
                self.layout.issues.push(LayoutIssue::OptionNotApplicable {
                    path: path.clone(),
                    option: option.to_string(),
                    part,
                });
                continue;
            }
            let options = &mut self.layout.entries[self.index].options;
            match option {
                "reuse_body" => options.reuse_body = true,
                _ => options.ignore_error = true,
            }
        }
        self
    }
}

/// The validated, flattened fields of a request struct in decode order.
///
/// Built once per route and shared read-only by every request.
pub struct FieldLayout<R> {
    pub(crate) entries: Vec<Entry<R>>,
}

impl<R> FieldLayout<R> {
    /// `(part, path)` of every field, in decode order.
    pub fn parts(&self) -> impl Iterator<Item = (Part, &str)> {
        self.entries.iter().map(|entry| (entry.part, entry.path.as_str()))
    }

    pub fn contains(&self, part: Part) -> bool {
        self.entries.iter().any(|entry| entry.part == part)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<R: BindRequest> FieldLayout<R> {
    /// Walks `R`'s fields and validates them.
    pub fn of() -> Result<Self, Vec<LayoutIssue>> {
        let mut layout = Layout::<R>::new();
        R::layout(&mut layout);
        layout.finish()
    }
}
