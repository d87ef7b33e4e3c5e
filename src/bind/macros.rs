/// Declares a request struct and its [`BindRequest`](crate::BindRequest)
/// impl.
///
/// Field names select the part they are decoded from: `body`, `query`,
/// `uri`, `header`, `meta` and `context`, in lower, Pascal or upper case.
/// A field marked `#[embed]` is a
/// nested request struct whose fields are flattened into this one. A
/// `#[bind("...")]` attribute carries bind options (`reuse_body`,
/// `ignore_error`). Any other field name is reported when the handler is
/// bound.
///
/// The struct derives `Default`; other derives are passed through.
///
/// ```rust
/// use axum_bind::{Context, FromHeaders, HeaderFields, Meta, bind_request};
/// use serde::Deserialize;
///
/// #[derive(Debug, Default, Deserialize)]
/// pub struct Paging {
///     pub page: u32,
/// }
///
/// #[derive(Debug, Default)]
/// pub struct Client {
///     pub version: u32,
/// }
///
/// impl FromHeaders for Client {
///     fn header_fields(fields: &mut HeaderFields<Self>) {
///         fields.field("x-app-version", |c: &mut Self| &mut c.version);
///     }
/// }
///
/// bind_request! {
///     #[derive(Debug)]
///     pub struct Common {
///         pub header: Client,
///         pub meta: Meta,
///     }
/// }
///
/// bind_request! {
///     #[derive(Debug)]
///     pub struct ListOrders {
///         #[embed]
///         pub common: Common,
///         #[bind("ignore_error")]
///         pub query: Paging,
///         pub context: Context,
///     }
/// }
/// ```
#[macro_export]
macro_rules! bind_request {
    (@field $layout:ident, [embed] $field:ident) => {
        $layout.embed(stringify!($field), |r: &mut Self| &mut r.$field);
    };
    (@field $layout:ident, [bind ($tag:literal)] $field:ident) => {
        $crate::bind_request!(@part $layout, $field, $tag);
    };
    (@field $layout:ident, [] $field:ident) => {
        $crate::bind_request!(@part $layout, $field);
    };
    (@field $layout:ident, [$other:ident $($rest:tt)*] $field:ident) => {
        compile_error!(concat!(
            "unsupported attribute `",
            stringify!($other),
            "` on field `",
            stringify!($field),
            "`; expected #[embed] or #[bind(\"...\")]"
        ));
    };

    (@part $layout:ident, body $(, $tag:literal)?) => {
        $crate::bind_request!(@bind $layout, body, body $(, $tag)?);
    };
    (@part $layout:ident, Body $(, $tag:literal)?) => {
        $crate::bind_request!(@bind $layout, body, Body $(, $tag)?);
    };
    (@part $layout:ident, BODY $(, $tag:literal)?) => {
        $crate::bind_request!(@bind $layout, body, BODY $(, $tag)?);
    };
    (@part $layout:ident, query $(, $tag:literal)?) => {
        $crate::bind_request!(@bind $layout, query, query $(, $tag)?);
    };
    (@part $layout:ident, Query $(, $tag:literal)?) => {
        $crate::bind_request!(@bind $layout, query, Query $(, $tag)?);
    };
    (@part $layout:ident, QUERY $(, $tag:literal)?) => {
        $crate::bind_request!(@bind $layout, query, QUERY $(, $tag)?);
    };
    (@part $layout:ident, uri $(, $tag:literal)?) => {
        $crate::bind_request!(@bind $layout, uri, uri $(, $tag)?);
    };
    (@part $layout:ident, Uri $(, $tag:literal)?) => {
        $crate::bind_request!(@bind $layout, uri, Uri $(, $tag)?);
    };
    (@part $layout:ident, URI $(, $tag:literal)?) => {
        $crate::bind_request!(@bind $layout, uri, URI $(, $tag)?);
    };
    (@part $layout:ident, header $(, $tag:literal)?) => {
        $crate::bind_request!(@bind $layout, header, header $(, $tag)?);
    };
    (@part $layout:ident, Header $(, $tag:literal)?) => {
        $crate::bind_request!(@bind $layout, header, Header $(, $tag)?);
    };
    (@part $layout:ident, HEADER $(, $tag:literal)?) => {
        $crate::bind_request!(@bind $layout, header, HEADER $(, $tag)?);
    };
    (@part $layout:ident, meta $(, $tag:literal)?) => {
        $crate::bind_request!(@bind $layout, meta, meta $(, $tag)?);
    };
    (@part $layout:ident, Meta $(, $tag:literal)?) => {
        $crate::bind_request!(@bind $layout, meta, Meta $(, $tag)?);
    };
    (@part $layout:ident, META $(, $tag:literal)?) => {
        $crate::bind_request!(@bind $layout, meta, META $(, $tag)?);
    };
    (@part $layout:ident, context $(, $tag:literal)?) => {
        $crate::bind_request!(@bind $layout, context, context $(, $tag)?);
    };
    (@part $layout:ident, Context $(, $tag:literal)?) => {
        $crate::bind_request!(@bind $layout, context, Context $(, $tag)?);
    };
    (@part $layout:ident, CONTEXT $(, $tag:literal)?) => {
        $crate::bind_request!(@bind $layout, context, CONTEXT $(, $tag)?);
    };
    (@part $layout:ident, $other:ident $(, $tag:literal)?) => {
        $layout.unrecognized(stringify!($other));
    };

    (@bind $layout:ident, $method:ident, $field:ident $(, $tag:literal)?) => {
        $layout.$method(|r: &mut Self| &mut r.$field)$(.tag($tag))?;
    };

    (
        $(#[$attr:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$kind:ident $(($tag:literal))?])?
                $fvis:vis $field:ident : $ty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$attr])*
        #[derive(Default)]
        $vis struct $name {
            $($fvis $field: $ty,)*
        }

        impl $crate::BindRequest for $name {
            fn layout(layout: &mut $crate::Layout<Self>) {
                $($crate::bind_request!(@field layout, [$($kind $(($tag))?)?] $field);)*
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::{Context, FieldLayout, LayoutIssue, Meta, Part};
    use serde::Deserialize;
    use std::collections::HashMap;

    #[derive(Debug, Default, Deserialize)]
    struct Paging {
        #[allow(dead_code)]
        page: u32,
    }

    bind_request! {
        #[derive(Debug)]
        struct Common {
            meta: Meta,
        }
    }

    bind_request! {
        #[derive(Debug)]
        struct Full {
            #[embed]
            common: Common,
            #[bind("reuse_body")]
            body: HashMap<String, String>,
            query: Paging,
            uri: HashMap<String, String>,
            context: Context,
        }
    }

    bind_request! {
        struct Misnamed {
            body: String,
            cookie: String,
        }
    }

    bind_request! {
        struct Twice {
            #[embed]
            first: Common,
            #[embed]
            second: Common,
        }
    }

    #[test]
    fn test_macro_layout() {
        let layout = FieldLayout::<Full>::of().unwrap();
        let parts: Vec<_> = layout.parts().collect();
        assert_eq!(
            parts,
            vec![
                (Part::Body, "body"),
                (Part::Query, "query"),
                (Part::Uri, "uri"),
                (Part::Meta, "common.meta"),
                (Part::Context, "context"),
            ]
        );
    }

    #[test]
    fn test_macro_unrecognized_field() {
        let issues = FieldLayout::<Misnamed>::of().err().unwrap();
        assert_eq!(
            issues,
            vec![LayoutIssue::Unrecognized {
                path: "cookie".into()
            }]
        );
    }

    bind_request! {
        #[allow(non_snake_case)]
        struct PascalCase {
            #[bind("reuse_body")]
            Body: HashMap<String, String>,
            Query: Paging,
            URI: HashMap<String, String>,
            Meta: Meta,
        }
    }

    bind_request! {
        #[allow(non_snake_case)]
        struct OddCase {
            bOdY: String,
        }
    }

    #[test]
    fn test_macro_part_names_ignore_case() {
        let layout = FieldLayout::<PascalCase>::of().unwrap();
        let parts: Vec<_> = layout.parts().collect();
        assert_eq!(
            parts,
            vec![
                (Part::Body, "Body"),
                (Part::Query, "Query"),
                (Part::Uri, "URI"),
                (Part::Meta, "Meta"),
            ]
        );
    }

    #[test]
    fn test_macro_mixed_case_part_name_is_reported() {
        let issues = FieldLayout::<OddCase>::of().err().unwrap();
        assert_eq!(
            issues,
            vec![LayoutIssue::Miscased {
                path: "bOdY".into(),
                part: Part::Body,
            }]
        );
    }

    #[test]
    fn test_macro_duplicate_through_embedding() {
        let issues = FieldLayout::<Twice>::of().err().unwrap();
        assert_eq!(
            issues,
            vec![LayoutIssue::Duplicate {
                part: Part::Meta,
                first: "first.meta".into(),
                second: "second.meta".into(),
            }]
        );
    }

    #[test]
    fn test_macro_struct_derives_default() {
        let full = Full::default();
        assert!(full.body.is_empty());
        assert!(full.common.meta.is_empty());
    }
}
