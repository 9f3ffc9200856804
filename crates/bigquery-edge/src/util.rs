use std::fmt::Display;

use url::Url;

/// Logs the warning attached to operations whose interface may still change.
#[inline]
pub(crate) fn experimental(operation: &'static str) {
    warn!("[EXPERIMENTAL] {operation} is experimental and its interface may change in the future");
}

/// Collects optional query parameters, only touching the url if at least one is present (so
/// we never end up with a dangling `?`).
#[derive(Debug, Default)]
pub(crate) struct QueryParams {
    pairs: Vec<(&'static str, String)>,
}

impl QueryParams {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn opt<T: Display>(mut self, key: &'static str, value: Option<T>) -> Self {
        if let Some(value) = value {
            self.pairs.push((key, value.to_string()));
        }
        self
    }

    pub(crate) fn apply(self, url: &mut Url) {
        if self.pairs.is_empty() {
            return;
        }

        url.query_pairs_mut()
            .extend_pairs(self.pairs.iter().map(|(key, value)| (*key, value.as_str())));
    }
}

/// BigQuery encodes int64s as strings, this accepts either form.
pub(crate) mod int64 {
    pub(crate) mod optional {
        use std::fmt;

        use serde::de;

        pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
        where
            D: de::Deserializer<'de>,
        {
            struct Visitor;

            impl<'vde> de::Visitor<'vde> for Visitor {
                type Value = Option<u64>;

                fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                    formatter.write_str("an optional int64, encoded as a string or number")
                }

                fn visit_none<E>(self) -> Result<Self::Value, E> {
                    Ok(None)
                }

                fn visit_unit<E>(self) -> Result<Self::Value, E> {
                    Ok(None)
                }

                fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
                where
                    D: de::Deserializer<'vde>,
                {
                    deserializer.deserialize_any(self)
                }

                fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E> {
                    Ok(Some(v))
                }

                fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
                where
                    E: de::Error,
                {
                    u64::try_from(v)
                        .map(Some)
                        .map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
                }

                fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
                where
                    E: de::Error,
                {
                    v.parse()
                        .map(Some)
                        .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
                }
            }

            deserializer.deserialize_option(Visitor)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_params_leave_url_untouched() {
        let mut url = Url::parse("https://example.com/datasets").unwrap();

        QueryParams::new()
            .opt::<u32>("maxResults", None)
            .opt::<&str>("pageToken", None)
            .apply(&mut url);

        assert_eq!(url.as_str(), "https://example.com/datasets");
    }

    #[test]
    fn test_present_params_are_encoded() {
        let mut url = Url::parse("https://example.com/datasets").unwrap();

        QueryParams::new()
            .opt("maxResults", Some(10))
            .opt::<&str>("pageToken", None)
            .opt("filter", Some("labels.team:data eng"))
            .apply(&mut url);

        assert_eq!(
            url.as_str(),
            "https://example.com/datasets?maxResults=10&filter=labels.team%3Adata+eng"
        );
    }

    #[test]
    fn test_int64_as_string_or_number() {
        #[derive(serde::Deserialize)]
        struct Wrapper {
            #[serde(default, with = "int64::optional")]
            n: Option<u64>,
        }

        let parse = |s: &str| serde_json::from_str::<Wrapper>(s).unwrap().n;

        assert_eq!(parse(r#"{"n": "42"}"#), Some(42));
        assert_eq!(parse(r#"{"n": 42}"#), Some(42));
        assert_eq!(parse(r#"{"n": null}"#), None);
        assert_eq!(parse(r#"{}"#), None);
    }
}
