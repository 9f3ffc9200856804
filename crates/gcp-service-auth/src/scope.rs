//! [`Scope`] and [`Scopes`] for the OAuth scopes a BigQuery client can request.

use std::fmt;

macro_rules! define_scopes {
    (
        $(#[$attr:meta])*
        pub enum Scope { $($variant:ident = ($int:literal, $const_name:ident, $uri:literal)),* $(,)? }
    ) => {
        $(#[$attr])*
        #[repr(u8)]
        pub enum Scope {
            $(
                $variant = $int,
            )*
        }

        bitflags::bitflags! {
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
            pub struct Scopes: u8 {
                $(
                    const $const_name = $int;
                )*
            }
        }

        impl From<Scope> for Scopes {
            #[inline]
            fn from(scope: Scope) -> Scopes {
                Scopes::from_bits_retain(scope as u8)
            }
        }

        impl Scope {
            #[inline]
            pub const fn scope_uri(&self) -> &'static str {
                match self {
                    $(
                        Self::$variant => $uri,
                    )*
                }
            }

            #[inline]
            pub const fn from_int(int: u8) -> Option<Self> {
                match int {
                    $(
                        $int => Some(Self::$variant),
                    )*
                    _ => None,
                }
            }
        }
    };
}

define_scopes! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub enum Scope {
        BigQuery              = (0x01, BIG_QUERY, "https://www.googleapis.com/auth/bigquery"),
        BigQueryReadOnly      = (0x02, BIG_QUERY_READ_ONLY, "https://www.googleapis.com/auth/bigquery.readonly"),
        BigQueryInsertData    = (0x04, BIG_QUERY_INSERT_DATA, "https://www.googleapis.com/auth/bigquery.insertdata"),
        CloudPlatform         = (0x08, CLOUD_PLATFORM, "https://www.googleapis.com/auth/cloud-platform"),
        CloudPlatformReadOnly = (0x10, CLOUD_PLATFORM_READ_ONLY, "https://www.googleapis.com/auth/cloud-platform.read-only"),
    }
}

impl Default for Scopes {
    /// Full BigQuery access, the scope every client uses unless told otherwise.
    fn default() -> Self {
        Scopes::BIG_QUERY
    }
}

impl Scopes {
    #[inline]
    pub fn iter_scopes(self) -> impl Iterator<Item = Scope> {
        self.into_iter()
            .filter_map(|flag| Scope::from_int(flag.bits()))
    }

    /// Space separated scope URIs, the format the OAuth `scope` claim expects.
    pub fn display_uris(self) -> impl fmt::Display {
        ConcatScopeUris(self)
    }
}

struct ConcatScopeUris(Scopes);

impl fmt::Display for ConcatScopeUris {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, scope) in self.0.iter_scopes().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }

            f.write_str(scope.scope_uri())?;
        }

        Ok(())
    }
}

pub(crate) fn serialize_scope_uris<S>(scopes: &Scopes, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_str(&scopes.display_uris())
}
