use strum::IntoEnumIterator;

/// Canonical classification of a [`StructuredError`](crate::StructuredError).
///
/// Each kind pairs an HTTP-style status code with the symbolic name carried
/// on the wire. `Display`, `FromStr` and `AsRef<str>` all operate on the
/// symbolic name (e.g. `"***NOT FOUND***"`).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::AsRefStr,
    strum_macros::IntoStaticStr,
    strum_macros::EnumIter,
)]
pub enum Kind {
    #[strum(serialize = "***BAD REQUEST***")]
    BadRequest,
    #[strum(serialize = "***UNAUTHORIZED***")]
    Unauthorized,
    #[strum(serialize = "***FORBIDDEN***")]
    Forbidden,
    #[strum(serialize = "***NOT FOUND***")]
    NotFound,
    #[strum(serialize = "***NOT ACCEPTABLE***")]
    NotAcceptable,
    #[strum(serialize = "***TIMEOUT***")]
    Timeout,
    #[strum(serialize = "***TOO EARLY***")]
    TooEarly,
    #[strum(serialize = "***TOO MANY REQUEST***")]
    TooManyRequests,
    #[strum(serialize = "***SERVICE EXECUTE FAILED***")]
    ServiceError,
    #[strum(serialize = "***SERVICE NOT IMPLEMENTED***")]
    NotImplemented,
    #[strum(serialize = "***SERVICE UNAVAILABLE***")]
    Unavailable,
    #[strum(serialize = "***WARNING***")]
    Warning,
}

impl Kind {
    pub const fn code(self) -> i32 {
        match self {
            Self::BadRequest => 400,
            Self::Unauthorized => 401,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::NotAcceptable => 406,
            Self::Timeout => 408,
            Self::TooEarly => 425,
            Self::TooManyRequests => 429,
            Self::ServiceError => 500,
            Self::NotImplemented => 501,
            Self::Unavailable => 503,
            Self::Warning => 555,
        }
    }

    pub fn name(self) -> &'static str {
        self.into()
    }

    pub fn from_code(code: i32) -> Option<Self> {
        Self::iter().find(|kind| kind.code() == code)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        name.parse().ok()
    }

    /// Resolves a `(code, name)` pair; both halves must agree.
    pub fn from_parts(code: i32, name: &str) -> Option<Self> {
        Self::from_code(code).filter(|kind| kind.name() == name)
    }
}
