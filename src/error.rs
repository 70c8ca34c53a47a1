use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, CardError>;

#[derive(thiserror::Error, Debug)]
pub enum CardError {
    #[error("current xp cannot be greater than required xp, {current} > {max}")]
    XpExceedsMax { current: u64, max: u64 },

    #[error("invalid color for {field}: {value:?}")]
    InvalidColor { field: &'static str, value: String },

    #[error("bar gradient needs at least one color stop")]
    EmptyGradient,

    #[error("gradient stop position {0} is outside of [0, 1]")]
    StopOutOfRange(f32),

    #[error("font family for {0} is empty")]
    EmptyFontFamily(&'static str),

    #[error("image reference for {0} is empty")]
    EmptyImageReference(&'static str),

    #[error("radius must be a positive number, got {0}")]
    InvalidRadius(f64),

    #[error("font family {0:?} was never registered")]
    FontNotRegistered(String),

    #[error("font family {0:?} is not available on this system")]
    FontUnavailable(String),

    #[error("cannot read font file {path:?}: {source}")]
    FontIo {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Backend failure. piet errors are not `Send`, only their message is kept.
    #[error("render error: {0}")]
    Render(String),

    #[error("encode error: {0}")]
    Encode(#[from] image::ImageError),

    #[error("cannot read config {path:?}: {source}")]
    ConfigIo {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

impl From<piet_common::Error> for CardError {
    fn from(e: piet_common::Error) -> Self {
        Self::Render(e.to_string())
    }
}

impl CardError {
    pub(crate) fn invalid_color(field: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidColor {
            field,
            value: value.into(),
        }
    }

    /// Whether the error comes from model validation, i.e. before any drawing happened.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::XpExceedsMax { .. }
                | Self::InvalidColor { .. }
                | Self::EmptyGradient
                | Self::StopOutOfRange(_)
                | Self::EmptyFontFamily(_)
                | Self::EmptyImageReference(_)
                | Self::InvalidRadius(_)
        )
    }
}

#[test]
fn test_validation_errors_are_flagged() {
    assert!(CardError::XpExceedsMax { current: 2, max: 1 }.is_validation());
    assert!(CardError::invalid_color("username", "#zz").is_validation());
    assert!(!CardError::FontNotRegistered("Fredoka Bold".into()).is_validation());
}

#[test]
fn test_xp_error_message() {
    let err = CardError::XpExceedsMax {
        current: 120,
        max: 100,
    };
    assert_eq!(
        err.to_string(),
        "current xp cannot be greater than required xp, 120 > 100"
    );
}

#[test]
fn test_error_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync + 'static>() {}
    assert_send_sync::<CardError>();

    let err: anyhow::Error = CardError::from(piet_common::Error::NotSupported).into();
    assert!(err.to_string().starts_with("render error"));
}
