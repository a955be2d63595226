/// Failure of a page or filtered-ids request.
///
/// `Cancelled` is not a failure: it marks a chain that was superseded or
/// disposed and is never reported to the user.
#[derive(Debug)]
pub enum LoadError {
    Cancelled,
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
    Status {
        code: u16,
        url: String,
    },
    Decode(String),
}

impl LoadError {
    pub fn transport(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        LoadError::Transport {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, LoadError::Cancelled)
    }
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::Cancelled => write!(f, "request cancelled"),
            LoadError::Transport { message, .. } => write!(f, "{message}"),
            LoadError::Status { code, url } => write!(f, "HTTP {code} from {url}"),
            LoadError::Decode(msg) => write!(f, "malformed response: {msg}"),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Transport {
                source: Some(source),
                ..
            } => Some(source.as_ref() as _),
            _ => None,
        }
    }
}
