use std::io;
use std::path::PathBuf;

/// Everything that can stop a database build.
///
/// Every variant is terminal for the whole build: the artifacts reference each
/// other through offsets and ranges, so there is no partial-success mode.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("capacity exceeded: need to increase {limit} (currently {capacity}) to process")]
    CapacityExceeded { limit: &'static str, capacity: usize },

    #[error(
        "line {line}: phrase `{phrase}` has {characters} characters but {phones} phonetic tokens"
    )]
    LengthMismatch {
        line: usize,
        phrase: String,
        characters: usize,
        phones: usize,
    },

    #[error(
        "line {line}: `{phrase}`: `{character}` has no phone `{phone}` in the word list; \
         if the reading is correct, add this entry to the exception table:\n{snippet}"
    )]
    UnresolvedWordReference {
        line: usize,
        phrase: String,
        character: String,
        phone: String,
        snippet: String,
    },

    #[error("duplicated phrase `{phrase}` with phones {phones}")]
    DuplicatePhrase { phrase: String, phones: String },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("memory allocation failed while constructing the phrase tree")]
    OutOfMemory,

    #[error("config error: {0}")]
    Config(String),

    #[error("corrupt index: {0}")]
    CorruptIndex(String),
}

impl BuildError {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        BuildError::Parse {
            line,
            message: message.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        BuildError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<std::collections::TryReserveError> for BuildError {
    fn from(_: std::collections::TryReserveError) -> Self {
        BuildError::OutOfMemory
    }
}

pub type Result<T> = std::result::Result<T, BuildError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_message_names_the_constant() {
        let err = BuildError::CapacityExceeded {
            limit: "MAX_WORD_DATA",
            capacity: 60000,
        };
        let msg = err.to_string();
        assert!(msg.contains("MAX_WORD_DATA"));
        assert!(msg.contains("60000"));
    }

    #[test]
    fn io_error_names_the_path() {
        let err = BuildError::io(
            "/nowhere/tsi.src",
            io::Error::new(io::ErrorKind::NotFound, "gone"),
        );
        assert!(err.to_string().starts_with("/nowhere/tsi.src"));
    }
}
