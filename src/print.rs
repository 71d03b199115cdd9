use crate::field::AnyField;
use std::{fmt, io, str::FromStr};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PrintError {
    #[error(
        "unknown format '{0}'. known values are 'short-bash', 'long-bash', 'short-dockerfile' and 'long-dockerfile'"
    )]
    UnknownFormat(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Output format for printing the declared fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Format {
    /// `NAME="value"` lines
    ShortBash,
    /// `NAME="value"` lines, each preceded by a description comment
    LongBash,
    /// One `ENV` instruction with a continuation line per field
    ShortDockerfile,
    /// One `ENV NAME value` instruction per field, each preceded by a description comment
    LongDockerfile,
}

impl Format {
    pub const ALL: [Format; 4] = [
        Format::ShortBash,
        Format::LongBash,
        Format::ShortDockerfile,
        Format::LongDockerfile,
    ];
}

impl FromStr for Format {
    type Err = PrintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "short-bash" => Ok(Self::ShortBash),
            "long-bash" => Ok(Self::LongBash),
            "short-dockerfile" => Ok(Self::ShortDockerfile),
            "long-dockerfile" => Ok(Self::LongDockerfile),
            _ => Err(PrintError::UnknownFormat(s.to_string())),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShortBash => write!(f, "short-bash"),
            Self::LongBash => write!(f, "long-bash"),
            Self::ShortDockerfile => write!(f, "short-dockerfile"),
            Self::LongDockerfile => write!(f, "long-dockerfile"),
        }
    }
}

pub(crate) fn print<'a, W: io::Write>(
    w: &mut W,
    fields: impl IntoIterator<Item = &'a dyn AnyField>,
    format: Format,
) -> io::Result<()> {
    let fields = fields.into_iter();
    match format {
        Format::ShortBash => {
            for field in fields {
                writeln!(w, "{}=\"{}\"", field.name(), field.get_raw_or_default())?;
            }
        }
        Format::LongBash => {
            for field in fields {
                writeln!(w)?;
                writeln!(w, "# {}", field.description())?;
                writeln!(w, "{}=\"{}\"", field.name(), field.get_raw_or_default())?;
            }
        }
        Format::ShortDockerfile => {
            let mut printed = false;
            for field in fields {
                if printed {
                    write!(w, " \\\n    ")?;
                } else {
                    write!(w, "ENV ")?;
                }
                write!(w, "{}=\"{}\"", field.name(), field.get_raw_or_default())?;
                printed = true;
            }
            if printed {
                writeln!(w)?;
            }
        }
        Format::LongDockerfile => {
            for field in fields {
                writeln!(w)?;
                writeln!(w, "# {}", field.description())?;
                writeln!(w, "ENV {} {}", field.name(), field.get_raw_or_default())?;
            }
        }
    }
    Ok(())
}
