use colored::*;
use std::{fmt, io};

use crate::typing::ty::Ty;

pub type SmithResult<T = ()> = Result<T, SmithError>;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum SmithErrorKind {
    ExhaustedCandidates,
    SelfReferentialType,
    LookupMiss,
    Config,
    IO,
}

impl fmt::Display for SmithErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                SmithErrorKind::ExhaustedCandidates => "generation error",
                SmithErrorKind::SelfReferentialType => "type error",
                SmithErrorKind::LookupMiss => "internal error",
                SmithErrorKind::Config => "config error",
                SmithErrorKind::IO => "i/o error",
            }
        )
    }
}

#[derive(Debug)]
pub struct SmithError {
    pub msg: String,
    pub seed: Option<u64>,
    pub kind: SmithErrorKind,
}

impl SmithError {
    pub fn exhausted(seed: u64, ty: &Ty) -> SmithError {
        SmithError {
            msg: format!("no construct can fill a hole of type `{}`", ty),
            seed: Some(seed),
            kind: SmithErrorKind::ExhaustedCandidates,
        }
    }

    pub fn self_referential(name: &str, field: &str) -> SmithError {
        SmithError {
            msg: format!(
                "struct `{}` contains itself through field `{}` without an owning indirection",
                name, field
            ),
            seed: None,
            kind: SmithErrorKind::SelfReferentialType,
        }
    }

    pub fn lookup_miss(name: &str) -> SmithError {
        SmithError {
            msg: format!("`{}` is not declared in any visible scope", name),
            seed: None,
            kind: SmithErrorKind::LookupMiss,
        }
    }

    pub fn config(msg: String) -> SmithError {
        SmithError {
            msg,
            seed: None,
            kind: SmithErrorKind::Config,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> SmithError {
        self.seed.get_or_insert(seed);
        self
    }

    pub fn emit(&self) {
        let kind = format!("{}:", self.kind);
        eprintln!("{} {}", kind.bold().red(), self.msg.bold());
        if let Some(seed) = self.seed {
            eprintln!(" {} seed {}", "-->".bold(), seed);
        }
        eprintln!()
    }
}

impl fmt::Display for SmithError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.seed {
            Some(seed) => write!(f, "{}: {} (seed {})", self.kind, self.msg, seed),
            None => write!(f, "{}: {}", self.kind, self.msg),
        }
    }
}

impl std::error::Error for SmithError {}

impl From<io::Error> for SmithError {
    fn from(err: io::Error) -> SmithError {
        SmithError {
            msg: err.to_string(),
            seed: None,
            kind: SmithErrorKind::IO,
        }
    }
}

impl From<toml::de::Error> for SmithError {
    fn from(err: toml::de::Error) -> SmithError {
        SmithError {
            msg: err.to_string(),
            seed: None,
            kind: SmithErrorKind::Config,
        }
    }
}
