use std::fmt;

/// Phases the crawl coordinator moves through during one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CrawlPhase {
    Init,
    Seeding,
    Looping,
    Draining,
    Done,
}

impl CrawlPhase {
    /// Returns the phase that follows this one, or None once done
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Init => Some(Self::Seeding),
            Self::Seeding => Some(Self::Looping),
            Self::Looping => Some(Self::Draining),
            Self::Draining => Some(Self::Done),
            Self::Done => None,
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::Seeding => "seeding",
            Self::Looping => "looping",
            Self::Draining => "draining",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}
