//! Route → feed registry.
//!
//! Each subway route is served by exactly one realtime feed partition.
//! Resolving routes to feeds deduplicates, so a feed shared by several
//! requested routes is fetched once.

use std::collections::BTreeSet;

use crate::error::UnknownRouteError;

/// A realtime trip-update feed partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Feed {
    /// 1 2 3 4 5 6 and the 42 St shuttle.
    Numbered,
    Flushing,
    Ace,
    Bdfm,
    Crosstown,
    Nassau,
    Canarsie,
    Broadway,
    StatenIsland,
}

impl Feed {
    pub const ALL: [Feed; 9] = [
        Feed::Numbered,
        Feed::Flushing,
        Feed::Ace,
        Feed::Bdfm,
        Feed::Crosstown,
        Feed::Nassau,
        Feed::Canarsie,
        Feed::Broadway,
        Feed::StatenIsland,
    ];

    /// Suffix appended (after a `-`) to the feed base URL. The numbered-lines
    /// feed has none.
    pub fn suffix(self) -> &'static str {
        match self {
            Feed::Numbered => "",
            Feed::Flushing => "7",
            Feed::Ace => "ace",
            Feed::Bdfm => "bdfm",
            Feed::Crosstown => "g",
            Feed::Nassau => "jz",
            Feed::Canarsie => "l",
            Feed::Broadway => "nqrw",
            Feed::StatenIsland => "si",
        }
    }

    pub fn routes(self) -> &'static [&'static str] {
        match self {
            Feed::Numbered => &["1", "2", "3", "4", "5", "6", "GS"],
            Feed::Flushing => &["7", "SS"],
            Feed::Ace => &["A", "C", "E", "FS", "H"],
            Feed::Bdfm => &["B", "D", "F", "M"],
            Feed::Crosstown => &["G"],
            Feed::Nassau => &["J", "Z"],
            Feed::Canarsie => &["L"],
            Feed::Broadway => &["N", "Q", "R", "W"],
            Feed::StatenIsland => &["SI"],
        }
    }

    /// Full endpoint URL of this feed under `base_url`.
    pub fn url(self, base_url: &str) -> String {
        match self.suffix() {
            "" => base_url.to_string(),
            suffix => format!("{base_url}-{suffix}"),
        }
    }
}

/// The feed serving `route`.
pub fn feed_for(route: &str) -> Result<Feed, UnknownRouteError> {
    Feed::ALL
        .into_iter()
        .find(|feed| feed.routes().contains(&route))
        .ok_or_else(|| UnknownRouteError {
            route: route.to_string(),
        })
}

/// The distinct feeds serving `routes`. Fails on the first unknown route.
pub fn feeds_for<I, S>(routes: I) -> Result<BTreeSet<Feed>, UnknownRouteError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    routes
        .into_iter()
        .map(|route| feed_for(route.as_ref()))
        .collect()
}
