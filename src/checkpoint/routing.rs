use crate::engine::Resource;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How a passenger leaving the checkers picks a scanner.
///
/// Both policies break ties in favour of the lowest scanner index, so routing is deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RoutingPolicy {
    /// Fewest passengers waiting. The passenger being scanned is not counted, so an idle scanner and a busy scanner
    /// with an empty queue rank equally.
    #[default]
    ShortestQueue,
    /// Fewest passengers waiting or being scanned.
    LeastLoaded,
}

impl RoutingPolicy {
    fn rank(self, scanner: &Resource) -> usize {
        match self {
            Self::ShortestQueue => scanner.queue_length(),
            Self::LeastLoaded => scanner.queue_length() + scanner.in_use(),
        }
    }

    /// Index of the best-ranked scanner, or `None` for an empty candidate list.
    ///
    /// # Errors
    ///
    /// The first failed lookup among `scanners`.
    pub fn select<'a, Scanners>(self, scanners: Scanners) -> crate::Result<Option<usize>>
    where
        Scanners: IntoIterator<Item = crate::Result<&'a Resource>>,
    {
        let mut best: Option<(usize, usize)> = None;
        for (index, scanner) in scanners.into_iter().enumerate() {
            let rank = self.rank(scanner?);
            if best.map_or(true, |(_, best_rank)| rank < best_rank) {
                best = Some((index, rank));
            }
        }
        Ok(best.map(|(index, _)| index))
    }
}
