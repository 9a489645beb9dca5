// Leaderboard parsing, the running score ledger, and ranked standings.

use std::collections::HashMap;
use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tokio::sync::Mutex;

use crate::metrics;
use crate::store::{JsonFile, StoreError};

/// Number of entries shown in the weekly standings.
pub const TOP_N: usize = 10;

lazy_static! {
    /// `<rank> [<tag>] <name> <score>`. The name is lazy so the first number
    /// following it is taken as the score.
    static ref LEADERBOARD_LINE: Regex =
        Regex::new(r"\d+\s+(\[[^\]]+\]\s+.+?)\s+([\d,]+)").expect("leaderboard pattern");

    static ref DECIMAL_DIGIT: Regex = Regex::new(r"^\d$").expect("digit pattern");
}

/// One row read out of a pasted leaderboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreLine {
    pub name: String,
    pub score: i64,
}

/// Extract every `<rank> [<tag>] <name> <score>` row from free-form text.
///
/// Rows are returned in the order they appear. The score may contain
/// thousands separators (`12,345`); captures with no digits or that do not
/// fit in an `i64` are skipped.
pub fn parse_leaderboard(text: &str) -> Vec<ScoreLine> {
    LEADERBOARD_LINE
        .captures_iter(text)
        .filter_map(|caps| {
            let name = caps.get(1)?.as_str();
            let score = parse_score(caps.get(2)?.as_str())?;
            Some(ScoreLine {
                name: name.to_string(),
                score,
            })
        })
        .collect()
}

/// Parse a captured score, ignoring separators. Any Unicode decimal digit
/// counts (`１２３` is 123); `None` when there are no digits or the value
/// overflows.
fn parse_score(raw: &str) -> Option<i64> {
    let mut digits = raw.chars().filter(|c| *c != ',').peekable();
    digits.peek()?;
    digits.try_fold(0i64, |acc, c| {
        acc.checked_mul(10)?.checked_add(i64::from(decimal_value(c)?))
    })
}

/// Value of a Unicode decimal digit (general category `Nd`).
///
/// Decimal digits are always encoded as contiguous runs `0..=9`, so the value
/// is the offset of `c` from the start of its run.
fn decimal_value(c: char) -> Option<u32> {
    if let Some(d) = c.to_digit(10) {
        return Some(d);
    }
    if !is_decimal_digit(c) {
        return None;
    }
    let preceding = (1..)
        .map_while(|back| char::from_u32((c as u32).checked_sub(back)?))
        .take_while(|&p| is_decimal_digit(p))
        .count();
    u32::try_from(preceding % 10).ok()
}

fn is_decimal_digit(c: char) -> bool {
    let mut buf = [0u8; 4];
    DECIMAL_DIGIT.is_match(c.encode_utf8(&mut buf))
}

/// Insertion-ordered `name -> total` mapping.
///
/// Order matters: it is the tie-breaker when two groups have the same total,
/// so keys keep the position at which they were first seen (or their order in
/// the data file).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoreLedger {
    entries: Vec<(String, i64)>,
    index: HashMap<String, usize>,
}

impl ScoreLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<i64> {
        self.index.get(name).map(|&i| self.entries[i].1)
    }

    /// Entries in encounter order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.entries.iter().map(|(name, score)| (name.as_str(), *score))
    }

    /// Set a total, appending the key if it is new.
    fn set(&mut self, name: &str, score: i64) {
        match self.index.get(name) {
            Some(&i) => self.entries[i].1 = score,
            None => {
                self.index.insert(name.to_string(), self.entries.len());
                self.entries.push((name.to_string(), score));
            }
        }
    }

    /// Add every parsed line to its running total. Returns the number of lines applied.
    pub fn accumulate(&mut self, lines: &[ScoreLine]) -> usize {
        for line in lines {
            let total = self.get(&line.name).unwrap_or(0).saturating_add(line.score);
            self.set(&line.name, total);
        }
        lines.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }

    /// Rank entries by descending total and cut the list at `limit`.
    ///
    /// The sort is stable, so equal totals keep encounter order. When
    /// `highlight` names an entry that did not make the cut, it is returned
    /// separately with its rank in the full ordering.
    pub fn standings(&self, limit: usize, highlight: Option<&str>) -> Standings {
        let mut ordered: Vec<&(String, i64)> = self.entries.iter().collect();
        ordered.sort_by(|a, b| b.1.cmp(&a.1));

        let is_highlight = |name: &str| highlight.is_some_and(|h| h == name);

        let top: Vec<Ranked> = ordered
            .iter()
            .take(limit)
            .enumerate()
            .map(|(i, (name, score))| Ranked {
                rank: i + 1,
                name: name.clone(),
                score: *score,
                highlighted: is_highlight(name),
            })
            .collect();

        let highlighted = if top.iter().any(|r| r.highlighted) {
            None
        } else {
            ordered
                .iter()
                .enumerate()
                .skip(limit)
                .find(|(_, (name, _))| is_highlight(name))
                .map(|(i, (name, score))| Ranked {
                    rank: i + 1,
                    name: name.clone(),
                    score: *score,
                    highlighted: true,
                })
        };

        Standings { top, highlighted }
    }
}

impl Serialize for ScoreLedger {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, score) in &self.entries {
            map.serialize_entry(name, score)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ScoreLedger {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct LedgerVisitor;

        impl<'de> Visitor<'de> for LedgerVisitor {
            type Value = ScoreLedger;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of group names to integer scores")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<ScoreLedger, A::Error> {
                let mut ledger = ScoreLedger::new();
                while let Some((name, score)) = access.next_entry::<String, i64>()? {
                    ledger.set(&name, score);
                }
                Ok(ledger)
            }
        }

        deserializer.deserialize_map(LedgerVisitor)
    }
}

/// One ranked row of the standings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ranked {
    pub rank: usize,
    pub name: String,
    pub score: i64,
    pub highlighted: bool,
}

/// Top of the table plus the highlighted group when it fell outside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Standings {
    pub top: Vec<Ranked>,
    pub highlighted: Option<Ranked>,
}

impl Standings {
    pub fn is_empty(&self) -> bool {
        self.top.is_empty()
    }
}

// ── Persistent ledger ────────────────────────────────────────────────

/// The ledger together with the file it is persisted to.
///
/// Every change is applied to a copy, written out, and only then swapped in,
/// so the in-memory ledger never runs ahead of the file.
pub struct ScoreStore {
    file: JsonFile,
    ledger: Mutex<ScoreLedger>,
}

impl ScoreStore {
    pub async fn load(file: JsonFile) -> Result<Self, StoreError> {
        let ledger: ScoreLedger = file.load_or_init(ScoreLedger::new()).await?;
        tracing::info!(
            path = %file.path().display(),
            entries = ledger.len(),
            "score ledger loaded"
        );
        metrics::LEDGER_ENTRIES.set(ledger.len() as i64);
        Ok(Self {
            file,
            ledger: Mutex::new(ledger),
        })
    }

    /// Apply parsed lines and persist. An empty batch is a no-op and does not touch the file.
    pub async fn accumulate(&self, lines: &[ScoreLine]) -> Result<usize, StoreError> {
        if lines.is_empty() {
            return Ok(0);
        }
        let mut ledger = self.ledger.lock().await;
        let mut next = ledger.clone();
        let applied = next.accumulate(lines);
        self.file.save(&next).await?;
        *ledger = next;

        metrics::SCORE_LINES_ACCUMULATED_TOTAL.inc_by(applied as u64);
        metrics::LEDGER_ENTRIES.set(ledger.len() as i64);
        Ok(applied)
    }

    pub async fn clear(&self) -> Result<(), StoreError> {
        let mut ledger = self.ledger.lock().await;
        let next = ScoreLedger::new();
        self.file.save(&next).await?;
        *ledger = next;
        metrics::LEDGER_ENTRIES.set(0);
        Ok(())
    }

    pub async fn standings(&self, limit: usize, highlight: Option<&str>) -> Standings {
        self.ledger.lock().await.standings(limit, highlight)
    }

    pub async fn snapshot(&self) -> ScoreLedger {
        self.ledger.lock().await.clone()
    }
}
