//! Flavor block filtering and build token substitution
//!
//! Source files carry flavor blocks:
//!
//! ```text
//! // BEGIN SUGARCRM flav=ent ONLY
//! enterprise only code
//! // END SUGARCRM ONLY
//! ```
//!
//! A block survives when the build flavor satisfies its `flav=` list. Marker
//! lines never reach the output. Blocks may nest; a line is kept only when
//! every enclosing block is kept.

use rome_types::BuildTarget;
use thiserror::Error;

const BEGIN_MARKER: &str = "BEGIN SUGARCRM";
const END_MARKER: &str = "END SUGARCRM";
const FLAVOR_KEY: &str = "flav=";
const ALTERNATIVE_SEPARATOR: &str = "||";

/// Errors raised while rendering one text file
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TagError {
    /// An end marker without a matching begin marker
    #[error("END marker on line {line} has no matching BEGIN")]
    UnexpectedEnd {
        /// One-based line number
        line: usize,
    },

    /// A begin marker that is never closed
    #[error("BEGIN marker on line {line} is never closed")]
    Unterminated {
        /// One-based line number of the open marker
        line: usize,
    },
}

/// Ordering of known flavors, lowest first
///
/// A flavor includes itself and every flavor ranked below it, so an `ult`
/// build keeps `ent`, `corp` and `pro` blocks. Flavors missing from the
/// order only match by exact name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlavorOrder {
    ranks: Vec<String>,
}

impl FlavorOrder {
    /// Create an ordering from lowest to highest flavor
    pub fn new<I, S>(flavors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            ranks: flavors
                .into_iter()
                .map(|flavor| flavor.as_ref().trim().to_ascii_lowercase())
                .collect(),
        }
    }

    fn rank(&self, flavor: &str) -> Option<usize> {
        self.ranks.iter().position(|known| known == flavor)
    }

    /// Whether a build of `build` flavor keeps a block marked `required`
    pub fn includes(&self, build: &str, required: &str) -> bool {
        let build = build.trim().to_ascii_lowercase();
        let required = required.trim().to_ascii_lowercase();

        match (self.rank(&build), self.rank(&required)) {
            (Some(have), Some(need)) => have >= need,
            _ => build == required,
        }
    }

    /// Whether any `||` alternative of a `flav=` list is satisfied
    pub fn satisfies(&self, build: &str, list: &str) -> bool {
        list.split(ALTERNATIVE_SEPARATOR)
            .map(str::trim)
            .filter(|alternative| !alternative.is_empty())
            .any(|alternative| self.includes(build, alternative))
    }
}

impl Default for FlavorOrder {
    fn default() -> Self {
        Self::new(["pro", "corp", "ent", "ult"])
    }
}

/// Renders text files for one build target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRenderer {
    version_token: String,
    flavor_token: String,
    order: FlavorOrder,
}

impl TagRenderer {
    /// Create a renderer with explicit tokens and flavor order
    pub fn new<V: Into<String>, F: Into<String>>(
        version_token: V,
        flavor_token: F,
        order: FlavorOrder,
    ) -> Self {
        Self {
            version_token: version_token.into(),
            flavor_token: flavor_token.into(),
            order,
        }
    }

    /// Flavor order used for block filtering
    pub fn order(&self) -> &FlavorOrder {
        &self.order
    }

    /// Render `text` for `target`, preserving line endings
    pub fn render(&self, text: &str, target: &BuildTarget) -> Result<String, TagError> {
        let mut output = String::with_capacity(text.len());
        // (line number, kept) for each open block
        let mut open: Vec<(usize, bool)> = Vec::new();

        for (index, line) in text.split_inclusive('\n').enumerate() {
            let number = index + 1;

            match Marker::parse(line) {
                Some(Marker::Begin(list)) => {
                    let kept = list.map_or(true, |list| self.order.satisfies(&target.flavor, list));
                    open.push((number, kept));
                }
                Some(Marker::End) => {
                    if open.pop().is_none() {
                        return Err(TagError::UnexpectedEnd { line: number });
                    }
                }
                None => {
                    if open.iter().all(|(_, kept)| *kept) {
                        output.push_str(&self.substitute(line, target));
                    }
                }
            }
        }

        if let Some((line, _)) = open.first() {
            return Err(TagError::Unterminated { line: *line });
        }

        Ok(output)
    }

    fn substitute(&self, line: &str, target: &BuildTarget) -> String {
        line.replace(&self.version_token, &target.version)
            .replace(&self.flavor_token, &target.flavor)
    }
}

impl Default for TagRenderer {
    fn default() -> Self {
        Self::new("@_SUGAR_VERSION", "@_SUGAR_FLAV", FlavorOrder::default())
    }
}

enum Marker<'a> {
    /// Begin marker with its `flav=` list, if any
    Begin(Option<&'a str>),
    End,
}

impl<'a> Marker<'a> {
    fn parse(line: &'a str) -> Option<Self> {
        if !line.contains("ONLY") {
            return None;
        }

        if let Some(start) = line.find(BEGIN_MARKER) {
            let rest = &line[start + BEGIN_MARKER.len()..];
            let list = rest.find(FLAVOR_KEY).map(|at| {
                let value = &rest[at + FLAVOR_KEY.len()..];
                value.split_whitespace().next().unwrap_or_default()
            });
            return Some(Self::Begin(list));
        }

        if line.contains(END_MARKER) {
            return Some(Self::End);
        }

        None
    }
}
