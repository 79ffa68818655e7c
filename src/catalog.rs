use crate::errors::FetchError;
use crate::models::Act;
use rand::{Rng, seq::SliceRandom};
use std::{collections::BTreeSet, convert::Infallible, str::FromStr};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Category(String),
}

impl CategoryFilter {
    pub fn matches(&self, act: &Act) -> bool {
        match self {
            Self::All => true,
            Self::Category(category) => act.category == *category,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::All => "all",
            Self::Category(category) => category,
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("all") {
            Ok(Self::All)
        } else {
            Ok(Self::Category(value.to_string()))
        }
    }
}

impl From<Option<&str>> for CategoryFilter {
    fn from(value: Option<&str>) -> Self {
        value
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default()
    }
}

/// The acts fetched for this session, plus whether the last fetch failed.
#[derive(Debug, Default)]
pub struct ActCatalog {
    acts: Vec<Act>,
    last_error: Option<String>,
}

impl ActCatalog {
    /// Takes the outcome of a fetch. A failure keeps the previous list and
    /// raises the error flag; a success replaces the list and clears it.
    pub fn apply_fetch(&mut self, outcome: Result<Vec<Act>, FetchError>) -> Result<usize, FetchError> {
        match outcome {
            Ok(acts) => {
                self.acts = acts;
                self.last_error = None;
                Ok(self.acts.len())
            }
            Err(err) => {
                self.last_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.acts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.acts.is_empty()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn get(&self, id: &str) -> Option<&Act> {
        self.acts.iter().find(|act| act.id == id)
    }

    pub fn categories(&self) -> Vec<String> {
        self.acts
            .iter()
            .filter(|act| !act.category.is_empty())
            .map(|act| act.category.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Uniform pick among acts passing `filter`. `None` when nothing matches;
    /// there is no fallback to the unfiltered pool.
    pub fn pick_random<R>(&self, filter: &CategoryFilter, rng: &mut R) -> Option<&Act>
    where
        R: Rng + ?Sized,
    {
        let matching: Vec<&Act> = self.acts.iter().filter(|act| filter.matches(act)).collect();
        matching.choose(rng).copied()
    }
}
