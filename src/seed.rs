//! Built-in sample corpus for trying out search.
//!
//! Document ids are slugs of the titles, so seeding the same collection
//! twice is rejected as a duplicate batch instead of storing copies.

use crate::core::Document;
use crate::retrieval::{self, WriteOutcome};
use crate::storage::Storage;

/// Collection seeded when none is named.
pub const DEFAULT_SEED_COLLECTION: &str = "default";

/// Queries that hit the sample corpus well.
pub const SUGGESTED_QUERIES: [&str; 6] = [
    "how do bees communicate",
    "ancient technology",
    "quantum physics",
    "perfect pizza recipe",
    "intelligent animals",
    "what is MCP protocol",
];

struct Sample {
    title: &'static str,
    category: &'static str,
    content: &'static str,
}

const SAMPLES: [Sample; 12] = [
    Sample {
        title: "Philosophy of Happiness",
        category: "philosophy",
        content: "The secret to happiness is not found in seeking more, but in developing the \
                  capacity to enjoy less. The Stoics believed that true contentment comes from \
                  within, not from external circumstances. Marcus Aurelius wrote that very \
                  little is needed to make a happy life.",
    },
    Sample {
        title: "Quantum Superposition Explained",
        category: "science",
        content: "In the quantum realm, particles can exist in multiple states simultaneously \
                  until observed. This phenomenon, known as superposition, challenges our \
                  understanding of reality. Schrödinger's cat illustrates the idea: a cat in a \
                  box could be both alive and dead until someone opens the box.",
    },
    Sample {
        title: "Perfect Pizza Dough Recipe",
        category: "cooking",
        content: "The best pizza dough requires time and patience. Mix flour, water, salt and a \
                  tiny bit of yeast, then let it ferment slowly in the fridge for 48 to 72 \
                  hours. Cold fermentation develops complex flavors and creates perfect air \
                  bubbles. Stretch it gently and never use a rolling pin.",
    },
    Sample {
        title: "What is MCP?",
        category: "technology",
        content: "The Model Context Protocol (MCP) enables AI agents to connect with external \
                  tools and data sources through a standardized interface. Think of it as USB \
                  for AI: a universal connector that lets agents reach databases, APIs and \
                  search engines without custom integrations for each service.",
    },
    Sample {
        title: "Amazing Octopuses",
        category: "marine-biology",
        content: "Octopuses are intelligent invertebrates with three hearts, blue blood and the \
                  ability to change color and texture instantly. Each of their eight arms has \
                  its own cluster of neurons that can make decisions independently.",
    },
    Sample {
        title: "Library of Alexandria",
        category: "history",
        content: "The library of Alexandria was the ancient world's greatest repository of \
                  knowledge, housing hundreds of thousands of scrolls. Its destruction, probably \
                  through several fires over many years, was an immeasurable loss to human \
                  civilization.",
    },
    Sample {
        title: "Bee Communication",
        category: "biology",
        content: "Bees dance to communicate. When a forager finds a good source of nectar it \
                  performs a waggle dance to tell other bees the direction and distance. The \
                  angle of the dance gives the direction relative to the sun, and the length of \
                  the waggle gives the distance.",
    },
    Sample {
        title: "Kintsugi Philosophy",
        category: "art",
        content: "The Japanese art of Kintsugi repairs broken pottery with gold or silver \
                  lacquer, highlighting the cracks rather than hiding them. It embraces the \
                  beauty of imperfection and the history of an object.",
    },
    Sample {
        title: "Black Holes Explained",
        category: "astrophysics",
        content: "Black holes are regions of spacetime where gravity is so strong that nothing, \
                  not even light, can escape. The event horizon marks the point of no return. \
                  Planet-sized telescope arrays now let us photograph them.",
    },
    Sample {
        title: "Game of Go",
        category: "games",
        content: "The ancient game of Go is deceptively simple with profound complexity. Players \
                  place black and white stones on a 19x19 grid to surround territory. Go has more \
                  possible positions than atoms in the observable universe.",
    },
    Sample {
        title: "Antikythera Mechanism",
        category: "archaeology",
        content: "The Antikythera mechanism, found in a shipwreck, is an ancient Greek analog \
                  computer from around 100 BCE that predicted astronomical positions and \
                  eclipses. It had at least 30 bronze gears, a complexity unmatched for over a \
                  thousand years.",
    },
    Sample {
        title: "Crow Intelligence",
        category: "ornithology",
        content: "Crows are among the most intelligent animals on Earth. They use tools, solve \
                  puzzles, remember human faces for years and teach these behaviors to their \
                  offspring.",
    },
];

/// Returns the sample documents with `title` and `category` metadata.
#[must_use]
pub fn sample_documents() -> Vec<Document> {
    SAMPLES
        .iter()
        .map(|s| {
            Document::new(slugify(s.title), s.content)
                .with_meta("title", s.title)
                .with_meta("category", s.category)
        })
        .collect()
}

/// Loads the sample corpus into `collection` in one batch.
pub fn seed<S: Storage + ?Sized>(storage: &mut S, collection: &str) -> WriteOutcome {
    let documents = sample_documents();
    tracing::info!(collection, count = documents.len(), "seeding sample documents");
    retrieval::add_documents(storage, collection, &documents)
}

/// Lowercases `title` and joins its alphanumeric runs with `-`.
fn slugify(title: &str) -> String {
    title
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}
