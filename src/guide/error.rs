use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fatal extraction failures for a single guide page.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GuideError {
    /// The page carries no `WH.markup.printHtml("...")` payload. Either the
    /// page is not a guide or its layout changed.
    #[error("could not find WH.markup.printHtml payload")]
    MarkupNotFound,
}

/// Non-fatal findings collected while extracting one guide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GuideDiagnostic {
    /// No `WH.Gatherer.addData` item dictionary; item names stay unresolved.
    ItemLookupAbsent,
    /// A section heading matched no slot or bucket and was dropped.
    UnclassifiedHeading { heading: String },
    /// A classified section produced no table rows and no inline references.
    EmptySlotResult { heading: String, target: String },
}

/// A flattened slot list that cannot be regrouped into ranked positions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RankingError {
    #[error("slot {slot}: order {order} appears after order {previous}")]
    OrderNotIncreasing {
        slot: String,
        order: u32,
        previous: u32,
    },
}
