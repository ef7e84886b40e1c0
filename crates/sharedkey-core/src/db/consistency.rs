use serde::Deserialize;

///
/// ReadConsistency
///
/// Missing-row handling policy for loads and relation attachment.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum ReadConsistency {
    /// Missing rows are ignored (no error).
    #[default]
    MissingOk,

    /// Missing rows are treated as corruption.
    Strict,
}
