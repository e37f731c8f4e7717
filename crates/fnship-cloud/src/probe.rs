//! Resource existence probing
//!
//! Probes turn the not-found sentinel into an answer instead of an error.
//! Every other failure is propagated untouched.

use crate::command::{CommandRunner, command_line};
use crate::error::{CloudError, Result};
use crate::resource::CandidateSet;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Listing {
    #[serde(default)]
    items: Vec<ListingItem>,
}

#[derive(Debug, Deserialize)]
struct ListingItem {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct Created {
    id: String,
}

/// Does the resource described by `program args` exist?
pub async fn exists(runner: &dyn CommandRunner, program: &str, args: &[String]) -> Result<bool> {
    match runner.output(program, args).await {
        Ok(_) => Ok(true),
        Err(e) if e.is_not_found() => Ok(false),
        Err(e) => Err(e),
    }
}

/// Run a listing command and collect its `{ items: [{ id, name }] }` answer
pub async fn list_candidates(
    runner: &dyn CommandRunner,
    program: &str,
    args: &[String],
    well_known: &str,
) -> Result<CandidateSet> {
    let output = match runner.output(program, args).await {
        Ok(output) => output,
        Err(e) if e.is_not_found() => return Ok(CandidateSet::new()),
        Err(e) => return Err(e),
    };
    parse_listing(&output, well_known).map_err(|err| match err {
        CloudError::MalformedResponse { reason, .. } => {
            CloudError::malformed(command_line(program, args), reason)
        }
        other => other,
    })
}

/// Parse a listing body. A body without `items` is an empty listing.
pub fn parse_listing(bytes: &[u8], well_known: &str) -> Result<CandidateSet> {
    let listing: Listing =
        serde_json::from_slice(bytes).map_err(|e| CloudError::malformed("listing", e))?;
    Ok(CandidateSet::from_pairs(
        listing.items.into_iter().map(|item| (item.name, item.id)),
        well_known,
    ))
}

/// Parse the `{ "id": "..." }` answer of a create command
pub fn parse_created_id(bytes: &[u8]) -> Result<String> {
    let created: Created =
        serde_json::from_slice(bytes).map_err(|e| CloudError::malformed("create", e))?;
    if created.id.is_empty() {
        return Err(CloudError::malformed("create", "empty id"));
    }
    Ok(created.id)
}

/// Run a text-output command whose answer is required to be non-empty
pub async fn required_text(
    runner: &dyn CommandRunner,
    program: &str,
    args: &[String],
) -> Result<String> {
    let text = runner.output_text(program, args).await?;
    if text.is_empty() {
        return Err(CloudError::malformed(
            command_line(program, args),
            "expected a value, got empty output",
        ));
    }
    Ok(text)
}
