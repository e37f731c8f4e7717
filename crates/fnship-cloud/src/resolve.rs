//! Resolving an account-scoped resource to exactly one id

use crate::error::{CloudError, Result};
use crate::prompt::Prompter;
use crate::resource::CandidateSet;
use std::future::Future;

/// Extra option offered when the well-known resource does not exist yet
pub const NONE_OF_THESE: &str = "None of these (create a new one)";

/// How a resource id was obtained
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The operator picked an existing resource
    Selected(String),
    /// A new resource was created
    Created(String),
}

impl Resolution {
    pub fn id(&self) -> &str {
        match self {
            Resolution::Selected(id) | Resolution::Created(id) => id,
        }
    }

    pub fn was_created(&self) -> bool {
        matches!(self, Resolution::Created(_))
    }
}

/// Pick one of `candidates`, or create a new resource.
///
/// `create` runs at most once: when there are no candidates, or when the
/// operator chooses [`NONE_OF_THESE`]. That option is only offered while the
/// well-known resource is missing from the candidates.
pub async fn resolve<F, Fut>(
    candidates: &CandidateSet,
    label: &str,
    prompter: &dyn Prompter,
    create: F,
) -> Result<Resolution>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<String>>,
{
    if candidates.is_empty() {
        tracing::info!("No existing {} found, creating one", label);
        return Ok(Resolution::Created(create().await?));
    }

    let mut options = candidates.names();
    let offer_create = !candidates.well_known_present();
    if offer_create {
        options.push(NONE_OF_THESE.to_string());
    }

    let index = prompter.choose_one(label, &options)?;
    let choice = options.get(index).ok_or_else(|| {
        CloudError::Prompt(format!(
            "selection {} out of range for {} options",
            index,
            options.len()
        ))
    })?;

    if offer_create && choice == NONE_OF_THESE {
        return Ok(Resolution::Created(create().await?));
    }

    let id = candidates
        .id_of(choice)
        .ok_or_else(|| CloudError::Prompt(format!("unknown selection: {}", choice)))?;
    tracing::info!("Using existing {} {} ({})", label, choice, id);
    Ok(Resolution::Selected(id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct PickIndex {
        index: usize,
        seen: Mutex<Vec<String>>,
    }

    impl PickIndex {
        fn new(index: usize) -> Self {
            Self {
                index,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl Prompter for PickIndex {
        fn choose_one(&self, _label: &str, options: &[String]) -> Result<usize> {
            *self.seen.lock().unwrap() = options.to_vec();
            Ok(self.index)
        }

        fn confirm(&self, _label: &str) -> Result<bool> {
            Ok(true)
        }
    }

    fn candidates(well_known: &str) -> CandidateSet {
        CandidateSet::from_pairs(
            vec![
                ("b".to_string(), "id2".to_string()),
                ("a".to_string(), "id1".to_string()),
            ],
            well_known,
        )
    }

    #[tokio::test]
    async fn test_empty_set_creates_without_prompting() {
        let prompter = PickIndex::new(0);
        let resolution = resolve(&CandidateSet::new(), "REST API", &prompter, || async {
            Ok("new-id".to_string())
        })
        .await
        .unwrap();

        assert_eq!(resolution, Resolution::Created("new-id".to_string()));
        assert!(prompter.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_selects_existing_candidate() {
        let prompter = PickIndex::new(1);
        let resolution = resolve(&candidates("gw"), "REST API", &prompter, || async {
            Err(CloudError::malformed("create", "must not be called"))
        })
        .await
        .unwrap();

        assert_eq!(resolution, Resolution::Selected("id2".to_string()));
        assert_eq!(
            *prompter.seen.lock().unwrap(),
            vec!["a".to_string(), "b".to_string(), NONE_OF_THESE.to_string()]
        );
    }

    #[tokio::test]
    async fn test_none_of_these_creates() {
        let prompter = PickIndex::new(2);
        let resolution = resolve(&candidates("gw"), "REST API", &prompter, || async {
            Ok("new-id".to_string())
        })
        .await
        .unwrap();

        assert!(resolution.was_created());
        assert_eq!(resolution.id(), "new-id");
    }

    #[tokio::test]
    async fn test_out_of_range_selection_is_a_prompt_error() {
        let prompter = PickIndex::new(7);
        let err = resolve(&candidates("a"), "REST API", &prompter, || async {
            Ok("new-id".to_string())
        })
        .await
        .unwrap_err();

        assert!(matches!(err, CloudError::Prompt(_)));
    }
}
